// src/config/digest.rs
use anyhow::{anyhow, Result};
use chrono_tz::Tz;
use std::env;
use std::path::PathBuf;

pub const DEFAULT_LOOKBACK_DAYS: i64 = 7;
pub const DEFAULT_MAX_ITEMS: usize = 1000;
pub const DEFAULT_TIMEZONE: &str = "Europe/Lisbon";
pub const DEFAULT_OUTPUT_PATH: &str = "noticias.json";
/// Upper bound on the lookback window (100 years).
pub const MAX_LOOKBACK_DAYS: i64 = 36_500;

pub const ENV_MAX_ITEMS: &str = "DIGEST_MAX_ITEMS";
pub const ENV_TIMEZONE: &str = "DIGEST_TIMEZONE";
pub const ENV_OUTPUT_PATH: &str = "DIGEST_OUTPUT_PATH";

#[derive(Debug, Clone, PartialEq)]
pub struct DigestSettings {
    /// Always >= 1.
    pub lookback_days: i64,
    pub max_items: usize,
    pub timezone: Tz,
    pub output: PathBuf,
}

impl Default for DigestSettings {
    fn default() -> Self {
        Self {
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            max_items: DEFAULT_MAX_ITEMS,
            timezone: chrono_tz::Europe::Lisbon,
            output: PathBuf::from(DEFAULT_OUTPUT_PATH),
        }
    }
}

/// Raw overrides as they come from the command line.
#[derive(Debug, Clone, Default)]
pub struct DigestOverrides {
    pub lookback_days: Option<i64>,
    pub max_items: Option<usize>,
    pub timezone: Option<String>,
    pub output: Option<PathBuf>,
}

impl DigestSettings {
    /// CLI value, else env var, else default. A bad timezone is fatal; a bad
    /// `DIGEST_MAX_ITEMS` falls back to the default with a warning.
    pub fn resolve(o: DigestOverrides) -> Result<Self> {
        let lookback_days = clamp_lookback(o.lookback_days.unwrap_or(DEFAULT_LOOKBACK_DAYS));

        let max_items = match o.max_items {
            Some(n) => n,
            None => match env::var(ENV_MAX_ITEMS) {
                Ok(v) => v.trim().parse().unwrap_or_else(|_| {
                    tracing::warn!(value = %v, "invalid {ENV_MAX_ITEMS}, using default");
                    DEFAULT_MAX_ITEMS
                }),
                Err(_) => DEFAULT_MAX_ITEMS,
            },
        };

        let tz_name = o
            .timezone
            .or_else(|| env::var(ENV_TIMEZONE).ok())
            .unwrap_or_else(|| DEFAULT_TIMEZONE.to_string());
        let timezone = parse_timezone(&tz_name)?;

        let output = o
            .output
            .or_else(|| env::var(ENV_OUTPUT_PATH).ok().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_PATH));

        Ok(Self {
            lookback_days,
            max_items,
            timezone,
            output,
        })
    }
}

/// Values below one day are raised to one; huge values stop at `MAX_LOOKBACK_DAYS`.
pub fn clamp_lookback(days: i64) -> i64 {
    days.clamp(1, MAX_LOOKBACK_DAYS)
}

pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|e| anyhow!("unknown timezone {name:?}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookback_is_clamped() {
        assert_eq!(clamp_lookback(0), 1);
        assert_eq!(clamp_lookback(-5), 1);
        assert_eq!(clamp_lookback(3), 3);
        assert_eq!(clamp_lookback(i64::MAX), MAX_LOOKBACK_DAYS);
    }

    #[test]
    fn timezone_parsing() {
        assert_eq!(parse_timezone("Europe/Lisbon").unwrap(), chrono_tz::Europe::Lisbon);
        assert!(parse_timezone("Mars/Olympus").is_err());
    }

    #[serial_test::serial]
    #[test]
    fn cli_beats_env_beats_default() {
        env::remove_var(ENV_MAX_ITEMS);
        env::remove_var(ENV_TIMEZONE);
        env::remove_var(ENV_OUTPUT_PATH);

        let s = DigestSettings::resolve(DigestOverrides::default()).unwrap();
        assert_eq!(s, DigestSettings::default());

        env::set_var(ENV_MAX_ITEMS, "50");
        env::set_var(ENV_TIMEZONE, "America/New_York");
        let s = DigestSettings::resolve(DigestOverrides {
            lookback_days: Some(0),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(s.max_items, 50);
        assert_eq!(s.timezone, chrono_tz::America::New_York);
        assert_eq!(s.lookback_days, 1);

        let s = DigestSettings::resolve(DigestOverrides {
            max_items: Some(5),
            timezone: Some("UTC".into()),
            output: Some(PathBuf::from("out/d.json")),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(s.max_items, 5);
        assert_eq!(s.timezone, chrono_tz::UTC);
        assert_eq!(s.output, PathBuf::from("out/d.json"));

        env::set_var(ENV_MAX_ITEMS, "lots");
        let s = DigestSettings::resolve(DigestOverrides::default()).unwrap();
        assert_eq!(s.max_items, DEFAULT_MAX_ITEMS);

        env::remove_var(ENV_MAX_ITEMS);
        env::remove_var(ENV_TIMEZONE);
    }
}
