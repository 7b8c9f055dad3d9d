// src/clock.rs
use chrono::{DateTime, Utc};

/// The single "now" of a run. Captured once and passed down, so the fallback
/// timestamp, the lookback cutoff and `generated_at` all agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunClock {
    now: DateTime<Utc>,
}

impl RunClock {
    pub fn system() -> Self {
        Self { now: Utc::now() }
    }

    pub fn fixed(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }
}
