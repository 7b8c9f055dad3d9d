// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod classify;
pub mod clock;
pub mod config;
pub mod dedup;
pub mod digest;
pub mod ingest;
pub mod logging;
pub mod noise;
pub mod normalize;
pub mod pipeline;
pub mod publish;

// ---- Re-exports for stable public API ----
pub use crate::clock::RunClock;
pub use crate::digest::{DayBucket, Digest, DigestItem};
pub use crate::ingest::types::{FeedBatch, FeedSource, RawEntry};
pub use crate::pipeline::{build_digest, PipelineParams, RunStats};
