//! Universe screening and cap bucketing.
//!
//! Screening is a funnel of order-preserving filters:
//! 1. ETF mode (include / exclude / only)
//! 2. Sector exact match
//! 3. Industry exact match
//! 4. Signal floor
//! 5. Volume floor
//! 6. Record limit
//!
//! Bucketing then classifies the survivors by dollar volume relative to
//! each other, so a bucket is only meaningful for the set it came from.

mod bucket;
mod filter;

pub use bucket::{percentile, BucketThresholds, BucketedUniverse, CapBucketizer};
pub use filter::{EtfMode, FilterResult, FilterStage, ScreenedUniverse, UniverseScreener};
