//! Dollar-volume cap bucketing.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::security::{BucketedSecurity, CapBucket, Security};

/// Quantile of `values` with linear interpolation between order statistics.
///
/// `q` is clamped to `[0, 1]`. Returns `None` for an empty slice.
pub fn percentile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let h = (sorted.len() - 1) as f64 * q.clamp(0.0, 1.0);
    let lo = h.floor() as usize;
    let hi = (lo + 1).min(sorted.len() - 1);
    Some(sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo]))
}

/// 25th / 75th percentile cut points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BucketThresholds {
    pub p25: f64,
    pub p75: f64,
}

impl BucketThresholds {
    pub fn from_dollar_volumes(values: &[f64]) -> Option<Self> {
        Some(Self {
            p25: percentile(values, 0.25)?,
            p75: percentile(values, 0.75)?,
        })
    }

    /// Boundaries are inclusive on the lower bucket.
    pub fn classify(&self, dollar_volume: f64) -> CapBucket {
        if dollar_volume <= self.p25 {
            CapBucket::Small
        } else if dollar_volume <= self.p75 {
            CapBucket::Mid
        } else {
            CapBucket::Large
        }
    }
}

/// A screened set with buckets attached, input order kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BucketedUniverse {
    pub securities: Vec<BucketedSecurity>,
    /// `None` when the screened set was empty
    pub thresholds: Option<BucketThresholds>,
}

pub struct CapBucketizer;

impl CapBucketizer {
    pub fn bucketize(securities: &[Security]) -> BucketedUniverse {
        let dollar_volumes: Vec<f64> = securities.iter().map(Security::dollar_volume).collect();
        let Some(thresholds) = BucketThresholds::from_dollar_volumes(&dollar_volumes) else {
            return BucketedUniverse::default();
        };

        let bucketed: Vec<BucketedSecurity> = securities
            .iter()
            .zip(&dollar_volumes)
            .map(|(security, &dv)| BucketedSecurity {
                security: security.clone(),
                cap_bucket: thresholds.classify(dv),
            })
            .collect();

        debug!(
            count = bucketed.len(),
            p25 = thresholds.p25,
            p75 = thresholds.p75,
            "Cap buckets assigned"
        );

        BucketedUniverse {
            securities: bucketed,
            thresholds: Some(thresholds),
        }
    }
}
