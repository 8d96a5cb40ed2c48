//! Summary counters for the screened universe and the pair set.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::pairs::PairCandidate;
use crate::security::Security;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UniverseStats {
    pub count: usize,
    /// Securities with signal > 0
    pub positive_count: usize,
    pub positive_pct: f64,
    pub mean_signal: Option<f64>,
    pub max_signal: Option<f64>,
    pub min_signal: Option<f64>,
    pub total_volume: f64,
}

impl UniverseStats {
    pub fn compute<T: AsRef<Security>>(securities: &[T]) -> Self {
        let count = securities.len();
        let signals: Vec<f64> = securities.iter().map(|s| s.as_ref().signal).collect();
        let positive_count = signals.iter().filter(|&&s| s > 0.0).count();

        Self {
            count,
            positive_count,
            positive_pct: positive_count as f64 / count.max(1) as f64 * 100.0,
            mean_signal: (count > 0).then(|| signals.iter().sum::<f64>() / count as f64),
            max_signal: signals.iter().copied().reduce(f64::max),
            min_signal: signals.iter().copied().reduce(f64::min),
            total_volume: securities.iter().map(|s| s.as_ref().volume).sum(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PairStats {
    pub pair_count: usize,
    pub industries_with_pairs: usize,
    pub max_spread: Option<f64>,
    pub min_spread: Option<f64>,
    /// Pairs whose legs share a cap bucket
    pub cap_match_count: usize,
}

impl PairStats {
    pub fn compute(pairs: &[PairCandidate]) -> Self {
        let industries: HashSet<&str> = pairs.iter().map(|p| p.industry.as_str()).collect();

        Self {
            pair_count: pairs.len(),
            industries_with_pairs: industries.len(),
            max_spread: pairs.iter().map(|p| p.spread).reduce(f64::max),
            min_spread: pairs.iter().map(|p| p.spread).reduce(f64::min),
            cap_match_count: pairs.iter().filter(|p| p.cap_match).count(),
        }
    }
}
