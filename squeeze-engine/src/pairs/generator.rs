//! Within-industry pair enumeration.

use std::collections::HashMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::PairConfig;
use crate::security::BucketedSecurity;

// ============================================================================
// Pair Types
// ============================================================================

/// A long/short pair from one industry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairCandidate {
    pub long: BucketedSecurity,
    pub short: BucketedSecurity,
    pub industry: String,
    /// long.signal - short.signal
    pub spread: f64,
    /// Smaller of the two share volumes
    pub min_volume: f64,
    /// Both sides fall in the same cap bucket
    pub cap_match: bool,
}

impl PairCandidate {
    fn new(long: &BucketedSecurity, short: &BucketedSecurity) -> Self {
        Self {
            industry: long.industry.clone(),
            spread: long.signal - short.signal,
            min_volume: long.volume.min(short.volume),
            cap_match: long.cap_bucket == short.cap_bucket,
            long: long.clone(),
            short: short.clone(),
        }
    }
}

/// Opportunity row for an industry that produced at least one pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndustryOpportunity {
    pub industry: String,
    /// Members above the long signal threshold
    pub long_count: usize,
    /// Members below the negated threshold
    pub short_count: usize,
    pub total_stocks: usize,
    /// max - min signal over every member
    pub signal_range: f64,
}

/// Pairs sorted by spread plus the per-industry summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PairTrades {
    pub pairs: Vec<PairCandidate>,
    pub industry_summary: Vec<IndustryOpportunity>,
}

// ============================================================================
// Pair Trade Generator
// ============================================================================

/// Enumerates pairs industry by industry.
///
/// Per industry, only the best `top_k` longs and worst `top_k` shorts are
/// crossed, so the work is bounded by `industries * top_k^2`.
pub struct PairTradeGenerator<'a> {
    config: &'a PairConfig,
}

impl<'a> PairTradeGenerator<'a> {
    pub fn new(config: &'a PairConfig) -> Self {
        Self { config }
    }

    pub fn generate(&self, universe: &[BucketedSecurity]) -> PairTrades {
        let groups = self.industry_groups(universe);

        let per_industry: Vec<Option<(Vec<PairCandidate>, IndustryOpportunity)>> = if self.config.parallel {
            groups
                .par_iter()
                .map(|(industry, members)| self.industry_pairs(industry, members))
                .collect()
        } else {
            groups
                .iter()
                .map(|(industry, members)| self.industry_pairs(industry, members))
                .collect()
        };

        let mut pairs = Vec::new();
        let mut industry_summary = Vec::new();
        for (industry_pairs, opportunity) in per_industry.into_iter().flatten() {
            pairs.extend(industry_pairs);
            industry_summary.push(opportunity);
        }

        pairs.sort_by(|a, b| {
            b.spread
                .total_cmp(&a.spread)
                .then_with(|| a.industry.cmp(&b.industry))
                .then_with(|| a.long.ticker.cmp(&b.long.ticker))
                .then_with(|| a.short.ticker.cmp(&b.short.ticker))
        });
        industry_summary.sort_by(|a, b| {
            b.signal_range
                .total_cmp(&a.signal_range)
                .then_with(|| a.industry.cmp(&b.industry))
        });

        debug!(
            industries = groups.len(),
            industries_with_pairs = industry_summary.len(),
            pairs = pairs.len(),
            parallel = self.config.parallel,
            "Pair generation complete"
        );

        PairTrades {
            pairs,
            industry_summary,
        }
    }

    /// Non-excluded industries in first-seen order.
    fn industry_groups<'u>(&self, universe: &'u [BucketedSecurity]) -> Vec<(&'u str, Vec<&'u BucketedSecurity>)> {
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut groups: Vec<(&str, Vec<&BucketedSecurity>)> = Vec::new();

        for security in universe {
            let industry = security.industry.as_str();
            if self.config.excluded_industries.iter().any(|e| e == industry) {
                continue;
            }
            match index.get(industry) {
                Some(&i) => groups[i].1.push(security),
                None => {
                    index.insert(industry, groups.len());
                    groups.push((industry, vec![security]));
                }
            }
        }

        groups
    }

    /// `None` when either side of the industry is empty or nothing passes.
    fn industry_pairs(
        &self,
        industry: &str,
        members: &[&BucketedSecurity],
    ) -> Option<(Vec<PairCandidate>, IndustryOpportunity)> {
        let cfg = self.config;

        let mut longs: Vec<&BucketedSecurity> = members
            .iter()
            .copied()
            .filter(|s| s.signal > cfg.signal_threshold)
            .collect();
        let mut shorts: Vec<&BucketedSecurity> = members
            .iter()
            .copied()
            .filter(|s| s.signal < -cfg.signal_threshold)
            .collect();
        if longs.is_empty() || shorts.is_empty() {
            return None;
        }

        let (long_count, short_count) = (longs.len(), shorts.len());
        longs.sort_by(|a, b| b.signal.total_cmp(&a.signal));
        shorts.sort_by(|a, b| a.signal.total_cmp(&b.signal));
        longs.truncate(cfg.top_k);
        shorts.truncate(cfg.top_k);

        let pairs: Vec<PairCandidate> = longs
            .iter()
            .flat_map(|&long| shorts.iter().map(move |&short| PairCandidate::new(long, short)))
            .filter(|pair| pair.spread >= cfg.min_spread && pair.min_volume >= cfg.liquidity_floor)
            .collect();
        if pairs.is_empty() {
            return None;
        }

        let (min, max) = members.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), s| {
            (lo.min(s.signal), hi.max(s.signal))
        });

        Some((
            pairs,
            IndustryOpportunity {
                industry: industry.to_string(),
                long_count,
                short_count,
                total_stocks: members.len(),
                signal_range: max - min,
            },
        ))
    }
}

// ============================================================================
// Tests
// ============================================================================
