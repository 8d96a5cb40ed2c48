//! Constrained long/short portfolio builder.
//!
//! # Algorithm
//!
//! ```text
//! screened universe
//!   └─ eligibility: volume >= floor, ETFs dropped
//!        └─ size check: eligible >= required, else Insufficient
//!             └─ rank by signal (stable)
//!                  ├─ long pool:  head, best first  ─┐
//!                  └─ short pool: tail, worst first ─┤ greedy selection under
//!                                                    │ sector / industry caps
//!                                                    └─ equal-dollar sizing
//! ```
//!
//! Each leg is selected on its own; nothing stops one security from being
//! picked for both when the pools overlap.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::config::PortfolioConfig;
use crate::ranker::SignalRanker;
use crate::security::{BucketedSecurity, Security};

use super::sizing::PositionSizer;
use super::types::{InsufficientUniverse, Leg, Portfolio, PortfolioOutcome};

// ============================================================================
// Portfolio Universe
// ============================================================================

/// Securities the portfolio path may draw from, in screened order.
pub fn portfolio_universe<'a>(
    screened: &'a [BucketedSecurity],
    config: &PortfolioConfig,
    etf_label: &str,
) -> Vec<&'a BucketedSecurity> {
    screened
        .iter()
        .filter(|s| s.volume >= config.volume_floor)
        .filter(|s| !(config.exclude_etf && s.is_etf(etf_label)))
        .collect()
}

// ============================================================================
// Constrained Portfolio Builder
// ============================================================================

/// Rank-greedy selection with per-sector and per-industry caps.
#[derive(Debug, Clone)]
pub struct ConstrainedPortfolioBuilder<'a> {
    config: &'a PortfolioConfig,
}

impl<'a> ConstrainedPortfolioBuilder<'a> {
    pub fn new(config: &'a PortfolioConfig) -> Self {
        Self { config }
    }

    /// Walk `pool` in order, admitting candidates whose sector and industry
    /// are still under their caps, until `target` are admitted.
    pub fn select<T>(&self, pool: impl IntoIterator<Item = T>, target: usize) -> Vec<T>
    where
        T: AsRef<Security>,
    {
        let mut sector_counts: HashMap<String, usize> = HashMap::new();
        let mut industry_counts: HashMap<String, usize> = HashMap::new();
        let pool = pool.into_iter();
        let mut selected = Vec::with_capacity(target.min(pool.size_hint().0));
        let mut skipped = 0usize;

        for candidate in pool {
            if selected.len() >= target {
                break;
            }

            let security = candidate.as_ref();
            let sector_count = sector_counts.get(&security.sector).copied().unwrap_or(0);
            let industry_count = industry_counts.get(&security.industry).copied().unwrap_or(0);

            if sector_count < self.config.sector_cap && industry_count < self.config.industry_cap {
                *sector_counts.entry(security.sector.clone()).or_insert(0) += 1;
                *industry_counts.entry(security.industry.clone()).or_insert(0) += 1;
                selected.push(candidate);
            } else {
                skipped += 1;
            }
        }

        debug!(
            selected = selected.len(),
            target_count = target,
            skipped_by_caps = skipped,
            sectors = sector_counts.len(),
            "Leg selection complete"
        );

        selected
    }

    /// Full portfolio path over a screened, bucketed universe.
    pub fn build(&self, screened: &[BucketedSecurity], etf_label: &str) -> PortfolioOutcome {
        let cfg = self.config;
        let eligible: Vec<BucketedSecurity> = portfolio_universe(screened, cfg, etf_label)
            .into_iter()
            .cloned()
            .collect();

        let required = cfg.required_universe_size();
        if eligible.len() < required {
            warn!(
                available = eligible.len(),
                required,
                volume_floor = cfg.volume_floor,
                "Portfolio universe too small, skipping construction"
            );
            return PortfolioOutcome::Insufficient(InsufficientUniverse {
                available: eligible.len(),
                required,
            });
        }

        let ranker = SignalRanker::new(&eligible);
        let longs = self.select(ranker.long_pool(cfg.candidate_depth), cfg.long_target);
        let shorts = self.select(ranker.short_pool(cfg.candidate_depth), cfg.short_target);

        let sizer = PositionSizer::new(cfg.notional);
        let portfolio = Portfolio {
            longs: sizer.size_leg(&longs, Leg::Long, cfg.long_alloc_fraction),
            shorts: sizer.size_leg(&shorts, Leg::Short, cfg.short_alloc_fraction),
        };

        debug!(
            eligible = eligible.len(),
            longs = portfolio.longs.len(),
            shorts = portfolio.shorts.len(),
            "Portfolio built"
        );

        PortfolioOutcome::Built(portfolio)
    }
}

// ============================================================================
// Tests
// ============================================================================
