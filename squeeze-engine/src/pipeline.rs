//! Pipeline orchestration.
//!
//! ```text
//! universe ─ screen ─ bucket ─┬─ portfolio universe ─ rank ─ select ─ size ─ balance / rebalance
//!                             ├─ pairs ─ pair stats
//!                             └─ universe stats, ranking analytics
//! ```
//!
//! The branches share nothing but the bucketed universe. The same input and
//! configuration always produce the same output.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use squeeze_common::{Validate, ValidationError};
use tracing::{info, warn};

use crate::analytics::RankingAnalytics;
use crate::config::EngineConfig;
use crate::pairs::{IndustryOpportunity, PairCandidate, PairTradeGenerator};
use crate::portfolio::{
    ConstrainedPortfolioBuilder, LegBalance, PortfolioOutcome, RebalanceCheck, RebalanceFlag,
};
use crate::screener::{BucketThresholds, CapBucketizer, FilterResult, UniverseScreener};
use crate::security::{BucketedSecurity, Security};
use crate::stats::{PairStats, UniverseStats};

// ============================================================================
// Pipeline Output
// ============================================================================

/// Everything one invocation computes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineOutput {
    /// Screened universe with cap buckets, input order
    pub screened: Vec<BucketedSecurity>,
    pub funnel: Vec<FilterResult>,
    pub total_scanned: usize,
    pub thresholds: Option<BucketThresholds>,
    pub stats: UniverseStats,
    pub portfolio: PortfolioOutcome,
    /// Present when the portfolio was built
    pub balance: Option<LegBalance>,
    pub rebalance: Vec<RebalanceFlag>,
    /// Spread descending
    pub pairs: Vec<PairCandidate>,
    pub industry_summary: Vec<IndustryOpportunity>,
    pub pair_stats: PairStats,
    pub analytics: RankingAnalytics,
}

// ============================================================================
// Pipeline
// ============================================================================

/// A validated configuration ready to run.
#[derive(Debug, Clone)]
pub struct Pipeline<'a> {
    config: &'a EngineConfig,
}

impl<'a> Pipeline<'a> {
    /// Rejects the configuration before any computation if it is malformed.
    pub fn new(config: &'a EngineConfig) -> Result<Self, ValidationError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn run(&self, universe: &[Security]) -> PipelineOutput {
        let started = Instant::now();
        let cfg = self.config;

        let screened = UniverseScreener::new(&cfg.screen).screen(universe);
        let bucketed = CapBucketizer::bucketize(&screened.securities);

        let portfolio = ConstrainedPortfolioBuilder::new(&cfg.portfolio)
            .build(&bucketed.securities, &cfg.screen.etf_industry_label);
        let (balance, rebalance) = match portfolio.portfolio() {
            Some(built) => (
                Some(LegBalance::from_portfolio(built)),
                RebalanceCheck::new(&cfg.portfolio).check(built),
            ),
            None => (None, Vec::new()),
        };

        let trades = PairTradeGenerator::new(&cfg.pairs).generate(&bucketed.securities);
        let pair_stats = PairStats::compute(&trades.pairs);

        let stats = UniverseStats::compute(&bucketed.securities);
        let analytics = RankingAnalytics::compute(&bucketed.securities, &cfg.analytics);

        if screened.is_empty() {
            warn!(total_scanned = universe.len(), "Screen left no securities");
        }
        info!(
            total_scanned = universe.len(),
            screened = stats.count,
            positive = stats.positive_count,
            portfolio_built = portfolio.is_built(),
            longs = portfolio.portfolio().map_or(0, |p| p.longs.len()),
            shorts = portfolio.portfolio().map_or(0, |p| p.shorts.len()),
            pairs = pair_stats.pair_count,
            rebalance_flags = rebalance.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Pipeline complete"
        );

        PipelineOutput {
            screened: bucketed.securities,
            funnel: screened.funnel,
            total_scanned: screened.total_scanned,
            thresholds: bucketed.thresholds,
            stats,
            portfolio,
            balance,
            rebalance,
            pairs: trades.pairs,
            industry_summary: trades.industry_summary,
            pair_stats,
            analytics,
        }
    }
}

/// Validate, then run once.
pub fn run_pipeline(universe: &[Security], config: &EngineConfig) -> Result<PipelineOutput, ValidationError> {
    Ok(Pipeline::new(config)?.run(universe))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sec(ticker: &str, industry: &str, signal: f64, volume: f64) -> Security {
        Security {
            ticker: ticker.to_string(),
            name: ticker.to_string(),
            sector: "Technology".to_string(),
            industry: industry.to_string(),
            signal,
            price: 10.0,
            volume,
        }
    }

    #[test]
    fn test_invalid_config_rejected_before_running() {
        let mut config = EngineConfig::default();
        config.portfolio.industry_cap = 0;
        let err = run_pipeline(&[], &config).unwrap_err();
        assert_eq!(err.fields(), vec!["portfolio.industry_cap"]);
    }

    #[test]
    fn test_empty_universe_is_valid() {
        let output = run_pipeline(&[], &EngineConfig::default()).unwrap();
        assert!(output.screened.is_empty());
        assert!(output.pairs.is_empty());
        assert!(output.thresholds.is_none());
        assert!(matches!(output.portfolio, PortfolioOutcome::Insufficient(_)));
        assert!(output.balance.is_none());
    }

    #[test]
    fn test_pairs_unaffected_by_insufficient_portfolio() {
        let universe = vec![
            sec("A", "Software", 0.08, 5_000_000.0),
            sec("B", "Software", -0.09, 500_000.0),
        ];
        let output = run_pipeline(&universe, &EngineConfig::default()).unwrap();

        assert!(!output.portfolio.is_built());
        assert_eq!(output.pairs.len(), 1);
        assert_eq!(output.pair_stats.pair_count, 1);
        assert_eq!(output.stats.count, 2);
    }
}
