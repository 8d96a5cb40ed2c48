//! Leg composition and rebalance checks for a built portfolio.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::PortfolioConfig;

use super::types::{Leg, Portfolio, Position};

// ============================================================================
// Leg Balance
// ============================================================================

/// Number of positions sharing a sector or industry label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupCount {
    pub name: String,
    pub count: usize,
}

/// Composition of one leg.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegSummary {
    pub count: usize,
    pub notional: f64,
    /// Most populated first, ties by name
    pub sectors: Vec<GroupCount>,
    pub industries: Vec<GroupCount>,
}

impl LegSummary {
    fn from_positions(positions: &[Position]) -> Self {
        Self {
            count: positions.len(),
            notional: positions.iter().map(|p| p.size).sum(),
            sectors: group_counts(positions.iter().map(|p| p.security.sector.as_str())),
            industries: group_counts(positions.iter().map(|p| p.security.industry.as_str())),
        }
    }
}

/// Exposure and diversification across both legs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegBalance {
    pub long: LegSummary,
    pub short: LegSummary,
    /// Long plus short notional
    pub gross_exposure: f64,
    /// Long minus short notional
    pub net_exposure: f64,
}

impl LegBalance {
    pub fn from_portfolio(portfolio: &Portfolio) -> Self {
        let long = LegSummary::from_positions(&portfolio.longs);
        let short = LegSummary::from_positions(&portfolio.shorts);
        Self {
            gross_exposure: long.notional + short.notional,
            net_exposure: long.notional - short.notional,
            long,
            short,
        }
    }
}

fn group_counts<'a>(labels: impl Iterator<Item = &'a str>) -> Vec<GroupCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for label in labels {
        *counts.entry(label).or_insert(0) += 1;
    }

    let mut groups: Vec<GroupCount> = counts
        .into_iter()
        .map(|(name, count)| GroupCount {
            name: name.to_string(),
            count,
        })
        .collect();
    groups.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    groups
}

// ============================================================================
// Rebalance Check
// ============================================================================

/// Why a position no longer qualifies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RebalanceReason {
    /// Long signal fell below the exit level
    WeakLongSignal { signal: f64, threshold: f64 },
    /// Short signal rose above the exit level
    WeakShortSignal { signal: f64, threshold: f64 },
    /// Share volume below the portfolio floor
    LowVolume { volume: f64, floor: f64 },
}

impl std::fmt::Display for RebalanceReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WeakLongSignal { signal, threshold } => {
                write!(f, "signal {:.4} below long exit {:.4}", signal, threshold)
            }
            Self::WeakShortSignal { signal, threshold } => {
                write!(f, "signal {:.4} above short exit {:.4}", signal, threshold)
            }
            Self::LowVolume { volume, floor } => {
                write!(f, "volume {:.0} below floor {:.0}", volume, floor)
            }
        }
    }
}

/// A position flagged for review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RebalanceFlag {
    pub ticker: String,
    pub leg: Leg,
    pub reason: RebalanceReason,
}

/// Checks positions against exit thresholds. Keeps no state between calls.
pub struct RebalanceCheck<'a> {
    config: &'a PortfolioConfig,
}

impl<'a> RebalanceCheck<'a> {
    pub fn new(config: &'a PortfolioConfig) -> Self {
        Self { config }
    }

    /// Flags in leg order (longs then shorts); a position can be flagged
    /// for both signal and volume.
    pub fn check(&self, portfolio: &Portfolio) -> Vec<RebalanceFlag> {
        let flags: Vec<RebalanceFlag> = portfolio
            .positions()
            .flat_map(|position| self.check_position(position))
            .collect();

        debug!(flagged = flags.len(), "Rebalance check complete");
        flags
    }

    fn check_position(&self, position: &Position) -> Vec<RebalanceFlag> {
        let exits = &self.config.rebalance;
        let security = &position.security;
        let mut reasons = Vec::new();

        match position.leg {
            Leg::Long if security.signal < exits.long_exit_signal => {
                reasons.push(RebalanceReason::WeakLongSignal {
                    signal: security.signal,
                    threshold: exits.long_exit_signal,
                });
            }
            Leg::Short if security.signal > exits.short_exit_signal => {
                reasons.push(RebalanceReason::WeakShortSignal {
                    signal: security.signal,
                    threshold: exits.short_exit_signal,
                });
            }
            _ => {}
        }

        if security.volume < self.config.volume_floor {
            reasons.push(RebalanceReason::LowVolume {
                volume: security.volume,
                floor: self.config.volume_floor,
            });
        }

        reasons
            .into_iter()
            .map(|reason| RebalanceFlag {
                ticker: security.ticker.clone(),
                leg: position.leg,
                reason,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::{BucketedSecurity, CapBucket, Security};

    fn position(ticker: &str, sector: &str, industry: &str, leg: Leg, signal: f64, volume: f64) -> Position {
        Position {
            security: BucketedSecurity {
                security: Security {
                    ticker: ticker.to_string(),
                    name: ticker.to_string(),
                    sector: sector.to_string(),
                    industry: industry.to_string(),
                    signal,
                    price: 30.0,
                    volume,
                },
                cap_bucket: CapBucket::Large,
            },
            leg,
            size: 100.0,
        }
    }

    fn portfolio() -> Portfolio {
        Portfolio {
            longs: vec![
                position("L1", "Tech", "Software", Leg::Long, 0.10, 20_000_000.0),
                position("L2", "Tech", "Hardware", Leg::Long, 0.02, 20_000_000.0),
                position("L3", "Energy", "Oil", Leg::Long, 0.05, 5_000_000.0),
            ],
            shorts: vec![
                position("S1", "Retail", "Apparel", Leg::Short, -0.08, 15_000_000.0),
                position("S2", "Retail", "Grocery", Leg::Short, -0.01, 15_000_000.0),
            ],
        }
    }

    #[test]
    fn test_leg_balance() {
        let balance = LegBalance::from_portfolio(&portfolio());

        assert_eq!(balance.long.count, 3);
        assert_eq!(balance.long.notional, 300.0);
        assert_eq!(balance.short.notional, 200.0);
        assert_eq!(balance.gross_exposure, 500.0);
        assert_eq!(balance.net_exposure, 100.0);
        assert_eq!(
            balance.long.sectors,
            vec![
                GroupCount { name: "Tech".into(), count: 2 },
                GroupCount { name: "Energy".into(), count: 1 },
            ]
        );
        assert_eq!(balance.short.industries[0].name, "Apparel");
    }

    #[test]
    fn test_rebalance_flags() {
        let config = PortfolioConfig::default();
        let flags = RebalanceCheck::new(&config).check(&portfolio());

        let summary: Vec<(&str, Leg)> = flags.iter().map(|f| (f.ticker.as_str(), f.leg)).collect();
        assert_eq!(summary, vec![("L2", Leg::Long), ("L3", Leg::Long), ("S2", Leg::Short)]);
        assert!(matches!(flags[0].reason, RebalanceReason::WeakLongSignal { .. }));
        assert!(matches!(flags[1].reason, RebalanceReason::LowVolume { .. }));
        assert!(matches!(flags[2].reason, RebalanceReason::WeakShortSignal { .. }));
    }

    #[test]
    fn test_rebalance_both_reasons() {
        let config = PortfolioConfig::default();
        let portfolio = Portfolio {
            longs: vec![position("X", "Tech", "Software", Leg::Long, 0.0, 1.0)],
            shorts: vec![],
        };
        let flags = RebalanceCheck::new(&config).check(&portfolio);
        assert_eq!(flags.len(), 2);
        assert!(flags[1].reason.to_string().contains("below floor"));
    }

    #[test]
    fn test_empty_portfolio() {
        let config = PortfolioConfig::default();
        let empty = Portfolio::default();
        assert!(RebalanceCheck::new(&config).check(&empty).is_empty());
        let balance = LegBalance::from_portfolio(&empty);
        assert_eq!(balance.gross_exposure, 0.0);
        assert!(balance.long.sectors.is_empty());
    }
}
