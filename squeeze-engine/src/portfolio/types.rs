//! Portfolio types.
//!
//! A portfolio is two independently built legs. Every position carries a
//! snapshot of the security it was selected from, so downstream checks
//! never need the universe again.

use serde::{Deserialize, Serialize};

use crate::security::BucketedSecurity;

// ============================================================================
// Leg
// ============================================================================

/// Side of a market-neutral book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Leg {
    Long,
    Short,
}

impl std::fmt::Display for Leg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Long => write!(f, "Long"),
            Self::Short => write!(f, "Short"),
        }
    }
}

// ============================================================================
// Position Types
// ============================================================================

/// A sized selection in one leg.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Security snapshot at selection time
    #[serde(flatten)]
    pub security: BucketedSecurity,
    pub leg: Leg,
    /// Dollar size; equal for every position in a leg
    pub size: f64,
}

impl Position {
    pub fn ticker(&self) -> &str {
        &self.security.ticker
    }
}

/// Both legs of a built portfolio.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    pub longs: Vec<Position>,
    pub shorts: Vec<Position>,
}

impl Portfolio {
    pub fn long_notional(&self) -> f64 {
        self.longs.iter().map(|p| p.size).sum()
    }

    pub fn short_notional(&self) -> f64 {
        self.shorts.iter().map(|p| p.size).sum()
    }

    pub fn positions(&self) -> impl Iterator<Item = &Position> {
        self.longs.iter().chain(self.shorts.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.longs.is_empty() && self.shorts.is_empty()
    }
}

// ============================================================================
// Outcome
// ============================================================================

/// Eligible universe too small to build from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsufficientUniverse {
    /// Eligible securities found
    pub available: usize,
    /// Securities needed before construction starts
    pub required: usize,
}

impl std::fmt::Display for InsufficientUniverse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Insufficient data for portfolio construction: {} eligible securities, need {}",
            self.available, self.required
        )
    }
}

/// Result of the portfolio path. Insufficiency is a result, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PortfolioOutcome {
    Built(Portfolio),
    Insufficient(InsufficientUniverse),
}

impl PortfolioOutcome {
    pub fn portfolio(&self) -> Option<&Portfolio> {
        match self {
            Self::Built(portfolio) => Some(portfolio),
            Self::Insufficient(_) => None,
        }
    }

    pub fn is_built(&self) -> bool {
        matches!(self, Self::Built(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::{CapBucket, Security};

    fn position(ticker: &str, leg: Leg, size: f64) -> Position {
        Position {
            security: BucketedSecurity {
                security: Security {
                    ticker: ticker.to_string(),
                    name: ticker.to_string(),
                    sector: "Utilities".to_string(),
                    industry: "Utilities - Regulated Electric".to_string(),
                    signal: 0.04,
                    price: 50.0,
                    volume: 20_000_000.0,
                },
                cap_bucket: CapBucket::Large,
            },
            leg,
            size,
        }
    }

    #[test]
    fn test_portfolio_notional() {
        let portfolio = Portfolio {
            longs: vec![position("A", Leg::Long, 250.0), position("B", Leg::Long, 250.0)],
            shorts: vec![position("C", Leg::Short, 500.0)],
        };
        assert_eq!(portfolio.long_notional(), 500.0);
        assert_eq!(portfolio.short_notional(), 500.0);
        assert_eq!(portfolio.positions().count(), 3);
        assert!(!portfolio.is_empty());
    }

    #[test]
    fn test_outcome_serialization_tag() {
        let outcome = PortfolioOutcome::Insufficient(InsufficientUniverse {
            available: 12,
            required: 60,
        });
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "insufficient");
        assert_eq!(json["available"], 12);
        assert!(outcome.portfolio().is_none());

        let built = PortfolioOutcome::Built(Portfolio::default());
        let json = serde_json::to_value(&built).unwrap();
        assert_eq!(json["status"], "built");
        assert!(built.is_built());
    }

    #[test]
    fn test_position_serializes_flat() {
        let json = serde_json::to_value(position("A", Leg::Short, 1.0)).unwrap();
        assert_eq!(json["ticker"], "A");
        assert_eq!(json["cap_bucket"], "Large");
        assert_eq!(json["leg"], "Short");
    }

    #[test]
    fn test_insufficient_display() {
        let msg = InsufficientUniverse { available: 3, required: 40 }.to_string();
        assert!(msg.contains("3 eligible"));
        assert!(msg.contains("need 40"));
    }
}
