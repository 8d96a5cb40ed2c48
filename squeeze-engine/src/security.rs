//! Security records and cap buckets.

use serde::{Deserialize, Serialize};

// ============================================================================
// Security
// ============================================================================

/// One scored security from the input universe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Security {
    /// Unique non-empty identifier
    pub ticker: String,
    /// Display name
    pub name: String,
    /// Sector label ("Unknown" when missing upstream)
    pub sector: String,
    /// Industry label ("ETF" marks exchange-traded funds)
    pub industry: String,
    /// Predictive score; positive means expected outperformance
    pub signal: f64,
    /// Last price (>= 0)
    pub price: f64,
    /// Share volume (>= 0)
    pub volume: f64,
}

impl Security {
    /// Price times share volume.
    pub fn dollar_volume(&self) -> f64 {
        self.price * self.volume
    }

    pub fn is_etf(&self, etf_label: &str) -> bool {
        self.industry == etf_label
    }
}

impl AsRef<Security> for Security {
    fn as_ref(&self) -> &Security {
        self
    }
}

// ============================================================================
// Cap Bucket
// ============================================================================

/// Coarse size class from the screened set's dollar-volume distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CapBucket {
    Small,
    Mid,
    Large,
}

impl std::fmt::Display for CapBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Small => write!(f, "Small"),
            Self::Mid => write!(f, "Mid"),
            Self::Large => write!(f, "Large"),
        }
    }
}

/// A screened security with the bucket computed for its screened set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketedSecurity {
    #[serde(flatten)]
    pub security: Security,
    pub cap_bucket: CapBucket,
}

impl AsRef<Security> for BucketedSecurity {
    fn as_ref(&self) -> &Security {
        &self.security
    }
}

impl std::ops::Deref for BucketedSecurity {
    type Target = Security;

    fn deref(&self) -> &Security {
        &self.security
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn security(ticker: &str, industry: &str) -> Security {
        Security {
            ticker: ticker.to_string(),
            name: format!("{} Inc", ticker),
            sector: "Technology".to_string(),
            industry: industry.to_string(),
            signal: 0.05,
            price: 12.5,
            volume: 2_000_000.0,
        }
    }

    #[test]
    fn test_dollar_volume() {
        let s = security("AAA", "Software");
        assert!((s.dollar_volume() - 25_000_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_is_etf() {
        assert!(security("SPY", "ETF").is_etf("ETF"));
        assert!(!security("AAA", "Software").is_etf("ETF"));
    }

    #[test]
    fn test_bucketed_serializes_flat() {
        let b = BucketedSecurity {
            security: security("AAA", "Software"),
            cap_bucket: CapBucket::Mid,
        };
        let json = serde_json::to_value(&b).unwrap();
        assert_eq!(json["ticker"], "AAA");
        assert_eq!(json["cap_bucket"], "Mid");
        assert_eq!(b.industry, "Software");
    }
}
