//! Eligibility filters over the raw universe.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ScreenConfig;
use crate::security::Security;

// ============================================================================
// ETF Mode
// ============================================================================

/// How securities in the ETF industry are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EtfMode {
    /// Keep ETFs alongside everything else
    #[default]
    Include,
    /// Drop ETFs
    Exclude,
    /// Keep only ETFs
    Only,
}

impl std::fmt::Display for EtfMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Include => write!(f, "include"),
            Self::Exclude => write!(f, "exclude"),
            Self::Only => write!(f, "only"),
        }
    }
}

impl std::str::FromStr for EtfMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "include" | "all" => Ok(Self::Include),
            "exclude" | "none" => Ok(Self::Exclude),
            "only" => Ok(Self::Only),
            _ => Err(format!("Unknown ETF mode: {}", s)),
        }
    }
}

// ============================================================================
// Filter Stage
// ============================================================================

/// Funnel stage, in application order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterStage {
    EtfMode,
    Sector,
    Industry,
    MinSignal,
    VolumeFloor,
    RecordLimit,
}

impl std::fmt::Display for FilterStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EtfMode => write!(f, "ETF mode"),
            Self::Sector => write!(f, "Sector"),
            Self::Industry => write!(f, "Industry"),
            Self::MinSignal => write!(f, "Signal floor"),
            Self::VolumeFloor => write!(f, "Volume floor"),
            Self::RecordLimit => write!(f, "Record limit"),
        }
    }
}

/// Result of one filtering stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterResult {
    /// Stage name
    pub stage: FilterStage,
    /// Number of securities that passed this stage
    pub passed: usize,
    /// Number of securities eliminated at this stage
    pub eliminated: usize,
    /// Elimination rate (%)
    pub elimination_rate: f64,
}

impl FilterResult {
    pub fn new(stage: FilterStage, input_count: usize, passed_count: usize) -> Self {
        let eliminated = input_count.saturating_sub(passed_count);
        let elimination_rate = if input_count > 0 {
            (eliminated as f64 / input_count as f64) * 100.0
        } else {
            0.0
        };

        Self {
            stage,
            passed: passed_count,
            eliminated,
            elimination_rate,
        }
    }
}

// ============================================================================
// Screened Universe
// ============================================================================

/// Survivors of the screen, in input order, plus the stages that ran.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScreenedUniverse {
    pub securities: Vec<Security>,
    /// Only the stages that were configured
    pub funnel: Vec<FilterResult>,
    pub total_scanned: usize,
}

impl ScreenedUniverse {
    pub fn len(&self) -> usize {
        self.securities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.securities.is_empty()
    }
}

// ============================================================================
// Universe Screener
// ============================================================================

/// Applies the configured filters. Never reorders, never fails.
pub struct UniverseScreener<'a> {
    config: &'a ScreenConfig,
}

impl<'a> UniverseScreener<'a> {
    pub fn new(config: &'a ScreenConfig) -> Self {
        Self { config }
    }

    /// Run the full funnel.
    pub fn screen(&self, universe: &[Security]) -> ScreenedUniverse {
        let cfg = self.config;
        let label = cfg.etf_industry_label.as_str();
        let mut funnel = Vec::new();
        let mut current: Vec<&Security> = universe.iter().collect();

        if cfg.etf_mode != EtfMode::Include {
            let keep_etf = cfg.etf_mode == EtfMode::Only;
            current = apply(&mut funnel, FilterStage::EtfMode, current, |s| {
                s.is_etf(label) == keep_etf
            });
        }
        if let Some(sector) = &cfg.sector {
            current = apply(&mut funnel, FilterStage::Sector, current, |s| &s.sector == sector);
        }
        if let Some(industry) = &cfg.industry {
            current = apply(&mut funnel, FilterStage::Industry, current, |s| {
                &s.industry == industry
            });
        }
        if let Some(min_signal) = cfg.min_signal {
            current = apply(&mut funnel, FilterStage::MinSignal, current, |s| {
                s.signal >= min_signal
            });
        }
        if let Some(floor) = cfg.volume_floor {
            current = apply(&mut funnel, FilterStage::VolumeFloor, current, |s| s.volume >= floor);
        }
        if let Some(limit) = cfg.record_limit {
            let input = current.len();
            current.truncate(limit);
            funnel.push(FilterResult::new(FilterStage::RecordLimit, input, current.len()));
        }

        for stage in &funnel {
            debug!(
                stage = %stage.stage,
                passed = stage.passed,
                eliminated = stage.eliminated,
                "Screen stage applied"
            );
        }

        ScreenedUniverse {
            securities: current.into_iter().cloned().collect(),
            funnel,
            total_scanned: universe.len(),
        }
    }
}

fn apply<'s>(
    funnel: &mut Vec<FilterResult>,
    stage: FilterStage,
    input: Vec<&'s Security>,
    keep: impl Fn(&Security) -> bool,
) -> Vec<&'s Security> {
    let input_count = input.len();
    let passed: Vec<&Security> = input.into_iter().filter(|s| keep(*s)).collect();
    funnel.push(FilterResult::new(stage, input_count, passed.len()));
    passed
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn sec(ticker: &str, sector: &str, industry: &str, signal: f64, volume: f64) -> Security {
        Security {
            ticker: ticker.to_string(),
            name: ticker.to_string(),
            sector: sector.to_string(),
            industry: industry.to_string(),
            signal,
            price: 10.0,
            volume,
        }
    }

    fn universe() -> Vec<Security> {
        vec![
            sec("AAA", "Technology", "Software", 0.08, 5_000_000.0),
            sec("SPY", "Financial", "ETF", 0.01, 90_000_000.0),
            sec("BBB", "Technology", "Semiconductors", -0.04, 800_000.0),
            sec("CCC", "Healthcare", "Biotechnology", 0.03, 12_000_000.0),
            sec("QQQ", "Financial", "ETF", 0.02, 40_000_000.0),
            sec("DDD", "Technology", "Software", 0.03, 300_000.0),
        ]
    }

    fn tickers(screened: &ScreenedUniverse) -> Vec<&str> {
        screened.securities.iter().map(|s| s.ticker.as_str()).collect()
    }

    #[test]
    fn test_default_config_keeps_everything() {
        let config = ScreenConfig::default();
        let screened = UniverseScreener::new(&config).screen(&universe());
        assert_eq!(screened.len(), 6);
        assert!(screened.funnel.is_empty());
        assert_eq!(screened.total_scanned, 6);
    }

    #[test_case(EtfMode::Include, &["AAA", "SPY", "BBB", "CCC", "QQQ", "DDD"] ; "include")]
    #[test_case(EtfMode::Exclude, &["AAA", "BBB", "CCC", "DDD"] ; "exclude")]
    #[test_case(EtfMode::Only, &["SPY", "QQQ"] ; "only")]
    fn test_etf_mode(mode: EtfMode, expected: &[&str]) {
        let config = ScreenConfig {
            etf_mode: mode,
            ..Default::default()
        };
        let screened = UniverseScreener::new(&config).screen(&universe());
        assert_eq!(tickers(&screened), expected);
    }

    #[test]
    fn test_filters_compose_and_preserve_order() {
        let config = ScreenConfig {
            sector: Some("Technology".into()),
            min_signal: Some(0.03),
            ..Default::default()
        };
        let screened = UniverseScreener::new(&config).screen(&universe());
        assert_eq!(tickers(&screened), vec!["AAA", "DDD"]);

        let stages: Vec<_> = screened.funnel.iter().map(|f| f.stage).collect();
        assert_eq!(stages, vec![FilterStage::Sector, FilterStage::MinSignal]);
        assert_eq!(screened.funnel[0].passed, 3);
        assert_eq!(screened.funnel[1].eliminated, 1);
    }

    #[test]
    fn test_min_signal_is_inclusive() {
        let config = ScreenConfig {
            min_signal: Some(0.03),
            ..Default::default()
        };
        let screened = UniverseScreener::new(&config).screen(&universe());
        assert_eq!(tickers(&screened), vec!["AAA", "CCC", "DDD"]);
    }

    #[test]
    fn test_volume_floor_then_limit() {
        let config = ScreenConfig {
            volume_floor: Some(1_000_000.0),
            record_limit: Some(2),
            ..Default::default()
        };
        let screened = UniverseScreener::new(&config).screen(&universe());
        assert_eq!(tickers(&screened), vec!["AAA", "SPY"]);
        assert_eq!(screened.funnel.last().map(|f| f.stage), Some(FilterStage::RecordLimit));
    }

    #[test]
    fn test_industry_no_match_is_empty_not_error() {
        let config = ScreenConfig {
            industry: Some("Airlines".into()),
            ..Default::default()
        };
        let screened = UniverseScreener::new(&config).screen(&universe());
        assert!(screened.is_empty());
        assert!((screened.funnel[0].elimination_rate - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_custom_etf_label() {
        let mut data = universe();
        data[1].industry = "Exchange Traded Fund".into();
        let config = ScreenConfig {
            etf_mode: EtfMode::Exclude,
            etf_industry_label: "Exchange Traded Fund".into(),
            ..Default::default()
        };
        let screened = UniverseScreener::new(&config).screen(&data);
        assert_eq!(tickers(&screened), vec!["AAA", "BBB", "CCC", "QQQ", "DDD"]);
    }

    #[test]
    fn test_etf_mode_parsing() {
        assert_eq!("exclude".parse::<EtfMode>().unwrap(), EtfMode::Exclude);
        assert_eq!("ONLY".parse::<EtfMode>().unwrap(), EtfMode::Only);
        assert_eq!("all".parse::<EtfMode>().unwrap(), EtfMode::Include);
        assert!("maybe".parse::<EtfMode>().is_err());
    }

    #[test]
    fn test_filter_result_empty_input() {
        let result = FilterResult::new(FilterStage::Sector, 0, 0);
        assert_eq!(result.eliminated, 0);
        assert_eq!(result.elimination_rate, 0.0);
    }
}
