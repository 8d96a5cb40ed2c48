//! Engine configuration module.
//!
//! Defines the screening, portfolio, pair-trade and analytics parameters.
//! Every field carries a serde default so a partial `engine.json` is enough.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use squeeze_common::config::config_dir;
use squeeze_common::config_loader::{load_json_file, load_section, load_section_from, merge_json};
use squeeze_common::{Validate, ValidationError, ValidationResult, Violations};

use crate::screener::EtfMode;

// ============================================================================
// Main Engine Configuration
// ============================================================================

/// Configuration for one pipeline invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Universe eligibility filters
    #[serde(default)]
    pub screen: ScreenConfig,

    /// Long/short portfolio construction
    #[serde(default)]
    pub portfolio: PortfolioConfig,

    /// Pair-trade generation
    #[serde(default)]
    pub pairs: PairConfig,

    /// Leaderboards and dispersion tables
    #[serde(default)]
    pub analytics: AnalyticsConfig,
}

/// Named default sets observed across dashboard variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// 20 long / 40 short from the top and bottom 50 candidates, 60-name
    /// universe check
    Final,
    /// 20 long / 20 short over the whole ranked universe, as in the
    /// lightweight dashboard without tabular dependencies
    Lightweight,
}

impl std::str::FromStr for Variant {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "final" => Ok(Self::Final),
            "lightweight" | "light" => Ok(Self::Lightweight),
            _ => Err(format!("Unknown variant: {}", s)),
        }
    }
}

impl EngineConfig {
    /// Defaults for a named variant.
    pub fn preset(variant: Variant) -> Self {
        let mut config = Self::default();
        if variant == Variant::Lightweight {
            config.portfolio.long_target = 20;
            config.portfolio.short_target = 20;
            config.portfolio.candidate_depth = None;
        }
        config
    }
}

impl EngineConfig {
    /// Modular file name inside the squeeze config directory.
    pub const FILE_NAME: &'static str = "engine.json";

    /// Load from `path` (or `~/.squeeze/engine.json`), merged over the
    /// defaults of `variant` (or the plain defaults).
    ///
    /// A missing file is not an error. Validation is left to the caller.
    pub fn load(path: Option<&Path>, variant: Option<Variant>) -> Result<Self> {
        let Some(variant) = variant else {
            return match path {
                Some(p) => load_section_from(p),
                None => load_section(None, Self::FILE_NAME),
            };
        };

        let path = match path {
            Some(p) => p.to_path_buf(),
            None => config_dir().join(Self::FILE_NAME),
        };

        let mut merged = serde_json::to_value(Self::preset(variant))
            .context("Failed to serialize engine preset")?;
        if let Some(overrides) = load_json_file(&path)? {
            merge_json(&mut merged, overrides);
        }
        serde_json::from_value(merged)
            .with_context(|| format!("Invalid settings in {}", path.display()))
    }
}

impl Validate for EngineConfig {
    fn validate(&self) -> ValidationResult<()> {
        let mut v = Violations::new();
        v.merge(self.screen.validate());
        v.merge(self.portfolio.validate());
        v.merge(self.pairs.validate());
        v.merge(self.analytics.validate());
        v.finish()
    }
}

// ============================================================================
// Screen Configuration
// ============================================================================

/// Eligibility filters, applied in the order the fields are listed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenConfig {
    /// ETF handling, keyed on `etf_industry_label`
    #[serde(default)]
    pub etf_mode: EtfMode,

    /// Exact sector match
    #[serde(default)]
    pub sector: Option<String>,

    /// Exact industry match
    #[serde(default)]
    pub industry: Option<String>,

    /// Signal floor (inclusive)
    #[serde(default)]
    pub min_signal: Option<f64>,

    /// Share volume floor (inclusive)
    #[serde(default)]
    pub volume_floor: Option<f64>,

    /// Keep only the first N survivors
    #[serde(default)]
    pub record_limit: Option<usize>,

    /// Industry label that marks a security as an ETF
    #[serde(default = "default_etf_label")]
    pub etf_industry_label: String,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            etf_mode: EtfMode::default(),
            sector: None,
            industry: None,
            min_signal: None,
            volume_floor: None,
            record_limit: None,
            etf_industry_label: default_etf_label(),
        }
    }
}

fn default_etf_label() -> String {
    "ETF".to_string()
}

impl Validate for ScreenConfig {
    fn validate(&self) -> ValidationResult<()> {
        let mut v = Violations::new();

        if let Some(min_signal) = self.min_signal {
            v.finite("screen.min_signal", min_signal);
        }
        if let Some(floor) = self.volume_floor {
            v.non_negative("screen.volume_floor", floor);
        }
        if let Some(limit) = self.record_limit {
            v.positive_count("screen.record_limit", limit);
        }
        if self.etf_industry_label.trim().is_empty() {
            v.push(ValidationError::InvalidValue {
                field: "screen.etf_industry_label".into(),
                reason: "must not be blank".into(),
            });
        }

        v.finish()
    }
}

// ============================================================================
// Portfolio Configuration
// ============================================================================

/// Constrained long/short construction parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioConfig {
    /// Max positions per sector within one leg
    #[serde(default = "default_sector_cap")]
    pub sector_cap: usize,

    /// Max positions per industry within one leg
    #[serde(default = "default_industry_cap")]
    pub industry_cap: usize,

    /// Long leg size target
    #[serde(default = "default_long_target")]
    pub long_target: usize,

    /// Short leg size target
    #[serde(default = "default_short_target")]
    pub short_target: usize,

    /// Total portfolio notional (currency)
    #[serde(default = "default_notional")]
    pub notional: f64,

    /// Share of notional allocated to the long leg
    #[serde(default = "default_half")]
    pub long_alloc_fraction: f64,

    /// Share of notional allocated to the short leg
    #[serde(default = "default_half")]
    pub short_alloc_fraction: f64,

    /// Minimum share volume for portfolio eligibility
    #[serde(default = "default_portfolio_volume_floor")]
    pub volume_floor: f64,

    /// Drop ETFs from the portfolio universe
    #[serde(default = "default_true")]
    pub exclude_etf: bool,

    /// How many ranked names feed each leg's candidate pool (None = all)
    #[serde(default = "default_candidate_depth")]
    pub candidate_depth: Option<usize>,

    /// Eligible universe size below which no portfolio is built
    /// (None = long_target + short_target)
    #[serde(default)]
    pub min_universe_size: Option<usize>,

    /// Exit thresholds for the rebalance check
    #[serde(default)]
    pub rebalance: RebalanceConfig,
}

impl Default for PortfolioConfig {
    fn default() -> Self {
        Self {
            sector_cap: default_sector_cap(),
            industry_cap: default_industry_cap(),
            long_target: default_long_target(),
            short_target: default_short_target(),
            notional: default_notional(),
            long_alloc_fraction: default_half(),
            short_alloc_fraction: default_half(),
            volume_floor: default_portfolio_volume_floor(),
            exclude_etf: true,
            candidate_depth: default_candidate_depth(),
            min_universe_size: None,
            rebalance: RebalanceConfig::default(),
        }
    }
}

impl PortfolioConfig {
    /// Eligible universe size required before construction starts.
    pub fn required_universe_size(&self) -> usize {
        self.min_universe_size
            .unwrap_or_else(|| self.long_target.saturating_add(self.short_target))
    }
}

fn default_sector_cap() -> usize {
    4
}

fn default_industry_cap() -> usize {
    2
}

fn default_long_target() -> usize {
    20
}

fn default_short_target() -> usize {
    40
}

fn default_notional() -> f64 {
    10_000_000.0
}

fn default_half() -> f64 {
    0.5
}

fn default_portfolio_volume_floor() -> f64 {
    10_000_000.0
}

fn default_true() -> bool {
    true
}

fn default_candidate_depth() -> Option<usize> {
    Some(50)
}

impl Validate for PortfolioConfig {
    fn validate(&self) -> ValidationResult<()> {
        let mut v = Violations::new();

        v.positive_count("portfolio.sector_cap", self.sector_cap);
        v.positive_count("portfolio.industry_cap", self.industry_cap);
        v.positive_count("portfolio.long_target", self.long_target);
        v.positive_count("portfolio.short_target", self.short_target);
        v.positive_amount("portfolio.notional", self.notional);
        v.fraction("portfolio.long_alloc_fraction", self.long_alloc_fraction);
        v.fraction("portfolio.short_alloc_fraction", self.short_alloc_fraction);
        v.non_negative("portfolio.volume_floor", self.volume_floor);

        if let Some(depth) = self.candidate_depth {
            v.positive_count("portfolio.candidate_depth", depth);
        }
        if let Some(size) = self.min_universe_size {
            v.positive_count("portfolio.min_universe_size", size);
        }
        v.merge(self.rebalance.validate());

        v.finish()
    }
}

/// Signal levels at which an existing position stops qualifying.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RebalanceConfig {
    /// Longs are flagged once their signal falls below this
    #[serde(default = "default_long_exit")]
    pub long_exit_signal: f64,

    /// Shorts are flagged once their signal rises above this
    #[serde(default = "default_short_exit")]
    pub short_exit_signal: f64,
}

impl Default for RebalanceConfig {
    fn default() -> Self {
        Self {
            long_exit_signal: default_long_exit(),
            short_exit_signal: default_short_exit(),
        }
    }
}

fn default_long_exit() -> f64 {
    0.03
}

fn default_short_exit() -> f64 {
    -0.03
}

impl Validate for RebalanceConfig {
    fn validate(&self) -> ValidationResult<()> {
        let mut v = Violations::new();
        v.finite("portfolio.rebalance.long_exit_signal", self.long_exit_signal);
        v.finite("portfolio.rebalance.short_exit_signal", self.short_exit_signal);
        v.finish()
    }
}

// ============================================================================
// Pair Configuration
// ============================================================================

/// Pair-trade enumeration parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairConfig {
    /// Long side needs signal > threshold, short side signal < -threshold
    #[serde(default = "default_pair_signal_threshold")]
    pub signal_threshold: f64,

    /// Minimum long-minus-short signal spread
    #[serde(default = "default_pair_min_spread")]
    pub min_spread: f64,

    /// Minimum share volume on both sides
    #[serde(default = "default_pair_liquidity_floor")]
    pub liquidity_floor: f64,

    /// Best longs and worst shorts considered per industry
    #[serde(default = "default_pair_top_k")]
    pub top_k: usize,

    /// Industries never paired
    #[serde(default = "default_excluded_industries")]
    pub excluded_industries: Vec<String>,

    /// Fan industries out across the rayon pool
    #[serde(default = "default_true")]
    pub parallel: bool,
}

impl Default for PairConfig {
    fn default() -> Self {
        Self {
            signal_threshold: default_pair_signal_threshold(),
            min_spread: default_pair_min_spread(),
            liquidity_floor: default_pair_liquidity_floor(),
            top_k: default_pair_top_k(),
            excluded_industries: default_excluded_industries(),
            parallel: true,
        }
    }
}

fn default_pair_signal_threshold() -> f64 {
    0.02
}

fn default_pair_min_spread() -> f64 {
    0.05
}

fn default_pair_liquidity_floor() -> f64 {
    100_000.0
}

fn default_pair_top_k() -> usize {
    3
}

fn default_excluded_industries() -> Vec<String> {
    vec!["Unknown".to_string(), "ETF".to_string()]
}

impl Validate for PairConfig {
    fn validate(&self) -> ValidationResult<()> {
        let mut v = Violations::new();
        v.non_negative("pairs.signal_threshold", self.signal_threshold);
        v.non_negative("pairs.min_spread", self.min_spread);
        v.non_negative("pairs.liquidity_floor", self.liquidity_floor);
        v.positive_count("pairs.top_k", self.top_k);
        v.finish()
    }
}

// ============================================================================
// Analytics Configuration
// ============================================================================

/// Sector leaderboard and dispersion table parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Names shown at each end of a sector leaderboard
    #[serde(default = "default_leaderboard_size")]
    pub leaderboard_size: usize,

    /// Sectors smaller than this get no leaderboard or momentum row
    #[serde(default = "default_min_sector_size")]
    pub min_sector_size: usize,

    /// Industries smaller than this get no dispersion row
    #[serde(default = "default_min_industry_size")]
    pub min_industry_size: usize,

    /// Placeholder sectors skipped in leaderboards
    #[serde(default = "default_excluded_sectors")]
    pub excluded_sectors: Vec<String>,

    /// Leaderboards considered, in first-seen sector order, before the
    /// size check
    #[serde(default = "default_max_sectors")]
    pub max_sectors: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            leaderboard_size: default_leaderboard_size(),
            min_sector_size: default_min_sector_size(),
            min_industry_size: default_min_industry_size(),
            excluded_sectors: default_excluded_sectors(),
            max_sectors: default_max_sectors(),
        }
    }
}

fn default_leaderboard_size() -> usize {
    5
}

fn default_min_sector_size() -> usize {
    5
}

fn default_min_industry_size() -> usize {
    3
}

fn default_excluded_sectors() -> Vec<String> {
    vec!["Unknown".to_string(), "-".to_string()]
}

fn default_max_sectors() -> usize {
    6
}

impl Validate for AnalyticsConfig {
    fn validate(&self) -> ValidationResult<()> {
        let mut v = Violations::new();
        v.positive_count("analytics.leaderboard_size", self.leaderboard_size);
        v.positive_count("analytics.min_sector_size", self.min_sector_size);
        v.positive_count("analytics.min_industry_size", self.min_industry_size);
        v.positive_count("analytics.max_sectors", self.max_sectors);
        v.finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
