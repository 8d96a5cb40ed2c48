//! Report generation for pipeline results.
//!
//! Generates reports in two formats:
//! - Markdown (human-readable)
//! - JSON (machine-readable, the full pipeline output)
//!
//! Formatting only; every number shown was computed by the pipeline.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::pipeline::PipelineOutput;
use crate::portfolio::{PortfolioOutcome, Position};

/// Rows shown in the markdown pair table.
const MAX_PAIR_ROWS: usize = 25;

/// Rows shown in the markdown dispersion table.
const MAX_DISPERSION_ROWS: usize = 10;

// ============================================================================
// Report Format
// ============================================================================

/// Supported report formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFormat {
    /// Markdown format (human-readable)
    #[default]
    Markdown,
    /// JSON format (machine-readable)
    Json,
}

impl std::fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Markdown => write!(f, "markdown"),
            Self::Json => write!(f, "json"),
        }
    }
}

impl std::str::FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "markdown" | "md" => Ok(Self::Markdown),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown report format: {}", s)),
        }
    }
}

impl ReportFormat {
    fn extension(self) -> &'static str {
        match self {
            Self::Markdown => "md",
            Self::Json => "json",
        }
    }
}

// ============================================================================
// Report
// ============================================================================

/// Report generator for pipeline results.
pub struct Report {
    output: PipelineOutput,
}

impl Report {
    pub fn new(output: PipelineOutput) -> Self {
        Self { output }
    }

    /// Generate report in the specified format.
    pub fn generate(&self, format: ReportFormat) -> String {
        match format {
            ReportFormat::Markdown => self.to_markdown(),
            ReportFormat::Json => self.to_json(),
        }
    }

    /// Save report to file, adding the format's extension if none is given.
    pub fn save_to_file(&self, path: &Path, format: ReportFormat) -> Result<PathBuf> {
        let content = self.generate(format);

        let file_path = if path.extension().is_none() {
            path.with_extension(format.extension())
        } else {
            path.to_path_buf()
        };

        if let Some(parent) = file_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).context("Failed to create report directory")?;
            }
        }

        std::fs::write(&file_path, content)
            .with_context(|| format!("Failed to write report file {}", file_path.display()))?;

        Ok(file_path)
    }

    /// Generate markdown report.
    pub fn to_markdown(&self) -> String {
        let out = &self.output;
        let mut md = String::new();

        md.push_str("# Portfolio & Pair-Trade Report\n\n");

        // Summary
        md.push_str("## Summary\n\n");
        md.push_str(&format!("- **Scanned**: {} securities\n", out.total_scanned));
        md.push_str(&format!("- **Screened**: {} securities\n", out.stats.count));
        md.push_str(&format!(
            "- **Positive signal**: {} ({:.1}%)\n",
            out.stats.positive_count, out.stats.positive_pct
        ));
        if let (Some(mean), Some(max), Some(min)) =
            (out.stats.mean_signal, out.stats.max_signal, out.stats.min_signal)
        {
            md.push_str(&format!(
                "- **Signal**: mean {:.4}, max {:.4}, min {:.4}\n",
                mean, max, min
            ));
        }
        if let Some(t) = &out.thresholds {
            md.push_str(&format!(
                "- **Cap bucket cut points**: p25 ${:.0}, p75 ${:.0}\n",
                t.p25, t.p75
            ));
        }
        md.push_str(&format!("- **Pairs**: {}\n", out.pair_stats.pair_count));
        if let (Some(max), Some(min)) = (out.pair_stats.max_spread, out.pair_stats.min_spread) {
            md.push_str(&format!("- **Spread**: max {:.4}, min {:.4}\n", max, min));
        }
        md.push_str(&format!(
            "- **Cap-matched pairs**: {}\n\n",
            out.pair_stats.cap_match_count
        ));

        // Funnel
        if !out.funnel.is_empty() {
            md.push_str("### Screen Funnel\n\n");
            md.push_str("| Stage | Passed | Eliminated | Rate |\n");
            md.push_str("|-------|--------|------------|------|\n");
            for fr in &out.funnel {
                md.push_str(&format!(
                    "| {} | {} | {} | {:.1}% |\n",
                    fr.stage, fr.passed, fr.eliminated, fr.elimination_rate
                ));
            }
            md.push('\n');
        }

        // Portfolio
        md.push_str("## Portfolio\n\n");
        match &out.portfolio {
            PortfolioOutcome::Insufficient(insufficient) => {
                md.push_str(&format!("> **Warning**: {}\n\n", insufficient));
            }
            PortfolioOutcome::Built(portfolio) => {
                md.push_str(&format!("### Long Leg ({})\n\n", portfolio.longs.len()));
                push_position_table(&mut md, &portfolio.longs);
                md.push_str(&format!("### Short Leg ({})\n\n", portfolio.shorts.len()));
                push_position_table(&mut md, &portfolio.shorts);

                if let Some(balance) = &out.balance {
                    md.push_str(&format!(
                        "- **Gross exposure**: ${:.0}\n- **Net exposure**: ${:.0}\n\n",
                        balance.gross_exposure, balance.net_exposure
                    ));
                }
            }
        }

        if !out.rebalance.is_empty() {
            md.push_str("### Rebalance Flags\n\n");
            md.push_str("| Ticker | Leg | Reason |\n");
            md.push_str("|--------|-----|--------|\n");
            for flag in &out.rebalance {
                md.push_str(&format!("| {} | {} | {} |\n", flag.ticker, flag.leg, flag.reason));
            }
            md.push('\n');
        }

        // Pairs
        md.push_str("## Pair Trades\n\n");
        if out.pairs.is_empty() {
            md.push_str("No qualifying pairs.\n\n");
        } else {
            md.push_str("| Industry | Long | Short | Spread | Min Volume | Cap Match |\n");
            md.push_str("|----------|------|-------|--------|------------|-----------|\n");
            for pair in out.pairs.iter().take(MAX_PAIR_ROWS) {
                md.push_str(&format!(
                    "| {} | {} ({:.4}) | {} ({:.4}) | {:.4} | {:.0} | {} |\n",
                    pair.industry,
                    pair.long.ticker,
                    pair.long.signal,
                    pair.short.ticker,
                    pair.short.signal,
                    pair.spread,
                    pair.min_volume,
                    if pair.cap_match { "yes" } else { "no" }
                ));
            }
            if out.pairs.len() > MAX_PAIR_ROWS {
                md.push_str(&format!("\n_...and {} more pairs_\n", out.pairs.len() - MAX_PAIR_ROWS));
            }
            md.push('\n');

            md.push_str("### Industry Opportunities\n\n");
            md.push_str("| Industry | Longs | Shorts | Stocks | Signal Range |\n");
            md.push_str("|----------|-------|--------|--------|--------------|\n");
            for row in &out.industry_summary {
                md.push_str(&format!(
                    "| {} | {} | {} | {} | {:.4} |\n",
                    row.industry, row.long_count, row.short_count, row.total_stocks, row.signal_range
                ));
            }
            md.push('\n');
        }

        // Rankings
        let analytics = &out.analytics;
        if !analytics.momentum.is_empty() {
            md.push_str("## Sector Momentum\n\n");
            md.push_str("| Sector | Count | Mean Signal |\n");
            md.push_str("|--------|-------|-------------|\n");
            for row in &analytics.momentum {
                md.push_str(&format!("| {} | {} | {:.4} |\n", row.sector, row.count, row.mean_signal));
            }
            md.push('\n');
        }
        if !analytics.dispersion.is_empty() {
            md.push_str("## Industry Dispersion\n\n");
            md.push_str("| Industry | Count | Mean | Std | Range |\n");
            md.push_str("|----------|-------|------|-----|-------|\n");
            for row in analytics.dispersion.iter().take(MAX_DISPERSION_ROWS) {
                md.push_str(&format!(
                    "| {} | {} | {:.4} | {:.4} | {:.4} |\n",
                    row.industry, row.count, row.mean, row.std_dev, row.range
                ));
            }
            md.push('\n');
        }

        md
    }

    /// Generate JSON report.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(&self.output).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn output(&self) -> &PipelineOutput {
        &self.output
    }
}

fn push_position_table(md: &mut String, positions: &[Position]) {
    if positions.is_empty() {
        md.push_str("_No positions._\n\n");
        return;
    }

    md.push_str("| Ticker | Name | Sector | Industry | Signal | Cap | Size |\n");
    md.push_str("|--------|------|--------|----------|--------|-----|------|\n");
    for p in positions {
        let s = &p.security;
        md.push_str(&format!(
            "| {} | {} | {} | {} | {:.4} | {} | ${:.0} |\n",
            s.ticker, s.name, s.sector, s.industry, s.signal, s.cap_bucket, p.size
        ));
    }
    md.push('\n');
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::pipeline::run_pipeline;
    use crate::security::Security;

    fn sec(ticker: &str, sector: &str, industry: &str, signal: f64, volume: f64) -> Security {
        Security {
            ticker: ticker.to_string(),
            name: format!("{} Corp", ticker),
            sector: sector.to_string(),
            industry: industry.to_string(),
            signal,
            price: 10.0,
            volume,
        }
    }

    fn create_small_output() -> PipelineOutput {
        let universe = vec![
            sec("AAA", "Technology", "Software", 0.08, 5_000_000.0),
            sec("BBB", "Technology", "Software", -0.09, 500_000.0),
        ];
        run_pipeline(&universe, &EngineConfig::default()).unwrap()
    }

    fn create_built_output() -> PipelineOutput {
        let universe: Vec<Security> = (0..8)
            .map(|i| {
                sec(
                    &format!("T{}", i),
                    &format!("Sector{}", i % 4),
                    &format!("Industry{}", i),
                    0.04 - i as f64 * 0.01,
                    20_000_000.0,
                )
            })
            .collect();
        let mut config = EngineConfig::default();
        config.portfolio.long_target = 2;
        config.portfolio.short_target = 2;
        run_pipeline(&universe, &config).unwrap()
    }

    #[test]
    fn test_markdown_insufficient_warning() {
        let md = Report::new(create_small_output()).to_markdown();
        assert!(md.contains("# Portfolio & Pair-Trade Report"));
        assert!(md.contains("**Warning**: Insufficient data"));
        assert!(md.contains("| Software | AAA (0.0800) | BBB (-0.0900) | 0.1700 |"));
    }

    #[test]
    fn test_markdown_built_portfolio() {
        let md = Report::new(create_built_output()).to_markdown();
        assert!(md.contains("### Long Leg (2)"));
        assert!(md.contains("### Short Leg (2)"));
        assert!(md.contains("| T0 | T0 Corp |"));
        assert!(md.contains("$2500000"));
        assert!(md.contains("**Gross exposure**: $10000000"));
    }

    #[test]
    fn test_json_generation() {
        let report = Report::new(create_small_output());
        let json = report.generate(ReportFormat::Json);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["portfolio"]["status"], "insufficient");
        assert_eq!(value["pairs"][0]["long"]["ticker"], "AAA");
    }

    #[test]
    fn test_save_to_file_adds_extension() {
        let dir = tempfile::tempdir().unwrap();
        let report = Report::new(create_small_output());

        let path = report
            .save_to_file(&dir.path().join("reports/today"), ReportFormat::Markdown)
            .unwrap();
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("md"));
        assert!(std::fs::read_to_string(&path).unwrap().contains("Pair Trades"));
    }

    #[test]
    fn test_report_format_parsing() {
        assert_eq!("markdown".parse::<ReportFormat>().unwrap(), ReportFormat::Markdown);
        assert_eq!("md".parse::<ReportFormat>().unwrap(), ReportFormat::Markdown);
        assert_eq!("JSON".parse::<ReportFormat>().unwrap(), ReportFormat::Json);
        assert!("telegram".parse::<ReportFormat>().is_err());
    }
}
