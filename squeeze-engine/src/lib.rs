//! Squeeze Engine
//!
//! Screens a scored security universe, builds a diversification-capped
//! long/short portfolio from it and enumerates within-industry pair trades.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                         squeeze-engine                            │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  loader ──▶ screener ──▶ bucket ──┬──▶ ranker ──▶ portfolio      │
//! │                                   ├──▶ pairs                     │
//! │                                   └──▶ stats / analytics         │
//! │                                                                  │
//! │  pipeline: one validated run     report: markdown / json         │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every stage is a pure function of the universe and the configuration.
//! Nothing is kept between runs.
//!
//! # Usage
//!
//! ```ignore
//! use squeeze_engine::{run_pipeline, EngineConfig, Report, ReportFormat};
//!
//! let output = run_pipeline(&universe, &EngineConfig::default())?;
//! println!("{}", Report::new(output).generate(ReportFormat::Markdown));
//! ```

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod analytics;
pub mod config;
pub mod loader;
pub mod pairs;
pub mod pipeline;
pub mod portfolio;
pub mod ranker;
pub mod report;
pub mod screener;
pub mod security;
pub mod stats;

pub use analytics::RankingAnalytics;
pub use config::{AnalyticsConfig, EngineConfig, PairConfig, PortfolioConfig, ScreenConfig, Variant};
pub use loader::{LoadError, LoadReport, UniverseLoader};
pub use pairs::{IndustryOpportunity, PairCandidate, PairTradeGenerator};
pub use pipeline::{run_pipeline, Pipeline, PipelineOutput};
pub use portfolio::{ConstrainedPortfolioBuilder, Leg, Portfolio, PortfolioOutcome, Position, PositionSizer};
pub use ranker::SignalRanker;
pub use report::{Report, ReportFormat};
pub use screener::{CapBucketizer, EtfMode, ScreenedUniverse, UniverseScreener};
pub use security::{BucketedSecurity, CapBucket, Security};
pub use stats::{PairStats, UniverseStats};
