//! Pair-trade generation.
//!
//! Runs on the screened, bucketed universe and never looks at the portfolio.

mod generator;

pub use generator::{IndustryOpportunity, PairCandidate, PairTradeGenerator, PairTrades};
