//! Long/short portfolio construction.
//!
//! - `builder`: eligibility, ranking and cap-constrained greedy selection
//! - `sizing`: equal-dollar sizing within a leg
//! - `balance`: leg composition and rebalance flags
//! - `types`: positions, portfolio and outcome

mod balance;
mod builder;
mod sizing;
mod types;

pub use balance::{GroupCount, LegBalance, LegSummary, RebalanceCheck, RebalanceFlag, RebalanceReason};
pub use builder::{portfolio_universe, ConstrainedPortfolioBuilder};
pub use sizing::PositionSizer;
pub use types::{InsufficientUniverse, Leg, Portfolio, PortfolioOutcome, Position};
