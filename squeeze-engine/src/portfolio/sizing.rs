//! Equal-dollar position sizing.

use crate::security::BucketedSecurity;

use super::types::{Leg, Position};

/// Splits a leg's allocation evenly across its selections.
#[derive(Debug, Clone, Copy)]
pub struct PositionSizer {
    notional: f64,
}

impl PositionSizer {
    pub fn new(notional: f64) -> Self {
        Self { notional }
    }

    /// Size every selection at `fraction * notional / count`.
    ///
    /// An empty selection yields an empty leg.
    pub fn size_leg(&self, selected: &[&BucketedSecurity], leg: Leg, fraction: f64) -> Vec<Position> {
        if selected.is_empty() {
            return Vec::new();
        }

        let size = fraction * self.notional / selected.len() as f64;
        selected
            .iter()
            .map(|&security| Position {
                security: security.clone(),
                leg,
                size,
            })
            .collect()
    }
}
