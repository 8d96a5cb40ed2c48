//! Signal ranking and candidate pools.

use tracing::debug;

use crate::security::BucketedSecurity;

/// Orders a universe by signal, best first.
///
/// Ties keep their input order so the same input always ranks the same way.
#[derive(Debug, Clone)]
pub struct SignalRanker<'a> {
    ranked: Vec<&'a BucketedSecurity>,
}

impl<'a> SignalRanker<'a> {
    pub fn new(universe: &'a [BucketedSecurity]) -> Self {
        let mut ranked: Vec<&BucketedSecurity> = universe.iter().collect();
        // sort_by is stable
        ranked.sort_by(|a, b| b.signal.total_cmp(&a.signal));
        debug!(count = ranked.len(), "Universe ranked by signal");
        Self { ranked }
    }

    pub fn ranked(&self) -> &[&'a BucketedSecurity] {
        &self.ranked
    }

    pub fn len(&self) -> usize {
        self.ranked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }

    /// Highest signals first; `None` takes the whole ranking.
    pub fn long_pool(&self, depth: Option<usize>) -> Vec<&'a BucketedSecurity> {
        let depth = depth.unwrap_or(self.ranked.len()).min(self.ranked.len());
        self.ranked[..depth].to_vec()
    }

    /// Lowest signals first, read from the tail of the ranking.
    pub fn short_pool(&self, depth: Option<usize>) -> Vec<&'a BucketedSecurity> {
        let depth = depth.unwrap_or(self.ranked.len()).min(self.ranked.len());
        self.ranked[self.ranked.len() - depth..]
            .iter()
            .rev()
            .copied()
            .collect()
    }
}
