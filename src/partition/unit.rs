use std::collections::BTreeSet;

use geo::Point;

use crate::types::{AcdpId, SeedId};

/// A live aggregation unit: the sectors it claims (local indices) and its running totals.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Unit {
    pub id: AcdpId,
    pub seed_id: SeedId,
    pub seed_location: Point<f64>,
    pub home: usize,             // Local index of the seed's own sector
    pub sectors: BTreeSet<usize>,
    pub households: u64,
    pub holes_left: usize,       // Holes the last repair pass could not fill
}

impl Unit {
    pub(crate) fn new(id: AcdpId, seed_id: SeedId, seed_location: Point<f64>, home: usize) -> Self {
        Self {
            id,
            seed_id,
            seed_location,
            home,
            sectors: BTreeSet::new(),
            households: 0,
            holes_left: 0,
        }
    }

    #[inline] pub(crate) fn len(&self) -> usize { self.sectors.len() }
}
