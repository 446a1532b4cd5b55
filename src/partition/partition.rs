use std::collections::BTreeMap;

use geo::Point;

use crate::partition::Unit;
use crate::types::{AcdpId, SeedId};

/// Assignment of a district's sectors to aggregation units.
///
/// `assignments[i]` is the single `acdp_id` slot of local sector `i` (`0` = unset).
/// Units refer to sectors by local index only, so merging or destroying a unit
/// never leaves a dangling reference.
#[derive(Debug, Clone)]
pub(crate) struct Partition {
    assignments: Vec<u32>,
    households: Vec<u64>,               // Per-sector weights, copied from the district
    units: BTreeMap<AcdpId, Unit>,
    unassigned: usize,                  // Number of `0` slots in `assignments`
    next_id: u32,
}

impl Partition {
    /// Construct an empty partition over sectors with the given household counts.
    pub(crate) fn new(households: Vec<u64>) -> Self {
        Self {
            assignments: vec![AcdpId::UNSET.0; households.len()],
            unassigned: households.len(),
            households,
            units: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Get the number of sectors.
    #[inline] pub(crate) fn num_sectors(&self) -> usize { self.assignments.len() }

    /// Get the number of live units.
    #[inline] pub(crate) fn num_units(&self) -> usize { self.units.len() }

    /// Get the unit a sector is assigned to, if any.
    #[inline]
    pub(crate) fn assignment(&self, sector: usize) -> Option<AcdpId> {
        match self.assignments[sector] {
            0 => None,
            id => Some(AcdpId(id)),
        }
    }

    /// Check if a sector is not assigned to any unit.
    #[inline] pub(crate) fn is_unassigned(&self, sector: usize) -> bool { self.assignments[sector] == 0 }

    /// Get the number of sectors not assigned to any unit.
    #[inline] pub(crate) fn num_unassigned(&self) -> usize { self.unassigned }

    /// Get a unit by id.
    #[inline] pub(crate) fn unit(&self, id: AcdpId) -> Option<&Unit> { self.units.get(&id) }

    /// Iterator over live units in ascending id.
    #[inline] pub(crate) fn units(&self) -> impl Iterator<Item = &Unit> + '_ { self.units.values() }

    /// Ids of live units, ascending.
    #[inline] pub(crate) fn unit_ids(&self) -> Vec<AcdpId> { self.units.keys().copied().collect() }

    /// Open a new, empty unit for a seed and return its id. Ids increase from 1.
    pub(crate) fn open_unit(&mut self, seed_id: SeedId, seed_location: Point<f64>, home: usize) -> AcdpId {
        let id = AcdpId(self.next_id);
        self.next_id += 1;
        self.units.insert(id, Unit::new(id, seed_id, seed_location, home));
        id
    }

    /// Assign an unassigned sector to `unit`.
    pub(crate) fn claim(&mut self, unit: AcdpId, sector: usize) {
        assert!(self.is_unassigned(sector), "sector {sector} is already assigned to {:?}", self.assignment(sector));
        let weight = self.households[sector];
        let entry = self.units.get_mut(&unit).expect("claim on a unit that does not exist");

        entry.sectors.insert(sector);
        entry.households += weight;
        self.assignments[sector] = unit.0;
        self.unassigned -= 1;
    }

    /// Return a sector to the unassigned pool.
    pub(crate) fn release(&mut self, sector: usize) {
        let Some(unit) = self.assignment(sector) else { return };
        let weight = self.households[sector];
        if let Some(entry) = self.units.get_mut(&unit) {
            entry.sectors.remove(&sector);
            entry.households -= weight;
        }
        self.assignments[sector] = AcdpId::UNSET.0;
        self.unassigned += 1;
    }

    /// Record how many holes a unit's last repair pass left open.
    pub(crate) fn set_holes_left(&mut self, unit: AcdpId, holes: usize) {
        if let Some(entry) = self.units.get_mut(&unit) {
            entry.holes_left = holes;
        }
    }

    /// Transfer every sector of `source` to `target` and destroy `source`.
    /// Returns the number of sectors moved.
    pub(crate) fn merge_units(&mut self, target: AcdpId, source: AcdpId) -> usize {
        assert!(target != source, "cannot merge a unit into itself");
        assert!(self.units.contains_key(&target), "merge target {target} does not exist");
        let Some(absorbed) = self.units.remove(&source) else { return 0 };

        for &sector in &absorbed.sectors {
            self.assignments[sector] = target.0;
        }

        let entry = self.units.get_mut(&target).expect("target checked above");
        entry.households += absorbed.households;
        entry.sectors.extend(absorbed.sectors.iter().copied());
        absorbed.sectors.len()
    }
}
