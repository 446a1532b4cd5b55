use std::sync::Arc;

use geo::{MultiPolygon, Point};

use crate::types::{SectorId, SeedId};

/// An administrative district: the scope of every other record.
#[derive(Debug, Clone)]
pub struct District {
    pub cd_dist: Arc<str>,
    pub boundary: MultiPolygon<f64>,
}

/// An atomic census polygon with household and registered-people counts.
#[derive(Debug, Clone)]
pub struct Sector {
    pub sec_id: SectorId,
    pub cd_setor: Arc<str>,   // Original sector code
    pub cd_dist: Arc<str>,
    pub geometry: MultiPolygon<f64>,
    pub num_dom: u64,         // Households
    pub num_cad: u64,         // Registered people
}

/// A point of social-attention interest, anchor of at most one unit.
#[derive(Debug, Clone)]
pub struct Seed {
    pub seed_id: SeedId,
    pub location: Point<f64>,
    pub cd_setor: Option<Arc<str>>, // Sector containing the seed, resolved by location when absent
    pub cd_dist: Option<Arc<str>>,  // Resolved by district boundary when absent
    pub order: Option<i64>,         // Processing order (`ordem`)
}

/// The three input collections, sharing one planar projected coordinate system.
///
/// Sectors form the arena every district and unit refers into: `sectors[i].sec_id == SectorId(i)`.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub districts: Vec<District>,
    pub sectors: Vec<Sector>,
    pub seeds: Vec<Seed>,
}

impl Dataset {
    /// Build a dataset, assigning `sec_id`s in the given order.
    pub fn new(districts: Vec<District>, sectors: Vec<Sector>, seeds: Vec<Seed>) -> Self {
        let sectors = sectors.into_iter().enumerate()
            .map(|(i, sector)| Sector { sec_id: SectorId(i as u32), ..sector })
            .collect();

        Self { districts, sectors, seeds }
    }

    /// Get a sector by id.
    #[inline] pub fn sector(&self, id: SectorId) -> &Sector { &self.sectors[id.0 as usize] }
}
