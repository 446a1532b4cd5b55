use std::sync::Arc;

use geo::{MultiPolygon, Polygon};

use crate::types::{AcdpId, SectorId, SeedId};

/// Width of a DBF character field.
pub const DBF_TEXT_WIDTH: usize = 255;

/// A finalized aggregation unit.
#[derive(Debug, Clone, PartialEq)]
pub struct AcdpsRecord {
    pub acdp_id: AcdpId,            // Sequential per district, from 1
    pub seed_id: SeedId,
    pub n_sectors: usize,
    pub cd_sectors: Vec<Arc<str>>,  // Ascending `sec_id`
    pub cd_dist: Arc<str>,
    pub area_m2: f64,
    pub num_dom: u64,
    pub geometry: MultiPolygon<f64>,
    pub flagged: bool,              // Emitted with holes left by repair
}

impl AcdpsRecord {
    /// Sector codes joined with commas.
    pub fn cd_sectors_joined(&self) -> String {
        self.cd_sectors.join(",")
    }

    /// Sector codes as stored in a fixed-width text field: joined, then cut to
    /// [`DBF_TEXT_WIDTH`] characters.
    pub fn cd_sectors_field(&self) -> String {
        truncate_chars(&self.cd_sectors_joined(), DBF_TEXT_WIDTH).to_string()
    }
}

/// A sector with the unit it ended up in.
#[derive(Debug, Clone, PartialEq)]
pub struct SectorRecord {
    pub sec_id: SectorId,
    pub cd_dist: Arc<str>,
    pub cd_setor: Arc<str>,
    pub num_cad: u64,
    pub num_dom: u64,
    pub seed_id: SeedId,
    pub acdp_id: AcdpId,
    pub geometry: MultiPolygon<f64>,
}

/// The buffer a seed stopped growing at.
#[derive(Debug, Clone, PartialEq)]
pub struct SeedBufferRecord {
    pub seed_id: SeedId,
    pub cd_dist: Arc<str>,
    pub buffer_val: f64,            // Radius
    pub num_dom: u64,               // Households accepted by the seed
    pub geometry: Polygon<f64>,
}

/// A sector no unit claimed.
#[derive(Debug, Clone, PartialEq)]
pub struct OrphanRecord {
    pub sec_id: SectorId,
    pub cd_dist: Arc<str>,
    pub cd_setor: Arc<str>,
    pub num_cad: u64,
    pub num_dom: u64,
    pub geometry: MultiPolygon<f64>,
}

/// Cut `s` to at most `max` characters without splitting one.
pub(crate) fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((end, _)) => &s[..end],
        None => s,
    }
}
