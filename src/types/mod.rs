mod ids;
mod records;

pub use ids::{AcdpId, SectorId, SeedId};
pub use records::{Dataset, District, Sector, Seed};
