mod assemble;
mod records;

pub(crate) use assemble::assemble;
pub use assemble::DistrictOutput;
pub use records::{AcdpsRecord, OrphanRecord, SectorRecord, SeedBufferRecord, DBF_TEXT_WIDTH};
pub(crate) use records::truncate_chars;
