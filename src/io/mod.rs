mod esri;
mod feature;
mod fs;
mod geojson;
mod load;
mod polygon;
mod table;
mod write;

pub(crate) use feature::{Attr, Feature, Geometry, Properties};

pub(crate) use fs::{ensure_dir_exists, require_dir_exists};
pub use load::{load_dataset, read_districts, read_sectors, read_seeds};
pub use write::write_output;
