#![doc = "ACDPS: seed-driven aggregation of census sectors into contiguous units"]
mod assemble;
mod config;
mod district;
mod error;
mod geom;
mod graph;
mod grow;
mod io;
mod merge;
mod partition;
mod pipeline;
mod repair;
mod types;

#[doc(inline)]
pub use types::{AcdpId, Dataset, District, Sector, SectorId, Seed, SeedId};

#[doc(inline)]
pub use config::{AdjacencyRule, Config, FieldNames, InputFiles, OutputFiles, OutputFormat};

#[doc(inline)]
pub use error::{AcdpsError, Diagnostic, Report, Result, Severity};

#[doc(inline)]
pub use geom::{GeoEngine, GeometryEngine};

#[doc(inline)]
pub use assemble::{AcdpsRecord, DistrictOutput, OrphanRecord, SectorRecord, SeedBufferRecord, DBF_TEXT_WIDTH};

#[doc(inline)]
pub use pipeline::{run, CancelToken, Output, Pipeline};

#[doc(inline)]
pub use io::{load_dataset, read_districts, read_sectors, read_seeds, write_output};
