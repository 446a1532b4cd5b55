mod buffer;
mod engine;
mod envelope;
mod index;
mod validate;

pub(crate) use envelope::envelope_of;
pub use engine::{GeoEngine, GeometryEngine};
pub(crate) use index::SpatialIndex;
pub(crate) use validate::check_polygon;
