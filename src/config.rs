use std::{fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::AcdpsError;

/// Output driver for the four result collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Shapefile,
    GeoJson,
}

impl OutputFormat {
    /// File extension used by this format.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Shapefile => "shp",
            Self::GeoJson => "geojson",
        }
    }
}

/// Predicate used to decide whether two sectors are neighbors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjacencyRule {
    /// Boundaries share a segment or at least one point.
    #[default]
    Queen,
    /// Boundaries share a segment of positive length.
    Rook,
}

/// Names of the input files, relative to the input directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputFiles {
    pub seeds: String,
    pub sectors: String,
    pub districts: String,
}

impl Default for InputFiles {
    fn default() -> Self {
        Self {
            seeds: "Sementes_pts.shp".to_string(),
            sectors: "SetoresCensitarios.shp".to_string(),
            districts: "Distritos.shp".to_string(),
        }
    }
}

/// Stem names of the output files; the extension follows `output_format`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputFiles {
    pub acdps: String,
    pub sectors: String,
    pub seeds: String,
    pub orphans: String,
}

impl Default for OutputFiles {
    fn default() -> Self {
        Self {
            acdps: "acdps".to_string(),
            sectors: "sectors_by_seed".to_string(),
            seeds: "buffer_around_seeds".to_string(),
            orphans: "orphan_sectors".to_string(),
        }
    }
}

/// Attribute names read from the input collections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldNames {
    pub district_id: String,
    pub sector_code: String,
    pub households: String,
    pub registered: String,
    pub seed_id: String,
    pub seed_order: String,
}

impl Default for FieldNames {
    fn default() -> Self {
        Self {
            district_id: "cd_dist".to_string(),
            sector_code: "cd_setor".to_string(),
            households: "num_dom".to_string(),
            registered: "num_cad".to_string(),
            seed_id: "seed_id".to_string(),
            seed_order: "ordem".to_string(),
        }
    }
}

/// Parameters of an aggregation run. Passed explicitly to the pipeline, never read from ambient state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Units with fewer households are merged into the unit with the nearest seed.
    pub lower_limit: u64,
    /// Radius increment of the seed buffer, in projection units.
    pub buffer_step: f64,
    /// Tolerance over `limit_to_stop`, in percent.
    pub percent_range: f64,
    /// Reference household count at which a seed stops growing.
    pub limit_to_stop: u64,
    pub output_format: OutputFormat,
    pub adjacency_rule: AdjacencyRule,
    /// Distance under which two boundaries count as touching, in projection units.
    pub adjacency_tolerance: f64,
    /// Number of vertices approximating each buffer circle.
    pub buffer_segments: usize,
    pub input: InputFiles,
    pub output: OutputFiles,
    pub fields: FieldNames,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lower_limit: 1000,
            buffer_step: 5.0,
            percent_range: 10.0,
            limit_to_stop: 5000,
            output_format: OutputFormat::default(),
            adjacency_rule: AdjacencyRule::default(),
            adjacency_tolerance: 0.0,
            buffer_segments: 64,
            input: InputFiles::default(),
            output: OutputFiles::default(),
            fields: FieldNames::default(),
        }
    }
}

impl Config {
    /// Read a configuration from a JSON file. Missing keys take their default value.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Upper household budget: `limit_to_stop * (1 + percent_range / 100)`.
    #[inline]
    pub fn upper_limit(&self) -> f64 {
        self.limit_to_stop as f64 * (1.0 + self.percent_range / 100.0)
    }

    /// Reject parameter combinations the algorithm cannot run with.
    pub fn validate(&self) -> Result<(), AcdpsError> {
        let invalid = |msg: String| Err(AcdpsError::InvalidConfig(msg));

        if !(self.buffer_step.is_finite() && self.buffer_step > 0.0) {
            return invalid(format!("buffer_step must be positive, got {}", self.buffer_step));
        }
        if !(self.percent_range.is_finite() && self.percent_range >= 0.0) {
            return invalid(format!("percent_range must be non-negative, got {}", self.percent_range));
        }
        if !(self.adjacency_tolerance.is_finite() && self.adjacency_tolerance >= 0.0) {
            return invalid(format!("adjacency_tolerance must be non-negative, got {}", self.adjacency_tolerance));
        }
        if self.buffer_segments < 8 {
            return invalid(format!("buffer_segments must be at least 8, got {}", self.buffer_segments));
        }
        Ok(())
    }
}
