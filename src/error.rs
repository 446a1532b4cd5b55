use std::{collections::BTreeMap, fmt, sync::Arc};

use thiserror::Error;

use crate::types::{AcdpId, SectorId, SeedId};

/// Errors and diagnostics raised by the aggregation pipeline.
///
/// Most variants are per-record: they are collected into a [`Report`] and never
/// abort the district they occur in. `InvalidConfig`, `InvariantViolation` and
/// `Cancelled` are fatal and returned from the pipeline entry point.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AcdpsError {
    #[error("invalid geometry for {sec_id} ({cd_setor}): {reason}")]
    InvalidGeometry {
        sec_id: SectorId,
        cd_setor: Arc<str>,
        reason: String,
    },

    #[error("{seed_id} has no sector in district {cd_dist}")]
    SeedOutsideDistrict { seed_id: SeedId, cd_dist: Arc<str> },

    #[error("{record} references unknown district {cd_dist}")]
    UnknownDistrict { record: String, cd_dist: Arc<str> },

    #[error("hole repair for {acdp_id} stopped after {iterations} passes with {holes} hole(s) left")]
    HoleRepairIncomplete {
        acdp_id: AcdpId,
        holes: usize,
        iterations: usize,
    },

    #[error("{acdp_id} has {households} households but is the only unit in its district")]
    NoNeighborForMerge { acdp_id: AcdpId, households: u64 },

    #[error("merging {source_id} into {target_id} produced {components} disconnected parts")]
    DisjointMerge {
        source_id: AcdpId,
        target_id: AcdpId,
        components: usize,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    #[error("run cancelled")]
    Cancelled,
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, AcdpsError>;

impl AcdpsError {
    /// Short stable name of the error kind, used for report summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidGeometry { .. } => "InvalidGeometry",
            Self::SeedOutsideDistrict { .. } => "SeedOutsideDistrict",
            Self::UnknownDistrict { .. } => "UnknownDistrict",
            Self::HoleRepairIncomplete { .. } => "HoleRepairIncomplete",
            Self::NoNeighborForMerge { .. } => "NoNeighborForMerge",
            Self::DisjointMerge { .. } => "DisjointMerge",
            Self::InvalidConfig(_) => "InvalidConfig",
            Self::InvariantViolation(_) => "InvariantViolation",
            Self::Cancelled => "Cancelled",
        }
    }

    /// Severity this error carries when recorded as a diagnostic.
    pub fn severity(&self) -> Severity {
        match self {
            Self::NoNeighborForMerge { .. } => Severity::Info,
            Self::HoleRepairIncomplete { .. } | Self::DisjointMerge { .. } => Severity::Warning,
            _ => Severity::Skipped,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Accepted as final, reported for information.
    Info,
    /// Output produced, but it does not meet every invariant.
    Warning,
    /// The record was dropped from processing.
    Skipped,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Skipped => write!(f, "skipped"),
        }
    }
}

/// A per-record failure, scoped to the district it occurred in.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub cd_dist: Option<Arc<str>>,
    pub severity: Severity,
    pub error: AcdpsError,
}

impl Diagnostic {
    pub fn new(cd_dist: Option<Arc<str>>, error: AcdpsError) -> Self {
        Self { cd_dist, severity: error.severity(), error }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.cd_dist {
            Some(cd_dist) => write!(f, "[{}] district {}: {}", self.severity, cd_dist, self.error),
            None => write!(f, "[{}] {}", self.severity, self.error),
        }
    }
}

/// All diagnostics of a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Report {
    pub diagnostics: Vec<Diagnostic>,
}

impl Report {
    #[inline] pub fn push(&mut self, diagnostic: Diagnostic) { self.diagnostics.push(diagnostic) }

    #[inline] pub fn extend(&mut self, other: Report) { self.diagnostics.extend(other.diagnostics) }

    #[inline] pub fn is_empty(&self) -> bool { self.diagnostics.is_empty() }

    /// Count diagnostics by error kind.
    pub fn summary(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for diagnostic in &self.diagnostics {
            *counts.entry(diagnostic.error.kind()).or_insert(0) += 1;
        }
        counts
    }

    /// Diagnostics of a given kind.
    pub fn of_kind<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a Diagnostic> + 'a {
        self.diagnostics.iter().filter(move |d| d.error.kind() == kind)
    }
}
