//! Contiguity and hole repair.
//!
//! A grown unit may be split into pieces that do not touch, and its dissolved
//! outline may enclose sectors nobody claimed. Repair alternates two passes until
//! the unit is one connected piece without holes, or until it cannot improve.

use std::cmp::Reverse;
use std::collections::BTreeSet;

use tracing::{debug, warn};

use crate::district::DistrictContext;
use crate::error::{AcdpsError, Diagnostic, Report};
use crate::geom::GeometryEngine;
use crate::partition::Partition;
use crate::types::AcdpId;

/// How a repair loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RepairOutcome {
    /// Connected and without holes.
    Complete,
    /// Holes remain but no unassigned sector lies inside them.
    Blocked { holes: usize },
    /// The pass count exceeded the number of sectors in the district.
    Bound { holes: usize },
}

impl RepairOutcome {
    #[inline]
    pub(crate) fn holes_left(&self) -> usize {
        match *self {
            Self::Complete => 0,
            Self::Blocked { holes } | Self::Bound { holes } => holes,
        }
    }
}

/// Which passes a repair runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RepairMode {
    /// Contiguity then holes, repeated.
    Full,
    /// Holes only. Merged units keep parts that do not touch.
    HolesOnly,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Repair {
    pub unit: AcdpId,
    pub released: usize,
    pub filled: usize,
    pub iterations: usize,
    pub outcome: RepairOutcome,
}

/// Choose the component to keep: the largest, then the one holding the seed's
/// own sector, then the one with the lowest local index.
fn keep_component(components: &[Vec<usize>], home: usize) -> usize {
    components.iter().enumerate()
        .max_by_key(|(_, c)| (c.len(), c.contains(&home), Reverse(c[0])))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Release every sector outside the kept component. Returns the number released.
fn restore_contiguity(ctx: &DistrictContext, partition: &mut Partition, id: AcdpId) -> usize {
    let Some(unit) = partition.unit(id) else { return 0 };
    let components = ctx.graph.components_of(unit.sectors.iter().copied());
    if components.len() <= 1 { return 0 }

    let keep = keep_component(&components, unit.home);
    let dropped = components.into_iter().enumerate()
        .filter(|&(i, _)| i != keep)
        .flat_map(|(_, c)| c)
        .collect::<Vec<_>>();

    dropped.iter().for_each(|&sector| partition.release(sector));
    dropped.len()
}

/// Unassigned sectors whose interior point lies inside one of the unit's holes,
/// plus the number of holes found.
fn hole_fillers(
    ctx: &DistrictContext,
    partition: &Partition,
    id: AcdpId,
    engine: &dyn GeometryEngine,
) -> (usize, BTreeSet<usize>) {
    let Some(unit) = partition.unit(id) else { return (0, BTreeSet::new()) };
    let shapes = unit.sectors.iter().map(|&i| ctx.shape(i)).collect::<Vec<_>>();
    let rings = engine.interior_rings(&engine.union(&shapes));

    let fillers = rings.iter()
        .flat_map(move |ring| {
            ctx.index.query(ring).into_iter()
                .filter(move |&i| partition.is_unassigned(i))
                .filter(move |&i| ctx.interior[i].is_some_and(|p| engine.contains(ring, p)))
        })
        .collect();

    (rings.len(), fillers)
}

/// Make unit `id` connected (in [`RepairMode::Full`]) and fill its holes with
/// unassigned sectors.
///
/// Returns `None` if the unit does not exist.
pub(crate) fn repair_unit(
    ctx: &DistrictContext,
    partition: &mut Partition,
    id: AcdpId,
    engine: &dyn GeometryEngine,
    mode: RepairMode,
) -> Option<Repair> {
    partition.unit(id)?;

    let bound = ctx.len();
    let mut released = 0;
    let mut filled = 0;
    let mut iterations = 0;

    let outcome = loop {
        iterations += 1;
        if mode == RepairMode::Full {
            released += restore_contiguity(ctx, partition, id);
        }

        let (holes, fillers) = hole_fillers(ctx, partition, id, engine);
        debug!(cd_dist = %ctx.cd_dist, acdp_id = id.0, iterations, holes, fillers = fillers.len(), "repair pass");

        if holes == 0 { break RepairOutcome::Complete }
        if fillers.is_empty() { break RepairOutcome::Blocked { holes } }
        if iterations > bound { break RepairOutcome::Bound { holes } }

        filled += fillers.len();
        fillers.into_iter().for_each(|sector| partition.claim(id, sector));
    };

    partition.set_holes_left(id, outcome.holes_left());
    Some(Repair { unit: id, released, filled, iterations, outcome })
}

/// Repair each of `ids` in turn, collecting diagnostics for incomplete repairs.
///
/// Returns `None` when `cancelled` turns true between units.
pub(crate) fn repair_all(
    ctx: &DistrictContext,
    partition: &mut Partition,
    ids: impl IntoIterator<Item = AcdpId>,
    engine: &dyn GeometryEngine,
    mode: RepairMode,
    cancelled: impl Fn() -> bool,
) -> Option<Report> {
    let mut report = Report::default();

    for id in ids {
        if cancelled() { return None }
        let Some(repair) = repair_unit(ctx, partition, id, engine, mode) else { continue };

        if repair.outcome != RepairOutcome::Complete {
            let error = AcdpsError::HoleRepairIncomplete {
                acdp_id: id,
                holes: repair.outcome.holes_left(),
                iterations: repair.iterations,
            };
            warn!(cd_dist = %ctx.cd_dist, "{error}");
            report.push(Diagnostic::new(Some(ctx.cd_dist.clone()), error));
        }
    }

    Some(report)
}
