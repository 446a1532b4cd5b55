//! Merging of undersized units into the unit with the nearest seed.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::district::DistrictContext;
use crate::error::{AcdpsError, Diagnostic, Report};
use crate::geom::GeometryEngine;
use crate::partition::Partition;
use crate::repair::{repair_all, RepairMode};
use crate::types::AcdpId;

/// Pick the unit whose seed is nearest to the seed of `source`, ties by lower id.
fn nearest_unit(partition: &Partition, source: AcdpId, engine: &dyn GeometryEngine) -> Option<AcdpId> {
    let origin = partition.unit(source)?.seed_location;
    partition.units()
        .filter(|unit| unit.id != source)
        .map(|unit| (engine.distance(origin, unit.seed_location), unit.id))
        .min_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)))
        .map(|(_, id)| id)
}

/// Merge every unit with fewer than `lower_limit` households into the unit with
/// the nearest seed, then fill the holes the merges created.
///
/// Units are taken smallest id first; a target that is still undersized after
/// absorbing goes back on the work-list. The last unit of a district is kept as
/// is. Returns `None` when `cancelled` turns true between units.
pub(crate) fn merge_undersized(
    ctx: &DistrictContext,
    partition: &mut Partition,
    config: &Config,
    engine: &dyn GeometryEngine,
    cancelled: impl Fn() -> bool,
) -> Option<Report> {
    let undersized = |partition: &Partition, id: AcdpId| {
        partition.unit(id).is_some_and(|unit| unit.households < config.lower_limit)
    };

    let mut report = Report::default();
    let mut worklist = partition.unit_ids().into_iter()
        .filter(|&id| undersized(partition, id))
        .collect::<BTreeSet<_>>();
    let mut absorbed: BTreeMap<AcdpId, AcdpId> = BTreeMap::new(); // target -> last source

    while let Some(source) = worklist.pop_first() {
        if cancelled() { return None }
        if !undersized(partition, source) { continue }

        let Some(target) = nearest_unit(partition, source, engine) else {
            let households = partition.unit(source).map_or(0, |unit| unit.households);
            info!(cd_dist = %ctx.cd_dist, acdp_id = source.0, households, "only unit in district, kept undersized");
            report.push(Diagnostic::new(
                Some(ctx.cd_dist.clone()),
                AcdpsError::NoNeighborForMerge { acdp_id: source, households },
            ));
            continue;
        };

        let moved = partition.merge_units(target, source);
        debug!(cd_dist = %ctx.cd_dist, source = source.0, target = target.0, moved, "merged undersized unit");

        absorbed.remove(&source);
        absorbed.insert(target, source);
        if undersized(partition, target) {
            worklist.insert(target);
        }
    }

    let targets = absorbed.keys().copied().collect::<Vec<_>>();
    report.extend(repair_all(ctx, partition, targets, engine, RepairMode::HolesOnly, &cancelled)?);

    for (&target, &source) in &absorbed {
        let Some(unit) = partition.unit(target) else { continue };
        let components = ctx.graph.components_of(unit.sectors.iter().copied()).len();
        if components > 1 {
            let error = AcdpsError::DisjointMerge { source_id: source, target_id: target, components };
            warn!(cd_dist = %ctx.cd_dist, "{error}");
            report.push(Diagnostic::new(Some(ctx.cd_dist.clone()), error));
        }
    }

    Some(report)
}
