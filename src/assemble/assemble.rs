use tracing::debug;

use crate::assemble::{AcdpsRecord, OrphanRecord, SectorRecord, SeedBufferRecord};
use crate::district::DistrictContext;
use crate::error::{AcdpsError, Result};
use crate::geom::GeometryEngine;
use crate::grow::Growth;
use crate::partition::Partition;
use crate::types::AcdpId;

/// The four output collections of one district.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DistrictOutput {
    pub acdps: Vec<AcdpsRecord>,
    pub sectors: Vec<SectorRecord>,
    pub seed_buffers: Vec<SeedBufferRecord>,
    pub orphans: Vec<OrphanRecord>,
}

/// Turn the final partition of a district into output records.
///
/// Surviving units are renumbered `1..=n` in ascending provisional id. A unit
/// whose outline has holes that repair did not report is an error.
pub(crate) fn assemble(
    ctx: &DistrictContext,
    partition: &Partition,
    growths: &[Growth],
    engine: &dyn GeometryEngine,
) -> Result<DistrictOutput> {
    let mut output = DistrictOutput::default();
    let mut final_ids = vec![AcdpId::UNSET; ctx.len()];

    for (n, unit) in partition.units().enumerate() {
        let acdp_id = AcdpId(n as u32 + 1);

        let mut members = unit.sectors.iter().copied().collect::<Vec<_>>();
        members.sort_by_key(|&i| ctx.sectors[i].sec_id);

        let shapes = members.iter().map(|&i| ctx.shape(i)).collect::<Vec<_>>();
        let geometry = engine.union(&shapes);

        let holes = engine.interior_rings(&geometry).len();
        if holes > 0 && unit.holes_left == 0 {
            return Err(AcdpsError::InvariantViolation(format!(
                "{} in district {} has {holes} unreported hole(s)", unit.id, ctx.cd_dist,
            )));
        }

        for &i in &members {
            final_ids[i] = acdp_id;
            let sector = ctx.sectors[i];
            output.sectors.push(SectorRecord {
                sec_id: sector.sec_id,
                cd_dist: ctx.cd_dist.clone(),
                cd_setor: sector.cd_setor.clone(),
                num_cad: sector.num_cad,
                num_dom: sector.num_dom,
                seed_id: unit.seed_id,
                acdp_id,
                geometry: sector.geometry.clone(),
            });
        }

        output.acdps.push(AcdpsRecord {
            acdp_id,
            seed_id: unit.seed_id,
            n_sectors: members.len(),
            cd_sectors: members.iter().map(|&i| ctx.sectors[i].cd_setor.clone()).collect(),
            cd_dist: ctx.cd_dist.clone(),
            area_m2: engine.area(&geometry),
            num_dom: ctx.households_of(members.iter().copied()),
            geometry,
            flagged: unit.holes_left > 0,
        });
    }

    output.sectors.sort_by_key(|record| record.sec_id);

    output.orphans = (0..ctx.len())
        .filter(|&i| final_ids[i].is_unset())
        .map(|i| {
            let sector = ctx.sectors[i];
            OrphanRecord {
                sec_id: sector.sec_id,
                cd_dist: ctx.cd_dist.clone(),
                cd_setor: sector.cd_setor.clone(),
                num_cad: sector.num_cad,
                num_dom: sector.num_dom,
                geometry: sector.geometry.clone(),
            }
        })
        .collect();

    output.seed_buffers = growths.iter()
        .map(|growth| SeedBufferRecord {
            seed_id: growth.seed_id,
            cd_dist: ctx.cd_dist.clone(),
            buffer_val: growth.radius,
            num_dom: growth.households,
            geometry: growth.buffer.clone(),
        })
        .collect();

    debug!(
        cd_dist = %ctx.cd_dist,
        acdps = output.acdps.len(),
        orphans = output.orphans.len(),
        "district assembled"
    );

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::GeoEngine;
    use crate::types::{District, Sector, SectorId, SeedId};
    use geo::{polygon, MultiPolygon, Point};

    fn square(id: u32, col: u32, row: u32) -> Sector {
        let (x, y) = (col as f64 * 100.0, row as f64 * 100.0);
        Sector {
            sec_id: SectorId(id),
            cd_setor: format!("S{id}").into(),
            cd_dist: "D1".into(),
            geometry: MultiPolygon(vec![polygon![(x: x, y: y), (x: x + 100.0, y: y), (x: x + 100.0, y: y + 100.0), (x: x, y: y + 100.0)]]),
            num_dom: 10 + id as u64,
            num_cad: 1,
        }
    }

    fn district() -> District {
        District { cd_dist: "D1".into(), boundary: MultiPolygon(vec![]) }
    }

    #[test]
    fn renumbers_units_and_lists_orphans() {
        let sectors = (0..4).map(|i| square(i, i, 0)).collect::<Vec<_>>();
        let engine = GeoEngine::default();
        let (ctx, _) = DistrictContext::build(&district(), &sectors, &[], &engine);
        let mut partition = Partition::new(ctx.sectors.iter().map(|s| s.num_dom).collect());

        let gone = partition.open_unit(SeedId(1), Point::new(50.0, 50.0), 0);
        let a = partition.open_unit(SeedId(2), Point::new(150.0, 50.0), 1);
        let b = partition.open_unit(SeedId(3), Point::new(350.0, 50.0), 3);
        partition.claim(gone, 0);
        partition.claim(a, 1);
        partition.claim(b, 3);
        partition.merge_units(a, gone);

        let output = assemble(&ctx, &partition, &[], &engine).unwrap();

        let ids = output.acdps.iter().map(|r| (r.acdp_id, r.seed_id)).collect::<Vec<_>>();
        assert_eq!(ids, vec![(AcdpId(1), SeedId(2)), (AcdpId(2), SeedId(3))]);

        let first = &output.acdps[0];
        assert_eq!(first.n_sectors, 2);
        assert_eq!(first.cd_sectors_joined(), "S0,S1");
        assert_eq!(first.num_dom, 21);
        assert!((first.area_m2 - 20_000.0).abs() < 1e-6);
        assert!(!first.flagged);

        assert_eq!(output.sectors.iter().map(|r| r.acdp_id.0).collect::<Vec<_>>(), vec![1, 1, 2]);
        assert_eq!(output.orphans.iter().map(|r| r.sec_id).collect::<Vec<_>>(), vec![SectorId(2)]);
    }

    #[test]
    fn unreported_hole_is_an_invariant_violation() {
        let sectors = (0..9).map(|i| square(i, i % 3, i / 3)).collect::<Vec<_>>();
        let engine = GeoEngine::default();
        let (ctx, _) = DistrictContext::build(&district(), &sectors, &[], &engine);
        let mut partition = Partition::new(ctx.sectors.iter().map(|s| s.num_dom).collect());

        let ring = partition.open_unit(SeedId(1), Point::new(50.0, 50.0), 0);
        [0, 1, 2, 3, 5, 6, 7, 8].into_iter().for_each(|i| partition.claim(ring, i));

        let err = assemble(&ctx, &partition, &[], &engine).unwrap_err();
        assert!(matches!(err, AcdpsError::InvariantViolation(_)));

        partition.set_holes_left(ring, 1);
        let output = assemble(&ctx, &partition, &[], &engine).unwrap();
        assert!(output.acdps[0].flagged);
    }
}
