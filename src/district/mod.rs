use std::sync::Arc;

use ahash::AHashMap;
use geo::{MultiPolygon, Point};
use tracing::debug;

use crate::error::{AcdpsError, Diagnostic, Report};
use crate::geom::{check_polygon, GeometryEngine, SpatialIndex};
use crate::graph::{build_adjacency, Graph};
use crate::types::{District, Sector, Seed, SeedId};

/// A seed whose containing sector has been found in its district.
#[derive(Debug, Clone)]
pub(crate) struct ResolvedSeed {
    pub seed_id: SeedId,
    pub location: Point<f64>,
    pub home: usize, // Local index of the sector containing the seed
}

/// Everything built once per district: the local sector arena, its spatial index,
/// its adjacency graph and the seeds to grow, in processing order.
///
/// Local indices (`0..len()`) are positions in `sectors`; the global `sec_id` of a
/// sector is kept on the record itself.
pub(crate) struct DistrictContext<'a> {
    pub cd_dist: Arc<str>,
    pub sectors: Vec<&'a Sector>,
    pub index: SpatialIndex,
    pub graph: Graph,
    pub interior: Vec<Option<Point<f64>>>,
    pub seeds: Vec<ResolvedSeed>,
}

impl<'a> DistrictContext<'a> {
    /// Build the context of `district` from its sectors and seeds.
    ///
    /// Sectors with invalid geometry and seeds that cannot be placed in a sector of
    /// this district are left out and reported.
    pub(crate) fn build(
        district: &District,
        sectors: impl IntoIterator<Item = &'a Sector>,
        seeds: impl IntoIterator<Item = &'a Seed>,
        engine: &dyn GeometryEngine,
    ) -> (Self, Report) {
        let cd_dist = district.cd_dist.clone();
        let mut report = Report::default();

        let sectors = sectors.into_iter()
            .filter(|sector| match check_polygon(&sector.geometry) {
                Ok(()) => true,
                Err(reason) => {
                    report.push(Diagnostic::new(Some(cd_dist.clone()), AcdpsError::InvalidGeometry {
                        sec_id: sector.sec_id,
                        cd_setor: sector.cd_setor.clone(),
                        reason,
                    }));
                    false
                }
            })
            .collect::<Vec<_>>();

        let shapes = sectors.iter().map(|s| &s.geometry).collect::<Vec<_>>();
        let index = SpatialIndex::new(shapes.iter().copied());
        let graph = build_adjacency(&shapes, &index, engine);
        let interior = shapes.iter().map(|&shape| engine.interior_point(shape)).collect();

        let by_code: AHashMap<&str, usize> = sectors.iter().enumerate()
            .map(|(i, s)| (&*s.cd_setor, i))
            .collect();

        // Seeds run in ascending `order`, unordered seeds last, ties by id.
        let mut seeds = seeds.into_iter().collect::<Vec<_>>();
        seeds.sort_by_key(|seed| (seed.order.is_none(), seed.order, seed.seed_id));

        let seeds = seeds.into_iter()
            .filter_map(|seed| {
                let finite = seed.location.x().is_finite() && seed.location.y().is_finite();
                let home = match &seed.cd_setor {
                    _ if !finite => None,
                    Some(code) => by_code.get(&**code).copied(),
                    None => index.locate(seed.location, &shapes),
                };
                match home {
                    Some(home) => Some(ResolvedSeed { seed_id: seed.seed_id, location: seed.location, home }),
                    None => {
                        report.push(Diagnostic::new(Some(cd_dist.clone()), AcdpsError::SeedOutsideDistrict {
                            seed_id: seed.seed_id,
                            cd_dist: cd_dist.clone(),
                        }));
                        None
                    }
                }
            })
            .collect::<Vec<_>>();

        debug!(
            cd_dist = %cd_dist,
            sectors = sectors.len(),
            seeds = seeds.len(),
            edges = graph.edge_count() / 2,
            "district context built"
        );

        (Self { cd_dist, sectors, index, graph, interior, seeds }, report)
    }

    /// Number of sectors in the district.
    #[inline] pub(crate) fn len(&self) -> usize { self.sectors.len() }

    /// Geometry of the sector at local index `i`.
    #[inline] pub(crate) fn shape(&self, i: usize) -> &'a MultiPolygon<f64> { &self.sectors[i].geometry }

    /// Households of the sector at local index `i`.
    #[inline] pub(crate) fn households(&self, i: usize) -> u64 { self.sectors[i].num_dom }

    /// Sum of households over `sectors`.
    pub(crate) fn households_of(&self, sectors: impl IntoIterator<Item = usize>) -> u64 {
        sectors.into_iter().map(|i| self.households(i)).sum()
    }
}
