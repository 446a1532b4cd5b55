//! Buffer growth around a seed.
//!
//! Each seed drives a small state machine, `Growing → Stopped(reason)`: a circular
//! buffer grows by `buffer_step` per step, and the unassigned sectors it reaches are
//! accepted one at a time, nearest first, while the household total stays within
//! budget. Growth stops once the budget is reached or no sector is left to reach.

use std::collections::BTreeSet;

use geo::Polygon;
use tracing::debug;

use crate::config::Config;
use crate::district::{DistrictContext, ResolvedSeed};
use crate::geom::GeometryEngine;
use crate::partition::Partition;
use crate::types::{AcdpId, SeedId};

/// Why a seed stopped growing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The household total reached `limit_to_stop`, or the next step would pass the upper limit.
    BudgetReached,
    /// The buffer covers every sector it could still reach.
    NoMoreSectors,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GrowthState {
    Growing,
    Stopped(StopReason),
}

/// Result of growing one seed.
#[derive(Debug, Clone)]
pub(crate) struct Growth {
    pub seed_id: SeedId,
    pub sectors: BTreeSet<usize>,
    pub households: u64,
    pub radius: f64,
    pub buffer: Polygon<f64>, // Buffer actually used at the stopping step
    pub reason: StopReason,
    pub steps: usize,
    pub fallback: bool,       // Accepted through the first-sector fallback
}

/// Grow a buffer around `seed` over the sectors still unassigned in `partition`.
///
/// Sectors already claimed by earlier seeds are permanently excluded. The
/// partition is not modified: the caller claims `Growth::sectors`.
pub(crate) fn grow_seed(
    ctx: &DistrictContext,
    partition: &Partition,
    seed: &ResolvedSeed,
    config: &Config,
    engine: &dyn GeometryEngine,
) -> Growth {
    let limit = config.limit_to_stop as f64;
    let upper = config.upper_limit();
    let reach = ctx.index.reach(seed.location);

    let mut accepted = BTreeSet::new();
    let mut total = 0u64;
    let mut radius = 0.0;
    let mut steps = 0;
    let mut fallback = false;
    let mut buffer = engine.buffer(seed.location, radius);
    let mut state = GrowthState::Growing;

    while state == GrowthState::Growing {
        steps += 1;
        radius += config.buffer_step;
        buffer = engine.buffer(seed.location, radius);

        let candidates = ctx.index.query(&buffer).into_iter()
            .filter(|&i| partition.is_unassigned(i) && !accepted.contains(&i))
            .filter(|&i| engine.intersects(ctx.shape(i), &buffer))
            .collect::<Vec<_>>();

        if candidates.is_empty() {
            // Accepted sectors are not claimed yet, so they still count as unassigned.
            let exhausted = radius >= reach || partition.num_unassigned() <= accepted.len();
            if exhausted {
                state = GrowthState::Stopped(StopReason::NoMoreSectors);
            }
            continue;
        }

        let candidates = by_proximity(ctx, seed, engine, candidates);

        for &i in &candidates {
            let next = total + ctx.households(i);

            if next as f64 <= limit {
                accepted.insert(i);
                total = next;
            } else if next as f64 <= upper {
                // The tolerance lets the total cross `limit_to_stop` once.
                accepted.insert(i);
                total = next;
                state = GrowthState::Stopped(StopReason::BudgetReached);
                break;
            } else {
                if accepted.is_empty() {
                    let pick = first_sector_fallback(ctx, &candidates);
                    accepted.insert(pick);
                    total = ctx.households(pick);
                    fallback = true;
                }
                state = GrowthState::Stopped(StopReason::BudgetReached);
                break;
            }
        }
    }

    let GrowthState::Stopped(reason) = state else { unreachable!("loop exits only when stopped") };

    debug!(
        cd_dist = %ctx.cd_dist,
        seed_id = seed.seed_id.0,
        sectors = accepted.len(),
        households = total,
        radius,
        steps,
        fallback,
        ?reason,
        "seed stopped growing"
    );

    Growth { seed_id: seed.seed_id, sectors: accepted, households: total, radius, buffer, reason, steps, fallback }
}

/// Order the candidates of one step: the seed's own sector first, then by distance
/// from the seed to the sector, then by local index.
fn by_proximity(
    ctx: &DistrictContext,
    seed: &ResolvedSeed,
    engine: &dyn GeometryEngine,
    candidates: Vec<usize>,
) -> Vec<usize> {
    let mut keyed = candidates.into_iter()
        .map(|i| (i != seed.home, engine.distance_to_shape(seed.location, ctx.shape(i)), i))
        .collect::<Vec<_>>();
    keyed.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.total_cmp(&b.1)).then(a.2.cmp(&b.2)));
    keyed.into_iter().map(|(_, _, i)| i).collect()
}

/// First-sector fallback: when the first candidate a seed ever meets already overshoots
/// the upper limit, keep the single candidate with the fewest households, so a seed that
/// reaches any sector always yields a non-empty unit. `candidates` come in proximity
/// order, which breaks ties. This is the only way a grown unit may exceed the upper limit.
fn first_sector_fallback(ctx: &DistrictContext, candidates: &[usize]) -> usize {
    *candidates.iter()
        .min_by_key(|&&i| ctx.households(i))
        .expect("fallback needs at least one candidate")
}

/// Grow every seed of the district in order, claiming accepted sectors as it goes.
///
/// Returns one `Growth` per seed, paired with the id of the unit it opened
/// (`None` when the seed reached no sector).
pub(crate) fn grow_all(
    ctx: &DistrictContext,
    partition: &mut Partition,
    config: &Config,
    engine: &dyn GeometryEngine,
    cancelled: impl Fn() -> bool,
) -> Option<Vec<(Growth, Option<AcdpId>)>> {
    let mut results = Vec::with_capacity(ctx.seeds.len());

    for seed in &ctx.seeds {
        if cancelled() { return None }

        let growth = grow_seed(ctx, partition, seed, config, engine);
        let unit = (!growth.sectors.is_empty()).then(|| {
            let id = partition.open_unit(seed.seed_id, seed.location, seed.home);
            growth.sectors.iter().for_each(|&sector| partition.claim(id, sector));
            id
        });
        results.push((growth, unit));
    }

    Some(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::GeoEngine;
    use crate::types::{District, Sector, SectorId, Seed};
    use geo::{polygon, MultiPolygon, Point};

    fn sector(id: u32, x0: f64, x1: f64, num_dom: u64) -> Sector {
        Sector {
            sec_id: SectorId(id),
            cd_setor: format!("S{id}").into(),
            cd_dist: "D1".into(),
            geometry: MultiPolygon(vec![polygon![(x: x0, y: 0.0), (x: x1, y: 0.0), (x: x1, y: 100.0), (x: x0, y: 100.0)]]),
            num_dom,
            num_cad: 0,
        }
    }

    fn seed(id: u32, x: f64, y: f64) -> Seed {
        Seed { seed_id: SeedId(id), location: Point::new(x, y), cd_setor: None, cd_dist: Some("D1".into()), order: None }
    }

    fn district() -> District {
        District { cd_dist: "D1".into(), boundary: MultiPolygon(vec![]) }
    }

    fn config(limit_to_stop: u64, buffer_step: f64) -> Config {
        Config { limit_to_stop, percent_range: 10.0, buffer_step, ..Config::default() }
    }

    /// Three 100x100 sectors in a row.
    fn row(households: [u64; 3]) -> Vec<Sector> {
        vec![
            sector(0, 0.0, 100.0, households[0]),
            sector(1, 100.0, 200.0, households[1]),
            sector(2, 200.0, 300.0, households[2]),
        ]
    }

    fn run(sectors: &[Sector], seeds: &[Seed], config: &Config) -> (Vec<Growth>, Partition) {
        let engine = GeoEngine::default();
        let (ctx, _) = DistrictContext::build(&district(), sectors, seeds, &engine);
        let mut partition = Partition::new(ctx.sectors.iter().map(|s| s.num_dom).collect());
        let results = grow_all(&ctx, &mut partition, config, &engine, || false).unwrap();
        (results.into_iter().map(|(growth, _)| growth).collect(), partition)
    }

    #[test]
    fn stops_when_next_step_overshoots_upper_limit() {
        // Seed near the right edge of the middle sector: the right neighbor joins
        // at radius 20, the left one is reached at radius 100 and overshoots.
        let (growths, partition) = run(&row([400, 400, 400]), &[seed(1, 190.0, 50.0)], &config(800, 20.0));
        let growth = &growths[0];

        assert_eq!(growth.sectors.iter().copied().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(growth.households, 800);
        assert_eq!(growth.reason, StopReason::BudgetReached);
        assert!(!growth.fallback);
        assert!(partition.is_unassigned(0));
    }

    #[test]
    fn tolerance_accepts_crossing_the_limit_once() {
        let (growths, _) = run(&row([300, 400, 450]), &[seed(1, 190.0, 50.0)], &config(800, 20.0));
        let growth = &growths[0];

        // 400 + 450 = 850 lies in (800, 880]: accepted, then stop.
        assert_eq!(growth.households, 850);
        assert_eq!(growth.reason, StopReason::BudgetReached);
        assert_eq!(growth.sectors.len(), 2);
    }

    #[test]
    fn centered_seed_keeps_its_sector_and_one_neighbor() {
        // One step reaches all three sectors; they are taken one at a time.
        let (growths, partition) = run(&row([400, 400, 400]), &[seed(1, 150.0, 50.0)], &config(800, 500.0));
        let growth = &growths[0];

        assert_eq!(growth.steps, 1);
        assert_eq!(growth.sectors.iter().copied().collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(growth.households, 800);
        assert_eq!(growth.reason, StopReason::BudgetReached);
        assert!(!growth.fallback);
        assert!(partition.is_unassigned(2));
    }

    #[test]
    fn small_steps_reach_the_same_unit() {
        let (growths, _) = run(&row([400, 400, 400]), &[seed(1, 150.0, 50.0)], &config(800, 20.0));
        let growth = &growths[0];

        assert_eq!(growth.sectors.iter().copied().collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(growth.households, 800);
        assert_eq!(growth.reason, StopReason::BudgetReached);
    }

    #[test]
    fn nearer_candidates_are_taken_first() {
        // Seed close to the right edge: sector 2 is 20 away, sector 0 is 80 away.
        let (growths, _) = run(&row([100, 400, 450]), &[seed(1, 180.0, 50.0)], &config(800, 500.0));
        let growth = &growths[0];

        // 400 + 450 = 850 lies in (800, 880]: sector 2 is accepted, sector 0 never tried.
        assert_eq!(growth.sectors.iter().copied().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(growth.households, 850);
    }

    #[test]
    fn first_sector_fallback_takes_the_smallest_candidate() {
        // One huge step reaches all three sectors and the seed's own sector overshoots.
        let (growths, _) = run(&row([500, 900, 450]), &[seed(1, 150.0, 50.0)], &config(800, 1000.0));
        let growth = &growths[0];

        assert!(growth.fallback);
        assert_eq!(growth.sectors.iter().copied().collect::<Vec<_>>(), vec![2]);
        assert_eq!(growth.households, 450);
        assert_eq!(growth.reason, StopReason::BudgetReached);

        // Equal households: the seed's own sector wins.
        let (growths, _) = run(&row([900, 900, 900]), &[seed(1, 150.0, 50.0)], &config(800, 1000.0));
        assert_eq!(growths[0].sectors.iter().copied().collect::<Vec<_>>(), vec![1]);

        // Equal households outside the seed's sector: the nearer one wins.
        let (growths, _) = run(&row([450, 900, 450]), &[seed(1, 180.0, 50.0)], &config(800, 1000.0));
        assert_eq!(growths[0].sectors.iter().copied().collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn fallback_may_exceed_the_upper_limit() {
        let (growths, _) = run(&row([5000, 5000, 5000]), &[seed(1, 150.0, 50.0)], &config(800, 1000.0));
        let growth = &growths[0];

        assert!(growth.fallback);
        assert_eq!(growth.households, 5000);
        assert_eq!(growth.sectors.iter().copied().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn small_district_runs_out_of_sectors() {
        let (growths, _) = run(&row([10, 10, 10]), &[seed(1, 150.0, 50.0)], &config(800, 30.0));
        let growth = &growths[0];

        assert_eq!(growth.households, 30);
        assert_eq!(growth.reason, StopReason::NoMoreSectors);
        // Both neighbors are reached at radius 60; the next empty step stops.
        assert_eq!(growth.radius, 90.0);
        assert_eq!(growth.steps, 3);
    }

    #[test]
    fn later_seeds_skip_claimed_sectors() {
        let seeds = [seed(1, 50.0, 50.0), seed(2, 250.0, 50.0)];
        let (growths, partition) = run(&row([400, 400, 400]), &seeds, &config(400, 10.0));

        assert_eq!(growths[0].sectors.iter().copied().collect::<Vec<_>>(), vec![0]);
        assert_eq!(growths[1].sectors.iter().copied().collect::<Vec<_>>(), vec![2]);
        assert_eq!(partition.num_units(), 2);
        assert_eq!(partition.assignment(1), None);
    }

    #[test]
    fn seed_without_reachable_sectors_opens_no_unit() {
        let sectors = row([100, 100, 100]);
        let engine = GeoEngine::default();
        let seeds = [seed(1, 150.0, 50.0)];
        let (ctx, _) = DistrictContext::build(&district(), &sectors, &seeds, &engine);
        let mut partition = Partition::new(vec![100, 100, 100]);

        // Everything is already taken by another unit.
        let other = partition.open_unit(SeedId(99), Point::new(0.0, 0.0), 0);
        (0..3).for_each(|i| partition.claim(other, i));

        let results = grow_all(&ctx, &mut partition, &config(800, 50.0), &engine, || false).unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].0.sectors.is_empty());
        assert_eq!(results[0].0.reason, StopReason::NoMoreSectors);
        assert!(results[0].1.is_none());
    }

    #[test]
    fn cancellation_is_checked_between_seeds() {
        let sectors = row([100, 100, 100]);
        let engine = GeoEngine::default();
        let seeds = [seed(1, 150.0, 50.0)];
        let (ctx, _) = DistrictContext::build(&district(), &sectors, &seeds, &engine);
        let mut partition = Partition::new(vec![100, 100, 100]);

        assert!(grow_all(&ctx, &mut partition, &config(800, 50.0), &engine, || true).is_none());
        assert_eq!(partition.num_units(), 0);
    }
}
