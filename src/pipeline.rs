//! Pipeline entry point: grouping by district, parallel processing and collection.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ahash::AHashMap;
use rayon::prelude::*;
use tracing::info;

use crate::assemble::{assemble, AcdpsRecord, DistrictOutput, OrphanRecord, SectorRecord, SeedBufferRecord};
use crate::config::Config;
use crate::district::DistrictContext;
use crate::error::{AcdpsError, Diagnostic, Report, Result};
use crate::geom::{GeoEngine, GeometryEngine};
use crate::grow::grow_all;
use crate::merge::merge_undersized;
use crate::partition::Partition;
use crate::repair::{repair_all, RepairMode};
use crate::types::{Dataset, District, Sector, Seed};

/// Shared flag that stops a running pipeline at the next seed or unit boundary.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self { Self::default() }

    /// Request cancellation. Every clone of the token observes it.
    pub fn cancel(&self) { self.0.store(true, Ordering::Relaxed) }

    #[inline] pub fn is_cancelled(&self) -> bool { self.0.load(Ordering::Relaxed) }
}

/// Everything a run produces, in district input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Output {
    pub acdps: Vec<AcdpsRecord>,
    pub sectors: Vec<SectorRecord>,
    pub seed_buffers: Vec<SeedBufferRecord>,
    pub orphans: Vec<OrphanRecord>,
    pub report: Report,
}

impl Output {
    fn append(&mut self, district: DistrictOutput, report: Report) {
        self.acdps.extend(district.acdps);
        self.sectors.extend(district.sectors);
        self.seed_buffers.extend(district.seed_buffers);
        self.orphans.extend(district.orphans);
        self.report.extend(report);
    }
}

/// The records of one district, ready to process.
struct DistrictInput<'a> {
    district: &'a District,
    sectors: Vec<&'a Sector>,
    seeds: Vec<&'a Seed>,
}

/// A configured aggregation run.
pub struct Pipeline {
    config: Config,
    engine: Box<dyn GeometryEngine>,
    cancel: CancelToken,
}

impl Pipeline {
    /// Create a pipeline with the `geo` engine. Fails if `config` is invalid.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let engine = Box::new(GeoEngine::from_config(&config));
        Ok(Self { config, engine, cancel: CancelToken::new() })
    }

    /// Replace the geometry engine.
    pub fn with_engine(mut self, engine: impl GeometryEngine + 'static) -> Self {
        self.engine = Box::new(engine);
        self
    }

    /// Observe an externally owned cancellation token.
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that cancels this pipeline.
    pub fn cancel_token(&self) -> CancelToken { self.cancel.clone() }

    #[inline] pub fn config(&self) -> &Config { &self.config }

    /// Aggregate the sectors of every district around its seeds.
    ///
    /// Districts run in parallel; output follows the order of `dataset.districts`.
    /// Per-record problems end up in `Output::report`; only fatal errors are returned.
    pub fn run(&self, dataset: &Dataset) -> Result<Output> {
        let (inputs, report) = self.group(dataset);
        info!(
            districts = inputs.len(),
            sectors = dataset.sectors.len(),
            seeds = dataset.seeds.len(),
            "starting run"
        );

        let results = inputs.into_par_iter()
            .map(|input| self.process_district(input))
            .collect::<Vec<_>>();

        let mut output = Output { report, ..Output::default() };
        for result in results {
            let (district, report) = result?;
            output.append(district, report);
        }
        if self.cancel.is_cancelled() {
            return Err(AcdpsError::Cancelled);
        }

        info!(
            acdps = output.acdps.len(),
            orphans = output.orphans.len(),
            diagnostics = output.report.diagnostics.len(),
            "run finished"
        );
        Ok(output)
    }

    /// Split sectors and seeds by district, reporting records that reference no known district.
    fn group<'a>(&self, dataset: &'a Dataset) -> (Vec<DistrictInput<'a>>, Report) {
        let mut report = Report::default();
        let mut inputs = dataset.districts.iter()
            .map(|district| DistrictInput { district, sectors: Vec::new(), seeds: Vec::new() })
            .collect::<Vec<_>>();

        let mut by_id: AHashMap<&str, usize> = AHashMap::new();
        for (i, district) in dataset.districts.iter().enumerate() {
            by_id.entry(&*district.cd_dist).or_insert(i);
        }
        let by_code: AHashMap<&str, &Sector> = dataset.sectors.iter()
            .map(|sector| (&*sector.cd_setor, sector))
            .collect();

        for sector in &dataset.sectors {
            match by_id.get(&*sector.cd_dist) {
                Some(&i) => inputs[i].sectors.push(sector),
                None => report.push(Diagnostic::new(None, AcdpsError::UnknownDistrict {
                    record: format!("{} ({})", sector.sec_id, sector.cd_setor),
                    cd_dist: sector.cd_dist.clone(),
                })),
            }
        }

        for seed in &dataset.seeds {
            let cd_dist = match &seed.cd_dist {
                Some(cd_dist) => Some(cd_dist.clone()),
                None => self.locate_district(dataset, seed, &by_code),
            };
            let district = cd_dist.as_ref().and_then(|cd_dist| by_id.get(&**cd_dist));

            match district {
                Some(&i) => inputs[i].seeds.push(seed),
                None => report.push(Diagnostic::new(None, AcdpsError::UnknownDistrict {
                    record: seed.seed_id.to_string(),
                    cd_dist: cd_dist.unwrap_or_else(|| "<none>".into()),
                })),
            }
        }

        (inputs, report)
    }

    /// District of a seed that names none: through its sector code, then the
    /// district boundary containing it, then the first sector containing it.
    fn locate_district(&self, dataset: &Dataset, seed: &Seed, by_code: &AHashMap<&str, &Sector>) -> Option<Arc<str>> {
        if let Some(sector) = seed.cd_setor.as_ref().and_then(|code| by_code.get(&**code)) {
            return Some(sector.cd_dist.clone());
        }

        let inside = |shape: &geo::MultiPolygon<f64>| {
            shape.0.iter().any(|polygon| self.engine.contains(polygon, seed.location))
        };

        dataset.districts.iter()
            .find(|district| inside(&district.boundary))
            .map(|district| district.cd_dist.clone())
            .or_else(|| {
                dataset.sectors.iter()
                    .find(|sector| inside(&sector.geometry))
                    .map(|sector| sector.cd_dist.clone())
            })
    }

    fn process_district(&self, input: DistrictInput) -> Result<(DistrictOutput, Report)> {
        let engine = self.engine.as_ref();
        let cancelled = || self.cancel.is_cancelled();
        if cancelled() { return Err(AcdpsError::Cancelled) }

        let (ctx, mut report) = DistrictContext::build(input.district, input.sectors, input.seeds, engine);
        info!(cd_dist = %ctx.cd_dist, sectors = ctx.len(), seeds = ctx.seeds.len(), "district started");

        let mut partition = Partition::new(ctx.sectors.iter().map(|s| s.num_dom).collect());

        let growths = grow_all(&ctx, &mut partition, &self.config, engine, cancelled)
            .ok_or(AcdpsError::Cancelled)?
            .into_iter()
            .map(|(growth, _)| growth)
            .collect::<Vec<_>>();

        let grown = partition.unit_ids();
        report.extend(repair_all(&ctx, &mut partition, grown, engine, RepairMode::Full, cancelled)
            .ok_or(AcdpsError::Cancelled)?);

        report.extend(merge_undersized(&ctx, &mut partition, &self.config, engine, cancelled)
            .ok_or(AcdpsError::Cancelled)?);

        let output = assemble(&ctx, &partition, &growths, engine)?;
        info!(
            cd_dist = %ctx.cd_dist,
            acdps = output.acdps.len(),
            orphans = output.orphans.len(),
            "district finished"
        );

        Ok((output, report))
    }
}

/// Run the pipeline over `dataset` with the default engine.
pub fn run(dataset: &Dataset, config: &Config) -> Result<Output> {
    Pipeline::new(config.clone())?.run(dataset)
}
