use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::info;

use crate::config::{Config, FieldNames};
use crate::io::fs::require_dir_exists;
use crate::io::{esri, geojson, Feature, Geometry};
use crate::types::{Dataset, District, Sector, SectorId, Seed, SeedId};

/// Read a feature collection, choosing the driver by file extension.
pub(crate) fn read_features(path: &Path) -> Result<Vec<Feature>> {
    let extension = path.extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("shp") => esri::read_features(path),
        Some("geojson" | "json") => geojson::read_features(path),
        _ => bail!("Unsupported input format (expected .shp or .geojson): {}", path.display()),
    }
}

/// Apply `parse` to every feature of `path`, naming the record on failure.
fn parse_all<T>(path: &Path, parse: impl Fn(&Feature) -> Result<T>) -> Result<Vec<T>> {
    read_features(path)?.iter().enumerate()
        .map(|(i, feature)| parse(feature)
            .with_context(|| format!("Invalid record {i} in {}", path.display())))
        .collect()
}

fn area(feature: &Feature) -> Result<geo::MultiPolygon<f64>> {
    match &feature.geometry {
        Some(Geometry::Area(shape)) => Ok(shape.clone()),
        Some(Geometry::Point(_)) => bail!("expected a polygon geometry, found a point"),
        None => bail!("missing geometry"),
    }
}

/// Read districts: `district_id` plus polygon boundary.
pub fn read_districts(path: &Path, fields: &FieldNames) -> Result<Vec<District>> {
    parse_all(path, |feature| Ok(District {
        cd_dist: feature.text(&fields.district_id)?.into(),
        boundary: area(feature)?,
    }))
}

/// Read sectors: code, district, household and registered counts plus polygon.
/// `sec_id`s are assigned in file order by [`Dataset::new`].
pub fn read_sectors(path: &Path, fields: &FieldNames) -> Result<Vec<Sector>> {
    parse_all(path, |feature| Ok(Sector {
        sec_id: SectorId(0),
        cd_setor: feature.text(&fields.sector_code)?.into(),
        cd_dist: feature.text(&fields.district_id)?.into(),
        geometry: area(feature)?,
        num_dom: feature.count(&fields.households)?,
        num_cad: feature.count_opt(&fields.registered)?,
    }))
}

/// Read seeds: id and point, with optional sector, district and processing order.
pub fn read_seeds(path: &Path, fields: &FieldNames) -> Result<Vec<Seed>> {
    parse_all(path, |feature| {
        let location = match &feature.geometry {
            Some(Geometry::Point(point)) => *point,
            Some(Geometry::Area(_)) => bail!("expected a point geometry, found a polygon"),
            None => bail!("missing geometry"),
        };
        let seed_id = feature.text(&fields.seed_id)?;

        Ok(Seed {
            seed_id: SeedId(seed_id.parse().with_context(|| format!("invalid seed id: {seed_id:?}"))?),
            location,
            cd_setor: feature.text_opt(&fields.sector_code)?.map(Into::into),
            cd_dist: feature.text_opt(&fields.district_id)?.map(Into::into),
            order: feature.number_opt(&fields.seed_order)?.map(|n| n.round() as i64),
        })
    })
}

/// Load the three input collections from `input_dir`, using the file and field
/// names of `config`.
pub fn load_dataset(input_dir: &Path, config: &Config) -> Result<Dataset> {
    require_dir_exists(input_dir)?;

    let districts = read_districts(&input_dir.join(&config.input.districts), &config.fields)?;
    let sectors = read_sectors(&input_dir.join(&config.input.sectors), &config.fields)?;
    let seeds = read_seeds(&input_dir.join(&config.input.seeds), &config.fields)?;

    info!(
        districts = districts.len(),
        sectors = sectors.len(),
        seeds = seeds.len(),
        dir = %input_dir.display(),
        "loaded input"
    );

    Ok(Dataset::new(districts, sectors, seeds))
}
