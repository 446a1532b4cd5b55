use std::path::{Path, PathBuf};

use anyhow::Result;
use geo::MultiPolygon;
use tracing::info;

use crate::assemble::{AcdpsRecord, OrphanRecord, SectorRecord, SeedBufferRecord, DBF_TEXT_WIDTH};
use crate::config::{Config, OutputFormat};
use crate::io::fs::ensure_dir_exists;
use crate::io::table::{Column, Table};
use crate::io::{esri, geojson, Attr};
use crate::pipeline::Output;

#[inline] fn int(n: impl Into<u64>) -> Attr { Attr::Number(n.into() as f64) }

#[inline] fn text(s: &str) -> Attr { Attr::Text(s.to_string()) }

const CODE_WIDTH: u8 = 50;

fn acdps_table(records: &[AcdpsRecord]) -> Table {
    let mut table = Table::new(vec![
        Column::integer("acdp_id"),
        Column::integer("seed_id"),
        Column::integer("n_sectors"),
        Column::text("cd_sectors", DBF_TEXT_WIDTH as u8),
        Column::text("cd_dist", CODE_WIDTH),
        Column::real("area_m2"),
        Column::integer("num_dom"),
    ]);
    for r in records {
        table.push(r.geometry.clone(), vec![
            int(r.acdp_id.0),
            int(r.seed_id.0),
            int(r.n_sectors as u64),
            Attr::Text(r.cd_sectors_joined()),
            text(&r.cd_dist),
            Attr::Number(r.area_m2),
            int(r.num_dom),
        ]);
    }
    table
}

fn sectors_table(records: &[SectorRecord]) -> Table {
    let mut table = Table::new(vec![
        Column::integer("sec_id"),
        Column::text("cd_dist", CODE_WIDTH),
        Column::text("cd_setor", CODE_WIDTH),
        Column::integer("num_cad"),
        Column::integer("num_dom"),
        Column::integer("seed_id"),
        Column::integer("acdp_id"),
    ]);
    for r in records {
        table.push(r.geometry.clone(), vec![
            int(r.sec_id.0),
            text(&r.cd_dist),
            text(&r.cd_setor),
            int(r.num_cad),
            int(r.num_dom),
            int(r.seed_id.0),
            int(r.acdp_id.0),
        ]);
    }
    table
}

fn seed_buffers_table(records: &[SeedBufferRecord]) -> Table {
    let mut table = Table::new(vec![
        Column::integer("seed_id"),
        Column::real("buffer_val"),
        Column::integer("num_dom"),
    ]);
    for r in records {
        table.push(MultiPolygon(vec![r.geometry.clone()]), vec![
            int(r.seed_id.0),
            Attr::Number(r.buffer_val),
            int(r.num_dom),
        ]);
    }
    table
}

fn orphans_table(records: &[OrphanRecord]) -> Table {
    let mut table = Table::new(vec![
        Column::integer("sec_id"),
        Column::text("cd_dist", CODE_WIDTH),
        Column::text("cd_setor", CODE_WIDTH),
        Column::integer("num_cad"),
        Column::integer("num_dom"),
    ]);
    for r in records {
        table.push(r.geometry.clone(), vec![
            int(r.sec_id.0),
            text(&r.cd_dist),
            text(&r.cd_setor),
            int(r.num_cad),
            int(r.num_dom),
        ]);
    }
    table
}

/// Write the four output collections of a run into `dir`, in the format and
/// under the file names of `config`. Returns the written paths.
pub fn write_output(output: &Output, dir: &Path, config: &Config) -> Result<Vec<PathBuf>> {
    ensure_dir_exists(dir)?;

    let names = &config.output;
    let tables = [
        (&names.acdps, acdps_table(&output.acdps)),
        (&names.sectors, sectors_table(&output.sectors)),
        (&names.seeds, seed_buffers_table(&output.seed_buffers)),
        (&names.orphans, orphans_table(&output.orphans)),
    ];

    let mut written = Vec::with_capacity(tables.len());
    for (stem, table) in &tables {
        let path = dir.join(stem).with_extension(config.output_format.extension());
        match config.output_format {
            OutputFormat::Shapefile => esri::write_table(&path, table)?,
            OutputFormat::GeoJson => geojson::write_table(&path, table)?,
        }
        info!(path = %path.display(), records = table.len(), "wrote output");
        written.push(path);
    }

    Ok(written)
}
