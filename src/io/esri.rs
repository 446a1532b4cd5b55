use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use geo::Point;
use shapefile as shp;
use shp::dbase::{FieldName, FieldValue, Record, TableWriterBuilder};

use crate::assemble::truncate_chars;
use crate::io::polygon::{geo_to_shp, rings_to_geo, shp_to_geo};
use crate::io::table::{ColumnKind, Table};
use crate::io::{Attr, Feature, Geometry, Properties};

/// Convert a shape to an input geometry; null shapes give `None`.
fn geometry_of(shape: shp::Shape) -> Result<Option<Geometry>> {
    Ok(Some(match shape {
        shp::Shape::NullShape => return Ok(None),
        shp::Shape::Point(p) => Geometry::Point(Point::new(p.x, p.y)),
        shp::Shape::PointM(p) => Geometry::Point(Point::new(p.x, p.y)),
        shp::Shape::PointZ(p) => Geometry::Point(Point::new(p.x, p.y)),
        shp::Shape::Polygon(p) => Geometry::Area(shp_to_geo(&p)),
        shp::Shape::PolygonM(p) => Geometry::Area(rings_to_geo(p.rings(), |pt| (pt.x, pt.y))),
        shp::Shape::PolygonZ(p) => Geometry::Area(rings_to_geo(p.rings(), |pt| (pt.x, pt.y))),
        other => bail!("unsupported shape type: {:?}", other.shapetype()),
    }))
}

/// Read every shape and attribute record of a `.shp` file (and its `.dbf`).
pub(crate) fn read_features(path: &Path) -> Result<Vec<Feature>> {
    let mut reader = shp::Reader::from_path(path)
        .with_context(|| format!("Failed to open shapefile: {}", path.display()))?;

    reader.iter_shapes_and_records()
        .enumerate()
        .map(|(i, result)| {
            let (shape, record) = result
                .with_context(|| format!("Error reading record {i} of {}", path.display()))?;
            Ok(Feature { geometry: geometry_of(shape)?, properties: Properties::Dbf(record) })
        })
        .collect()
}

fn field_name(name: &str) -> Result<FieldName> {
    FieldName::try_from(name).map_err(|err| anyhow!("invalid DBF field name {name}: {err:?}"))
}

/// Write `table` as a polygon shapefile (`.shp`, `.shx`, `.dbf`).
pub(crate) fn write_table(path: &Path, table: &Table) -> Result<()> {
    let mut builder = TableWriterBuilder::new();
    for column in &table.columns {
        let name = field_name(column.name)?;
        builder = match column.kind {
            ColumnKind::Text(width) => builder.add_character_field(name, width),
            ColumnKind::Integer => builder.add_numeric_field(name, 18, 0),
            ColumnKind::Real => builder.add_numeric_field(name, 20, 4),
        };
    }

    let mut writer = shp::Writer::from_path(path, builder)
        .with_context(|| format!("Failed to create shapefile: {}", path.display()))?;

    for (geometry, values) in &table.rows {
        let mut record = Record::default();
        for (column, value) in table.columns.iter().zip(values) {
            let field = match (column.kind, value) {
                (ColumnKind::Text(width), Attr::Text(s)) => FieldValue::Character(Some(truncate_chars(s, width as usize).to_string())),
                (ColumnKind::Text(_), Attr::Number(n)) => FieldValue::Character(Some(n.to_string())),
                (ColumnKind::Text(_), Attr::Null) => FieldValue::Character(None),
                (_, Attr::Number(n)) => FieldValue::Numeric(Some(*n)),
                (_, Attr::Text(s)) => FieldValue::Numeric(s.parse().ok()),
                (_, Attr::Null) => FieldValue::Numeric(None),
            };
            record.insert(column.name.to_string(), field);
        }

        writer.write_shape_and_record(&geo_to_shp(geometry), &record)
            .with_context(|| format!("Failed to write record to {}", path.display()))?;
    }

    Ok(())
}
