use std::{fs::File, io::{BufReader, BufWriter}, path::Path};

use anyhow::{anyhow, bail, Context, Result};
use geo::{Coord, LineString, MultiPolygon, Point, Polygon};
use serde_json::{json, Map, Value};

use crate::io::table::Table;
use crate::io::{Attr, Feature, Geometry, Properties};

/// Parse a position: `[x, y, ...]`.
fn parse_coord(value: &Value) -> Result<Coord<f64>> {
    let pair = value.as_array().filter(|a| a.len() >= 2)
        .ok_or_else(|| anyhow!("invalid position: {value}"))?;
    let x = pair[0].as_f64().ok_or_else(|| anyhow!("invalid coordinate: x must be a number"))?;
    let y = pair[1].as_f64().ok_or_else(|| anyhow!("invalid coordinate: y must be a number"))?;
    Ok(Coord { x, y })
}

/// Parse a ring, closing it if needed.
fn parse_ring(value: &Value) -> Result<LineString<f64>> {
    let mut coords = value.as_array()
        .ok_or_else(|| anyhow!("invalid ring: expected an array of positions"))?
        .iter()
        .map(parse_coord)
        .collect::<Result<Vec<_>>>()?;

    if coords.first() != coords.last() {
        coords.push(coords[0]);
    }
    Ok(LineString(coords))
}

/// Parse polygon coordinates: `[exterior, hole, hole, ...]`.
fn parse_polygon(value: &Value) -> Result<Polygon<f64>> {
    let rings = value.as_array()
        .ok_or_else(|| anyhow!("invalid polygon: expected an array of rings"))?
        .iter()
        .map(parse_ring)
        .collect::<Result<Vec<_>>>()?;

    let mut rings = rings.into_iter();
    let exterior = rings.next().ok_or_else(|| anyhow!("invalid polygon: missing exterior ring"))?;
    Ok(Polygon::new(exterior, rings.collect()))
}

fn parse_geometry(value: &Value) -> Result<Option<Geometry>> {
    if value.is_null() {
        return Ok(None);
    }
    let coords = &value["coordinates"];

    Ok(Some(match value["type"].as_str() {
        Some("Point") => Geometry::Point(Point::from(parse_coord(coords)?)),
        Some("Polygon") => Geometry::Area(MultiPolygon(vec![parse_polygon(coords)?])),
        Some("MultiPolygon") => Geometry::Area(MultiPolygon(
            coords.as_array()
                .ok_or_else(|| anyhow!("invalid MultiPolygon: expected an array of polygons"))?
                .iter()
                .map(parse_polygon)
                .collect::<Result<Vec<_>>>()?,
        )),
        Some(other) => bail!("unsupported geometry type: {other}"),
        None => bail!("geometry without a type"),
    }))
}

/// Read the features of a GeoJSON FeatureCollection.
pub(crate) fn read_features(path: &Path) -> Result<Vec<Feature>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open GeoJSON file: {}", path.display()))?;
    let value: Value = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse GeoJSON file: {}", path.display()))?;

    let features = value["features"].as_array()
        .ok_or_else(|| anyhow!("{} is not a FeatureCollection", path.display()))?;

    features.iter().enumerate()
        .map(|(i, feature)| {
            let geometry = parse_geometry(&feature["geometry"])
                .with_context(|| format!("Invalid geometry in feature {i} of {}", path.display()))?;
            let properties = match &feature["properties"] {
                Value::Object(map) => map.clone(),
                _ => Map::new(),
            };
            Ok(Feature { geometry, properties: Properties::Json(properties) })
        })
        .collect()
}

fn ring_json(ring: &LineString<f64>) -> Value {
    Value::Array(ring.coords().map(|c| json!([c.x, c.y])).collect())
}

fn multipolygon_json(shape: &MultiPolygon<f64>) -> Value {
    let polygons = shape.0.iter()
        .map(|polygon| {
            let rings = std::iter::once(polygon.exterior())
                .chain(polygon.interiors())
                .map(ring_json)
                .collect::<Vec<_>>();
            Value::Array(rings)
        })
        .collect::<Vec<_>>();

    json!({ "type": "MultiPolygon", "coordinates": polygons })
}

/// Write `table` as a GeoJSON FeatureCollection of MultiPolygons.
pub(crate) fn write_table(path: &Path, table: &Table) -> Result<()> {
    let features = table.rows.iter()
        .map(|(geometry, values)| {
            let properties = table.columns.iter().zip(values)
                .map(|(column, value)| {
                    let value = match value {
                        Attr::Text(s) => json!(s),
                        Attr::Number(n) => json!(n),
                        Attr::Null => Value::Null,
                    };
                    (column.name.to_string(), value)
                })
                .collect::<Map<_, _>>();

            json!({
                "type": "Feature",
                "geometry": multipolygon_json(geometry),
                "properties": properties,
            })
        })
        .collect::<Vec<_>>();

    let collection = json!({ "type": "FeatureCollection", "features": features });

    let file = File::create(path)
        .with_context(|| format!("Failed to create GeoJSON file: {}", path.display()))?;
    serde_json::to_writer(BufWriter::new(file), &collection)
        .with_context(|| format!("Failed to write GeoJSON to {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::table::Column;
    use geo::{polygon, Area};
    use std::io::Write;

    #[test]
    fn reads_points_polygons_and_properties() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", json!({
            "type": "FeatureCollection",
            "features": [
                { "type": "Feature", "geometry": { "type": "Point", "coordinates": [1.5, 2.5] }, "properties": { "seed_id": 4 } },
                { "type": "Feature", "geometry": { "type": "Polygon", "coordinates": [[[0, 0], [2, 0], [2, 2], [0, 2]]] }, "properties": { "cd_dist": "D1" } },
                { "type": "Feature", "geometry": null, "properties": null }
            ]
        })).unwrap();

        let features = read_features(file.path()).unwrap();

        assert_eq!(features.len(), 3);
        assert_eq!(features[0].geometry, Some(Geometry::Point(Point::new(1.5, 2.5))));
        assert_eq!(features[0].count("seed_id").unwrap(), 4);

        let Some(Geometry::Area(shape)) = &features[1].geometry else { panic!("expected a polygon") };
        assert_eq!(shape.0[0].exterior().0.len(), 5);
        assert!((shape.unsigned_area() - 4.0).abs() < 1e-9);
        assert_eq!(features[1].text("cd_dist").unwrap(), "D1");

        assert!(features[2].geometry.is_none());
    }

    #[test]
    fn rejects_unsupported_geometry() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", json!({
            "type": "FeatureCollection",
            "features": [{ "type": "Feature", "geometry": { "type": "LineString", "coordinates": [[0, 0], [1, 1]] }, "properties": {} }]
        })).unwrap();

        assert!(read_features(file.path()).is_err());
    }

    #[test]
    fn written_collection_keeps_holes_and_full_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("units.geojson");

        let long = "x".repeat(300);
        let mut table = Table::new(vec![Column::text("cd_sectors", 255), Column::integer("num_dom")]);
        table.push(
            MultiPolygon(vec![polygon!(
                exterior: [(x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 10.0), (x: 0.0, y: 10.0)],
                interiors: [[(x: 2.0, y: 2.0), (x: 4.0, y: 2.0), (x: 4.0, y: 4.0), (x: 2.0, y: 4.0)]],
            )]),
            vec![Attr::Text(long.clone()), Attr::Number(12.0)],
        );
        write_table(&path, &table).unwrap();

        let features = read_features(&path).unwrap();
        assert_eq!(features[0].text("cd_sectors").unwrap(), long);
        assert_eq!(features[0].count("num_dom").unwrap(), 12);
        let Some(Geometry::Area(shape)) = &features[0].geometry else { panic!("expected a polygon") };
        assert_eq!(shape.0[0].interiors().len(), 1);
    }
}
