use geo::algorithm::line_intersection::line_intersection;
use geo::{Area, Coord, Line, LineString, MultiPolygon};

/// Check that a sector polygon is usable: non-empty, finite, closed rings of at
/// least four coordinates, positive area and no self-intersecting ring.
pub(crate) fn check_polygon(shape: &MultiPolygon<f64>) -> Result<(), String> {
    if shape.0.is_empty() {
        return Err("empty geometry".to_string());
    }

    for (p, polygon) in shape.0.iter().enumerate() {
        for ring in std::iter::once(polygon.exterior()).chain(polygon.interiors()) {
            if ring.0.iter().any(|c| !(c.x.is_finite() && c.y.is_finite())) {
                return Err(format!("polygon {p} has non-finite coordinates"));
            }
            if ring.0.len() < 4 {
                return Err(format!("polygon {p} has a ring with {} coordinates", ring.0.len()));
            }
            if ring_self_intersects(ring) {
                return Err(format!("polygon {p} has a self-intersecting ring"));
            }
        }
    }

    if shape.unsigned_area() <= 0.0 {
        return Err("zero area".to_string());
    }

    Ok(())
}

/// Returns true if two non-consecutive segments of a closed ring touch or cross.
fn ring_self_intersects(ring: &LineString<f64>) -> bool {
    let mut coords: Vec<Coord<f64>> = ring.0.clone();
    coords.dedup();
    if coords.len() < 4 { return false }

    let segments = coords.windows(2)
        .map(|w| Line::new(w[0], w[1]))
        .collect::<Vec<_>>();
    let n = segments.len();

    for i in 0..n {
        for j in (i + 2)..n {
            // First and last segments share the closing vertex.
            if i == 0 && j == n - 1 { continue }
            if line_intersection(segments[i], segments[j]).is_some() {
                return true;
            }
        }
    }
    false
}
