use geo::{Coord, LineString, MultiPolygon, Polygon};
use shapefile as shp;

/// Convert shapefile polygon rings to a geo::MultiPolygon<f64>.
///
/// Shapefiles store each outer ring followed by its holes; `xy` projects a
/// point of any dimension to the plane.
pub(crate) fn rings_to_geo<P>(rings: &[shp::PolygonRing<P>], xy: impl Fn(&P) -> (f64, f64)) -> MultiPolygon<f64> {
    let to_line = |points: &[P]| {
        let mut coords = points.iter().map(|p| { let (x, y) = xy(p); Coord { x, y } }).collect::<Vec<_>>();
        if coords.first() != coords.last() {
            coords.push(coords[0]);
        }
        LineString(coords)
    };

    let mut polygons: Vec<Polygon<f64>> = Vec::new();
    let mut exterior: Option<LineString<f64>> = None;
    let mut holes: Vec<LineString<f64>> = Vec::new();

    for ring in rings {
        match ring {
            shp::PolygonRing::Outer(points) => {
                if let Some(ext) = exterior.take() {
                    polygons.push(Polygon::new(ext, std::mem::take(&mut holes)));
                }
                exterior = Some(to_line(points));
            }
            shp::PolygonRing::Inner(points) => holes.push(to_line(points)),
        }
    }
    if let Some(ext) = exterior {
        polygons.push(Polygon::new(ext, holes));
    }

    MultiPolygon(polygons)
}

/// Convert shapefile::Polygon to geo::MultiPolygon<f64>
#[inline]
pub(crate) fn shp_to_geo(p: &shp::Polygon) -> MultiPolygon<f64> {
    rings_to_geo(p.rings(), |pt| (pt.x, pt.y))
}

/// Convert geo::MultiPolygon<f64> to shapefile::Polygon
pub(crate) fn geo_to_shp(mp: &MultiPolygon<f64>) -> shp::Polygon {
    /// Signed area of a closed ring (negative for clockwise)
    fn signed_area(pts: &[shp::Point]) -> f64 {
        pts.windows(2).map(|w| w[0].x * w[1].y - w[1].x * w[0].y).sum::<f64>() / 2.0
    }

    let points = |ring: &LineString<f64>| {
        let mut pts = ring.coords().map(|c| shp::Point { x: c.x, y: c.y }).collect::<Vec<_>>();
        if let (Some(&first), Some(&last)) = (pts.first(), pts.last()) {
            if first.x != last.x || first.y != last.y {
                pts.push(first);
            }
        }
        pts
    };

    // Shapefile ordering: [outer CW, hole CCW, hole CCW, ..., next outer CW, ...]
    let mut rings = Vec::new();
    for polygon in &mp.0 {
        let mut outer = points(polygon.exterior());
        if signed_area(&outer) > 0.0 {
            outer.reverse();
        }
        rings.push(shp::PolygonRing::Outer(outer));

        for hole in polygon.interiors() {
            let mut inner = points(hole);
            if signed_area(&inner) < 0.0 {
                inner.reverse();
            }
            rings.push(shp::PolygonRing::Inner(inner));
        }
    }

    shp::Polygon::with_rings(rings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, Area};

    #[test]
    fn orientation_follows_shapefile_convention() {
        let square = MultiPolygon(vec![polygon!(
            exterior: [(x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 10.0), (x: 0.0, y: 10.0)],
            interiors: [[(x: 2.0, y: 2.0), (x: 2.0, y: 4.0), (x: 4.0, y: 4.0), (x: 4.0, y: 2.0)]],
        )]);

        let shape = geo_to_shp(&square);
        let rings = shape.rings();
        assert_eq!(rings.len(), 2);
        assert!(matches!(rings[0], shp::PolygonRing::Outer(_)));
        assert!(matches!(rings[1], shp::PolygonRing::Inner(_)));

        let back = shp_to_geo(&shape);
        assert_eq!(back.0.len(), 1);
        assert_eq!(back.0[0].interiors().len(), 1);
        assert!((back.unsigned_area() - 96.0).abs() < 1e-9);
    }

    #[test]
    fn each_outer_ring_starts_a_polygon() {
        let two = MultiPolygon(vec![
            polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 1.0)],
            polygon![(x: 5.0, y: 0.0), (x: 6.0, y: 0.0), (x: 6.0, y: 1.0), (x: 5.0, y: 1.0)],
        ]);

        let back = shp_to_geo(&geo_to_shp(&two));
        assert_eq!(back.0.len(), 2);
        assert!((back.unsigned_area() - 2.0).abs() < 1e-9);
    }
}
