use std::f64::consts::PI;

use geo::{LineString, Point, Polygon};

/// Circular buffer around a point, approximated by a regular polygon with `segments` vertices.
pub(crate) fn circle(center: Point<f64>, radius: f64, segments: usize) -> Polygon<f64> {
    let n = segments.max(4);
    let r = radius.abs();

    let mut coords = (0..n)
        .map(|i| {
            let angle = 2.0 * PI * i as f64 / n as f64;
            (center.x() + r * angle.cos(), center.y() + r * angle.sin())
        })
        .collect::<Vec<_>>();
    coords.push(coords[0]);

    Polygon::new(LineString::from(coords), vec![])
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Area;

    #[test]
    fn circle_area_approximates_pi_r_squared() {
        let polygon = circle(Point::new(0.0, 0.0), 10.0, 64);
        let expected = PI * 100.0;
        let error = (polygon.unsigned_area() - expected).abs() / expected;
        assert!(error < 0.01, "circle area error {:.2}%", error * 100.0);
    }

    #[test]
    fn circle_ring_is_closed() {
        let polygon = circle(Point::new(5.0, 5.0), 1.0, 32);
        let ring = polygon.exterior();
        assert_eq!(ring.0.len(), 33);
        assert_eq!(ring.0.first(), ring.0.last());
    }

    #[test]
    fn tiny_segment_counts_are_clamped() {
        let polygon = circle(Point::new(0.0, 0.0), 1.0, 2);
        assert_eq!(polygon.exterior().0.len(), 5);
    }
}
