use geo::{
    Area, BooleanOps, Closest, ClosestPoint, Contains, CoordsIter, InteriorPoint, Intersects,
    MultiPolygon, Point, Polygon, Relate,
};

use crate::config::{AdjacencyRule, Config};
use crate::geom::buffer;

/// Geometric capabilities needed by the aggregation algorithm.
///
/// Implementations are stateless apart from their parameters, so one engine can be
/// shared across districts processed in parallel.
pub trait GeometryEngine: Send + Sync {
    /// Exact intersection test; touching boundaries count as intersecting.
    fn intersects(&self, a: &MultiPolygon<f64>, b: &Polygon<f64>) -> bool;

    /// Dissolve `parts` into one shape, keeping interior holes.
    fn union(&self, parts: &[&MultiPolygon<f64>]) -> MultiPolygon<f64>;

    /// Circular buffer of `radius` around `center`.
    fn buffer(&self, center: Point<f64>, radius: f64) -> Polygon<f64>;

    /// Planar area.
    fn area(&self, shape: &MultiPolygon<f64>) -> f64;

    /// Planar distance between two points.
    fn distance(&self, a: Point<f64>, b: Point<f64>) -> f64;

    /// Planar distance from `point` to the nearest point of `shape`; zero inside it.
    fn distance_to_shape(&self, point: Point<f64>, shape: &MultiPolygon<f64>) -> f64;

    /// Every interior ring of `shape`, as a simple polygon.
    fn interior_rings(&self, shape: &MultiPolygon<f64>) -> Vec<Polygon<f64>>;

    /// Whether `a` and `b` are neighbors.
    fn shares_boundary(&self, a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> bool;

    /// Point-in-polygon test.
    fn contains(&self, shape: &Polygon<f64>, point: Point<f64>) -> bool;

    /// A point guaranteed to lie inside an areal shape.
    fn interior_point(&self, shape: &MultiPolygon<f64>) -> Option<Point<f64>>;

    /// Search padding to apply around bounding boxes when looking for neighbors.
    fn adjacency_padding(&self) -> f64 { 0.0 }
}

/// [`GeometryEngine`] backed by the `geo` crate.
#[derive(Debug, Clone)]
pub struct GeoEngine {
    rule: AdjacencyRule,
    tolerance: f64,
    segments: usize,
}

impl Default for GeoEngine {
    fn default() -> Self {
        Self::new(AdjacencyRule::Queen, 0.0, 64)
    }
}

impl GeoEngine {
    pub fn new(rule: AdjacencyRule, tolerance: f64, segments: usize) -> Self {
        Self { rule, tolerance, segments }
    }

    /// Engine parameterized by a run configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.adjacency_rule, config.adjacency_tolerance, config.buffer_segments)
    }

    /// Returns true if some vertex of `a` lies within the tolerance of `b`.
    fn within_tolerance(&self, a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> bool {
        a.coords_iter().any(|c| {
            let p = Point::from(c);
            match b.closest_point(&p) {
                Closest::Intersection(_) => true,
                Closest::SinglePoint(q) => self.distance(p, q) <= self.tolerance,
                Closest::Indeterminate => false,
            }
        })
    }
}

impl GeometryEngine for GeoEngine {
    #[inline]
    fn intersects(&self, a: &MultiPolygon<f64>, b: &Polygon<f64>) -> bool {
        a.intersects(b)
    }

    fn union(&self, parts: &[&MultiPolygon<f64>]) -> MultiPolygon<f64> {
        parts.iter()
            .map(|&shape| shape.clone())
            .reduce(|a, b| a.union(&b))
            .unwrap_or_else(|| MultiPolygon::new(vec![]))
    }

    #[inline]
    fn buffer(&self, center: Point<f64>, radius: f64) -> Polygon<f64> {
        buffer::circle(center, radius, self.segments)
    }

    #[inline]
    fn area(&self, shape: &MultiPolygon<f64>) -> f64 {
        shape.unsigned_area()
    }

    #[inline]
    fn distance(&self, a: Point<f64>, b: Point<f64>) -> f64 {
        (a.x() - b.x()).hypot(a.y() - b.y())
    }

    fn distance_to_shape(&self, point: Point<f64>, shape: &MultiPolygon<f64>) -> f64 {
        if shape.contains(&point) { return 0.0 }
        match shape.closest_point(&point) {
            Closest::Intersection(_) => 0.0,
            Closest::SinglePoint(q) => self.distance(point, q),
            Closest::Indeterminate => f64::INFINITY,
        }
    }

    fn interior_rings(&self, shape: &MultiPolygon<f64>) -> Vec<Polygon<f64>> {
        shape.0.iter()
            .flat_map(|polygon| polygon.interiors().iter())
            .map(|ring| Polygon::new(ring.clone(), vec![]))
            .collect()
    }

    fn shares_boundary(&self, a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> bool {
        let im = a.relate(b);

        // DE-9IM index 4 is Boundary/Boundary, index 0 is Interior/Interior.
        let exact = match self.rule {
            AdjacencyRule::Queen => im.is_intersects(),
            AdjacencyRule::Rook => {
                im.matches("****1****").unwrap_or(false) || im.matches("T********").unwrap_or(false)
            }
        };

        exact || (self.tolerance > 0.0 && (self.within_tolerance(a, b) || self.within_tolerance(b, a)))
    }

    #[inline]
    fn contains(&self, shape: &Polygon<f64>, point: Point<f64>) -> bool {
        shape.contains(&point)
    }

    #[inline]
    fn interior_point(&self, shape: &MultiPolygon<f64>) -> Option<Point<f64>> {
        shape.interior_point()
    }

    #[inline]
    fn adjacency_padding(&self) -> f64 { self.tolerance }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> MultiPolygon<f64> {
        MultiPolygon(vec![polygon![(x: x0, y: y0), (x: x1, y: y0), (x: x1, y: y1), (x: x0, y: y1)]])
    }

    #[test]
    fn queen_counts_shared_edges_and_corners() {
        let engine = GeoEngine::default();
        let a = rect(0.0, 0.0, 1.0, 1.0);
        assert!(engine.shares_boundary(&a, &rect(1.0, 0.0, 2.0, 1.0)));
        assert!(engine.shares_boundary(&a, &rect(1.0, 1.0, 2.0, 2.0)));
        assert!(!engine.shares_boundary(&a, &rect(1.5, 0.0, 2.5, 1.0)));
    }

    #[test]
    fn rook_ignores_corner_contact() {
        let engine = GeoEngine::new(AdjacencyRule::Rook, 0.0, 64);
        let a = rect(0.0, 0.0, 1.0, 1.0);
        assert!(engine.shares_boundary(&a, &rect(1.0, 0.0, 2.0, 1.0)));
        assert!(!engine.shares_boundary(&a, &rect(1.0, 1.0, 2.0, 2.0)));
    }

    #[test]
    fn tolerance_bridges_near_coincident_edges() {
        let a = rect(0.0, 0.0, 1.0, 1.0);
        let b = rect(1.0 + 1e-9, 0.0, 2.0, 1.0);
        assert!(!GeoEngine::default().shares_boundary(&a, &b));
        assert!(GeoEngine::new(AdjacencyRule::Queen, 1e-6, 64).shares_boundary(&a, &b));
    }

    #[test]
    fn bounding_box_overlap_alone_is_not_adjacency() {
        // An L-shaped sector whose bbox covers the square, without touching it.
        let l_shape = MultiPolygon(vec![polygon![
            (x: 0.0, y: 0.0), (x: 3.0, y: 0.0), (x: 3.0, y: 1.0),
            (x: 1.0, y: 1.0), (x: 1.0, y: 3.0), (x: 0.0, y: 3.0),
        ]]);
        let square = rect(2.0, 2.0, 3.0, 3.0);
        assert!(!GeoEngine::default().shares_boundary(&l_shape, &square));
    }

    #[test]
    fn union_of_ring_exposes_hole() {
        let engine = GeoEngine::default();
        let parts = [
            rect(0.0, 0.0, 3.0, 1.0),
            rect(0.0, 2.0, 3.0, 3.0),
            rect(0.0, 1.0, 1.0, 2.0),
            rect(2.0, 1.0, 3.0, 2.0),
        ];
        let union = engine.union(&parts.iter().collect::<Vec<_>>());

        assert_eq!(union.0.len(), 1);
        let holes = engine.interior_rings(&union);
        assert_eq!(holes.len(), 1);
        assert!((holes[0].unsigned_area() - 1.0).abs() < 1e-9);
        assert!((engine.area(&union) - 8.0).abs() < 1e-9);
        assert!(engine.contains(&holes[0], Point::new(1.5, 1.5)));
    }

    #[test]
    fn union_of_nothing_is_empty() {
        assert!(GeoEngine::default().union(&[]).0.is_empty());
    }

    #[test]
    fn distance_is_euclidean() {
        let engine = GeoEngine::default();
        assert!((engine.distance(Point::new(0.0, 0.0), Point::new(3.0, 4.0)) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn distance_to_shape_is_zero_inside() {
        let engine = GeoEngine::default();
        let shape = rect(1.0, 0.0, 2.0, 1.0);
        assert_eq!(engine.distance_to_shape(Point::new(1.5, 0.5), &shape), 0.0);
        assert!((engine.distance_to_shape(Point::new(0.0, 0.5), &shape) - 1.0).abs() < 1e-12);
        assert!((engine.distance_to_shape(Point::new(4.0, 4.0), &shape) - 13f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn buffer_intersects_nearby_sector_only() {
        let engine = GeoEngine::default();
        let buffer = engine.buffer(Point::new(0.5, 0.5), 1.0);
        assert!(engine.intersects(&rect(1.0, 0.0, 2.0, 1.0), &buffer));
        assert!(!engine.intersects(&rect(5.0, 5.0, 6.0, 6.0), &buffer));
    }
}
