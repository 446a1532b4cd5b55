use geo::{BoundingRect, Contains, MultiPolygon, Point, Polygon, Rect};
use rstar::{RTree, AABB};

use crate::geom::envelope::{cover, envelope_of, sector_envelope, SectorEnvelope};

/// R-tree over the bounding boxes of one district's sectors.
///
/// The index is a candidate filter: every query answers with local indices whose
/// bounding box intersects the query envelope, and callers confirm with an exact test.
#[derive(Debug, Clone)]
pub(crate) struct SpatialIndex {
    rtree: RTree<SectorEnvelope>,
    extent: Option<Rect<f64>>,
}

impl SpatialIndex {
    /// Bulk-load an index over `shapes`; the position in the slice is the local index.
    /// Shapes without a bounding rectangle (empty) are left out.
    pub(crate) fn new<'a>(shapes: impl IntoIterator<Item = &'a MultiPolygon<f64>>) -> Self {
        let rects = shapes.into_iter().enumerate()
            .filter_map(|(i, shape)| Some((i, shape.bounding_rect()?)))
            .collect::<Vec<_>>();

        let extent = rects.iter().map(|&(_, rect)| rect).reduce(cover);
        let entries = rects.iter().map(|(i, rect)| sector_envelope(*i, rect)).collect();

        Self { rtree: RTree::bulk_load(entries), extent }
    }

    /// Number of indexed shapes.
    #[inline] pub(crate) fn len(&self) -> usize { self.rtree.size() }

    /// Bounding rectangle of every indexed shape.
    #[inline] pub(crate) fn extent(&self) -> Option<Rect<f64>> { self.extent }

    /// Local indices whose bounding box intersects `envelope`, ascending.
    pub(crate) fn query_envelope(&self, envelope: &AABB<[f64; 2]>) -> Vec<usize> {
        let mut hits = self.rtree.locate_in_envelope_intersecting(envelope)
            .map(|entry| entry.data)
            .collect::<Vec<_>>();
        hits.sort_unstable();
        hits
    }

    /// Local indices whose bounding box intersects the bounding box of `polygon`, ascending.
    pub(crate) fn query(&self, polygon: &Polygon<f64>) -> Vec<usize> {
        match polygon.bounding_rect() {
            Some(rect) => self.query_envelope(&envelope_of(&rect, 0.0)),
            None => Vec::new(),
        }
    }

    /// Find the first shape (lowest local index) containing `point`.
    pub(crate) fn locate(&self, point: Point<f64>, shapes: &[&MultiPolygon<f64>]) -> Option<usize> {
        let envelope = AABB::from_corners([point.x(), point.y()], [point.x(), point.y()]);
        self.query_envelope(&envelope).into_iter()
            .find(|&i| shapes[i].contains(&point))
    }

    /// Furthest distance from `point` to a corner of the index extent.
    /// A buffer of this radius covers every indexed shape.
    pub(crate) fn reach(&self, point: Point<f64>) -> f64 {
        let Some(extent) = self.extent else { return 0.0 };
        [
            (extent.min().x, extent.min().y),
            (extent.min().x, extent.max().y),
            (extent.max().x, extent.min().y),
            (extent.max().x, extent.max().y),
        ]
        .into_iter()
        .map(|(x, y)| (x - point.x()).hypot(y - point.y()))
        .fold(0.0, f64::max)
    }
}
