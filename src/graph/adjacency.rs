use geo::{BoundingRect, MultiPolygon};

use crate::geom::{envelope_of, GeometryEngine, SpatialIndex};
use crate::graph::Graph;

/// Build the sector adjacency graph of one district.
///
/// The R-tree prunes candidate pairs to those whose bounding boxes (padded by the
/// engine's adjacency tolerance) intersect; `shares_boundary` decides each pair
/// exactly. Each unordered pair is tested once.
pub(crate) fn build_adjacency(shapes: &[&MultiPolygon<f64>], index: &SpatialIndex, engine: &dyn GeometryEngine) -> Graph {
    let mut adj_list: Vec<Vec<u32>> = vec![Vec::new(); shapes.len()];
    let pad = engine.adjacency_padding();

    for (i, shape) in shapes.iter().enumerate() {
        let Some(rect) = shape.bounding_rect() else { continue };

        for j in index.query_envelope(&envelope_of(&rect, pad)) {
            if j <= i { continue } // check each unordered pair once

            if engine.shares_boundary(shape, shapes[j]) {
                adj_list[i].push(j as u32);
                adj_list[j].push(i as u32);
            }
        }
    }

    Graph::new(shapes.len(), &adj_list)
}
