use geo::{Coord, Rect};
use rstar::primitives::{GeomWithData, Rectangle};
use rstar::AABB;

/// R-tree entry: a sector's bounding rectangle tagged with its local index.
pub(crate) type SectorEnvelope = GeomWithData<Rectangle<[f64; 2]>, usize>;

pub(crate) fn sector_envelope(local: usize, rect: &Rect<f64>) -> SectorEnvelope {
    GeomWithData::new(Rectangle::from_aabb(envelope_of(rect, 0.0)), local)
}

/// Convert a rectangle to an R-tree envelope, padded by `pad` on every side.
#[inline]
pub(crate) fn envelope_of(rect: &Rect<f64>, pad: f64) -> AABB<[f64; 2]> {
    let (lo, hi) = (rect.min(), rect.max());
    AABB::from_corners([lo.x - pad, lo.y - pad], [hi.x + pad, hi.y + pad])
}

/// Smallest rectangle covering both `a` and `b`.
pub(crate) fn cover(a: Rect<f64>, b: Rect<f64>) -> Rect<f64> {
    Rect::new(
        Coord { x: a.min().x.min(b.min().x), y: a.min().y.min(b.min().y) },
        Coord { x: a.max().x.max(b.max().x), y: a.max().y.max(b.max().y) },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::coord;
    use rstar::RTreeObject;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Rect<f64> {
        Rect::new(coord! { x: x0, y: y0 }, coord! { x: x1, y: y1 })
    }

    #[test]
    fn entry_keeps_local_index_and_extent() {
        let entry = sector_envelope(3, &rect(1.0, 2.0, 4.0, 6.0));
        assert_eq!(entry.data, 3);
        assert_eq!(entry.envelope().lower(), [1.0, 2.0]);
        assert_eq!(entry.envelope().upper(), [4.0, 6.0]);
    }

    #[test]
    fn padding_grows_every_side() {
        let envelope = envelope_of(&rect(0.0, 0.0, 1.0, 1.0), 0.5);
        assert_eq!(envelope.lower(), [-0.5, -0.5]);
        assert_eq!(envelope.upper(), [1.5, 1.5]);
    }

    #[test]
    fn cover_spans_disjoint_rectangles() {
        let both = cover(rect(0.0, 0.0, 1.0, 1.0), rect(3.0, -2.0, 4.0, 0.5));
        assert_eq!(both, rect(0.0, -2.0, 4.0, 1.0));
    }
}
