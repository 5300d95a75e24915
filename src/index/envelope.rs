//! Axis-aligned envelopes and the corner-sequence normalization that feeds the index.
//!
//! Extractors report an envelope as the corner coordinates of its bounding shape,
//! following the convention of common geometry libraries:
//!
//! - 0 corners: empty geometry, the feature is not indexed
//! - 1 corner: a point
//! - 2 corners: a horizontal or vertical segment
//! - 5 corners: a closed rectangle ring
//!
//! Any other count is rejected.

use crate::error::{GeoRewriteError, Result};
use geo::{BoundingRect, Coord, Geometry};

/// A 2D axis-aligned rectangle with closed bounds.
///
/// Corners are stored exactly as given; `width` and `height` are derived.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Envelope {
    min: [f64; 2],
    max: [f64; 2],
}

impl Envelope {
    /// Builds an envelope from its two opposite corners.
    ///
    /// The corners may be given in any order. Coordinates must be finite.
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Result<Self> {
        for (x, y) in [(x0, y0), (x1, y1)] {
            if !x.is_finite() || !y.is_finite() {
                return Err(GeoRewriteError::NonFiniteCoordinate { x, y });
            }
        }
        Ok(Self {
            min: [x0.min(x1), y0.min(y1)],
            max: [x0.max(x1), y0.max(y1)],
        })
    }

    /// Envelope over bounds that were already validated as finite and ordered.
    pub(crate) fn from_bounds(min: [f64; 2], max: [f64; 2]) -> Self {
        debug_assert!(min[0] <= max[0] && min[1] <= max[1]);
        Self { min, max }
    }

    /// Zero-extent envelope at a point.
    pub fn point(x: f64, y: f64) -> Result<Self> {
        Self::new(x, y, x, y)
    }

    /// Normalizes an extractor's corner sequence.
    ///
    /// Returns `Ok(None)` for an empty envelope.
    ///
    /// # Examples
    ///
    /// ```
    /// use georewrite::Envelope;
    /// use geo::coord;
    ///
    /// let seg = Envelope::from_corners(&[coord! { x: 4.0, y: 1.0 }, coord! { x: 2.0, y: 1.0 }])
    ///     .unwrap()
    ///     .unwrap();
    /// assert_eq!(seg.min_x(), 2.0);
    /// assert_eq!(seg.width(), 2.0);
    /// assert_eq!(seg.height(), 0.0);
    ///
    /// assert!(Envelope::from_corners(&[]).unwrap().is_none());
    /// assert!(Envelope::from_corners(&[coord! { x: 0.0, y: 0.0 }; 3]).is_err());
    /// ```
    pub fn from_corners(corners: &[Coord<f64>]) -> Result<Option<Self>> {
        match corners {
            [] => Ok(None),
            [p] => Self::point(p.x, p.y).map(Some),
            [a, b] => Self::new(a.x, a.y, b.x, b.y).map(Some),
            [first, rest @ ..] if corners.len() == 5 => {
                if let Some(bad) = corners
                    .iter()
                    .find(|c| !c.x.is_finite() || !c.y.is_finite())
                {
                    return Err(GeoRewriteError::NonFiniteCoordinate { x: bad.x, y: bad.y });
                }
                // Scanning the whole ring also accepts rings that do not start
                // at the lower-left corner.
                let (mut min, mut max) = (*first, *first);
                for c in rest {
                    min.x = min.x.min(c.x);
                    min.y = min.y.min(c.y);
                    max.x = max.x.max(c.x);
                    max.y = max.y.max(c.y);
                }
                Self::new(min.x, min.y, max.x, max.y).map(Some)
            }
            _ => Err(GeoRewriteError::InvalidEnvelope {
                corners: corners.len(),
            }),
        }
    }

    pub fn min_x(&self) -> f64 {
        self.min[0]
    }

    pub fn min_y(&self) -> f64 {
        self.min[1]
    }

    pub fn max_x(&self) -> f64 {
        self.max[0]
    }

    pub fn max_y(&self) -> f64 {
        self.max[1]
    }

    /// Horizontal extent. May overflow to infinity for corners near `f64::MAX`.
    pub fn width(&self) -> f64 {
        self.max[0] - self.min[0]
    }

    pub fn height(&self) -> f64 {
        self.max[1] - self.min[1]
    }

    pub fn is_point(&self) -> bool {
        self.min == self.max
    }

    /// Closed-interval intersection: touching edges and corners count.
    pub fn intersects(&self, other: &Envelope) -> bool {
        self.min_x() <= other.max_x()
            && other.min_x() <= self.max_x()
            && self.min_y() <= other.max_y()
            && other.min_y() <= self.max_y()
    }

    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.min_x() && x <= self.max_x() && y >= self.min_y() && y <= self.max_y()
    }
}

/// Corner sequence of a geometry's envelope.
///
/// Mirrors how geometry libraries report an envelope as a shape: nothing for an
/// empty geometry, a single point when the bounds collapse, the two endpoints of
/// a segment when one extent is zero, otherwise a closed ring starting at the
/// lower-left corner with the upper-right corner at index 2.
pub fn envelope_corners(geometry: &Geometry<f64>) -> Vec<Coord<f64>> {
    let Some(rect) = geometry.bounding_rect() else {
        return Vec::new();
    };
    let (min, max) = (rect.min(), rect.max());

    if min == max {
        vec![min]
    } else if min.x == max.x || min.y == max.y {
        vec![min, max]
    } else {
        vec![
            min,
            Coord { x: min.x, y: max.y },
            max,
            Coord { x: max.x, y: min.y },
            min,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{LineString, Point, Polygon, coord};

    #[test]
    fn test_point_corner() {
        let env = Envelope::from_corners(&[coord! { x: 10.0, y: 10.0 }])
            .unwrap()
            .unwrap();
        assert!(env.is_point());
        assert_eq!(env.min_x(), 10.0);
        assert_eq!(env.max_y(), 10.0);
    }

    #[test]
    fn test_segment_corners_any_order() {
        let env = Envelope::from_corners(&[coord! { x: 3.0, y: 7.0 }, coord! { x: 3.0, y: 2.0 }])
            .unwrap()
            .unwrap();
        assert_eq!(env.min_y(), 2.0);
        assert_eq!(env.height(), 5.0);
        assert_eq!(env.width(), 0.0);
    }

    #[test]
    fn test_ring_corners() {
        let ring = [
            coord! { x: 1.0, y: 2.0 },
            coord! { x: 1.0, y: 6.0 },
            coord! { x: 4.0, y: 6.0 },
            coord! { x: 4.0, y: 2.0 },
            coord! { x: 1.0, y: 2.0 },
        ];
        let env = Envelope::from_corners(&ring).unwrap().unwrap();
        assert_eq!((env.min_x(), env.min_y()), (1.0, 2.0));
        assert_eq!((env.width(), env.height()), (3.0, 4.0));
    }

    #[test]
    fn test_invalid_corner_counts() {
        for n in [3usize, 4, 6] {
            let corners = vec![coord! { x: 0.0, y: 0.0 }; n];
            match Envelope::from_corners(&corners) {
                Err(GeoRewriteError::InvalidEnvelope { corners }) => assert_eq!(corners, n),
                other => panic!("expected InvalidEnvelope for {n} corners, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_non_finite_rejected() {
        assert!(matches!(
            Envelope::from_corners(&[coord! { x: f64::NAN, y: 0.0 }]),
            Err(GeoRewriteError::NonFiniteCoordinate { .. })
        ));
        assert!(Envelope::new(0.0, 0.0, f64::INFINITY, 1.0).is_err());
    }

    #[test]
    fn test_touching_envelopes_intersect() {
        let a = Envelope::new(0.0, 0.0, 1.0, 1.0).unwrap();
        let b = Envelope::new(1.0, 1.0, 2.0, 2.0).unwrap();
        let c = Envelope::new(1.0001, 0.0, 2.0, 2.0).unwrap();
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn test_envelope_corners_by_shape() {
        let empty = Geometry::LineString(LineString::<f64>::new(vec![]));
        assert!(envelope_corners(&empty).is_empty());

        let point = Geometry::Point(Point::new(5.0, 6.0));
        assert_eq!(envelope_corners(&point), vec![coord! { x: 5.0, y: 6.0 }]);

        let horizontal = Geometry::LineString(LineString::from(vec![(0.0, 1.0), (3.0, 1.0)]));
        assert_eq!(envelope_corners(&horizontal).len(), 2);

        let square = Geometry::Polygon(Polygon::new(
            LineString::from(vec![(0.0, 0.0), (2.0, 0.0), (2.0, 3.0), (0.0, 0.0)]),
            vec![],
        ));
        let corners = envelope_corners(&square);
        assert_eq!(corners.len(), 5);
        assert_eq!(corners[2], coord! { x: 2.0, y: 3.0 });
    }

    #[test]
    fn test_max_corner_is_exact() {
        let (x0, x1) = (-1360.0155501079203, -222.77699102169882);
        let env = Envelope::new(x0, 0.0, x1, 0.0).unwrap();
        assert_eq!(env.min_x(), x0);
        assert_eq!(env.max_x(), x1);

        let edge = Envelope::new(x1, 0.0, x1 + 1.0, 1.0).unwrap();
        assert!(env.intersects(&edge));
        assert!(env.contains_point(x1, 0.0));
    }

    #[test]
    fn test_extreme_finite_corners() {
        let env = Envelope::new(-1e308, -1e308, 1e308, 1e308).unwrap();
        assert_eq!(env.max_x(), 1e308);
        assert_eq!(env.width(), f64::INFINITY);
        assert!(env.intersects(&Envelope::point(0.0, 0.0).unwrap()));
    }
}
