//! Read-only spatial index over caller features.
//!
//! [`PrTreeIndex`] is built once from a finite collection of features and an
//! envelope extractor, then answers envelope-intersection range queries. It
//! never changes after construction, so a shared reference can be queried from
//! any number of threads at once.
//!
//! ```rust
//! use georewrite::PrTreeIndex;
//! use geo::{Geometry, Point};
//!
//! let cities = vec![("Paris", 2.35, 48.85), ("Berlin", 13.40, 52.52)];
//! let index = PrTreeIndex::from_geometries(cities, |(_, x, y)| {
//!     Some(Geometry::Point(Point::new(*x, *y)))
//! })?;
//!
//! let mut hits = Vec::new();
//! index.query_env_intersect(0.0, 40.0, 10.0, 50.0, |(name, _, _)| hits.push(*name))?;
//! assert_eq!(hits, vec!["Paris"]);
//! # Ok::<(), georewrite::GeoRewriteError>(())
//! ```

pub mod envelope;
pub mod leaf;
pub mod prtree;

use crate::error::{GeoRewriteError, Result};
use envelope::{Envelope, envelope_corners};
use geo::{Coord, Geometry};
use leaf::{Leaf, LeafConverter};
use prtree::{Mbr, PackedPrTree, branch_factor};
use std::borrow::Borrow;

/// Packed priority R-tree keyed by feature envelopes.
#[derive(Debug, Clone)]
pub struct PrTreeIndex<T> {
    tree: PackedPrTree<Leaf<T>>,
}

impl<T> PrTreeIndex<T> {
    /// Builds the index, asking `extract` once per feature for its envelope corners.
    ///
    /// Features with an empty corner sequence are skipped. Construction fails on
    /// the first extractor error, unsupported corner count, or non-finite
    /// coordinate.
    pub fn try_new<I, F, C, E>(features: I, mut extract: F) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        F: FnMut(&T) -> std::result::Result<C, E>,
        C: AsRef<[Coord<f64>]>,
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let features = features.into_iter();
        let mut leaves = Vec::with_capacity(features.size_hint().0);
        let mut skipped = 0usize;

        for feature in features {
            let corners = extract(&feature).map_err(GeoRewriteError::extractor)?;
            match Envelope::from_corners(corners.as_ref())? {
                Some(envelope) => leaves.push(Leaf::new(feature, envelope)),
                None => skipped += 1,
            }
        }

        Ok(Self::from_leaves(leaves, skipped))
    }

    /// Builds the index from each feature's geometry.
    ///
    /// `None` and empty geometries leave the feature out of the index.
    pub fn from_geometries<I, F, G>(features: I, mut geometry: F) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        F: FnMut(&T) -> Option<G>,
        G: Borrow<Geometry<f64>>,
    {
        Self::try_new(features, |feature| {
            let corners = match geometry(feature) {
                Some(geom) => envelope_corners(geom.borrow()),
                None => Vec::new(),
            };
            Ok::<_, GeoRewriteError>(corners)
        })
    }

    fn from_leaves(leaves: Vec<Leaf<T>>, skipped: usize) -> Self {
        let b = branch_factor(leaves.len());
        let tree = PackedPrTree::load(&LeafConverter, b, leaves);
        log::debug!(
            "Built PR-tree index: {} leaves, {} empty skipped, branch factor {}, height {}",
            tree.len(),
            skipped,
            tree.branch_factor(),
            tree.height()
        );
        Self { tree }
    }

    /// Number of indexed features.
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    pub fn branch_factor(&self) -> usize {
        self.tree.branch_factor()
    }

    pub fn height(&self) -> usize {
        self.tree.height()
    }

    /// Envelope covering every indexed feature.
    pub fn bounds(&self) -> Option<Envelope> {
        self.tree.bounds().map(|m| Envelope::from_bounds(m.min, m.max))
    }

    /// Calls `visitor` once for every feature whose envelope intersects the
    /// query rectangle. Touching boundaries count as intersecting.
    ///
    /// # Errors
    ///
    /// Returns [`GeoRewriteError::InvalidQuery`] when a bound is not finite or
    /// a minimum exceeds its maximum; the visitor is not called in that case.
    pub fn query_env_intersect<V>(
        &self,
        xmin: f64,
        ymin: f64,
        xmax: f64,
        ymax: f64,
        mut visitor: V,
    ) -> Result<()>
    where
        V: FnMut(&T),
    {
        self.try_query_env_intersect(xmin, ymin, xmax, ymax, |feature| {
            visitor(feature);
            Ok::<(), GeoRewriteError>(())
        })
    }

    /// Like [`query_env_intersect`](Self::query_env_intersect), but the visitor
    /// may abort the query by returning an error, which is handed back unchanged.
    pub fn try_query_env_intersect<V, E>(
        &self,
        xmin: f64,
        ymin: f64,
        xmax: f64,
        ymax: f64,
        mut visitor: V,
    ) -> std::result::Result<(), E>
    where
        V: FnMut(&T) -> std::result::Result<(), E>,
        E: From<GeoRewriteError>,
    {
        let query = query_mbr(xmin, ymin, xmax, ymax)?;
        self.tree
            .find(&query, &mut |leaf: &Leaf<T>| visitor(leaf.feature()))
    }

    /// Collects the features intersecting `envelope` in traversal order.
    pub fn query(&self, envelope: &Envelope) -> Vec<&T> {
        let query = Mbr::new(
            envelope.min_x(),
            envelope.min_y(),
            envelope.max_x(),
            envelope.max_y(),
        );
        let mut hits = Vec::new();
        let _ = self.tree.find::<std::convert::Infallible, _>(&query, &mut |leaf| {
            hits.push(leaf.feature());
            Ok(())
        });
        hits
    }
}

fn query_mbr(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Result<Mbr> {
    if ![xmin, ymin, xmax, ymax].iter().all(|v| v.is_finite()) {
        return Err(GeoRewriteError::InvalidQuery(format!(
            "bounds must be finite, got ({xmin}, {ymin}, {xmax}, {ymax})"
        )));
    }
    if xmin > xmax || ymin > ymax {
        return Err(GeoRewriteError::InvalidQuery(format!(
            "inverted bounds ({xmin}, {ymin}, {xmax}, {ymax})"
        )));
    }
    Ok(Mbr::new(xmin, ymin, xmax, ymax))
}
