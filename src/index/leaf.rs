//! Leaf records and the MBR adapter the tree builder reads them through.

use super::envelope::Envelope;
use std::hash::{Hash, Hasher};

/// One indexed feature together with its envelope.
///
/// Equality and hashing delegate to the feature alone.
#[derive(Debug, Clone)]
pub struct Leaf<T> {
    feature: T,
    envelope: Envelope,
}

impl<T> Leaf<T> {
    pub fn new(feature: T, envelope: Envelope) -> Self {
        Self { feature, envelope }
    }

    pub fn feature(&self) -> &T {
        &self.feature
    }

    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }
}

impl<T: PartialEq> PartialEq for Leaf<T> {
    fn eq(&self, other: &Self) -> bool {
        self.feature == other.feature
    }
}

impl<T: Eq> Eq for Leaf<T> {}

impl<T: Hash> Hash for Leaf<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.feature.hash(state);
    }
}

/// Per-axis bounds of an indexed item, as seen by the tree builder.
///
/// Axis 0 is X, axis 1 is Y.
pub trait MbrConverter<T> {
    fn dimensions(&self) -> usize;

    fn min(&self, axis: usize, item: &T) -> f64;

    fn max(&self, axis: usize, item: &T) -> f64;
}

/// Two-dimensional converter for [`Leaf`] records.
#[derive(Debug, Clone, Copy, Default)]
pub struct LeafConverter;

impl<T> MbrConverter<Leaf<T>> for LeafConverter {
    fn dimensions(&self) -> usize {
        2
    }

    fn min(&self, axis: usize, leaf: &Leaf<T>) -> f64 {
        match axis {
            0 => leaf.envelope.min_x(),
            1 => leaf.envelope.min_y(),
            _ => unreachable!("axis {axis} out of range for a 2D leaf"),
        }
    }

    fn max(&self, axis: usize, leaf: &Leaf<T>) -> f64 {
        match axis {
            0 => leaf.envelope.max_x(),
            1 => leaf.envelope.max_y(),
            _ => unreachable!("axis {axis} out of range for a 2D leaf"),
        }
    }
}
