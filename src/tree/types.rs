//! Small value types shared by the tree growing code.
use std::{fmt, cmp, ops};

use crate::dataset::FeatureMatrix;


/// Struct `Depth` is the depth of a node.
/// The root node has depth `1`.
/// This is just a wrapper for `usize`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[repr(transparent)]
pub struct Depth(usize);


impl Depth {
    /// The depth of a root node.
    #[inline]
    pub fn root() -> Self {
        Self(1)
    }


    /// Returns the depth as `usize`.
    #[inline]
    pub fn get(&self) -> usize {
        self.0
    }
}


impl fmt::Display for Depth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let depth = self.0;
        write!(f, "{depth}")
    }
}


impl From<usize> for Depth {
    fn from(depth: usize) -> Self {
        Self(depth)
    }
}


impl ops::Add<usize> for Depth {
    type Output = Self;
    /// The addition saturates at `usize::MAX`.
    #[inline]
    fn add(self, other: usize) -> Self::Output {
        Self(self.0.saturating_add(other))
    }
}


impl cmp::PartialEq<usize> for Depth {
    #[inline]
    fn eq(&self, rhs: &usize) -> bool {
        self.0.eq(rhs)
    }
}


impl cmp::PartialOrd<usize> for Depth {
    #[inline]
    fn partial_cmp(&self, other: &usize) -> Option<cmp::Ordering> {
        self.0.partial_cmp(other)
    }
}


/// The output of the function `split` of `Splitter`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeftRight {
    /// `value <= threshold`
    Left,
    /// `value > threshold`
    Right,
}


/// A pair of feature and threshold.
/// An observation goes left iff its value is at most the threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct Splitter {
    pub(crate) feature: String,
    pub(crate) index: usize,
    pub(crate) threshold: f64,
}


impl Splitter {
    /// Construct a splitter on the `index`-th feature, named `name`.
    #[inline]
    pub fn new(name: &str, index: usize, threshold: f64) -> Self {
        let feature = name.to_string();
        Self { feature, index, threshold, }
    }


    /// Returns the feature name.
    pub fn feature(&self) -> &str {
        &self.feature
    }


    /// Returns the column position of the feature.
    pub fn index(&self) -> usize {
        self.index
    }


    /// Returns the threshold.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }


    /// Defines the splitting.
    #[inline]
    pub fn split(&self, matrix: &FeatureMatrix<'_>, row: usize) -> LeftRight {
        let value = matrix.value(self.index, row);

        if value <= self.threshold { LeftRight::Left } else { LeftRight::Right }
    }
}
