//! Default values of the growth parameters.

/// Default number of trees in a forest.
pub const DEFAULT_N_TREES: usize = 500;
/// Default minimum number of (in-bag) observations in a child node.
pub const DEFAULT_MIN_NODE_SIZE: usize = 1;
/// Fraction of observations drawn when sampling without replacement.
pub const DEFAULT_SELECTION_FRACTION: f64 = 0.632;
/// Default interval (in trees) between progress lines.
pub const DEFAULT_PRINT_EVERY: usize = 50;

/// A split is accepted only when its criterion is below this value.
pub(crate) const IMPURITY_UPPER_BOUND: f64 = 1.0;

/// Name of the positive class in positive-unlabelled learning.
pub const POSITIVE_CLASS: &str = "Positive";
/// Name of the unlabelled class in positive-unlabelled learning.
pub const UNLABELLED_CLASS: &str = "Unlabelled";
