//! Error type shared by every part of the forest engine.
use polars::prelude::PolarsError;


/// Errors reported by dataset construction, growth control validation,
/// forest growth, prediction, and metric evaluation.
#[derive(Debug, thiserror::Error)]
pub enum ForestError {
    /// The type-tag row has no response (`r`) column.
    #[error("no response column; tag exactly one column with `r`")]
    MissingResponse,

    /// The type-tag row has more than one response (`r`) column.
    #[error("exactly one response column is allowed, found {0}")]
    MultipleResponses(usize),

    /// A type tag other than `r`, `n`, or `x`.
    #[error("unknown variable type `{0}`; permitted types are `r`, `n`, and `x`")]
    UnknownTypeTag(String),

    /// Two feature columns share a name.
    #[error("feature `{0}` appears more than once")]
    DuplicateFeature(String),

    /// A column or weight vector does not have one entry per observation.
    #[error("`{name}` has {actual} entries, expected {expected}")]
    LengthMismatch {
        /// Name of the offending column or weight vector.
        name: String,
        /// Number of observations in the dataset.
        expected: usize,
        /// Number of entries supplied.
        actual: usize,
    },

    /// A value could not be parsed as a number.
    #[error("line {line}: cannot parse `{value}` as a number")]
    Parse {
        /// 1-based line number in the input.
        line: usize,
        /// The offending token.
        value: String,
    },

    /// A covariate is NaN or infinite.
    #[error("feature `{name}` has a non-finite value at observation {row}")]
    NonFinite {
        /// Name of the offending feature.
        name: String,
        /// 0-based observation index.
        row: usize,
    },

    /// The dataset has no observations or no features.
    #[error("the dataset is empty")]
    EmptyDataset,

    /// The response has fewer distinct classes than required.
    #[error("the response has {0} distinct classes, at least two are required")]
    TooFewClasses(usize),

    /// A class name that the dataset does not know.
    #[error("class `{0}` does not exist in the dataset")]
    UnknownClass(String),

    /// A feature name that the dataset does not know.
    #[error("feature `{0}` does not exist in the dataset")]
    UnknownFeature(String),

    /// A variable is listed both as ignored and as used.
    #[error("variable `{0}` is listed both to ignore and to use")]
    OverlappingVariables(String),

    /// A growth control parameter is out of range or inconsistent.
    #[error("invalid growth control: {0}")]
    InvalidControl(String),

    /// A statistic cannot be computed for the given confusion matrix.
    #[error("metric is undefined: {0}")]
    UndefinedMetric(String),

    /// A tree or forest was used before it was grown.
    #[error("the model has not been grown yet")]
    NotGrown,

    /// A tree or observation index beyond the end of its collection.
    #[error("{what} {index} is out of range (length {len})")]
    OutOfRange {
        /// What the index refers to.
        what: &'static str,
        /// The offending index.
        index: usize,
        /// Length of the indexed collection.
        len: usize,
    },

    /// OOB statistics were requested but not calculated.
    #[error("OOB statistics were not calculated for this forest")]
    NoOobStatistics,

    /// Prediction was requested with no trees.
    #[error("no trees selected for prediction")]
    EmptyForest,

    /// A tree was asked to grow from an empty observation subset.
    #[error("cannot grow a tree from an empty observation subset")]
    EmptySubset,

    /// The worker pool could not be built.
    #[error("failed to build the worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// IO error while reading a dataset or configuration.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error raised by polars while converting a `DataFrame`.
    #[error("polars error: {0}")]
    Polars(#[from] PolarsError),

    /// Error raised while decoding a JSON configuration.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}


/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ForestError>;
