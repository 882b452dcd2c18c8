#![warn(missing_docs)]

//!
//! A crate that grows weighted and positive-unlabelled random forests.
//!
//! Trees are grown by minimizing the weighted Gini impurity,
//! where every observation carries a weight for every class.
//! By default an observation weighs `1` for its own class and `0` for
//! the others, which gives the classic random forest.
//! Soft labels (positive-unlabelled learning) and class weights
//! are expressed by changing those weights.
//!
//! A [`Forest`] bootstraps the training observations
//! (stratified by class by default),
//! grows its trees in parallel,
//! and estimates its error from the out-of-bag (OOB) predictions.
//! It also computes permutation variable importance
//! and observation proximities.
//!
//! [`ForestFitness`] wraps forest growth as a fitness function
//! for feature and instance selection searches.
//!
//! # Example
//! ```no_run
//! use jyrest::prelude::*;
//!
//! let dataset = DatasetReader::new()
//!     .file("/path/to/data.tsv")
//!     .read()
//!     .unwrap();
//!
//! let control = GrowthControl::default()
//!     .n_trees(500)
//!     .seed(1234)
//!     .verbose(true);
//! let mut forest = Forest::new(&dataset, control);
//! forest.grow().unwrap();
//!
//! let confusion = forest.oob_confusion().unwrap();
//! println!("{confusion}");
//!
//! let importance = forest.variable_importance().unwrap();
//! for (name, score) in importance.accuracy {
//!     println!("{name}\t{score:.5}");
//! }
//! ```

pub mod constants;
pub mod error;
pub mod dataset;
pub mod tree;
pub mod control;
pub mod forest;
pub mod metrics;
pub mod fitness;
pub mod prelude;

mod common;
mod logger;


pub use error::{ForestError, Result};

pub use dataset::{
    Dataset,
    DatasetReader,
    Feature,
    FeatureMatrix,
    Scaling,
    pu_discounts,
};

pub use tree::{
    DecisionTree,
    TreeControl,
    ObservationSubset,
};

pub use control::GrowthControl;

pub use forest::{
    Forest,
    VariableImportance,
};

pub use metrics::{
    ConfusionMatrix,
    ConfusionEntry,
};

pub use fitness::{
    FitnessMetric,
    ForestFitness,
    Selection,
};
