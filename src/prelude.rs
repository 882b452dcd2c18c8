//! Exports the forest engine, its configuration, and the dataset types.
//!
pub use crate::dataset::{
    Dataset,
    DatasetReader,
    Feature,
    Scaling,
    pu_discounts,
};


pub use crate::tree::{
    DecisionTree,
    TreeControl,
    ObservationSubset,
};


pub use crate::control::GrowthControl;


pub use crate::forest::{
    Forest,
    VariableImportance,
};


pub use crate::metrics::{
    ConfusionMatrix,
    ConfusionEntry,
};


pub use crate::fitness::{
    FitnessMetric,
    ForestFitness,
    Selection,
};


pub use crate::constants::{
    POSITIVE_CLASS,
    UNLABELLED_CLASS,
};


pub use crate::error::ForestError;
