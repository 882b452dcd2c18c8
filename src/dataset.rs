//! Provides the numeric dataset the forest engine grows from.
mod feature;
mod dataset_struct;
mod dataset_reader;
mod matrix;


pub use feature::Feature;
pub use dataset_struct::{Dataset, pu_discounts};
pub use dataset_reader::{DatasetReader, Scaling};
pub use matrix::FeatureMatrix;
