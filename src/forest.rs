//! Bagged ensembles of classification trees.
mod bootstrap;
mod forest_struct;
mod importance;
mod proximity;


pub use forest_struct::Forest;
pub use importance::VariableImportance;
