//! Confusion matrices and the statistics derived from them.
mod confusion;


pub use confusion::{ConfusionMatrix, ConfusionEntry};
