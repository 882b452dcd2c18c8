//! This file defines some functions that checks some pre-conditions
//! E.g., Shape of data, ranges of growth parameters.

use crate::Dataset;
use crate::error::{ForestError, Result};


/// Check whether the training dataset is usable or not.
#[inline(always)]
pub(crate) fn check_dataset(dataset: &Dataset) -> Result<()> {
    let (n_sample, n_feature) = dataset.shape();

    // `Dataset::new` already rejects zero observations,
    // a dataset without any covariate cannot be split either.
    if n_sample == 0 || n_feature == 0 {
        return Err(ForestError::EmptyDataset);
    }
    Ok(())
}


/// Check that a count parameter is at least `1`.
#[inline(always)]
pub(crate) fn check_positive(name: &str, value: usize) -> Result<()> {
    if value == 0 {
        return Err(ForestError::InvalidControl(
            format!("`{name}` must be at least 1")
        ));
    }
    Ok(())
}


/// Check that `fraction` lies in `(0, 1]`.
#[inline(always)]
pub(crate) fn check_fraction(name: &str, fraction: f64) -> Result<()> {
    if !(fraction > 0.0 && fraction <= 1.0) {
        return Err(ForestError::InvalidControl(
            format!("`{name}` must be in (0, 1], got {fraction}")
        ));
    }
    Ok(())
}


/// Check that every row index is below `n_sample`.
#[inline(always)]
pub(crate) fn check_rows(rows: &[usize], n_sample: usize) -> Result<()> {
    if let Some(row) = rows.iter().find(|&&i| i >= n_sample) {
        return Err(ForestError::InvalidControl(
            format!("observation {row} is out of range (n_sample = {n_sample})")
        ));
    }
    Ok(())
}
