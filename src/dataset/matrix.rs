use super::dataset_struct::Dataset;
use crate::error::{ForestError, Result};


/// Column-major view of numeric covariates
/// aligned with the feature order of the dataset a tree was grown on.
///
/// Trees route observations through a `FeatureMatrix`, so the same tree
/// can predict the training data, a held-out dataset whose columns come in
/// another order, or a copy with one permuted column.
#[derive(Debug, Clone)]
pub struct FeatureMatrix<'a> {
    columns: Vec<&'a [f64]>,
}


impl<'a> FeatureMatrix<'a> {
    pub(crate) fn new(columns: Vec<&'a [f64]>) -> Self {
        Self { columns }
    }


    /// Align the columns of `other` with the feature order of `reference`.
    /// Only the features in `required` (positions in `reference`)
    /// must exist in `other`; the rest are left empty.
    pub(crate) fn aligned(
        reference: &Dataset,
        other: &'a Dataset,
        required: &[usize],
    ) -> Result<Self>
    {
        let mut columns: Vec<&'a [f64]> = vec![&[]; reference.shape().1];
        for &j in required {
            let name = reference.features()[j].name();
            let feature = other.feature(name)
                .ok_or_else(|| ForestError::UnknownFeature(name.into()))?;
            columns[j] = feature.values();
        }
        Ok(Self { columns })
    }


    /// Returns a matrix whose `feature`-th column is replaced by `values`.
    pub(crate) fn with_column<'b>(&self, feature: usize, values: &'b [f64])
        -> FeatureMatrix<'b>
        where 'a: 'b
    {
        let mut columns: Vec<&'b [f64]> = self.columns.clone();
        columns[feature] = values;
        FeatureMatrix { columns }
    }


    /// Returns the value of `feature` at `row`.
    #[inline(always)]
    pub fn value(&self, feature: usize, row: usize) -> f64 {
        self.columns[feature][row]
    }


    /// Returns the `feature`-th column.
    #[inline]
    pub fn column(&self, feature: usize) -> &'a [f64] {
        self.columns[feature]
    }
}
