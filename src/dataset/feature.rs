use polars::prelude::*;
use std::ops::Index;
use std::slice::Iter;

use crate::error::Result;


/// A numeric covariate column.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    /// Feature name
    pub(crate) name: String,
    /// Feature values, one per observation.
    pub(crate) values: Vec<f64>,
}


impl Feature {
    /// Construct an empty feature named `name`.
    pub fn new<T: ToString>(name: T) -> Self {
        Self { name: name.to_string(), values: Vec::new(), }
    }


    /// Construct a feature from its name and values.
    pub fn from_values<T: ToString>(name: T, values: Vec<f64>) -> Self {
        Self { name: name.to_string(), values, }
    }


    /// Convert a `polars::Series` of any numeric dtype into `Feature`.
    /// Missing values are rejected.
    pub(crate) fn from_series(series: &Series) -> Result<Self> {
        let name = series.name();
        let casted = series.cast(&DataType::Float64)?;
        let values = casted.f64()?
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| PolarsError::ComputeError(
                format!("column `{name}` has missing values").into()
            ))?;

        Ok(Self::from_values(name, values))
    }


    pub(crate) fn append(&mut self, x: f64) {
        self.values.push(x);
    }


    /// Get the feature name.
    pub fn name(&self) -> &str {
        &self.name
    }


    /// Returns the values as a slice.
    pub fn values(&self) -> &[f64] {
        &self.values[..]
    }


    /// Returns an iterator over the values.
    pub fn iter(&self) -> Iter<'_, f64> {
        self.values.iter()
    }


    /// Returns the number of items in this feature.
    pub fn len(&self) -> usize {
        self.values.len()
    }


    /// Returns `true` if the feature holds no value.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }


    /// Returns `true` if every value is identical.
    pub fn is_constant(&self) -> bool {
        match self.values.first() {
            Some(first) => self.values.iter().all(|x| x == first),
            None => true,
        }
    }


    /// Map each value to `(x - min) / (max - min)`.
    /// A constant feature maps to all zeros.
    pub(crate) fn min_max_scaled(&self) -> Self {
        let min = self.iter().copied().fold(f64::INFINITY, f64::min);
        let max = self.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let range = max - min;

        let values = self.iter()
            .map(|x| if range > 0.0 { (x - min) / range } else { 0.0 })
            .collect();
        Self::from_values(&self.name, values)
    }


    /// Map each value to `(x - mean) / sd`
    /// with the population standard deviation.
    /// A constant feature maps to all zeros.
    pub(crate) fn standardised(&self) -> Self {
        let n = self.len() as f64;
        let mean = self.iter().sum::<f64>() / n;
        let sd = (
            self.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n
        ).sqrt();

        let values = self.iter()
            .map(|x| if sd > 0.0 { (x - mean) / sd } else { 0.0 })
            .collect();
        Self::from_values(&self.name, values)
    }
}


impl Index<usize> for Feature {
    type Output = f64;
    fn index(&self, idx: usize) -> &Self::Output {
        &self.values[idx]
    }
}
