use polars::prelude::*;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::ops::Index;
use std::sync::Arc;

use super::feature::Feature;
use super::matrix::FeatureMatrix;
use crate::constants::{POSITIVE_CLASS, UNLABELLED_CLASS};
use crate::error::{ForestError, Result};


/// Struct `Dataset` holds numeric covariates, class labels,
/// and a per-class weight for every observation.
///
/// A `Dataset` is read-only for the forest engine.
/// Observation subsets are passed around as indices into it.
/// Clones share the feature columns; only labels and weights are copied.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub(super) name_to_index: Arc<HashMap<String, usize>>,
    pub(super) features: Arc<[Feature]>,
    // Sorted class names.
    pub(super) classes: Vec<String>,
    // Index into `classes` for each observation.
    pub(super) labels: Vec<usize>,
    // `weights[c][i]` is the weight of observation `i` for class `c`.
    pub(super) weights: Vec<Vec<f64>>,
    pub(super) n_sample: usize,
    pub(super) n_feature: usize,
}


impl Dataset {
    /// Construct a `Dataset` from feature columns and one label
    /// per observation.
    ///
    /// Every observation weighs `1.0` for its own class
    /// and `0.0` for the other classes.
    pub fn new<S>(features: Vec<Feature>, labels: &[S]) -> Result<Self>
        where S: AsRef<str>,
    {
        let n_sample = labels.len();
        if n_sample == 0 { return Err(ForestError::EmptyDataset); }

        let mut name_to_index = HashMap::with_capacity(features.len());
        for (i, feature) in features.iter().enumerate() {
            if feature.len() != n_sample {
                return Err(ForestError::LengthMismatch {
                    name: feature.name().to_string(),
                    expected: n_sample,
                    actual: feature.len(),
                });
            }
            if let Some(row) = feature.iter().position(|x| !x.is_finite()) {
                return Err(ForestError::NonFinite {
                    name: feature.name().to_string(),
                    row,
                });
            }
            let name = feature.name().to_string();
            if name_to_index.insert(name.clone(), i).is_some() {
                return Err(ForestError::DuplicateFeature(name));
            }
        }

        let classes = labels.iter()
            .map(|s| s.as_ref().to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect::<Vec<_>>();

        let labels = labels.iter()
            .map(|s| {
                classes.binary_search_by(|c| c.as_str().cmp(s.as_ref()))
                    .map_err(|_| ForestError::UnknownClass(s.as_ref().into()))
            })
            .collect::<Result<Vec<_>>>()?;

        let weights = (0..classes.len())
            .map(|c| {
                labels.iter()
                    .map(|&y| if y == c { 1.0 } else { 0.0 })
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>();

        let n_feature = features.len();
        let dataset = Self {
            name_to_index: Arc::new(name_to_index),
            features: features.into(),
            classes,
            labels,
            weights,
            n_sample,
            n_feature,
        };
        Ok(dataset)
    }


    /// Convert a `polars::DataFrame` into `Dataset`.
    /// The column named `response` becomes the class label,
    /// every other column must be numeric.
    pub fn from_dataframe(data: &DataFrame, response: &str) -> Result<Self> {
        let target = data.column(response)
            .map_err(|_| ForestError::UnknownFeature(response.into()))?
            .cast(&DataType::Utf8)?;
        let labels = target.utf8()?
            .into_iter()
            .map(|y| y.map(str::to_string))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| PolarsError::ComputeError(
                format!("response `{response}` has missing values").into()
            ))?;

        let features = data.get_columns()
            .iter()
            .filter(|series| series.name() != response)
            .map(Feature::from_series)
            .collect::<Result<Vec<_>>>()?;

        Self::new(features, &labels[..])
    }


    /// Returns the pair of the number of observations and
    /// the number of features.
    pub fn shape(&self) -> (usize, usize) {
        (self.n_sample, self.n_feature)
    }


    /// Returns a slice of type `Feature`.
    pub fn features(&self) -> &[Feature] {
        &self.features[..]
    }


    /// Returns the feature named `name`, if any.
    pub fn feature(&self, name: &str) -> Option<&Feature> {
        self.name_to_index.get(name).map(|&i| &self.features[i])
    }


    /// Returns the column position of the feature named `name`.
    pub fn feature_index(&self, name: &str) -> Option<usize> {
        self.name_to_index.get(name).copied()
    }


    /// Returns the feature names in column order.
    pub fn feature_names(&self) -> Vec<&str> {
        self.features.iter().map(Feature::name).collect()
    }


    /// Returns the class names in lexicographic order.
    pub fn classes(&self) -> &[String] {
        &self.classes[..]
    }


    /// Returns the number of classes.
    pub fn n_class(&self) -> usize {
        self.classes.len()
    }


    /// Returns the position of `class` in [`Dataset::classes`].
    pub fn class_index(&self, class: &str) -> Option<usize> {
        self.classes.binary_search_by(|c| c.as_str().cmp(class)).ok()
    }


    /// Returns the class index of every observation.
    pub fn labels(&self) -> &[usize] {
        &self.labels[..]
    }


    /// Returns the class name of observation `row`.
    pub fn label(&self, row: usize) -> &str {
        &self.classes[self.labels[row]]
    }


    /// Returns the weight of observation `row` for class index `class`.
    #[inline]
    pub fn weight(&self, class: usize, row: usize) -> f64 {
        self.weights[class][row]
    }


    /// Returns the weights of all observations for class index `class`.
    pub fn class_weights_of(&self, class: usize) -> &[f64] {
        &self.weights[class][..]
    }


    /// Returns the number of observations of each class.
    pub fn class_counts(&self) -> Vec<usize> {
        let mut counts = vec![0_usize; self.n_class()];
        self.labels.iter().for_each(|&y| counts[y] += 1);
        counts
    }


    /// Returns a view of the feature columns
    /// used to route observations through trees.
    pub fn matrix(&self) -> FeatureMatrix<'_> {
        FeatureMatrix::new(
            self.features.iter().map(Feature::values).collect()
        )
    }


    /// Set the weight of every observation for its own class
    /// to the weight given for that class.
    /// Classes missing from `class_weights` keep their weights.
    pub fn with_class_weights(mut self, class_weights: &BTreeMap<String, f64>)
        -> Result<Self>
    {
        for (class, &w) in class_weights {
            let c = self.class_index(class)
                .ok_or_else(|| ForestError::UnknownClass(class.clone()))?;
            check_weight(class, w)?;

            for (i, &y) in self.labels.iter().enumerate() {
                if y == c { self.weights[c][i] = w; }
            }
        }
        Ok(self)
    }


    /// Set the per-observation weights for `class` directly.
    pub fn with_observation_weights(mut self, class: &str, weights: Vec<f64>)
        -> Result<Self>
    {
        let c = self.class_index(class)
            .ok_or_else(|| ForestError::UnknownClass(class.into()))?;
        if weights.len() != self.n_sample {
            return Err(ForestError::LengthMismatch {
                name: class.into(),
                expected: self.n_sample,
                actual: weights.len(),
            });
        }
        for &w in &weights { check_weight(class, w)?; }

        self.weights[c] = weights;
        Ok(self)
    }


    /// Set `weight[c][i] = discount[c][i] * class_weight[c]`.
    ///
    /// Classes missing from `discounts` use a discount of `1.0` for their
    /// own observations and `0.0` otherwise.
    /// Classes missing from `class_weights` use a class weight of `1.0`.
    pub fn with_discounts(
        mut self,
        class_weights: &BTreeMap<String, f64>,
        discounts: &BTreeMap<String, Vec<f64>>,
    ) -> Result<Self>
    {
        for class in class_weights.keys().chain(discounts.keys()) {
            if self.class_index(class).is_none() {
                return Err(ForestError::UnknownClass(class.clone()));
            }
        }

        for c in 0..self.n_class() {
            let class = &self.classes[c];
            let class_weight = class_weights.get(class).copied().unwrap_or(1.0);
            check_weight(class, class_weight)?;

            let weights = match discounts.get(class) {
                Some(discount) => {
                    if discount.len() != self.n_sample {
                        return Err(ForestError::LengthMismatch {
                            name: class.clone(),
                            expected: self.n_sample,
                            actual: discount.len(),
                        });
                    }
                    discount.iter()
                        .map(|d| d * class_weight)
                        .collect::<Vec<_>>()
                },
                None => {
                    self.labels.iter()
                        .map(|&y| if y == c { class_weight } else { 0.0 })
                        .collect::<Vec<_>>()
                },
            };
            for &w in &weights { check_weight(class, w)?; }
            self.weights[c] = weights;
        }
        Ok(self)
    }


    /// Returns a copy whose features are min-max scaled into `[0, 1]`.
    pub fn scaled(&self) -> Self {
        let mut dataset = self.clone();
        dataset.features = self.features.iter()
            .map(Feature::min_max_scaled)
            .collect();
        dataset
    }


    /// Returns a copy whose features have zero mean and unit variance.
    pub fn standardised(&self) -> Self {
        let mut dataset = self.clone();
        dataset.features = self.features.iter()
            .map(Feature::standardised)
            .collect();
        dataset
    }
}


impl<S> Index<S> for Dataset
    where S: AsRef<str>
{
    type Output = Feature;
    fn index(&self, name: S) -> &Self::Output {
        let name = name.as_ref();
        let idx = self.name_to_index.get(name)
            .unwrap_or_else(|| panic!("The feature `{name}` does not exist"));
        &self.features[*idx]
    }
}


/// Builds the discount map of a positive-unlabelled dataset.
///
/// `positive[i]` is the belief that observation `i` is positive.
/// Its unlabelled discount is `1 - positive[i]`.
pub fn pu_discounts(dataset: &Dataset, positive: &[f64])
    -> Result<BTreeMap<String, Vec<f64>>>
{
    for class in [POSITIVE_CLASS, UNLABELLED_CLASS] {
        if dataset.class_index(class).is_none() {
            return Err(ForestError::UnknownClass(class.into()));
        }
    }
    if positive.len() != dataset.n_sample {
        return Err(ForestError::LengthMismatch {
            name: POSITIVE_CLASS.into(),
            expected: dataset.n_sample,
            actual: positive.len(),
        });
    }
    if let Some(p) = positive.iter().find(|p| !(0.0..=1.0).contains(*p)) {
        return Err(ForestError::InvalidControl(
            format!("positive discount {p} is outside [0, 1]")
        ));
    }

    let unlabelled = positive.iter().map(|p| 1.0 - p).collect();
    let discounts = BTreeMap::from([
        (POSITIVE_CLASS.to_string(), positive.to_vec()),
        (UNLABELLED_CLASS.to_string(), unlabelled),
    ]);
    Ok(discounts)
}


fn check_weight(class: &str, weight: f64) -> Result<()> {
    if weight.is_finite() && weight >= 0.0 {
        Ok(())
    } else {
        Err(ForestError::InvalidControl(
            format!("weight {weight} for class `{class}` is not a non-negative number")
        ))
    }
}
