//! Reduces a forest grown on a masked dataset to one fitness value,
//! for feature and instance selection drivers.
use fixedbitset::FixedBitSet;
use serde::{Serialize, Deserialize};

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};

use crate::control::GrowthControl;
use crate::dataset::Dataset;
use crate::error::{ForestError, Result};
use crate::forest::Forest;
use crate::metrics::ConfusionMatrix;


/// Statistic of the OOB confusion matrix used as fitness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FitnessMetric {
    /// Matthews correlation coefficient. Two classes only.
    Mcc,
    /// Macro G-mean.
    GMean,
    /// MCC for two classes, G-mean otherwise.
    #[default]
    Auto,
}


impl FitnessMetric {
    /// Evaluate this metric on `confusion`.
    pub fn evaluate(&self, confusion: &ConfusionMatrix) -> Result<f64> {
        match self {
            FitnessMetric::Mcc => confusion.mcc(),
            FitnessMetric::GMean => confusion.g_mean(),
            FitnessMetric::Auto if confusion.n_class() == 2 => confusion.mcc(),
            FitnessMetric::Auto => confusion.g_mean(),
        }
    }
}


/// A candidate solution of a selection search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Bit `j` set keeps the `j`-th feature of the dataset.
    Features(FixedBitSet),
    /// Bit `i` set keeps observation `i` for training and OOB evaluation.
    Observations(FixedBitSet),
}


/// Grows a forest for a [`Selection`] and reports its OOB fitness.
///
/// # Example
/// ```no_run
/// use fixedbitset::FixedBitSet;
/// use jyrest::prelude::*;
///
/// let dataset = DatasetReader::new()
///     .file("/path/to/data.tsv")
///     .read()
///     .unwrap();
///
/// let control = GrowthControl::default().n_trees(100);
/// let fitness = ForestFitness::new(&dataset, control)
///     .metric(FitnessMetric::GMean);
///
/// let mut mask = FixedBitSet::with_capacity(dataset.shape().1);
/// mask.insert_range(..);
/// let value = fitness.evaluate(&Selection::Features(mask), None, 42)
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct ForestFitness<'a> {
    dataset: &'a Dataset,
    control: GrowthControl,
    metric: FitnessMetric,
}


impl<'a> ForestFitness<'a> {
    /// Construct a fitness adapter over `dataset`.
    pub fn new(dataset: &'a Dataset, control: GrowthControl) -> Self {
        Self { dataset, control, metric: FitnessMetric::default(), }
    }


    /// Set the fitness statistic.
    pub fn metric(mut self, metric: FitnessMetric) -> Self {
        self.metric = metric;
        self
    }


    /// Grow a forest restricted by `selection`, with the observations of
    /// each class in `class_weights` weighted accordingly,
    /// and return the fitness of its OOB predictions.
    pub fn evaluate(
        &self,
        selection: &Selection,
        class_weights: Option<&BTreeMap<String, f64>>,
        seed: u64,
    ) -> Result<f64>
    {
        let dataset = self.weighted_dataset(class_weights)?;
        let control = self.masked_control(selection)?
            .seed(seed)
            .calculate_oob(true);

        let mut forest = Forest::new(&dataset, control);
        forest.grow()?;
        self.metric.evaluate(forest.oob_confusion()?)
    }


    // Clones share the feature columns, so only weights are copied.
    fn weighted_dataset(&self, class_weights: Option<&BTreeMap<String, f64>>)
        -> Result<Cow<'a, Dataset>>
    {
        let dataset = match class_weights {
            Some(weights) => {
                Cow::Owned(self.dataset.clone().with_class_weights(weights)?)
            },
            None => Cow::Borrowed(self.dataset),
        };
        Ok(dataset)
    }


    fn masked_control(&self, selection: &Selection) -> Result<GrowthControl> {
        let (n_sample, n_feature) = self.dataset.shape();
        let mut control = self.control.clone();

        match selection {
            Selection::Features(mask) => {
                check_mask("feature mask", mask, n_feature)?;
                let dropped = self.dataset.features()
                    .iter()
                    .enumerate()
                    .filter(|(j, _)| !mask.contains(*j))
                    .map(|(_, f)| f.name().to_string())
                    .collect::<BTreeSet<_>>();

                if !control.variables_to_use.is_empty() {
                    control.variables_to_use.retain(|v| !dropped.contains(v));
                    if control.variables_to_use.is_empty() {
                        return Err(ForestError::InvalidControl(
                            "the feature mask drops every variable to use".into()
                        ));
                    }
                }
                for name in dropped {
                    if !control.variables_to_ignore.contains(&name) {
                        control.variables_to_ignore.push(name);
                    }
                }
            },
            Selection::Observations(mask) => {
                check_mask("observation mask", mask, n_sample)?;
                let rows = match &control.training_observations {
                    Some(rows) => rows.iter()
                        .copied()
                        .filter(|&i| mask.contains(i))
                        .collect(),
                    None => mask.ones().collect(),
                };
                control.training_observations = Some(rows);
            },
        }
        Ok(control)
    }
}


fn check_mask(name: &str, mask: &FixedBitSet, expected: usize) -> Result<()> {
    if mask.len() != expected {
        return Err(ForestError::LengthMismatch {
            name: name.into(),
            expected,
            actual: mask.len(),
        });
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Feature;

    fn toy() -> Dataset {
        let signal = (0..30).map(|i| i as f64).collect::<Vec<_>>();
        let noise = (0..30).map(|i| ((i * 11) % 7) as f64).collect::<Vec<_>>();
        let labels = (0..30)
            .map(|i| if i < 15 { "a" } else { "b" })
            .collect::<Vec<_>>();
        let features = vec![
            Feature::from_values("signal", signal),
            Feature::from_values("noise", noise),
        ];
        Dataset::new(features, &labels).unwrap()
    }

    fn mask(len: usize, ones: &[usize]) -> FixedBitSet {
        let mut mask = FixedBitSet::with_capacity(len);
        ones.iter().for_each(|&i| mask.insert(i));
        mask
    }

    #[test]
    fn test_evaluate_01() {
        let dataset = toy();
        let control = GrowthControl::default().n_trees(30);
        let fitness = ForestFitness::new(&dataset, control)
            .metric(FitnessMetric::GMean);

        let with_signal = fitness
            .evaluate(&Selection::Features(mask(2, &[0, 1])), None, 1)
            .unwrap();
        let noise_only = fitness
            .evaluate(&Selection::Features(mask(2, &[1])), None, 1)
            .unwrap();
        assert!(
            with_signal > noise_only,
            "expected {with_signal} > {noise_only}"
        );
    }

    #[test]
    fn test_evaluate_02() {
        let dataset = toy();
        let fitness = ForestFitness::new(&dataset, GrowthControl::default());
        let res = fitness.evaluate(&Selection::Observations(mask(3, &[0])), None, 1);
        assert!(matches!(res, Err(ForestError::LengthMismatch { .. })));
    }

    #[test]
    fn test_evaluate_03() {
        let dataset = toy();
        let fitness = ForestFitness::new(&dataset, GrowthControl::default());
        let res = fitness.evaluate(&Selection::Features(mask(2, &[])), None, 1);
        assert!(matches!(res, Err(ForestError::InvalidControl(_))));
    }

    #[test]
    fn test_weighted_dataset_01() {
        let dataset = toy();
        let fitness = ForestFitness::new(&dataset, GrowthControl::default());
        let weights = BTreeMap::from([("b".to_string(), 4.0)]);
        let weighted = fitness.weighted_dataset(Some(&weights)).unwrap();

        assert!(matches!(weighted, Cow::Owned(_)));
        let shared = std::ptr::eq(
            dataset.features().as_ptr(), weighted.features().as_ptr()
        );
        assert!(shared, "weighted dataset copied the feature columns");

        let res = weighted.weight(1, 20);
        let exp = 4.0;
        assert_eq!(exp, res, "expected {exp:?}, got {res:?}.");

        let res = fitness.weighted_dataset(None).unwrap();
        assert!(matches!(res, Cow::Borrowed(_)));
    }

    #[test]
    fn test_masked_control_01() {
        let dataset = toy();
        let control = GrowthControl::default().training_observations(vec![0, 1, 2, 20]);
        let fitness = ForestFitness::new(&dataset, control);

        let selection = Selection::Observations(mask(30, &[1, 2, 20, 21]));
        let res = fitness.masked_control(&selection)
            .unwrap()
            .training_observations;
        let exp = Some(vec![1, 2, 20]);
        assert_eq!(exp, res, "expected {exp:?}, got {res:?}.");
    }

    #[test]
    fn test_metric_01() {
        let mut confusion = ConfusionMatrix::new(&["a", "b", "c"]);
        confusion.record("a", "a", 2.0);
        confusion.record("b", "b", 2.0);
        confusion.record("c", "a", 1.0);
        confusion.record("c", "c", 1.0);

        let res = FitnessMetric::Auto.evaluate(&confusion).unwrap();
        let exp = confusion.g_mean().unwrap();
        assert_eq!(exp, res, "expected {exp:?}, got {res:?}.");
        assert!(FitnessMetric::Mcc.evaluate(&confusion).is_err());
    }
}
