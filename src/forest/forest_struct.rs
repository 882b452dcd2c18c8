use fixedbitset::FixedBitSet;
use rand::prelude::*;
use rand::rngs::StdRng;
use rayon::prelude::*;

use std::time::{SystemTime, UNIX_EPOCH};

use crate::control::GrowthControl;
use crate::dataset::{Dataset, FeatureMatrix};
use crate::error::{ForestError, Result};
use crate::logger::GrowthLogger;
use crate::metrics::ConfusionMatrix;
use crate::tree::{DecisionTree, ObservationSubset};
use super::bootstrap::BootstrapSampler;


/// A bagged ensemble of weighted Gini classification trees.
///
/// A forest is created empty by [`Forest::new`]
/// and populated by [`Forest::grow`].
/// Each tree keeps the set of training observations
/// it never saw (its out-of-bag set),
/// from which the forest derives an OOB confusion matrix.
///
/// # Example
/// ```no_run
/// use jyrest::prelude::*;
///
/// let dataset = DatasetReader::new()
///     .file("/path/to/data.tsv")
///     .read()
///     .unwrap();
///
/// let control = GrowthControl::default()
///     .n_trees(200)
///     .mtry(3)
///     .seed(1234);
///
/// let mut forest = Forest::new(&dataset, control);
/// forest.grow().unwrap();
///
/// let error = forest.oob_error().unwrap();
/// println!("OOB error: {error}");
/// ```
#[derive(Debug, Clone)]
pub struct Forest<'a> {
    pub(super) dataset: &'a Dataset,
    pub(super) control: GrowthControl,
    // Seed the forest RNG started from.
    pub(super) seed: u64,
    // Column positions of the features trees may split on.
    pub(super) features: Vec<usize>,
    // Training observations, sorted.
    pub(super) training: Vec<usize>,
    pub(super) trees: Vec<DecisionTree<'a>>,
    // `oob[t]` holds the training observations tree `t` never drew.
    pub(super) oob: Vec<FixedBitSet>,
    pub(super) oob_confusion: Option<ConfusionMatrix>,
}


impl<'a> Forest<'a> {
    /// Construct an empty forest over `dataset`.
    pub fn new(dataset: &'a Dataset, control: GrowthControl) -> Self {
        Self {
            dataset,
            control,
            seed: 0,
            features: Vec::new(),
            training: Vec::new(),
            trees: Vec::new(),
            oob: Vec::new(),
            oob_confusion: None,
        }
    }


    /// Grow every tree, replacing any previous ones.
    ///
    /// Bootstrap samples and per-tree seeds are drawn sequentially from
    /// the forest RNG before any tree grows, so the result does not
    /// depend on the number of worker threads.
    /// If a tree fails to grow the whole forest is discarded.
    pub fn grow(&mut self) -> Result<()> {
        self.clear();
        self.control.validate(self.dataset)?;

        let features = self.control.candidate_features(self.dataset)?;
        let sampler = BootstrapSampler::new(self.dataset, &self.control)?;
        let seed = self.control.seed.unwrap_or_else(system_seed);

        let logger = self.control.verbose
            .then(|| GrowthLogger::new(&self.control));
        if let Some(logger) = &logger {
            logger.print_stats(
                self.dataset, &self.control, seed, features.len()
            );
        }


        // Draw every bootstrap sample and tree seed up front.
        let mut rng = StdRng::seed_from_u64(seed);
        let plans = (0..self.control.n_trees)
            .map(|_| {
                let (in_bag, oob) = sampler.draw(&mut rng);
                let tree_seed = rng.gen::<u64>();
                (tree_seed, in_bag, oob)
            })
            .collect::<Vec<(u64, ObservationSubset, FixedBitSet)>>();


        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.control.n_threads)
            .build()?;

        let dataset = self.dataset;
        let tree_control = self.control.tree_control();
        let grown = pool.install(|| {
            plans.into_par_iter()
                .map(|(tree_seed, in_bag, oob)| -> Result<_> {
                    let mut tree = DecisionTree::new(
                        dataset, tree_control, tree_seed
                    );
                    tree.grow(&in_bag, &features)?;
                    if let Some(logger) = &logger { logger.tree_finished(); }
                    Ok((tree, oob))
                })
                .collect::<Result<Vec<_>>>()
        })?;

        let (trees, oob): (Vec<_>, Vec<_>) = grown.into_iter().unzip();
        self.trees = trees;
        self.oob = oob;
        self.seed = seed;
        self.features = features;
        self.training = sampler.rows().to_vec();

        if self.control.calculate_oob {
            let matrix = self.compute_oob()?;
            self.oob_confusion = Some(matrix);
        }

        if let Some(logger) = &logger {
            logger.finish(self.oob_confusion.as_ref());
        }
        Ok(())
    }


    /// Discard every tree and grow again from `seed`.
    pub fn regrow(&mut self, seed: u64) -> Result<()> {
        self.control.seed = Some(seed);
        self.grow()
    }


    /// Discard every tree and grow again with `control`.
    pub fn regrow_with(&mut self, control: GrowthControl) -> Result<()> {
        self.control = control;
        self.grow()
    }


    fn clear(&mut self) {
        self.trees.clear();
        self.oob.clear();
        self.features.clear();
        self.training.clear();
        self.oob_confusion = None;
    }


    /// Predict every training observation with the trees it is OOB on.
    fn compute_oob(&self) -> Result<ConfusionMatrix> {
        let classes = self.dataset.classes();
        let matrix = self.dataset.matrix();

        let predicted = self.training.par_iter()
            .map(|&i| -> Result<_> {
                let mut votes = vec![0.0; classes.len()];
                let mut evaluated = false;
                for (tree, oob) in self.trees.iter().zip(&self.oob) {
                    if !oob.contains(i) { continue; }
                    evaluated = true;
                    add_votes(&mut votes, tree.predict_row(&matrix, i)?);
                }
                Ok(evaluated.then(|| (i, argmax(&votes))))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut confusion = ConfusionMatrix::new(classes);
        for (i, c) in predicted.into_iter().flatten() {
            confusion.record(self.dataset.label(i), &classes[c], 1.0);
        }
        Ok(confusion)
    }


    /// Returns `true` once [`Forest::grow`] has succeeded.
    pub fn is_grown(&self) -> bool {
        !self.trees.is_empty()
    }


    /// Returns the grown trees.
    pub fn trees(&self) -> &[DecisionTree<'a>] {
        &self.trees[..]
    }


    /// Returns the number of grown trees.
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }


    /// Returns the OOB set of every tree, in tree order.
    pub fn oob_sets(&self) -> &[FixedBitSet] {
        &self.oob[..]
    }


    /// Returns the trees observation `row` is out-of-bag on.
    pub fn oob_trees_of(&self, row: usize) -> Vec<usize> {
        self.oob.iter()
            .enumerate()
            .filter(|(_, oob)| oob.contains(row))
            .map(|(t, _)| t)
            .collect()
    }


    /// Returns the seed the last growth started from.
    pub fn seed(&self) -> u64 {
        self.seed
    }


    /// Returns the growth parameters.
    pub fn control(&self) -> &GrowthControl {
        &self.control
    }


    /// Returns the training dataset.
    pub fn dataset(&self) -> &'a Dataset {
        self.dataset
    }


    /// Returns the names of the features trees may split on.
    pub fn candidate_features(&self) -> Vec<&str> {
        self.features.iter()
            .map(|&j| self.dataset.features()[j].name())
            .collect()
    }


    /// Returns the OOB confusion matrix.
    pub fn oob_confusion(&self) -> Result<&ConfusionMatrix> {
        if !self.is_grown() { return Err(ForestError::NotGrown); }
        self.oob_confusion.as_ref().ok_or(ForestError::NoOobStatistics)
    }


    /// Returns the OOB error estimate.
    pub fn oob_error(&self) -> Result<f64> {
        self.oob_confusion()?.error_rate()
    }


    /// Returns the macro G-mean of the OOB predictions.
    pub fn oob_g_mean(&self) -> Result<f64> {
        self.oob_confusion()?.g_mean()
    }


    /// Returns the MCC of the OOB predictions (two classes only).
    pub fn oob_mcc(&self) -> Result<f64> {
        self.oob_confusion()?.mcc()
    }


    /// Returns, for every row, the votes summed over the selected trees.
    ///
    /// `dataset` may be any dataset holding the candidate features;
    /// columns are matched by name. `rows` defaults to every observation
    /// and `trees` to every tree.
    pub fn predict_raw(
        &self,
        dataset: &Dataset,
        rows: Option<&[usize]>,
        trees: Option<&[usize]>,
    ) -> Result<Vec<Vec<f64>>>
    {
        let trees = self.selected_trees(trees)?;
        let rows = selected_rows(dataset, rows)?;
        let matrix = FeatureMatrix::aligned(self.dataset, dataset, &self.features)?;
        let n_class = self.dataset.n_class();

        rows.par_iter()
            .map(|&i| -> Result<Vec<f64>> {
                let mut votes = vec![0.0; n_class];
                for &t in &trees {
                    add_votes(&mut votes, self.trees[t].predict_row(&matrix, i)?);
                }
                Ok(votes)
            })
            .collect()
    }


    /// Returns the predicted class of every row.
    /// Ties go to the lexicographically smallest class.
    pub fn predict_classes(
        &self,
        dataset: &Dataset,
        rows: Option<&[usize]>,
        trees: Option<&[usize]>,
    ) -> Result<Vec<String>>
    {
        let classes = self.dataset.classes();
        let predicted = self.predict_raw(dataset, rows, trees)?
            .into_iter()
            .map(|votes| classes[argmax(&votes)].clone())
            .collect();
        Ok(predicted)
    }


    /// Predict `rows` of `dataset` and compare with its labels.
    /// Returns the error rate and the confusion matrix.
    pub fn predict(
        &self,
        dataset: &Dataset,
        rows: Option<&[usize]>,
        trees: Option<&[usize]>,
    ) -> Result<(f64, ConfusionMatrix)>
    {
        let predicted = self.predict_classes(dataset, rows, trees)?;
        let rows = selected_rows(dataset, rows)?;

        let mut confusion = ConfusionMatrix::new(self.dataset.classes());
        for (&i, class) in rows.iter().zip(&predicted) {
            confusion.record(dataset.label(i), class, 1.0);
        }
        let error = confusion.error_rate()?;
        Ok((error, confusion))
    }


    fn selected_trees(&self, trees: Option<&[usize]>) -> Result<Vec<usize>> {
        if !self.is_grown() { return Err(ForestError::NotGrown); }

        let trees = match trees {
            Some(trees) => trees.to_vec(),
            None => (0..self.trees.len()).collect(),
        };
        if trees.is_empty() { return Err(ForestError::EmptyForest); }
        if let Some(&t) = trees.iter().find(|&&t| t >= self.trees.len()) {
            return Err(ForestError::OutOfRange {
                what: "tree",
                index: t,
                len: self.trees.len(),
            });
        }
        Ok(trees)
    }
}


fn selected_rows(dataset: &Dataset, rows: Option<&[usize]>)
    -> Result<Vec<usize>>
{
    let n_sample = dataset.shape().0;
    let rows = match rows {
        Some(rows) => rows.to_vec(),
        None => (0..n_sample).collect(),
    };
    if let Some(&i) = rows.iter().find(|&&i| i >= n_sample) {
        return Err(ForestError::OutOfRange {
            what: "observation",
            index: i,
            len: n_sample,
        });
    }
    Ok(rows)
}


#[inline(always)]
pub(super) fn add_votes(acc: &mut [f64], votes: &[f64]) {
    acc.iter_mut()
        .zip(votes)
        .for_each(|(a, v)| { *a += v; });
}


/// Index of the largest vote.
/// Ties (and all-zero votes) go to the smallest index.
#[inline]
pub(crate) fn argmax(votes: &[f64]) -> usize {
    let mut best = 0;
    for (c, &v) in votes.iter().enumerate().skip(1) {
        if v > votes[best] { best = c; }
    }
    best
}


fn system_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default()
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Feature;

    // Two separated groups along `x`, `y` is noise.
    fn toy() -> Dataset {
        let x = (0..20).map(|i| i as f64).collect::<Vec<_>>();
        let y = (0..20).map(|i| ((i * 7) % 5) as f64).collect::<Vec<_>>();
        let labels = (0..20)
            .map(|i| if i < 10 { "a" } else { "b" })
            .collect::<Vec<_>>();
        let features = vec![
            Feature::from_values("x", x),
            Feature::from_values("y", y),
        ];
        Dataset::new(features, &labels).unwrap()
    }

    #[test]
    fn test_argmax_01() {
        let res = (argmax(&[1.0, 3.0, 3.0]), argmax(&[0.0, 0.0]));
        let exp = (1, 0);
        assert_eq!(exp, res, "expected {exp:?}, got {res:?}.");
    }

    #[test]
    fn test_grow_01() {
        let dataset = toy();
        let control = GrowthControl::default().n_trees(30).seed(5);
        let mut forest = Forest::new(&dataset, control);
        forest.grow().unwrap();

        let res = (forest.n_trees(), forest.oob_sets().len());
        let exp = (30, 30);
        assert_eq!(exp, res, "expected {exp:?}, got {res:?}.");

        let res = forest.oob_error().unwrap();
        assert!(res <= 0.2, "OOB error {res} is too large");
    }

    #[test]
    fn test_oob_sets_01() {
        let dataset = toy();
        let control = GrowthControl::default().n_trees(10).seed(6);
        let mut forest = Forest::new(&dataset, control);
        forest.grow().unwrap();

        let matrix = dataset.matrix();
        for (tree, oob) in forest.trees().iter().zip(forest.oob_sets()) {
            let total = tree.root().unwrap()
                .terminals()
                .iter()
                .map(|leaf| leaf.votes().iter().sum::<f64>())
                .sum::<f64>();
            let in_bag = (0..20).filter(|&i| !oob.contains(i)).count();
            assert!(in_bag > 0 && total >= in_bag as f64);
            assert!(tree.predict(&matrix, &[0]).is_ok());
        }

        let res = forest.oob_trees_of(0);
        let exp = (0..10)
            .filter(|&t| forest.oob_sets()[t].contains(0))
            .collect::<Vec<_>>();
        assert_eq!(exp, res, "expected {exp:?}, got {res:?}.");
    }

    #[test]
    fn test_regrow_01() {
        let dataset = toy();
        let control = GrowthControl::default().n_trees(15).seed(7);
        let mut forest = Forest::new(&dataset, control);
        forest.grow().unwrap();
        let first = forest.oob_confusion().unwrap().clone();

        forest.regrow(8).unwrap();
        forest.regrow(7).unwrap();
        let second = forest.oob_confusion().unwrap().clone();
        assert_eq!(first, second, "expected {first:?}, got {second:?}.");
    }

    #[test]
    fn test_predict_01() {
        let dataset = toy();
        let control = GrowthControl::default().n_trees(20).seed(9);
        let mut forest = Forest::new(&dataset, control);
        forest.grow().unwrap();

        let (error, confusion) = forest.predict(&dataset, None, None).unwrap();
        let res = confusion.total();
        let exp = 20.0;
        assert_eq!(exp, res, "expected {exp:?}, got {res:?}.");
        assert!(error <= 0.1, "training error {error} is too large");

        let res = forest.predict_classes(&dataset, Some(&[0, 19]), Some(&[0]))
            .unwrap();
        let exp = vec!["a".to_string(), "b".to_string()];
        assert_eq!(exp, res, "expected {exp:?}, got {res:?}.");
    }

    #[test]
    fn test_predict_02() {
        let dataset = toy();
        let forest = Forest::new(&dataset, GrowthControl::default());
        let res = forest.predict(&dataset, None, None);
        assert!(matches!(res, Err(ForestError::NotGrown)));
    }

    #[test]
    fn test_predict_03() {
        let dataset = toy();
        let control = GrowthControl::default().n_trees(3).seed(1);
        let mut forest = Forest::new(&dataset, control);
        forest.grow().unwrap();

        let res = forest.predict_raw(&dataset, None, Some(&[]));
        assert!(matches!(res, Err(ForestError::EmptyForest)));
        let res = forest.predict_raw(&dataset, None, Some(&[3]));
        assert!(matches!(res, Err(ForestError::OutOfRange { .. })));
    }

    #[test]
    fn test_no_oob_01() {
        let dataset = toy();
        let control = GrowthControl::default()
            .n_trees(3)
            .seed(1)
            .calculate_oob(false);
        let mut forest = Forest::new(&dataset, control);
        forest.grow().unwrap();
        let res = forest.oob_error();
        assert!(matches!(res, Err(ForestError::NoOobStatistics)));
    }
}
