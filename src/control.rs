//! Growth parameters of a forest.
use serde::{Serialize, Deserialize};

use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;

use crate::common::checker;
use crate::constants::*;
use crate::dataset::Dataset;
use crate::error::{ForestError, Result};
use crate::tree::TreeControl;


/// Parameters controlling how a [`Forest`](crate::Forest) grows.
///
/// `GrowthControl` is a plain record.
/// Build one with the consuming setters,
/// or load it from JSON with [`GrowthControl::from_json`].
/// Fields missing from the JSON keep their defaults.
///
/// # Example
/// ```
/// use jyrest::prelude::*;
///
/// let control = GrowthControl::default()
///     .n_trees(100)
///     .mtry(3)
///     .min_node_size(2)
///     .seed(7);
/// assert_eq!(control.n_trees, 100);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrowthControl {
    /// Minimum number of in-bag observations in each child of a split.
    pub min_node_size: usize,
    /// Number of features sampled as split candidates at each node.
    /// `usize::MAX` uses every candidate feature.
    pub mtry: usize,
    /// Number of trees to grow.
    pub n_trees: usize,
    /// Maximum depth of a tree. The root has depth `1`.
    pub max_depth: usize,
    /// Bootstrap with replacement.
    pub replacement: bool,
    /// Fraction of observations drawn when sampling without replacement.
    pub selection_fraction: f64,
    /// Draw the bootstrap separately within each class.
    pub stratified: bool,
    /// Number of observations drawn from each class.
    /// Cannot be combined with `stratified`.
    pub sample_sizes: BTreeMap<String, usize>,
    /// Features never used as split candidates.
    pub variables_to_ignore: Vec<String>,
    /// If non-empty, the only features used as split candidates.
    pub variables_to_use: Vec<String>,
    /// Observations available for bootstrapping and OOB evaluation.
    /// `None` uses every observation.
    pub training_observations: Option<Vec<usize>>,
    /// Compute the OOB confusion matrix after growth.
    pub calculate_oob: bool,
    /// Seed of the forest RNG. `None` seeds from the system time.
    pub seed: Option<u64>,
    /// Number of worker threads. `0` uses the rayon default.
    pub n_threads: usize,
    /// Print growth progress to stdout.
    pub verbose: bool,
    /// Interval, in trees, between progress lines.
    pub print_every: usize,
}


impl Default for GrowthControl {
    fn default() -> Self {
        Self {
            min_node_size: DEFAULT_MIN_NODE_SIZE,
            mtry: usize::MAX,
            n_trees: DEFAULT_N_TREES,
            max_depth: usize::MAX,
            replacement: true,
            selection_fraction: DEFAULT_SELECTION_FRACTION,
            stratified: true,
            sample_sizes: BTreeMap::new(),
            variables_to_ignore: Vec::new(),
            variables_to_use: Vec::new(),
            training_observations: None,
            calculate_oob: true,
            seed: None,
            n_threads: 0,
            verbose: false,
            print_every: DEFAULT_PRINT_EVERY,
        }
    }
}


impl GrowthControl {
    /// Load a control record from JSON.
    pub fn from_json<R: Read>(reader: R) -> Result<Self> {
        let control = serde_json::from_reader(reader)?;
        Ok(control)
    }


    /// Set the minimum node size.
    pub fn min_node_size(mut self, size: usize) -> Self {
        assert!(size >= 1, "`min_node_size` must be at least 1");
        self.min_node_size = size;
        self
    }


    /// Set the number of features sampled at each node.
    pub fn mtry(mut self, mtry: usize) -> Self {
        assert!(mtry >= 1, "`mtry` must be at least 1");
        self.mtry = mtry;
        self
    }


    /// Set the number of trees.
    pub fn n_trees(mut self, n_trees: usize) -> Self {
        assert!(n_trees >= 1, "`n_trees` must be at least 1");
        self.n_trees = n_trees;
        self
    }


    /// Set the maximum tree depth.
    pub fn max_depth(mut self, depth: usize) -> Self {
        assert!(depth >= 1, "`max_depth` must be at least 1");
        self.max_depth = depth;
        self
    }


    /// Sample with (`true`) or without (`false`) replacement.
    pub fn replacement(mut self, flag: bool) -> Self {
        self.replacement = flag;
        self
    }


    /// Set the fraction drawn when sampling without replacement.
    pub fn selection_fraction(mut self, fraction: f64) -> Self {
        assert!(
            fraction > 0.0 && fraction <= 1.0,
            "`selection_fraction` must be in (0, 1]"
        );
        self.selection_fraction = fraction;
        self
    }


    /// Stratify the bootstrap by class.
    pub fn stratified(mut self, flag: bool) -> Self {
        self.stratified = flag;
        self
    }


    /// Draw `size` observations from `class`.
    /// Turns stratification off.
    pub fn sample_size<S: AsRef<str>>(mut self, class: S, size: usize) -> Self {
        self.sample_sizes.insert(class.as_ref().to_string(), size);
        self.stratified = false;
        self
    }


    /// Replace the per-class sample sizes.
    /// Turns stratification off when `sizes` is non-empty.
    pub fn sample_sizes(mut self, sizes: BTreeMap<String, usize>) -> Self {
        if !sizes.is_empty() { self.stratified = false; }
        self.sample_sizes = sizes;
        self
    }


    /// Never split on the named features.
    pub fn variables_to_ignore<S: AsRef<str>>(mut self, names: &[S]) -> Self {
        self.variables_to_ignore = names.iter()
            .map(|s| s.as_ref().to_string())
            .collect();
        self
    }


    /// Split only on the named features.
    pub fn variables_to_use<S: AsRef<str>>(mut self, names: &[S]) -> Self {
        self.variables_to_use = names.iter()
            .map(|s| s.as_ref().to_string())
            .collect();
        self
    }


    /// Restrict bootstrapping and OOB evaluation to `rows`.
    pub fn training_observations(mut self, rows: Vec<usize>) -> Self {
        self.training_observations = Some(rows);
        self
    }


    /// Compute the OOB confusion matrix after growth.
    pub fn calculate_oob(mut self, flag: bool) -> Self {
        self.calculate_oob = flag;
        self
    }


    /// Fix the seed of the forest RNG.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }


    /// Set the number of worker threads. `0` uses the rayon default.
    pub fn n_threads(mut self, n_threads: usize) -> Self {
        self.n_threads = n_threads;
        self
    }


    /// Print growth progress.
    pub fn verbose(mut self, flag: bool) -> Self {
        self.verbose = flag;
        self
    }


    /// Print a progress line every `trees` trees.
    /// Set `usize::MAX` to print only the summary.
    pub fn print_every(mut self, trees: usize) -> Self {
        assert!(trees >= 1, "`print_every` must be at least 1");
        self.print_every = trees;
        self
    }


    /// Returns the per-tree part of these parameters.
    pub fn tree_control(&self) -> TreeControl {
        TreeControl {
            min_node_size: self.min_node_size,
            max_depth: self.max_depth,
            mtry: self.mtry,
        }
    }


    /// Check these parameters against `dataset`.
    pub fn validate(&self, dataset: &Dataset) -> Result<()> {
        checker::check_dataset(dataset)?;
        checker::check_positive("min_node_size", self.min_node_size)?;
        checker::check_positive("mtry", self.mtry)?;
        checker::check_positive("n_trees", self.n_trees)?;
        checker::check_positive("max_depth", self.max_depth)?;
        checker::check_positive("print_every", self.print_every)?;
        checker::check_fraction("selection_fraction", self.selection_fraction)?;

        let rows = self.training_rows(dataset)?;
        self.check_sample_sizes(dataset, &rows)?;
        self.candidate_features(dataset)?;
        Ok(())
    }


    /// Returns the sorted, distinct training observations.
    pub(crate) fn training_rows(&self, dataset: &Dataset) -> Result<Vec<usize>> {
        let n_sample = dataset.shape().0;
        let rows = match &self.training_observations {
            None => return Ok((0..n_sample).collect()),
            Some(rows) => rows,
        };
        checker::check_rows(rows, n_sample)?;

        let rows = rows.iter()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect::<Vec<_>>();
        if rows.is_empty() {
            return Err(ForestError::InvalidControl(
                "no training observation is selected".into()
            ));
        }
        Ok(rows)
    }


    /// Returns the column positions of the features
    /// that may be used as split candidates.
    pub(crate) fn candidate_features(&self, dataset: &Dataset)
        -> Result<Vec<usize>>
    {
        let ignore = self.variables_to_ignore.iter()
            .map(String::as_str)
            .collect::<BTreeSet<_>>();
        let usable = self.variables_to_use.iter()
            .map(String::as_str)
            .collect::<BTreeSet<_>>();

        if let Some(name) = ignore.intersection(&usable).next() {
            return Err(ForestError::OverlappingVariables(name.to_string()));
        }
        if let Some(name) = ignore.iter()
            .chain(usable.iter())
            .find(|name| dataset.feature_index(name).is_none())
        {
            return Err(ForestError::UnknownFeature(name.to_string()));
        }

        let features = dataset.features()
            .iter()
            .enumerate()
            .filter(|(_, f)| !ignore.contains(f.name()))
            .filter(|(_, f)| usable.is_empty() || usable.contains(f.name()))
            .map(|(j, _)| j)
            .collect::<Vec<_>>();

        if features.is_empty() {
            return Err(ForestError::InvalidControl(
                "every feature is excluded from splitting".into()
            ));
        }
        Ok(features)
    }


    fn check_sample_sizes(&self, dataset: &Dataset, rows: &[usize])
        -> Result<()>
    {
        if self.sample_sizes.is_empty() { return Ok(()); }
        if self.stratified {
            return Err(ForestError::InvalidControl(
                "`sample_sizes` cannot be combined with a stratified bootstrap"
                    .into()
            ));
        }

        let mut counts = vec![0_usize; dataset.n_class()];
        rows.iter().for_each(|&i| counts[dataset.labels()[i]] += 1);

        for class in self.sample_sizes.keys() {
            if dataset.class_index(class).is_none() {
                return Err(ForestError::UnknownClass(class.clone()));
            }
        }

        for (c, &count) in counts.iter().enumerate() {
            if count == 0 { continue; }
            let class = &dataset.classes()[c];
            let size = self.sample_sizes.get(class)
                .ok_or_else(|| ForestError::InvalidControl(
                    format!("no sample size given for class `{class}`")
                ))?;

            if !self.replacement {
                let drawn = (*size as f64 * self.selection_fraction).floor()
                    as usize;
                if drawn > count {
                    return Err(ForestError::InvalidControl(format!(
                        "cannot draw {drawn} observations of class `{class}` \
                         without replacement from {count}"
                    )));
                }
            }
        }
        Ok(())
    }
}
