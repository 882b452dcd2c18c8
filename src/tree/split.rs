//! Weighted Gini split search.

use rayon::prelude::*;

use std::cmp::Ordering;

use crate::constants::IMPURITY_UPPER_BOUND;
use crate::dataset::Dataset;
use super::{
    subset::ObservationSubset,
    types::Splitter,
};


/// Best boundary found on a single feature.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Candidate {
    feature: usize,
    threshold: f64,
    criterion: f64,
}


/// Searches the (feature, threshold) pair
/// that minimizes the weighted Gini impurity of the two children.
#[derive(Debug, Clone, Copy)]
pub struct SplitFinder<'a> {
    dataset: &'a Dataset,
    min_node_size: usize,
}


impl<'a> SplitFinder<'a> {
    /// Construct a new instance of `SplitFinder`.
    /// Both children of an accepted split hold at least `min_node_size`
    /// observations, counted with multiplicity.
    #[inline]
    pub fn new(dataset: &'a Dataset, min_node_size: usize) -> Self {
        Self { dataset, min_node_size }
    }


    /// Returns the best splitting rule over `candidates`,
    /// or `None` when no boundary satisfies the node size constraint
    /// or improves on the impurity bound.
    ///
    /// Among equally good boundaries, the earliest feature in
    /// `candidates` and the smallest threshold win.
    pub fn find_best_split(
        &self,
        subset: &ObservationSubset,
        candidates: &[usize],
    ) -> Option<Splitter>
    {
        let parent = subset.class_weights(self.dataset);

        let per_feature = candidates.par_iter()
            .map(|&j| self.best_split_on(subset, j, &parent))
            .collect::<Vec<_>>();

        let best = per_feature.into_iter()
            .flatten()
            .fold(None, |best: Option<Candidate>, cand| match best {
                Some(b) if b.criterion <= cand.criterion => Some(b),
                _ => Some(cand),
            })?;

        let name = self.dataset.features()[best.feature].name();
        Some(Splitter::new(name, best.feature, best.threshold))
    }


    /// Sweeps the observations of `subset` sorted by feature `j`,
    /// moving class weight from the right child to the left child.
    fn best_split_on(
        &self,
        subset: &ObservationSubset,
        j: usize,
        parent: &[f64],
    ) -> Option<Candidate>
    {
        let column = self.dataset.features()[j].values();
        let n_class = parent.len();

        let mut pack = subset.iter()
            .map(|(i, k)| (column[i], i, k))
            .collect::<Vec<_>>();
        pack.sort_by(|a, b| a.0.total_cmp(&b.0));

        let parent_total = parent.iter().sum::<f64>();
        if parent_total <= 0.0 { return None; }
        let total_size = subset.size();

        let mut left = vec![0.0; n_class];
        let mut right = vec![0.0; n_class];
        let mut left_size = 0_usize;

        let mut best: Option<Candidate> = None;
        let mut best_criterion = IMPURITY_UPPER_BOUND;

        for pos in 0..pack.len().saturating_sub(1) {
            let (value, i, k) = pack[pos];
            for c in 0..n_class {
                left[c] += k as f64 * self.dataset.weight(c, i);
            }
            left_size += k;

            let next = pack[pos + 1].0;
            if value.total_cmp(&next) == Ordering::Equal { continue; }

            let right_size = total_size - left_size;
            if left_size < self.min_node_size
                || right_size < self.min_node_size
            {
                continue;
            }

            for c in 0..n_class {
                right[c] = (parent[c] - left[c]).max(0.0);
            }
            let left_total = left.iter().sum::<f64>();
            let right_total = right.iter().sum::<f64>();

            let criterion = (left_total / parent_total) * gini_impurity(&left)
                + (right_total / parent_total) * gini_impurity(&right);

            if criterion < best_criterion {
                best_criterion = criterion;
                best = Some(Candidate {
                    feature: j,
                    threshold: (value + next) / 2.0,
                    criterion,
                });
            }
        }
        best
    }
}


/// Returns the gini-impurity `1 - Σ (w_c / W)^2` of the given class weights.
/// An empty (zero weight) node has impurity `0`.
#[inline(always)]
pub fn gini_impurity(weights: &[f64]) -> f64 {
    let total = weights.iter().sum::<f64>();
    if total <= 0.0 { return 0.0; }

    let correct = weights.iter()
        .map(|w| (w / total).powi(2))
        .sum::<f64>();

    (1.0 - correct).max(0.0)
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Feature;
    use approx::assert_relative_eq;

    fn dataset(x: Vec<f64>, z: Vec<f64>, labels: &[&str]) -> Dataset {
        let x = Feature::from_values("x", x);
        let z = Feature::from_values("z", z);
        Dataset::new(vec![x, z], labels).unwrap()
    }

    #[test]
    fn test_gini_impurity_01() {
        let res = gini_impurity(&[5.0, 5.0]);
        let exp = 0.5;
        assert_eq!(exp, res, "expected {exp:?}, got {res:?}.");
    }

    #[test]
    fn test_gini_impurity_02() {
        let res = gini_impurity(&[0.0, 3.0]);
        let exp = 0.0;
        assert_eq!(exp, res, "expected {exp:?}, got {res:?}.");

        let res = gini_impurity(&[0.0, 0.0]);
        assert_eq!(exp, res, "expected {exp:?}, got {res:?}.");
    }

    #[test]
    fn test_gini_impurity_03() {
        let res = gini_impurity(&[1.0, 1.0, 2.0]);
        assert_relative_eq!(res, 0.625);
    }

    #[test]
    fn test_find_best_split_01() {
        // `x` separates the classes perfectly, `z` is noise.
        let data = dataset(
            vec![1.0, 2.0, 3.0, 10.0, 11.0, 12.0],
            vec![5.0, 1.0, 5.0, 1.0, 5.0, 1.0],
            &["a", "a", "a", "b", "b", "b"],
        );
        let subset = ObservationSubset::all(6);
        let finder = SplitFinder::new(&data, 1);

        let res = finder.find_best_split(&subset, &[0, 1]).unwrap();
        let exp = Splitter::new("x", 0, 6.5);
        assert_eq!(exp, res, "expected {exp:?}, got {res:?}.");
    }

    #[test]
    fn test_find_best_split_02() {
        // Only the noise feature is a candidate; it still splits.
        let data = dataset(
            vec![1.0, 2.0, 3.0, 10.0],
            vec![1.0, 2.0, 1.0, 2.0],
            &["a", "a", "b", "b"],
        );
        let subset = ObservationSubset::all(4);
        let finder = SplitFinder::new(&data, 1);

        let res = finder.find_best_split(&subset, &[1]).unwrap();
        let exp = Splitter::new("z", 1, 1.5);
        assert_eq!(exp, res, "expected {exp:?}, got {res:?}.");
    }

    #[test]
    fn test_find_best_split_03() {
        // Constant features offer no boundary.
        let data = dataset(
            vec![1.0, 1.0, 1.0],
            vec![2.0, 2.0, 2.0],
            &["a", "b", "a"],
        );
        let subset = ObservationSubset::all(3);
        let finder = SplitFinder::new(&data, 1);

        let res = finder.find_best_split(&subset, &[0, 1]);
        assert!(res.is_none(), "expected no split, got {res:?}.");
    }

    #[test]
    fn test_find_best_split_04() {
        // Two observations cannot both reach two observations per child.
        let data = dataset(vec![1.0, 2.0], vec![1.0, 2.0], &["a", "b"]);
        let subset = ObservationSubset::all(2);
        let finder = SplitFinder::new(&data, 2);

        let res = finder.find_best_split(&subset, &[0, 1]);
        assert!(res.is_none(), "expected no split, got {res:?}.");
    }

    #[test]
    fn test_find_best_split_05() {
        // Multiplicities count toward the node size.
        let data = dataset(vec![1.0, 2.0], vec![1.0, 2.0], &["a", "b"]);
        let subset = ObservationSubset::from_rows([0, 0, 1, 1]);
        let finder = SplitFinder::new(&data, 2);

        let res = finder.find_best_split(&subset, &[0]).unwrap();
        let exp = Splitter::new("x", 0, 1.5);
        assert_eq!(exp, res, "expected {exp:?}, got {res:?}.");
    }

    #[test]
    fn test_find_best_split_06() {
        // Class weights move the best threshold.
        let data = dataset(
            vec![1.0, 2.0, 3.0, 4.0],
            vec![0.0, 0.0, 0.0, 0.0],
            &["b", "a", "b", "a"],
        );
        let subset = ObservationSubset::all(4);

        let finder = SplitFinder::new(&data, 1);
        let res = finder.find_best_split(&subset, &[0]).unwrap();
        let exp = Splitter::new("x", 0, 1.5);
        assert_eq!(exp, res, "expected {exp:?}, got {res:?}.");

        let weights = std::collections::BTreeMap::from([("b".to_string(), 5.0)]);
        let data = data.with_class_weights(&weights).unwrap();
        let finder = SplitFinder::new(&data, 1);
        let res = finder.find_best_split(&subset, &[0]).unwrap();
        let exp = Splitter::new("x", 0, 3.5);
        assert_eq!(exp, res, "expected {exp:?}, got {res:?}.");
    }
}
