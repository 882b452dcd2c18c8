use rand::prelude::*;
use rand::rngs::StdRng;
use rayon::prelude::*;
use serde::Serialize;

use std::collections::BTreeMap;

use crate::dataset::FeatureMatrix;
use crate::error::{ForestError, Result};
use crate::metrics::ConfusionMatrix;
use crate::tree::DecisionTree;
use super::forest_struct::{Forest, argmax};


/// Permutation importance of every candidate feature.
///
/// Each score is the drop of a tree's OOB accuracy (or G-mean)
/// after permuting the feature among that tree's OOB observations,
/// averaged over the trees.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableImportance {
    /// Mean drop in OOB accuracy, keyed by feature name.
    pub accuracy: BTreeMap<String, f64>,
    /// Mean drop in OOB macro G-mean, keyed by feature name.
    pub g_mean: BTreeMap<String, f64>,
}


// Drops of one tree, one entry per candidate feature.
struct TreeImportance {
    accuracy: Vec<f64>,
    // `None` when the G-mean of the tree's OOB set is undefined.
    g_mean: Option<Vec<f64>>,
}


impl<'a> Forest<'a> {
    /// Compute the permutation importance of every candidate feature.
    ///
    /// Trees without OOB observations are skipped.
    /// The G-mean score averages only the trees whose OOB set holds
    /// every class.
    /// The dataset itself is never modified;
    /// each permutation works on a copy of one column.
    pub fn variable_importance(&self) -> Result<VariableImportance> {
        if !self.is_grown() { return Err(ForestError::NotGrown); }

        let per_tree = self.trees.par_iter()
            .zip(&self.oob)
            .map(|(tree, oob)| {
                let rows = oob.ones().collect::<Vec<_>>();
                if rows.is_empty() { return Ok(None); }
                self.tree_importance(tree, &rows).map(Some)
            })
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .flatten()
            .collect::<Vec<_>>();

        if per_tree.is_empty() {
            return Err(ForestError::UndefinedMetric(
                "no tree has an out-of-bag observation".into()
            ));
        }

        let accuracy = mean_drops(per_tree.iter().map(|t| &t.accuracy[..]));
        let g_mean = per_tree.iter()
            .filter_map(|t| t.g_mean.as_deref())
            .collect::<Vec<_>>();
        if g_mean.is_empty() {
            return Err(ForestError::UndefinedMetric(
                "no tree has every class among its out-of-bag observations"
                    .into()
            ));
        }
        let g_mean = mean_drops(g_mean.into_iter());

        let names = self.candidate_features();
        let importance = VariableImportance {
            accuracy: names.iter()
                .map(|s| s.to_string())
                .zip(accuracy)
                .collect(),
            g_mean: names.iter()
                .map(|s| s.to_string())
                .zip(g_mean)
                .collect(),
        };
        Ok(importance)
    }


    fn tree_importance(&self, tree: &DecisionTree<'_>, rows: &[usize])
        -> Result<TreeImportance>
    {
        let matrix = self.dataset.matrix();
        let base = self.oob_confusion_of(tree, &matrix, rows)?;
        let base_accuracy = base.accuracy()?;
        let base_g_mean = base.g_mean().ok();

        let mut rng = StdRng::seed_from_u64(tree.seed());
        let mut accuracy = Vec::with_capacity(self.features.len());
        let mut g_mean = base_g_mean.map(|_| {
            Vec::with_capacity(self.features.len())
        });

        let cells = [rows.to_vec()];
        for &j in &self.features {
            let permuted = permuted_within(matrix.column(j), &cells, &mut rng);
            let permuted_matrix = matrix.with_column(j, &permuted);
            let confusion = self.oob_confusion_of(tree, &permuted_matrix, rows)?;

            accuracy.push(base_accuracy - confusion.accuracy()?);
            if let (Some(drops), Some(base)) = (g_mean.as_mut(), base_g_mean) {
                drops.push(base - confusion.g_mean()?);
            }
        }
        Ok(TreeImportance { accuracy, g_mean })
    }


    /// Compute the conditional permutation importance of every
    /// candidate feature.
    ///
    /// Features whose absolute Pearson correlation with a feature is at
    /// least `max_correlation` condition its permutation:
    /// the OOB observations of each tree are cut into cells by that tree's
    /// splits on the correlated features, and the feature is permuted
    /// within each cell only.
    /// Each score is the drop of OOB accuracy averaged over the trees
    /// that have OOB observations.
    pub fn conditional_variable_importance(&self, max_correlation: f64)
        -> Result<BTreeMap<String, f64>>
    {
        if !self.is_grown() { return Err(ForestError::NotGrown); }

        let matrix = self.dataset.matrix();
        let correlated = self.features.iter()
            .map(|&j| {
                self.features.iter()
                    .copied()
                    .filter(|&k| k != j)
                    .filter(|&k| {
                        let r = pearson(matrix.column(j), matrix.column(k));
                        r.abs() >= max_correlation
                    })
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>();

        let per_tree = self.trees.par_iter()
            .zip(&self.oob)
            .map(|(tree, oob)| {
                let rows = oob.ones().collect::<Vec<_>>();
                if rows.is_empty() { return Ok(None); }
                self.conditional_tree_importance(tree, &rows, &correlated)
                    .map(Some)
            })
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .flatten()
            .collect::<Vec<_>>();

        if per_tree.is_empty() {
            return Err(ForestError::UndefinedMetric(
                "no tree has an out-of-bag observation".into()
            ));
        }

        let drops = mean_drops(per_tree.iter().map(|t| &t[..]));
        let importance = self.candidate_features()
            .into_iter()
            .map(|s| s.to_string())
            .zip(drops)
            .collect();
        Ok(importance)
    }


    fn conditional_tree_importance(
        &self,
        tree: &DecisionTree<'_>,
        rows: &[usize],
        correlated: &[Vec<usize>],
    ) -> Result<Vec<f64>>
    {
        let matrix = self.dataset.matrix();
        let root = tree.root()?;
        let base = self.oob_confusion_of(tree, &matrix, rows)?.accuracy()?;

        let mut rng = StdRng::seed_from_u64(tree.seed());
        self.features.iter()
            .zip(correlated)
            .map(|(&j, condition_on)| -> Result<f64> {
                let grid = root.conditional_grid(
                    &matrix, vec![rows.to_vec()], condition_on
                );
                let permuted = permuted_within(matrix.column(j), &grid, &mut rng);
                let permuted_matrix = matrix.with_column(j, &permuted);
                let confusion = self.oob_confusion_of(
                    tree, &permuted_matrix, rows
                )?;
                Ok(base - confusion.accuracy()?)
            })
            .collect()
    }


    fn oob_confusion_of(
        &self,
        tree: &DecisionTree<'_>,
        matrix: &FeatureMatrix<'_>,
        rows: &[usize],
    ) -> Result<ConfusionMatrix>
    {
        let classes = self.dataset.classes();
        let mut confusion = ConfusionMatrix::new(classes);
        for (&i, votes) in rows.iter().zip(tree.predict(matrix, rows)?) {
            confusion.record(
                self.dataset.label(i), &classes[argmax(votes)], 1.0
            );
        }
        Ok(confusion)
    }
}


// A copy of `column` whose values are shuffled within each cell.
fn permuted_within(column: &[f64], cells: &[Vec<usize>], rng: &mut StdRng)
    -> Vec<f64>
{
    let mut permuted = column.to_vec();
    for cell in cells {
        let mut values = cell.iter()
            .map(|&i| column[i])
            .collect::<Vec<_>>();
        values.shuffle(rng);
        cell.iter()
            .zip(values)
            .for_each(|(&i, v)| { permuted[i] = v; });
    }
    permuted
}


// Pearson correlation, `0.0` when either column is constant.
fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (xi, yi) in x.iter().zip(y) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let denom = (var_x * var_y).sqrt();
    if denom == 0.0 { return 0.0; }
    cov / denom
}


fn mean_drops<'b, I>(drops: I) -> Vec<f64>
    where I: Iterator<Item = &'b [f64]>
{
    let mut n = 0_usize;
    let mut sum: Vec<f64> = Vec::new();
    for tree in drops {
        if sum.is_empty() { sum = vec![0.0; tree.len()]; }
        sum.iter_mut().zip(tree).for_each(|(s, d)| { *s += d; });
        n += 1;
    }
    sum.into_iter().map(|s| s / n as f64).collect()
}
