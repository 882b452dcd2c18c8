use rayon::prelude::*;

use std::collections::BTreeMap;

use crate::dataset::{Dataset, FeatureMatrix};
use crate::error::{ForestError, Result};
use super::forest_struct::Forest;


impl<'a> Forest<'a> {
    /// Returns the proximity of every pair of observations of `dataset`.
    ///
    /// The proximity of `(i, j)`, `i < j`, is the fraction of trees in which
    /// both observations reach the same terminal node.
    /// Pairs that never share a terminal node are absent.
    pub fn proximities(&self, dataset: &Dataset)
        -> Result<BTreeMap<(usize, usize), f64>>
    {
        if !self.is_grown() { return Err(ForestError::NotGrown); }

        let n_sample = dataset.shape().0;
        let matrix = FeatureMatrix::aligned(self.dataset, dataset, &self.features)?;

        let per_tree = self.trees.par_iter()
            .map(|tree| -> Result<Vec<Vec<usize>>> {
                let mut groups = vec![Vec::new(); tree.n_terminals()?];
                for i in 0..n_sample {
                    groups[tree.terminal_id(&matrix, i)?].push(i);
                }
                Ok(groups)
            })
            .collect::<Result<Vec<_>>>()?;

        let mut counts = BTreeMap::new();
        for group in per_tree.iter().flatten() {
            for (k, &i) in group.iter().enumerate() {
                for &j in &group[k + 1..] {
                    *counts.entry((i, j)).or_insert(0_usize) += 1;
                }
            }
        }

        let n_trees = self.trees.len() as f64;
        let proximities = counts.into_iter()
            .map(|(pair, count)| (pair, count as f64 / n_trees))
            .collect();
        Ok(proximities)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::GrowthControl;
    use crate::dataset::Feature;

    #[test]
    fn test_proximities_01() {
        let x = Feature::from_values("x", vec![0.0, 0.1, 5.0, 5.1]);
        let dataset = Dataset::new(vec![x], &["a", "a", "b", "b"]).unwrap();
        let control = GrowthControl::default().n_trees(10).seed(4);
        let mut forest = Forest::new(&dataset, control);
        forest.grow().unwrap();

        let proximities = forest.proximities(&dataset).unwrap();
        assert!(proximities.keys().all(|(i, j)| i < j));
        assert!(proximities.values().all(|p| (0.0..=1.0).contains(p)));

        let res = proximities.get(&(0, 2)).copied().unwrap_or(0.0);
        let exp = 0.0;
        assert_eq!(exp, res, "expected {exp:?}, got {res:?}.");
    }
}
