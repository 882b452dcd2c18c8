use fixedbitset::FixedBitSet;
use rand::prelude::*;
use rand::rngs::StdRng;

use crate::control::GrowthControl;
use crate::dataset::Dataset;
use crate::error::Result;
use crate::tree::ObservationSubset;


/// Draws the in-bag multiset and the OOB set of each tree.
///
/// Observations are pooled once, either per class or all together.
/// Every draw then samples each pool independently.
#[derive(Debug, Clone)]
pub(crate) struct BootstrapSampler {
    n_sample: usize,
    // Training observations, sorted.
    rows: Vec<usize>,
    // Pools of training observations and the size drawn from each.
    pools: Vec<Vec<usize>>,
    sizes: Vec<usize>,
    replacement: bool,
    selection_fraction: f64,
}


impl BootstrapSampler {
    /// Build the pools of `dataset` described by `control`.
    /// `control` must have been validated against `dataset`.
    pub(crate) fn new(dataset: &Dataset, control: &GrowthControl)
        -> Result<Self>
    {
        let rows = control.training_rows(dataset)?;
        let n_class = dataset.n_class();
        let labels = dataset.labels();

        let by_class = || {
            let mut pools = vec![Vec::new(); n_class];
            rows.iter().for_each(|&i| pools[labels[i]].push(i));
            pools
        };

        let (pools, sizes) = if !control.sample_sizes.is_empty() {
            let pools = by_class();
            let sizes = dataset.classes()
                .iter()
                .map(|c| control.sample_sizes.get(c).copied().unwrap_or(0))
                .collect::<Vec<_>>();
            (pools, sizes)
        } else if control.stratified {
            let pools = by_class();
            let sizes = pools.iter().map(Vec::len).collect::<Vec<_>>();
            (pools, sizes)
        } else {
            (vec![rows.clone()], vec![rows.len()])
        };

        let sampler = Self {
            n_sample: dataset.shape().0,
            rows,
            pools,
            sizes,
            replacement: control.replacement,
            selection_fraction: control.selection_fraction,
        };
        Ok(sampler)
    }


    /// Returns the training observations.
    pub(crate) fn rows(&self) -> &[usize] {
        &self.rows[..]
    }


    /// Draw one bootstrap sample.
    ///
    /// Returns the in-bag multiset and the training observations
    /// that were never drawn.
    pub(crate) fn draw(&self, rng: &mut StdRng)
        -> (ObservationSubset, FixedBitSet)
    {
        let mut counts = vec![0_usize; self.n_sample];

        for (pool, &size) in self.pools.iter().zip(&self.sizes) {
            if pool.is_empty() { continue; }

            if self.replacement {
                for _ in 0..size {
                    let k = rng.gen_range(0..pool.len());
                    counts[pool[k]] += 1;
                }
            } else {
                let n = (size as f64 * self.selection_fraction).floor() as usize;
                let n = n.min(pool.len());
                let mut pool = pool.clone();
                let (chosen, _) = pool.partial_shuffle(rng, n);
                chosen.iter().for_each(|&i| counts[i] += 1);
            }
        }

        let mut oob = FixedBitSet::with_capacity(self.n_sample);
        self.rows.iter()
            .filter(|&&i| counts[i] == 0)
            .for_each(|&i| oob.insert(i));

        (ObservationSubset::from_counts(&counts), oob)
    }
}
