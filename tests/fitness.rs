use jyrest::prelude::*;

use fixedbitset::FixedBitSet;
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use std::collections::BTreeMap;


// `signal` separates the classes, `noise` does not.
// Class `minor` has a third of the observations of `major`.
fn imbalanced(seed: u64) -> Dataset {
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0, 1.0).unwrap();

    let mut signal = Vec::new();
    let mut other = Vec::new();
    let mut labels = Vec::new();
    for (class, center, n) in [("major", 0.0, 45), ("minor", 3.0, 15)] {
        for _ in 0..n {
            signal.push(center + noise.sample(&mut rng));
            other.push(noise.sample(&mut rng));
            labels.push(class);
        }
    }

    let features = vec![
        Feature::from_values("signal", signal),
        Feature::from_values("noise", other),
    ];
    Dataset::new(features, &labels).unwrap()
}


fn full_mask(len: usize) -> FixedBitSet {
    let mut mask = FixedBitSet::with_capacity(len);
    mask.insert_range(..);
    mask
}


#[test]
fn fitness_is_deterministic_for_a_seed() {
    let dataset = imbalanced(1);
    let control = GrowthControl::default().n_trees(30);
    let fitness = ForestFitness::new(&dataset, control);
    let selection = Selection::Features(full_mask(2));

    let first = fitness.evaluate(&selection, None, 17).unwrap();
    let second = fitness.evaluate(&selection, None, 17).unwrap();
    assert_eq!(first, second, "expected {first:?}, got {second:?}.");
    assert!((-1.0..=1.0).contains(&first));
}


#[test]
fn feature_mask_drops_the_signal() {
    let dataset = imbalanced(2);
    let control = GrowthControl::default().n_trees(30);
    let fitness = ForestFitness::new(&dataset, control)
        .metric(FitnessMetric::GMean);

    let all = fitness.evaluate(&Selection::Features(full_mask(2)), None, 3)
        .unwrap();

    let mut noise_only = FixedBitSet::with_capacity(2);
    noise_only.insert(1);
    let without = fitness.evaluate(&Selection::Features(noise_only), None, 3)
        .unwrap();

    assert!(all > without, "expected {all} > {without}");
}


#[test]
fn observation_mask_and_class_weights() {
    let dataset = imbalanced(3);
    let control = GrowthControl::default().n_trees(30);
    let fitness = ForestFitness::new(&dataset, control)
        .metric(FitnessMetric::GMean);

    let mut mask = FixedBitSet::with_capacity(60);
    (0..60).filter(|i| i % 3 != 0).for_each(|i| mask.insert(i));
    let selection = Selection::Observations(mask);

    let weights = BTreeMap::from([("minor".to_string(), 3.0)]);
    let res = fitness.evaluate(&selection, Some(&weights), 5).unwrap();
    assert!((0.0..=1.0).contains(&res));

    let weights = BTreeMap::from([("other".to_string(), 3.0)]);
    let res = fitness.evaluate(&selection, Some(&weights), 5);
    assert!(matches!(res, Err(ForestError::UnknownClass(_))));
}
