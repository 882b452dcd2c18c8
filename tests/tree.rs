use jyrest::prelude::*;
use jyrest::tree::{Node, SplitFinder, partition};

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;


// Two Gaussian blobs in the plane.
//
//  y
//    |          b b
//    |        b  b b
//    |  a a
//    | a  a a
//    +------------------ x
fn blobs(n_per_class: usize, seed: u64) -> Dataset {
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0, 1.0).unwrap();

    let mut x = Vec::new();
    let mut y = Vec::new();
    let mut labels = Vec::new();
    for (class, center) in [("a", 0.0), ("b", 3.0)] {
        for _ in 0..n_per_class {
            x.push(center + noise.sample(&mut rng));
            y.push(center + noise.sample(&mut rng));
            labels.push(class);
        }
    }

    let features = vec![Feature::from_values("x", x), Feature::from_values("y", y)];
    Dataset::new(features, &labels).unwrap()
}


#[test]
fn vote_totals_equal_bootstrap_weights() {
    let dataset = blobs(30, 1);
    let n_sample = dataset.shape().0;
    let mut rng = StdRng::seed_from_u64(2);

    for seed in 0..10 {
        let rows = (0..n_sample).map(|_| rng.gen_range(0..n_sample));
        let subset = ObservationSubset::from_rows(rows);

        let control = TreeControl { mtry: 1, ..Default::default() };
        let mut tree = DecisionTree::new(&dataset, control, seed);
        tree.grow(&subset, &[0, 1]).unwrap();

        let mut res = vec![0.0; dataset.n_class()];
        for leaf in tree.root().unwrap().terminals() {
            res.iter_mut().zip(leaf.votes()).for_each(|(r, v)| *r += v);
        }
        let exp = subset.class_weights(&dataset);
        assert_eq!(exp, res, "expected {exp:?}, got {res:?}.");
    }
}


#[test]
fn split_children_are_non_empty() {
    let dataset = blobs(20, 3);
    let n_sample = dataset.shape().0;
    let matrix = dataset.matrix();
    let subset = ObservationSubset::all(n_sample);

    for min_node_size in [1, 5, 15] {
        let finder = SplitFinder::new(&dataset, min_node_size);
        let splitter = finder.find_best_split(&subset, &[0, 1])
            .expect("two separated blobs must be split");
        let (left, right) = partition(&matrix, &subset, &splitter);

        assert!(left.size() >= min_node_size);
        assert!(right.size() >= min_node_size);
        let res = left.size() + right.size();
        let exp = n_sample;
        assert_eq!(exp, res, "expected {exp:?}, got {res:?}.");
    }
}


#[test]
fn single_class_gives_single_terminal() {
    let x = Feature::from_values("x", vec![0.3, 1.2, 0.7, 4.1]);
    let z = Feature::from_values("z", vec![1.0, 1.0, 2.0, 2.0]);
    let dataset = Dataset::new(vec![x, z], &["a"; 4]).unwrap();

    for (mtry, min_node_size) in [(1, 1), (2, 1), (2, 3)] {
        let control = TreeControl { mtry, min_node_size, ..Default::default() };
        let mut tree = DecisionTree::new(&dataset, control, 0);
        tree.grow(&ObservationSubset::all(4), &[0, 1]).unwrap();

        let root = tree.root().unwrap();
        assert!(matches!(root, Node::Terminal(_)));
        let res = (root.depth(), tree.n_terminals().unwrap());
        let exp = (1, 1);
        assert_eq!(exp, res, "expected {exp:?}, got {res:?}.");
    }
}


#[test]
fn two_observations_with_min_node_size_two() {
    let x = Feature::from_values("x", vec![0.0, 1.0]);
    let dataset = Dataset::new(vec![x], &["a", "b"]).unwrap();
    let control = TreeControl { min_node_size: 2, ..Default::default() };

    let mut tree = DecisionTree::new(&dataset, control, 0);
    tree.grow(&ObservationSubset::all(2), &[0]).unwrap();

    let res = tree.n_terminals().unwrap();
    let exp = 1;
    assert_eq!(exp, res, "expected {exp:?}, got {res:?}.");

    let res = tree.predict(&dataset.matrix(), &[0, 1]).unwrap();
    let exp = vec![&[1.0, 1.0][..], &[1.0, 1.0][..]];
    assert_eq!(exp, res, "expected {exp:?}, got {res:?}.");
}


#[test]
fn predict_is_idempotent() {
    let dataset = blobs(25, 4);
    let n_sample = dataset.shape().0;
    let rows = (0..n_sample).collect::<Vec<_>>();

    let control = TreeControl { mtry: 1, max_depth: 4, ..Default::default() };
    let mut tree = DecisionTree::new(&dataset, control, 11);
    tree.grow(&ObservationSubset::all(n_sample), &[0, 1]).unwrap();
    assert!(tree.depth().unwrap() <= 4);

    let matrix = dataset.matrix();
    let first = tree.predict(&matrix, &rows).unwrap();
    let second = tree.predict(&matrix, &rows).unwrap();
    assert_eq!(first, second, "expected {first:?}, got {second:?}.");
}


#[test]
fn dot_file_is_written() {
    let dataset = blobs(10, 5);
    let mut tree = DecisionTree::new(&dataset, TreeControl::default(), 0);
    tree.grow(&ObservationSubset::all(20), &[0, 1]).unwrap();

    let path = std::env::temp_dir().join("jyrest_tree_test.dot");
    tree.to_dot_file(&path).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert!(text.starts_with("graph DecisionTree {"));
    assert!(text.trim_end().ends_with('}'));
}
