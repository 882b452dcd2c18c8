use rand::prelude::*;
use rand::rngs::StdRng;

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::constants::DEFAULT_MIN_NODE_SIZE;
use crate::dataset::{Dataset, FeatureMatrix};
use crate::error::{ForestError, Result};
use super::{
    node::*,
    partition::partition,
    split::SplitFinder,
    subset::ObservationSubset,
    types::Depth,
};


/// Per-tree growth parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeControl {
    /// Minimum number of observations, counted with multiplicity,
    /// in each child of a split.
    pub min_node_size: usize,
    /// Nodes at this depth become terminal. The root has depth `1`.
    pub max_depth: usize,
    /// Number of features sampled as split candidates at each node.
    pub mtry: usize,
}


impl Default for TreeControl {
    fn default() -> Self {
        Self {
            min_node_size: DEFAULT_MIN_NODE_SIZE,
            max_depth: usize::MAX,
            mtry: usize::MAX,
        }
    }
}


/// A binary classification tree grown with weighted Gini splits.
///
/// A tree starts unbuilt. [`DecisionTree::grow`] builds it once;
/// afterwards it is read-only and can predict any number of times.
/// # Example
/// ```no_run
/// use jyrest::prelude::*;
///
/// let dataset = DatasetReader::new()
///     .file("/path/to/data.tsv")
///     .read()
///     .unwrap();
/// let n_sample = dataset.shape().0;
/// let features = (0..dataset.shape().1).collect::<Vec<_>>();
///
/// let mut tree = DecisionTree::new(&dataset, TreeControl::default(), 7);
/// tree.grow(&ObservationSubset::all(n_sample), &features).unwrap();
///
/// let votes = tree.predict(&dataset.matrix(), &[0, 1, 2]).unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct DecisionTree<'a> {
    dataset: &'a Dataset,
    control: TreeControl,
    seed: u64,
    root: Option<Node>,
}


impl<'a> DecisionTree<'a> {
    /// Construct an unbuilt tree over `dataset`.
    /// `seed` drives the feature subsampling.
    #[inline]
    pub fn new(dataset: &'a Dataset, control: TreeControl, seed: u64) -> Self {
        Self { dataset, control, seed, root: None, }
    }


    /// Grow the tree from `subset` (the in-bag multiset),
    /// choosing split candidates among `features`
    /// (column positions in the dataset).
    ///
    /// Growing again replaces the previous tree.
    pub fn grow(&mut self, subset: &ObservationSubset, features: &[usize])
        -> Result<()>
    {
        if subset.is_empty() { return Err(ForestError::EmptySubset); }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut features = features.to_vec();
        let mut next_id = 0_usize;

        let root = self.grow_node(
            &mut rng,
            subset.clone(),
            &mut features,
            Depth::root(),
            &mut next_id,
        );
        self.root = Some(root);
        Ok(())
    }


    fn grow_node(
        &self,
        rng: &mut StdRng,
        subset: ObservationSubset,
        features: &mut [usize],
        depth: Depth,
        next_id: &mut usize,
    ) -> Node
    {
        let votes = subset.class_weights(self.dataset);
        let n_present = votes.iter().filter(|&&w| w > 0.0).count();

        if n_present < 2 || depth >= self.control.max_depth {
            return self.leaf(votes, depth, next_id);
        }


        // Sample the split candidates for this node.
        let n_candidate = self.control.mtry.min(features.len());
        let (candidates, _) = features.partial_shuffle(rng, n_candidate);
        let candidates = candidates.to_vec();


        let finder = SplitFinder::new(self.dataset, self.control.min_node_size);
        let splitter = match finder.find_best_split(&subset, &candidates) {
            Some(splitter) => splitter,
            None => return self.leaf(votes, depth, next_id),
        };


        let matrix = self.dataset.matrix();
        let (left, right) = partition(&matrix, &subset, &splitter);
        if left.is_empty() || right.is_empty() {
            return self.leaf(votes, depth, next_id);
        }
        drop(subset);


        let left = self.grow_node(rng, left, features, depth + 1, next_id);
        let right = self.grow_node(rng, right, features, depth + 1, next_id);

        Node::split(splitter, left, right, depth)
    }


    #[inline]
    fn leaf(&self, votes: Vec<f64>, depth: Depth, next_id: &mut usize) -> Node {
        let id = *next_id;
        *next_id += 1;
        Node::terminal(votes, depth, id)
    }


    /// Returns `true` once [`DecisionTree::grow`] has succeeded.
    pub fn is_grown(&self) -> bool {
        self.root.is_some()
    }


    /// Returns the root node.
    pub fn root(&self) -> Result<&Node> {
        self.root.as_ref().ok_or(ForestError::NotGrown)
    }


    /// Returns the seed of the feature subsampling.
    pub fn seed(&self) -> u64 {
        self.seed
    }


    /// Returns the growth parameters.
    pub fn control(&self) -> &TreeControl {
        &self.control
    }


    /// Returns the dataset this tree grows from.
    pub fn dataset(&self) -> &'a Dataset {
        self.dataset
    }


    /// Returns the vote vector of the terminal node `row` reaches.
    #[inline]
    pub fn predict_row<'t>(&'t self, matrix: &FeatureMatrix<'_>, row: usize)
        -> Result<&'t [f64]>
    {
        let terminal = self.root()?.route(matrix, row);
        Ok(terminal.votes())
    }


    /// Returns, for every row, the vote vector of the terminal node it
    /// reaches. Vote vectors are indexed like the classes of the dataset
    /// the tree grew from and are not normalized.
    pub fn predict<'t>(&'t self, matrix: &FeatureMatrix<'_>, rows: &[usize])
        -> Result<Vec<&'t [f64]>>
    {
        let root = self.root()?;
        let votes = rows.iter()
            .map(|&i| root.route(matrix, i).votes())
            .collect();
        Ok(votes)
    }


    /// Returns the identifier of the terminal node `row` reaches.
    pub fn terminal_id(&self, matrix: &FeatureMatrix<'_>, row: usize)
        -> Result<usize>
    {
        Ok(self.root()?.route(matrix, row).id())
    }


    /// Returns the number of terminal nodes.
    pub fn n_terminals(&self) -> Result<usize> {
        Ok(self.root()?.terminals().len())
    }


    /// Returns the depth of the deepest node.
    pub fn depth(&self) -> Result<usize> {
        Ok(self.root()?.max_depth())
    }


    /// Write the grown tree to a Graphviz dot file.
    pub fn to_dot_file<P>(&self, path: P) -> Result<()>
        where P: AsRef<Path>
    {
        let root = self.root()?;
        let mut f = File::create(path)?;
        f.write_all(b"graph DecisionTree {\n")?;

        let info = root.to_dot_info(self.dataset.classes(), 0).0;
        for row in info {
            f.write_all(row.as_bytes())?;
        }

        f.write_all(b"}\n")?;
        Ok(())
    }
}
