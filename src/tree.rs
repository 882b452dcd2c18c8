//! Binary classification trees grown by weighted Gini splitting.
mod types;
mod subset;
mod split;
mod partition;
mod node;
mod dtree;


pub use types::{Depth, LeftRight, Splitter};
pub use subset::ObservationSubset;
pub use split::{SplitFinder, gini_impurity};
pub use partition::partition;
pub use node::{Node, SplitNode, TerminalNode};
pub use dtree::{DecisionTree, TreeControl};
