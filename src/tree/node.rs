//! Defines the nodes of a grown tree.
use crate::dataset::FeatureMatrix;
use super::types::*;


/// Enumeration of `SplitNode` and `TerminalNode`.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// A node that have two childrens.
    Split(SplitNode),


    /// A node that have no child.
    Terminal(TerminalNode),
}


/// Represents the branch nodes of a decision tree.
/// Each `SplitNode` must have two childrens
#[derive(Debug, Clone, PartialEq)]
pub struct SplitNode {
    pub(super) splitter: Splitter,
    pub(super) left: Box<Node>,
    pub(super) right: Box<Node>,
    pub(super) depth: Depth,
}


/// Represents the leaf nodes of a decision tree.
#[derive(Debug, Clone, PartialEq)]
pub struct TerminalNode {
    // Total in-bag weight per class of the observations reaching this node.
    pub(super) votes: Vec<f64>,
    pub(super) depth: Depth,
    // Position of this terminal in left-to-right order.
    pub(super) id: usize,
}


impl SplitNode {
    /// Returns the splitting rule of this node.
    pub fn splitter(&self) -> &Splitter {
        &self.splitter
    }


    /// Returns the left child.
    pub fn left(&self) -> &Node {
        &self.left
    }


    /// Returns the right child.
    pub fn right(&self) -> &Node {
        &self.right
    }
}


impl TerminalNode {
    /// Returns the class-weight vote vector,
    /// indexed like [`Dataset::classes`](crate::Dataset::classes).
    pub fn votes(&self) -> &[f64] {
        &self.votes[..]
    }


    /// Returns the identifier of this terminal within its tree.
    pub fn id(&self) -> usize {
        self.id
    }
}


impl Node {
    /// Construct a terminal node.
    #[inline]
    pub(super) fn terminal(votes: Vec<f64>, depth: Depth, id: usize) -> Self {
        Self::Terminal(TerminalNode { votes, depth, id })
    }


    /// Construct a split node.
    #[inline]
    pub(super) fn split(
        splitter: Splitter,
        left: Node,
        right: Node,
        depth: Depth,
    ) -> Self
    {
        let left = Box::new(left);
        let right = Box::new(right);
        Self::Split(SplitNode { splitter, left, right, depth })
    }


    /// Returns the depth of this node.
    pub fn depth(&self) -> usize {
        match self {
            Node::Split(ref node) => node.depth.get(),
            Node::Terminal(ref node) => node.depth.get(),
        }
    }


    /// Routes `row` from this node down to a terminal node.
    #[inline]
    pub fn route(&self, matrix: &FeatureMatrix<'_>, row: usize)
        -> &TerminalNode
    {
        let mut node = self;
        loop {
            match node {
                Node::Split(ref split) => {
                    node = match split.splitter.split(matrix, row) {
                        LeftRight::Left => split.left.as_ref(),
                        LeftRight::Right => split.right.as_ref(),
                    };
                },
                Node::Terminal(ref terminal) => return terminal,
            }
        }
    }


    /// Returns every terminal node of this subtree, left to right.
    pub fn terminals(&self) -> Vec<&TerminalNode> {
        match self {
            Node::Split(ref node) => {
                let mut terminals = node.left.terminals();
                terminals.append(&mut node.right.terminals());
                terminals
            },
            Node::Terminal(ref node) => vec![node],
        }
    }


    /// Returns the depth of the deepest node in this subtree.
    pub fn max_depth(&self) -> usize {
        match self {
            Node::Split(ref node) => {
                node.left.max_depth().max(node.right.max_depth())
            },
            Node::Terminal(ref node) => node.depth.get(),
        }
    }


    /// Bisects the cells of `grid` at every split of this subtree
    /// whose feature column is in `condition_on`.
    /// Splits are visited in pre-order and empty cells are dropped.
    pub fn conditional_grid(
        &self,
        matrix: &FeatureMatrix<'_>,
        grid: Vec<Vec<usize>>,
        condition_on: &[usize],
    ) -> Vec<Vec<usize>>
    {
        let node = match self {
            Node::Split(ref node) => node,
            Node::Terminal(_) => return grid,
        };

        let grid = if condition_on.contains(&node.splitter.index) {
            grid.into_iter()
                .flat_map(|cell| {
                    let (left, right): (Vec<_>, Vec<_>) = cell.into_iter()
                        .partition(|&i| {
                            node.splitter.split(matrix, i) == LeftRight::Left
                        });
                    [left, right]
                })
                .filter(|cell| !cell.is_empty())
                .collect()
        } else {
            grid
        };

        let grid = node.left.conditional_grid(matrix, grid, condition_on);
        node.right.conditional_grid(matrix, grid, condition_on)
    }


    pub(super) fn to_dot_info(&self, classes: &[String], id: usize)
        -> (Vec<String>, usize)
    {
        match self {
            Node::Split(b) => {
                let b_info = format!(
                    "\tnode_{id} [ label = \"{feat} <= {thr:.3} ?\" ];\n",
                    feat = b.splitter.feature,
                    thr = b.splitter.threshold,
                );

                let (l_info, next_id) = b.left.to_dot_info(classes, id + 1);
                let (mut r_info, ret_id) = b.right.to_dot_info(classes, next_id);

                let mut info = l_info;
                info.push(b_info);
                info.append(&mut r_info);

                let l_edge = format!(
                    "\tnode_{id} -- node_{l_id} [ label = \"Yes\" ];\n",
                    l_id = id + 1
                );
                let r_edge = format!(
                    "\tnode_{id} -- node_{r_id} [ label = \"No\" ];\n",
                    r_id = next_id
                );

                info.push(l_edge);
                info.push(r_edge);

                (info, ret_id)
            },
            Node::Terminal(l) => {
                let votes = classes.iter()
                    .zip(&l.votes)
                    .map(|(c, w)| format!("{c}: {w:.2}"))
                    .collect::<Vec<_>>()
                    .join("\\n");
                let info = format!(
                    "\tnode_{id} [ \
                     label = \"{votes}\", \
                     shape = box, \
                     ];\n",
                );

                (vec![info], id + 1)
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    // x <= 1.5 ? leaf : (y <= 0.5 ? leaf : leaf)
    fn toy() -> Node {
        let leaf = |id| Node::terminal(vec![1.0, 0.0], Depth::from(2), id);
        let inner = Node::split(
            Splitter::new("y", 1, 0.5), leaf(1), leaf(2), Depth::from(2),
        );
        Node::split(Splitter::new("x", 0, 1.5), leaf(0), inner, Depth::root())
    }

    #[test]
    fn test_conditional_grid_01() {
        let x = [1.0, 2.0, 1.0, 2.0, 3.0];
        let y = [0.0, 0.0, 1.0, 1.0, 1.0];
        let matrix = FeatureMatrix::new(vec![&x[..], &y[..]]);
        let root = toy();
        let rows = vec![vec![0, 1, 2, 3, 4]];

        let res = root.conditional_grid(&matrix, rows.clone(), &[]);
        assert_eq!(rows, res, "expected {rows:?}, got {res:?}.");

        let res = root.conditional_grid(&matrix, rows.clone(), &[0]);
        let exp = vec![vec![0, 2], vec![1, 3, 4]];
        assert_eq!(exp, res, "expected {exp:?}, got {res:?}.");

        let res = root.conditional_grid(&matrix, rows, &[0, 1]);
        let exp = vec![vec![0], vec![2], vec![1], vec![3, 4]];
        assert_eq!(exp, res, "expected {exp:?}, got {res:?}.");
    }

    #[test]
    fn test_conditional_grid_02() {
        let x = [1.0, 1.2];
        let y = [0.0, 1.0];
        let matrix = FeatureMatrix::new(vec![&x[..], &y[..]]);

        // Both rows go left at the root, so no empty cell is kept.
        let res = toy().conditional_grid(&matrix, vec![vec![0, 1]], &[0]);
        let exp = vec![vec![0, 1]];
        assert_eq!(exp, res, "expected {exp:?}, got {res:?}.");
    }
}
