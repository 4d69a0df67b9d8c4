use crate::{ColumnMajorMatrix, Dataset, FitError, FitResult, StridedVecView, DEFAULT_MIN_OBS,
            DEFAULT_N_LEAVES, SHOULD_NOT_HAPPEN};
use itertools::Itertools;
use ordered_float::OrderedFloat;
use rayon::prelude::{IntoParallelIterator, ParallelIterator};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TreeParams {
    /// Number of terminal nodes to grow towards. Growth can stop earlier when no split has a
    /// positive gain.
    pub n_leaves: usize,
    /// Minimum weighted instance count on each side of a split.
    pub min_obs: usize,
}

impl TreeParams {
    pub fn new() -> Self {
        TreeParams {
            n_leaves: DEFAULT_N_LEAVES,
            min_obs: DEFAULT_MIN_OBS,
        }
    }

    pub(crate) fn validate(&self) -> FitResult<()> {
        if self.n_leaves < 1 {
            return Err(FitError::InvalidParameter(
                "n_leaves must be at least 1".to_string(),
            ));
        }
        if self.min_obs < 1 {
            return Err(FitError::InvalidParameter(
                "min_obs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for TreeParams {
    fn default() -> Self {
        TreeParams::new()
    }
}

/// One training row as the tree sees it: its position in the feature matrix, the value it
/// regresses on (a pseudo-residual during boosting), and a structural weight. Rows with weight 0
/// are invisible to the split search but still routed through the tree.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Instance {
    pub row: usize,
    pub target: f64,
    pub weight: f64,
}

#[derive(Debug, Clone)]
struct SplitNode {
    feature: usize,
    threshold: f64,
    left: usize,
    right: usize,
}

#[derive(Debug, Clone)]
struct LeafNode {
    value: f64,
}

#[derive(Debug, Clone)]
enum Node {
    Split(SplitNode),
    Leaf(LeafNode),
}

#[derive(Debug, Clone)]
struct SplitCandidate {
    gain: f64,
    feature: usize,
    threshold: f64,
}

/// A terminal node that has not been finalized yet: it still owns its instance buffer, and its
/// best split was computed once at creation.
struct OpenLeaf {
    node: usize,
    instances: Vec<Instance>,
    best: Option<SplitCandidate>,
}

impl OpenLeaf {
    fn gain(&self) -> f64 {
        self.best.as_ref().map_or(0., |b| b.gain)
    }
}

impl PartialEq for OpenLeaf {
    fn eq(&self, other: &Self) -> bool {
        OrderedFloat(self.gain()) == OrderedFloat(other.gain())
    }
}

impl Eq for OpenLeaf {}

impl PartialOrd for OpenLeaf {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenLeaf {
    fn cmp(&self, other: &Self) -> Ordering {
        OrderedFloat(self.gain()).cmp(&OrderedFloat(other.gain()))
    }
}

/// A finalized leaf, reduced to its arena slot and the rows routed into it. The instance buffer
/// itself is dropped at this point.
pub(crate) struct GrownLeaf {
    pub node: usize,
    pub rows: Vec<usize>,
}

/// Best split over one feature dimension: sort the positive-weight instances by the feature,
/// then scan every boundary between two distinct adjacent values.
fn best_split_on_feature(
    column: &[f64],
    instances: &[Instance],
    total_weight: f64,
    feature: usize,
    min_obs: usize,
) -> Option<SplitCandidate> {
    let mut values: Vec<(f64, f64, f64)> = instances
        .iter()
        .filter(|i| i.weight > 0.)
        .map(|i| (column[i.row], i.target, i.weight))
        .collect();
    values.sort_by_key(|&(x, _, _)| OrderedFloat(x));

    let total_sum: f64 = values.iter().map(|&(_, y, w)| w * y).sum();
    let min_weight = min_obs as f64;
    let mut left_weight = 0.;
    let mut left_sum = 0.;
    let mut best: Option<SplitCandidate> = None;

    for (&(x, y, w), &(next_x, _, _)) in values.iter().tuple_windows() {
        left_weight += w;
        left_sum += w * y;
        let right_weight = total_weight - left_weight;
        let right_sum = total_sum - left_sum;
        if left_weight < min_weight || right_weight < min_weight {
            continue;
        }
        // Instances with an equal value of the feature must all go to the same child.
        if next_x == x {
            continue;
        }
        let gain = -total_sum.powi(2) / total_weight
            + left_sum.powi(2) / left_weight
            + right_sum.powi(2) / right_weight;
        if gain > best.as_ref().map_or(0., |b| b.gain) {
            best = Some(SplitCandidate {
                gain,
                feature,
                threshold: (x + next_x) / 2.,
            });
        }
    }
    best
}

/// Best split over all features. Features are searched in parallel, then reduced in feature
/// order so that ties keep the first candidate found.
fn find_best_split(
    features: &ColumnMajorMatrix<f64>,
    instances: &[Instance],
    total_weight: f64,
    params: &TreeParams,
) -> Option<SplitCandidate> {
    if total_weight < 2. * params.min_obs as f64 {
        return None;
    }
    let candidates: Vec<Option<SplitCandidate>> = (0..features.n_cols())
        .into_par_iter()
        .map(|feature| {
            best_split_on_feature(
                features.column(feature),
                instances,
                total_weight,
                feature,
                params.min_obs,
            )
        })
        .collect();

    let mut best: Option<SplitCandidate> = None;
    for candidate in candidates.into_iter().flatten() {
        if candidate.gain > best.as_ref().map_or(0., |b| b.gain) {
            best = Some(candidate);
        }
    }
    best
}

/// CART regression tree grown best-first, stored as an arena of nodes.
///
/// A split rewrites the parent's arena entry to reference two freshly pushed children, so there
/// is no nested ownership and no recursive destructor.
#[derive(Debug, Clone)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

impl RegressionTree {
    /// Fit a single tree on a dataset, every row with weight 1. Leaf values are the weighted
    /// means of the targets.
    pub fn fit(train: &Dataset, params: &TreeParams) -> FitResult<RegressionTree> {
        params.validate()?;
        train.validate()?;
        let instances: Vec<Instance> = train
            .target
            .iter()
            .enumerate()
            .map(|(row, &target)| Instance {
                row,
                target,
                weight: 1.,
            })
            .collect();
        let (tree, _leaves) = RegressionTree::grow(&train.features, instances, params);
        Ok(tree)
    }

    /// Grow a tree and report, for every leaf, the rows routed into it (whatever their weight).
    ///
    /// The boosting loop uses those rows to re-fit every leaf value on the true loss.
    pub(crate) fn grow(
        features: &ColumnMajorMatrix<f64>,
        instances: Vec<Instance>,
        params: &TreeParams,
    ) -> (RegressionTree, Vec<GrownLeaf>) {
        assert!(!instances.is_empty(), "{}", SHOULD_NOT_HAPPEN);
        let mut tree = RegressionTree { nodes: Vec::new() };
        // Open leaves, keyed by the gain of their pre-computed best split.
        let mut queue: BinaryHeap<OpenLeaf> = BinaryHeap::new();
        let root = tree.open_leaf(features, instances, params);
        queue.push(root);

        while queue.len() < params.n_leaves {
            let leaf = queue.pop().expect(SHOULD_NOT_HAPPEN);
            let best = match leaf.best.clone() {
                Some(best) => best,
                None => {
                    queue.push(leaf);
                    break;
                }
            };
            debug_assert!(best.gain > 0.);

            // Zero-weight rows are routed by feature value like any other row.
            let column = features.column(best.feature);
            let (left_set, right_set): (Vec<Instance>, Vec<Instance>) = leaf
                .instances
                .into_iter()
                .partition(|i| column[i.row] < best.threshold);

            let left = tree.open_leaf(features, left_set, params);
            let right = tree.open_leaf(features, right_set, params);
            tree.nodes[leaf.node] = Node::Split(SplitNode {
                feature: best.feature,
                threshold: best.threshold,
                left: left.node,
                right: right.node,
            });
            queue.push(left);
            queue.push(right);
        }

        let leaves = queue
            .into_iter()
            .map(|leaf| GrownLeaf {
                node: leaf.node,
                rows: leaf.instances.iter().map(|i| i.row).collect(),
            })
            .collect();
        (tree, leaves)
    }

    /// Push a new leaf into the arena and compute its value and best split in one pass over its
    /// instance set.
    fn open_leaf(
        &mut self,
        features: &ColumnMajorMatrix<f64>,
        instances: Vec<Instance>,
        params: &TreeParams,
    ) -> OpenLeaf {
        let total_weight: f64 = instances.iter().map(|i| i.weight).sum();
        // A node with no weight left still needs a defined output.
        let value = if total_weight == 0. {
            0.
        } else {
            instances.iter().map(|i| i.weight * i.target).sum::<f64>() / total_weight
        };
        // find_best_split only returns candidates with a strictly positive gain.
        let best = find_best_split(features, &instances, total_weight, params);

        let node = self.nodes.len();
        self.nodes.push(Node::Leaf(LeafNode { value }));
        OpenLeaf {
            node,
            instances,
            best,
        }
    }

    pub(crate) fn set_leaf_value(&mut self, node: usize, value: f64) {
        match &mut self.nodes[node] {
            Node::Leaf(leaf) => leaf.value = value,
            Node::Split(_) => panic!("{}", SHOULD_NOT_HAPPEN),
        }
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| match n {
                Node::Leaf(_) => true,
                Node::Split(_) => false,
            })
            .count()
    }

    /// Route a feature vector to a leaf and return its value. Goes left on a strict `<`.
    pub fn predict(&self, features: &StridedVecView<f64>) -> f64 {
        let mut node = &self.nodes[0];
        loop {
            match node {
                Node::Split(split) => {
                    node = if features[split.feature] < split.threshold {
                        &self.nodes[split.left]
                    } else {
                        &self.nodes[split.right]
                    };
                }
                Node::Leaf(leaf) => return leaf.value,
            }
        }
    }
}
