//! Decision Tree - weighted Gini CART used as the forest's base learner

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::logic::dataset::CLASS_COUNT;
use crate::logic::features::{FeatureVector, FEATURE_COUNT};

/// Minimum impurity decrease for a split to be kept
const MIN_IMPURITY_DECREASE: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    /// `features[feature] <= threshold` goes left
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        distribution: [f64; CLASS_COUNT],
    },
}

#[derive(Debug, Clone, Copy)]
pub struct TreeParams {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    /// Informative features examined per split
    pub max_features: usize,
}

/// Training view shared by every node of one tree
pub struct TrainingView<'a> {
    pub x: &'a [FeatureVector],
    /// Class index per row
    pub y: &'a [usize],
    pub sample_weight: &'a [f64],
}

impl TrainingView<'_> {
    fn weighted_counts(&self, indices: &[usize]) -> [f64; CLASS_COUNT] {
        let mut counts = [0.0; CLASS_COUNT];
        for &i in indices {
            counts[self.y[i]] += self.sample_weight[i];
        }
        counts
    }
}

/// `w * gini` for a node holding `counts` (total weight `w`)
fn weighted_gini(counts: &[f64; CLASS_COUNT]) -> f64 {
    let total: f64 = counts.iter().sum();
    if total <= 0.0 {
        return 0.0;
    }
    total - counts.iter().map(|c| c * c).sum::<f64>() / total
}

/// Arena-allocated tree, root at index 0
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

/// Node still to be grown over `indices[start..end]`
struct GrowTask {
    node: usize,
    start: usize,
    end: usize,
    depth: usize,
}

fn leaf(counts: &[f64; CLASS_COUNT]) -> Node {
    let total: f64 = counts.iter().sum();
    let mut distribution = [0.0; CLASS_COUNT];
    if total > 0.0 {
        for (d, c) in distribution.iter_mut().zip(counts) {
            *d = c / total;
        }
    }
    Node::Leaf { distribution }
}

impl DecisionTree {
    /// Grow a tree over `indices` (bootstrap draws may repeat rows).
    ///
    /// Growth uses an explicit work stack; unbounded trees can get as deep
    /// as the row count. Children are always allocated after their parent.
    pub fn fit(
        view: &TrainingView<'_>,
        mut indices: Vec<usize>,
        params: &TreeParams,
        rng: &mut StdRng,
    ) -> Self {
        let mut nodes = vec![leaf(&[0.0; CLASS_COUNT])];
        let mut pending = vec![GrowTask {
            node: 0,
            start: 0,
            end: indices.len(),
            depth: 0,
        }];

        while let Some(task) = pending.pop() {
            let rows = &mut indices[task.start..task.end];
            let counts = view.weighted_counts(rows);
            let pure = counts.iter().filter(|&&c| c > 0.0).count() <= 1;
            let depth_reached = params.max_depth.map_or(false, |max| task.depth >= max);

            let split = if pure || depth_reached || rows.len() < params.min_samples_split {
                None
            } else {
                best_split(view, rows, &counts, params.max_features, rng)
            };

            let Some((feature, threshold)) = split else {
                nodes[task.node] = leaf(&counts);
                continue;
            };

            let mid = task.start + partition(view, rows, feature, threshold);
            let left = nodes.len();
            let right = left + 1;
            nodes.push(leaf(&[0.0; CLASS_COUNT]));
            nodes.push(leaf(&[0.0; CLASS_COUNT]));
            nodes[task.node] = Node::Split {
                feature,
                threshold,
                left,
                right,
            };

            // Left popped first
            pending.push(GrowTask {
                node: right,
                start: mid,
                end: task.end,
                depth: task.depth + 1,
            });
            pending.push(GrowTask {
                node: left,
                start: task.start,
                end: mid,
                depth: task.depth + 1,
            });
        }

        Self { nodes }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut pending = vec![(0usize, 0usize)];
        while let Some((at, depth)) = pending.pop() {
            match self.nodes.get(at) {
                Some(Node::Split { left, right, .. }) => {
                    pending.push((*left, depth + 1));
                    pending.push((*right, depth + 1));
                }
                _ => deepest = deepest.max(depth),
            }
        }
        deepest
    }

    /// Structural check for a tree decoded from disk: feature indices in
    /// range, children stored after their parent, finite leaf weights.
    pub fn verify(&self) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }

        for (at, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Split {
                    feature,
                    left,
                    right,
                    ..
                } => {
                    if *feature >= FEATURE_COUNT {
                        return Err(format!(
                            "node {}: feature index {} out of range (< {})",
                            at, feature, FEATURE_COUNT
                        ));
                    }
                    for child in [*left, *right] {
                        if child <= at || child >= self.nodes.len() {
                            return Err(format!("node {}: child index {} is out of order", at, child));
                        }
                    }
                }
                Node::Leaf { distribution } => {
                    if distribution.iter().any(|p| !p.is_finite() || *p < 0.0) {
                        return Err(format!("node {}: leaf distribution is not a probability", at));
                    }
                }
            }
        }
        Ok(())
    }

    /// Class distribution of the leaf reached by `features`
    pub fn distribution(&self, features: &FeatureVector) -> [f64; CLASS_COUNT] {
        let mut at = 0;
        loop {
            match self.nodes.get(at) {
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    at = if features.get(*feature) <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
                Some(Node::Leaf { distribution }) => return *distribution,
                None => return [0.0; CLASS_COUNT],
            }
        }
    }
}

/// Move rows going left to the front; returns the boundary
fn partition(view: &TrainingView<'_>, indices: &mut [usize], feature: usize, threshold: f64) -> usize {
    let mut mid = 0;
    for i in 0..indices.len() {
        if view.x[indices[i]].get(feature) <= threshold {
            indices.swap(i, mid);
            mid += 1;
        }
    }
    mid
}

/// Best (feature, threshold) among a random subset of informative features
fn best_split(
    view: &TrainingView<'_>,
    indices: &[usize],
    parent_counts: &[f64; CLASS_COUNT],
    max_features: usize,
    rng: &mut StdRng,
) -> Option<(usize, f64)> {
    let parent_impurity = weighted_gini(parent_counts);

    let mut order: Vec<usize> = (0..FEATURE_COUNT).collect();
    order.shuffle(rng);

    let mut best: Option<(usize, f64, f64)> = None;
    let mut examined = 0;
    let mut sorted = indices.to_vec();

    for feature in order {
        if examined >= max_features {
            break;
        }

        sorted.sort_by(|&a, &b| view.x[a].get(feature).total_cmp(&view.x[b].get(feature)));
        let first = view.x[sorted[0]].get(feature);
        let last = view.x[sorted[sorted.len() - 1]].get(feature);
        if first == last {
            // Constant here; does not count towards max_features
            continue;
        }
        examined += 1;

        let mut left = [0.0; CLASS_COUNT];
        let mut right = *parent_counts;
        for k in 0..sorted.len() - 1 {
            let row = sorted[k];
            let w = view.sample_weight[row];
            left[view.y[row]] += w;
            right[view.y[row]] -= w;

            let here = view.x[row].get(feature);
            let next = view.x[sorted[k + 1]].get(feature);
            if here == next {
                continue;
            }

            let impurity = weighted_gini(&left) + weighted_gini(&right);
            if best.map_or(true, |(_, _, b)| impurity < b) {
                let mut threshold = here + (next - here) / 2.0;
                if threshold >= next {
                    threshold = here;
                }
                best = Some((feature, threshold, impurity));
            }
        }
    }

    best.filter(|&(_, _, impurity)| parent_impurity - impurity > MIN_IMPURITY_DECREASE)
        .map(|(feature, threshold, _)| (feature, threshold))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn params() -> TreeParams {
        TreeParams {
            max_depth: None,
            min_samples_split: 2,
            max_features: FEATURE_COUNT,
        }
    }

    #[test]
    fn test_separable_on_one_feature() {
        let x: Vec<FeatureVector> = (0..20)
            .map(|i| FeatureVector::new(i as f64, 5.0, 5.0))
            .collect();
        let y: Vec<usize> = (0..20).map(|i| if i < 10 { 0 } else { 2 }).collect();
        let w = vec![1.0; 20];
        let view = TrainingView { x: &x, y: &y, sample_weight: &w };

        let mut rng = StdRng::seed_from_u64(1);
        let tree = DecisionTree::fit(&view, (0..20).collect(), &params(), &mut rng);

        assert_eq!(tree.node_count(), 3);
        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.distribution(&FeatureVector::new(3.0, 0.0, 0.0))[0], 1.0);
        assert_eq!(tree.distribution(&FeatureVector::new(9.5, 0.0, 0.0))[0], 1.0);
        assert_eq!(tree.distribution(&FeatureVector::new(10.0, 0.0, 0.0))[2], 1.0);
    }

    #[test]
    fn test_pure_node_is_a_leaf() {
        let x = vec![FeatureVector::new(1.0, 2.0, 3.0), FeatureVector::new(4.0, 5.0, 6.0)];
        let y = vec![1, 1];
        let w = vec![1.0, 1.0];
        let view = TrainingView { x: &x, y: &y, sample_weight: &w };

        let mut rng = StdRng::seed_from_u64(1);
        let tree = DecisionTree::fit(&view, vec![0, 1], &params(), &mut rng);
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.distribution(&x[0]), [0.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_identical_features_cannot_split() {
        let x = vec![FeatureVector::new(1.0, 1.0, 1.0); 4];
        let y = vec![0, 1, 0, 1];
        let w = vec![1.0; 4];
        let view = TrainingView { x: &x, y: &y, sample_weight: &w };

        let mut rng = StdRng::seed_from_u64(1);
        let tree = DecisionTree::fit(&view, vec![0, 1, 2, 3], &params(), &mut rng);
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.distribution(&x[0]), [0.5, 0.5, 0.0, 0.0]);
    }

    #[test]
    fn test_max_depth_caps_growth() {
        let x: Vec<FeatureVector> = (0..16)
            .map(|i| FeatureVector::new(i as f64, 0.0, 0.0))
            .collect();
        let y: Vec<usize> = (0..16).map(|i| i % 4).collect();
        let w = vec![1.0; 16];
        let view = TrainingView { x: &x, y: &y, sample_weight: &w };

        let capped = TreeParams {
            max_depth: Some(2),
            ..params()
        };
        let mut rng = StdRng::seed_from_u64(3);
        let tree = DecisionTree::fit(&view, (0..16).collect(), &capped, &mut rng);
        assert!(tree.depth() <= 2);
    }

    #[test]
    fn test_alternating_labels_grow_on_a_small_stack() {
        // Cuts keep peeling off single rows, so depth tracks row count
        let n = 4000;
        let x: Vec<FeatureVector> = (0..n)
            .map(|i| FeatureVector::new(i as f64, 0.0, 0.0))
            .collect();
        let y: Vec<usize> = (0..n).map(|i| i % 2).collect();
        let w = vec![1.0; n];
        let view = TrainingView { x: &x, y: &y, sample_weight: &w };

        let (depth, nodes, verified) = std::thread::scope(|scope| {
            std::thread::Builder::new()
                .stack_size(128 * 1024)
                .spawn_scoped(scope, || {
                    let mut rng = StdRng::seed_from_u64(5);
                    let tree = DecisionTree::fit(&view, (0..n).collect(), &params(), &mut rng);
                    (tree.depth(), tree.node_count(), tree.verify())
                })
                .unwrap()
                .join()
                .unwrap()
        });

        assert!(depth > 100);
        // Pure single-row leaves
        assert_eq!(nodes, 2 * n - 1);
        assert!(verified.is_ok());
    }

    #[test]
    fn test_verify_rejects_bad_structure() {
        let leaf = Node::Leaf {
            distribution: [1.0, 0.0, 0.0, 0.0],
        };
        let split = |feature, left, right| Node::Split {
            feature,
            threshold: 1.0,
            left,
            right,
        };

        let ok = DecisionTree {
            nodes: vec![split(0, 1, 2), leaf.clone(), leaf.clone()],
        };
        assert!(ok.verify().is_ok());

        let bad_feature = DecisionTree {
            nodes: vec![split(FEATURE_COUNT, 1, 2), leaf.clone(), leaf.clone()],
        };
        assert!(bad_feature.verify().unwrap_err().contains("feature index"));

        let cycle = DecisionTree {
            nodes: vec![split(0, 1, 2), split(1, 0, 2), leaf.clone()],
        };
        assert!(cycle.verify().unwrap_err().contains("out of order"));

        let dangling = DecisionTree {
            nodes: vec![split(0, 1, 9), leaf.clone()],
        };
        assert!(dangling.verify().is_err());

        assert!(DecisionTree { nodes: vec![] }.verify().is_err());
    }
}
