//! Second-order regression trees grown on gradient statistics
//!
//! A node's split maximizes
//!
//! ```text
//! gain = 0.5 * (S(G_L, H_L) + S(G_R, H_R) - S(G, H)),   S(G, H) = T(G)^2 / (H + lambda)
//! ```
//!
//! where `T` soft-thresholds the gradient sum by the L1 penalty. A leaf's
//! weight is `-T(G) / (H + lambda)`.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Node of a fitted tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TreeNode {
    Leaf {
        value: f64,
    },
    /// Rows with `row[feature] < threshold` go left
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

/// Growth limits and regularization for one tree
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeConfig {
    pub max_depth: usize,
    pub min_child_weight: f64,
    pub reg_alpha: f64,
    pub reg_lambda: f64,
}

/// Gradient and hessian per training row
pub struct Gradients<'a> {
    pub grad: &'a [f64],
    pub hess: &'a [f64],
}

#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    gain: f64,
}

/// A single fitted regression tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    root: TreeNode,
}

impl RegressionTree {
    /// Grow a tree on the rows in `rows`, considering only the columns in `features`
    ///
    /// Split gains are added to `importance`, indexed by column.
    pub fn fit(
        x: &[Vec<f64>],
        gradients: &Gradients<'_>,
        rows: &[usize],
        features: &[usize],
        config: &TreeConfig,
        importance: &mut [f64],
    ) -> Self {
        let root = grow(x, gradients, rows.to_vec(), features, config, 0, importance);
        Self { root }
    }

    /// A tree that predicts a constant
    pub fn constant(value: f64) -> Self {
        Self {
            root: TreeNode::Leaf { value },
        }
    }

    pub fn root(&self) -> &TreeNode {
        &self.root
    }

    pub fn predict_row(&self, row: &[f64]) -> f64 {
        let mut node = &self.root;
        loop {
            match node {
                TreeNode::Leaf { value } => return *value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row[*feature] < *threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }

    /// Multiply every leaf value by `factor`
    pub fn scale(&mut self, factor: f64) {
        visit_leaves_mut(&mut self.root, &mut |value| *value *= factor);
    }

    /// Replace each leaf value with `refit(rows reaching that leaf)`
    ///
    /// Leaves no row reaches keep their current value.
    pub fn refit_leaves<F>(&mut self, x: &[Vec<f64>], rows: &[usize], refit: &F)
    where
        F: Fn(&[usize]) -> f64,
    {
        refit_node(&mut self.root, x, rows.to_vec(), refit);
    }

    pub fn depth(&self) -> usize {
        node_depth(&self.root)
    }

    pub fn n_leaves(&self) -> usize {
        let mut count = 0;
        count_leaves(&self.root, &mut count);
        count
    }
}

fn soft_threshold(g: f64, alpha: f64) -> f64 {
    if g > alpha {
        g - alpha
    } else if g < -alpha {
        g + alpha
    } else {
        0.0
    }
}

fn score(g: f64, h: f64, config: &TreeConfig) -> f64 {
    let denom = h + config.reg_lambda;
    if denom <= 0.0 {
        return 0.0;
    }
    let t = soft_threshold(g, config.reg_alpha);
    t * t / denom
}

fn leaf_weight(g: f64, h: f64, config: &TreeConfig) -> f64 {
    let denom = h + config.reg_lambda;
    if denom <= 0.0 {
        return 0.0;
    }
    -soft_threshold(g, config.reg_alpha) / denom
}

fn grow(
    x: &[Vec<f64>],
    gradients: &Gradients<'_>,
    rows: Vec<usize>,
    features: &[usize],
    config: &TreeConfig,
    depth: usize,
    importance: &mut [f64],
) -> TreeNode {
    let g: f64 = rows.iter().map(|&r| gradients.grad[r]).sum();
    let h: f64 = rows.iter().map(|&r| gradients.hess[r]).sum();

    if depth >= config.max_depth || rows.len() < 2 {
        return TreeNode::Leaf {
            value: leaf_weight(g, h, config),
        };
    }

    let best = match best_split(x, gradients, &rows, features, config, g, h) {
        Some(split) => split,
        None => {
            return TreeNode::Leaf {
                value: leaf_weight(g, h, config),
            }
        }
    };

    importance[best.feature] += best.gain;

    let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
        .into_iter()
        .partition(|&r| x[r][best.feature] < best.threshold);

    let left = grow(x, gradients, left_rows, features, config, depth + 1, importance);
    let right = grow(x, gradients, right_rows, features, config, depth + 1, importance);

    TreeNode::Split {
        feature: best.feature,
        threshold: best.threshold,
        left: Box::new(left),
        right: Box::new(right),
    }
}

/// Exact greedy search over every distinct value of every candidate column
fn best_split(
    x: &[Vec<f64>],
    gradients: &Gradients<'_>,
    rows: &[usize],
    features: &[usize],
    config: &TreeConfig,
    g_total: f64,
    h_total: f64,
) -> Option<SplitCandidate> {
    let parent = score(g_total, h_total, config);
    let mut best: Option<SplitCandidate> = None;
    let mut sorted = rows.to_vec();

    for &feature in features {
        sorted.sort_by(|&a, &b| {
            x[a][feature]
                .partial_cmp(&x[b][feature])
                .unwrap_or(Ordering::Equal)
        });

        let mut g_left = 0.0;
        let mut h_left = 0.0;
        for i in 0..sorted.len() - 1 {
            let r = sorted[i];
            g_left += gradients.grad[r];
            h_left += gradients.hess[r];

            let current = x[r][feature];
            let next = x[sorted[i + 1]][feature];
            if next <= current {
                continue;
            }

            let g_right = g_total - g_left;
            let h_right = h_total - h_left;
            if h_left < config.min_child_weight || h_right < config.min_child_weight {
                continue;
            }

            let gain = 0.5
                * (score(g_left, h_left, config) + score(g_right, h_right, config) - parent);
            if gain > 0.0 && best.map_or(true, |b| gain > b.gain) {
                best = Some(SplitCandidate {
                    feature,
                    threshold: (current + next) / 2.0,
                    gain,
                });
            }
        }
    }

    best
}

fn visit_leaves_mut<F: FnMut(&mut f64)>(node: &mut TreeNode, f: &mut F) {
    match node {
        TreeNode::Leaf { value } => f(value),
        TreeNode::Split { left, right, .. } => {
            visit_leaves_mut(left, f);
            visit_leaves_mut(right, f);
        }
    }
}

fn refit_node<F>(node: &mut TreeNode, x: &[Vec<f64>], rows: Vec<usize>, refit: &F)
where
    F: Fn(&[usize]) -> f64,
{
    match node {
        TreeNode::Leaf { value } => {
            if !rows.is_empty() {
                *value = refit(&rows);
            }
        }
        TreeNode::Split {
            feature,
            threshold,
            left,
            right,
        } => {
            let (left_rows, right_rows): (Vec<usize>, Vec<usize>) =
                rows.into_iter().partition(|&r| x[r][*feature] < *threshold);
            refit_node(left, x, left_rows, refit);
            refit_node(right, x, right_rows, refit);
        }
    }
}

fn node_depth(node: &TreeNode) -> usize {
    match node {
        TreeNode::Leaf { .. } => 0,
        TreeNode::Split { left, right, .. } => 1 + node_depth(left).max(node_depth(right)),
    }
}

fn count_leaves(node: &TreeNode, count: &mut usize) {
    match node {
        TreeNode::Leaf { .. } => *count += 1,
        TreeNode::Split { left, right, .. } => {
            count_leaves(left, count);
            count_leaves(right, count);
        }
    }
}
