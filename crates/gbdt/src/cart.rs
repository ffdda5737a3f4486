//! CART (Classification and Regression Tree) builder
//!
//! Exact-greedy regression tree construction over per-sample gradients and
//! hessians, with L1/L2 regularized leaf values and deterministic
//! tie-breaking between equal-gain splits.

use crate::deterministic::SplitTieBreaker;
use crate::model::{Node, Tree};

/// Parameters for a single tree
#[derive(Clone, Debug)]
pub struct TreeConfig {
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    pub lambda_l1: f64,
    pub lambda_l2: f64,
    /// Cap on candidate thresholds per feature; above it, candidates are
    /// thinned to evenly spaced quantiles.
    pub max_thresholds: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: 6,
            min_samples_leaf: 30,
            lambda_l1: 0.1,
            lambda_l2: 0.1,
            max_thresholds: 255,
        }
    }
}

/// Split candidate with gain and tie-breaker
#[derive(Debug, Clone)]
struct SplitCandidate {
    feature_idx: usize,
    threshold: f64,
    gain: f64,
    tie_breaker: SplitTieBreaker,
}

impl SplitCandidate {
    fn new(feature_idx: usize, threshold: f64, gain: f64, node_id: usize) -> Self {
        Self {
            feature_idx,
            threshold,
            gain,
            tie_breaker: SplitTieBreaker::new(feature_idx, threshold, node_id),
        }
    }
}

/// Builds one regression tree over a row subset of the training matrix.
pub struct CartBuilder<'a> {
    config: TreeConfig,
    features: &'a [Vec<f64>],
    gradients: &'a [f64],
    hessians: &'a [f64],
    /// Feature indices this tree may split on (feature subsampling).
    active_features: &'a [usize],
}

impl<'a> CartBuilder<'a> {
    pub fn new(
        features: &'a [Vec<f64>],
        gradients: &'a [f64],
        hessians: &'a [f64],
        active_features: &'a [usize],
        config: TreeConfig,
    ) -> Self {
        assert_eq!(features.len(), gradients.len());
        assert_eq!(features.len(), hessians.len());

        Self {
            config,
            features,
            gradients,
            hessians,
            active_features,
        }
    }

    /// Build a tree from the given row indices.
    pub fn build(&self, indices: &[usize]) -> Tree {
        let mut nodes = Vec::new();
        self.build_node(indices, 0, &mut nodes, 0);
        Tree { nodes }
    }

    fn build_node(
        &self,
        indices: &[usize],
        depth: usize,
        nodes: &mut Vec<Node>,
        node_id: usize,
    ) -> u16 {
        let current_idx = nodes.len() as u16;
        let leaf_value = self.leaf_value(indices);

        if depth >= self.config.max_depth || indices.len() < 2 * self.config.min_samples_leaf {
            nodes.push(Self::leaf(leaf_value));
            return current_idx;
        }

        let split = match self.find_best_split(indices, node_id) {
            Some(s) if s.gain > 0.0 => s,
            _ => {
                nodes.push(Self::leaf(leaf_value));
                return current_idx;
            }
        };

        let (left_indices, right_indices) =
            self.split_indices(indices, split.feature_idx, split.threshold);

        if left_indices.len() < self.config.min_samples_leaf
            || right_indices.len() < self.config.min_samples_leaf
        {
            nodes.push(Self::leaf(leaf_value));
            return current_idx;
        }

        // Reserve space for the current node before recursing
        nodes.push(Node {
            feature_index: split.feature_idx as u16,
            threshold: split.threshold,
            left: 0,
            right: 0,
            value: None,
            gain: split.gain,
        });

        let left_idx = self.build_node(&left_indices, depth + 1, nodes, node_id * 2 + 1);
        let right_idx = self.build_node(&right_indices, depth + 1, nodes, node_id * 2 + 2);

        nodes[current_idx as usize].left = left_idx;
        nodes[current_idx as usize].right = right_idx;

        current_idx
    }

    fn leaf(value: f64) -> Node {
        Node {
            feature_index: 0,
            threshold: 0.0,
            left: 0,
            right: 0,
            value: Some(value),
            gain: 0.0,
        }
    }

    fn find_best_split(&self, indices: &[usize], node_id: usize) -> Option<SplitCandidate> {
        let mut best_split: Option<SplitCandidate> = None;
        let parent_score = {
            let (g, h) = self.sums(indices);
            self.score(g, h)
        };

        for &feature_idx in self.active_features {
            for threshold in self.candidate_thresholds(indices, feature_idx) {
                let (left, right) = self.split_indices(indices, feature_idx, threshold);

                if left.len() < self.config.min_samples_leaf
                    || right.len() < self.config.min_samples_leaf
                {
                    continue;
                }

                let (g_left, h_left) = self.sums(&left);
                let (g_right, h_right) = self.sums(&right);
                let gain = self.score(g_left, h_left) + self.score(g_right, h_right) - parent_score;

                let candidate = SplitCandidate::new(feature_idx, threshold, gain, node_id);

                best_split = match best_split {
                    None => Some(candidate),
                    Some(current) => {
                        // Deterministic tie-breaking
                        if gain > current.gain
                            || (gain == current.gain && candidate.tie_breaker < current.tie_breaker)
                        {
                            Some(candidate)
                        } else {
                            Some(current)
                        }
                    }
                };
            }
        }

        best_split
    }

    /// Candidate thresholds: midpoints between consecutive distinct values
    /// of the feature within this node, thinned to `max_thresholds`.
    fn candidate_thresholds(&self, indices: &[usize], feature_idx: usize) -> Vec<f64> {
        let mut values: Vec<f64> = indices
            .iter()
            .map(|&i| self.features[i][feature_idx])
            .collect();
        values.sort_by(f64::total_cmp);
        values.dedup_by(|a, b| a.to_bits() == b.to_bits());

        let mut thresholds: Vec<f64> = values
            .windows(2)
            .map(|pair| pair[0] + (pair[1] - pair[0]) / 2.0)
            .collect();

        if thresholds.len() > self.config.max_thresholds {
            let step = thresholds.len() as f64 / self.config.max_thresholds as f64;
            thresholds = (0..self.config.max_thresholds)
                .map(|i| thresholds[(i as f64 * step) as usize])
                .collect();
        }

        thresholds
    }

    fn split_indices(
        &self,
        indices: &[usize],
        feature_idx: usize,
        threshold: f64,
    ) -> (Vec<usize>, Vec<usize>) {
        let mut left = Vec::new();
        let mut right = Vec::new();

        for &idx in indices {
            if self.features[idx][feature_idx] <= threshold {
                left.push(idx);
            } else {
                right.push(idx);
            }
        }

        (left, right)
    }

    fn sums(&self, indices: &[usize]) -> (f64, f64) {
        let mut sum_g = 0.0;
        let mut sum_h = 0.0;

        for &idx in indices {
            sum_g += self.gradients[idx];
            sum_h += self.hessians[idx];
        }

        (sum_g, sum_h)
    }

    /// L1 soft-thresholded gradient sum.
    fn soft(&self, g: f64) -> f64 {
        let l1 = self.config.lambda_l1;
        if g > l1 {
            g - l1
        } else if g < -l1 {
            g + l1
        } else {
            0.0
        }
    }

    /// Structure score: soft(G)^2 / (H + lambda_l2).
    fn score(&self, g: f64, h: f64) -> f64 {
        let s = self.soft(g);
        let denom = h + self.config.lambda_l2;
        if denom <= 0.0 {
            0.0
        } else {
            s * s / denom
        }
    }

    /// Optimal leaf value: -soft(G) / (H + lambda_l2).
    fn leaf_value(&self, indices: &[usize]) -> f64 {
        let (sum_g, sum_h) = self.sums(indices);
        let denom = sum_h + self.config.lambda_l2;
        if denom <= 0.0 {
            return 0.0;
        }
        -self.soft(sum_g) / denom
    }
}
