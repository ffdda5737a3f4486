//! GBDT model representation, evaluation and persistence.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::TrainerError;

/// A decision tree node (internal or leaf)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Node {
    /// Feature index to compare (for internal nodes)
    pub feature_index: u16,
    /// Threshold value for comparison
    pub threshold: f64,
    /// Index of left child node
    pub left: u16,
    /// Index of right child node
    pub right: u16,
    /// Leaf value (None for internal nodes, Some for leaves)
    pub value: Option<f64>,
    /// Gain achieved by this split; 0.0 for leaves
    pub gain: f64,
}

/// A single regression tree
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

impl Tree {
    /// Walk the tree for one feature vector.
    pub fn eval(&self, features: &[f64]) -> f64 {
        let mut idx = 0usize;

        loop {
            if idx >= self.nodes.len() {
                // invalid tree structure
                return 0.0;
            }

            let node = &self.nodes[idx];

            if let Some(value) = node.value {
                return value;
            }

            let feature_idx = node.feature_index as usize;
            if feature_idx >= features.len() {
                // feature index out of bounds
                return 0.0;
            }

            idx = if features[feature_idx] <= node.threshold {
                node.left as usize
            } else {
                node.right as usize
            };
        }
    }
}

/// Describes how a persisted model was produced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelMetadata {
    pub version: String,
    pub created_at: i64,
    pub feature_names: Vec<String>,
    pub feature_count: usize,
    pub tree_count: usize,
    pub max_depth: usize,
    /// Boosting round the trees were truncated to (early stopping)
    pub best_iteration: usize,
    /// blake3 over the serialized trees and bias
    pub model_hash: String,
}

/// Complete trained model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GbdtModel {
    pub trees: Vec<Tree>,
    /// Base prediction (mean of the training targets)
    pub bias: f64,
    pub metadata: ModelMetadata,
}

impl GbdtModel {
    /// Raw model output for one feature vector.
    pub fn predict(&self, features: &[f64]) -> f64 {
        let mut sum = self.bias;
        for tree in &self.trees {
            sum += tree.eval(features);
        }
        sum
    }

    /// Model output clamped at zero. Daily sales cannot be negative, and
    /// the log-scale metric requires non-negative predictions.
    pub fn predict_non_negative(&self, features: &[f64]) -> f64 {
        self.predict(features).max(0.0)
    }

    /// Per-feature importance: total split gain accumulated over all trees.
    pub fn feature_importance_gain(&self) -> Vec<f64> {
        let mut importance = vec![0.0; self.metadata.feature_count];

        for tree in &self.trees {
            for node in &tree.nodes {
                if node.value.is_none() {
                    let idx = node.feature_index as usize;
                    if idx < importance.len() {
                        importance[idx] += node.gain;
                    }
                }
            }
        }

        importance
    }

    /// Reproducible hash over the model structure.
    pub fn calculate_model_hash(trees: &[Tree], bias: f64) -> Result<String, TrainerError> {
        let serialized = serde_json::to_string(&(trees, bias))?;
        let hash = blake3::hash(serialized.as_bytes());
        Ok(hex::encode(hash.as_bytes()))
    }

    /// Write the model as JSON plus a `.hash` sidecar next to it.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), TrainerError> {
        let path = path.as_ref();
        let json = serde_json::to_string(self)?;
        std::fs::write(path, &json)?;
        std::fs::write(path.with_extension("hash"), &self.metadata.model_hash)?;
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, TrainerError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&content)?)
    }
}
