//! Gradient Boosted Decision Tree trainer
//!
//! Squared-error boosting over [`CartBuilder`] trees with shrinkage,
//! deterministic row/feature subsampling and validation-based early
//! stopping. Identical parameters and data always produce identical models.

use crate::cart::{CartBuilder, TreeConfig};
use crate::dataset::Dataset;
use crate::deterministic::LcgRng;
use crate::errors::TrainerError;
use crate::metrics::rmse;
use crate::model::{GbdtModel, ModelMetadata, Tree};

/// Training parameters. The values mirror the pipeline's fixed
/// hyperparameter block; jobs construct this once and never tune it.
#[derive(Clone, Debug)]
pub struct GbdtParams {
    /// Upper bound on boosting rounds; early stopping usually ends first
    pub num_rounds: usize,
    /// Stop after this many rounds without validation improvement (0 = off)
    pub early_stopping_rounds: usize,
    /// Log evaluation metrics every this many rounds
    pub eval_every: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    /// Fraction of features each tree may split on
    pub feature_fraction: f64,
    /// Fraction of rows each tree is fit on
    pub bagging_fraction: f64,
    pub lambda_l1: f64,
    pub lambda_l2: f64,
    pub seed: i64,
}

impl Default for GbdtParams {
    fn default() -> Self {
        Self {
            num_rounds: 10_000,
            early_stopping_rounds: 20,
            eval_every: 20,
            learning_rate: 0.1,
            max_depth: 6,
            min_samples_leaf: 30,
            feature_fraction: 0.9,
            bagging_fraction: 0.9,
            lambda_l1: 0.1,
            lambda_l2: 0.1,
            seed: 2020,
        }
    }
}

/// GBDT trainer
pub struct GbdtTrainer {
    params: GbdtParams,
}

impl GbdtTrainer {
    pub fn new(params: GbdtParams) -> Self {
        Self { params }
    }

    /// Train a model, optionally evaluating against a held-out fold for
    /// early stopping. Trees are truncated to the best validation round.
    pub fn train(
        &self,
        train: &Dataset,
        valid: Option<&Dataset>,
    ) -> Result<GbdtModel, TrainerError> {
        if train.is_empty() {
            return Err(TrainerError::Dataset("training set is empty".to_string()));
        }
        if train.feature_count() == 0 {
            return Err(TrainerError::Dataset("no feature columns".to_string()));
        }
        if let Some(valid) = valid {
            if valid.feature_count() != train.feature_count() {
                return Err(TrainerError::Dataset(format!(
                    "validation set has {} features, training set has {}",
                    valid.feature_count(),
                    train.feature_count()
                )));
            }
        }

        let n = train.len();
        let feature_count = train.feature_count();
        let bias = mean(&train.targets);

        let mut preds_train = vec![bias; n];
        let mut preds_valid = valid.map(|v| vec![bias; v.len()]);

        let mut rng = LcgRng::new(self.params.seed);
        let mut trees: Vec<Tree> = Vec::new();
        let mut best_rmse = f64::INFINITY;
        let mut best_iteration = 0usize;

        let tree_config = TreeConfig {
            max_depth: self.params.max_depth,
            min_samples_leaf: self.params.min_samples_leaf,
            lambda_l1: self.params.lambda_l1,
            lambda_l2: self.params.lambda_l2,
            ..TreeConfig::default()
        };

        for round in 1..=self.params.num_rounds {
            // Gradient of squared error: prediction - target; hessian 1
            let gradients: Vec<f64> = preds_train
                .iter()
                .zip(&train.targets)
                .map(|(p, t)| p - t)
                .collect();
            let hessians = vec![1.0; n];

            let rows = sample(n, self.params.bagging_fraction, &mut rng);
            let mut active = sample(feature_count, self.params.feature_fraction, &mut rng);
            active.sort_unstable();

            let builder = CartBuilder::new(
                &train.features,
                &gradients,
                &hessians,
                &active,
                tree_config.clone(),
            );
            let mut tree = builder.build(&rows);
            scale_leaves(&mut tree, self.params.learning_rate);

            for (i, row) in train.features.iter().enumerate() {
                preds_train[i] += tree.eval(row);
            }
            trees.push(tree);

            match (valid, preds_valid.as_mut()) {
                (Some(valid), Some(preds)) => {
                    let last = &trees[trees.len() - 1];
                    for (i, row) in valid.features.iter().enumerate() {
                        preds[i] += last.eval(row);
                    }
                    let valid_rmse = rmse(&valid.targets, preds);

                    if valid_rmse < best_rmse {
                        best_rmse = valid_rmse;
                        best_iteration = round;
                    }

                    if round % self.params.eval_every == 0 {
                        tracing::info!(
                            "[{}] train rmse: {:.5}  valid rmse: {:.5}",
                            round,
                            rmse(&train.targets, &preds_train),
                            valid_rmse
                        );
                    }

                    if self.params.early_stopping_rounds > 0
                        && round - best_iteration >= self.params.early_stopping_rounds
                    {
                        tracing::info!(
                            "early stopping at round {}, best iteration {} (valid rmse {:.5})",
                            round,
                            best_iteration,
                            best_rmse
                        );
                        break;
                    }
                }
                _ => {
                    best_iteration = round;
                    if round % self.params.eval_every == 0 {
                        tracing::info!(
                            "[{}] train rmse: {:.5}",
                            round,
                            rmse(&train.targets, &preds_train)
                        );
                    }
                }
            }
        }

        trees.truncate(best_iteration);

        let model_hash = GbdtModel::calculate_model_hash(&trees, bias)?;
        let metadata = ModelMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            created_at: chrono::Utc::now().timestamp(),
            feature_names: train.feature_names.clone(),
            feature_count,
            tree_count: trees.len(),
            max_depth: self.params.max_depth,
            best_iteration,
            model_hash,
        };

        Ok(GbdtModel {
            trees,
            bias,
            metadata,
        })
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Deterministic sample of `ceil(fraction * n)` indices, ascending.
fn sample(n: usize, fraction: f64, rng: &mut LcgRng) -> Vec<usize> {
    if fraction >= 1.0 || n == 0 {
        return (0..n).collect();
    }
    let keep = ((fraction * n as f64).ceil() as usize).clamp(1, n);

    let mut indices: Vec<usize> = (0..n).collect();
    for i in (1..n).rev() {
        let j = rng.next_range(i as i64 + 1) as usize;
        indices.swap(i, j);
    }
    indices.truncate(keep);
    indices.sort_unstable();
    indices
}

/// Apply shrinkage to the stored leaf values so evaluation needs no
/// separate learning-rate term.
fn scale_leaves(tree: &mut Tree, learning_rate: f64) {
    for node in &mut tree.nodes {
        if let Some(value) = node.value.as_mut() {
            *value *= learning_rate;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear_dataset(n: usize) -> Dataset {
        // target = x0 + x1
        let features: Vec<Vec<f64>> = (0..n)
            .map(|i| vec![i as f64, (i % 7) as f64])
            .collect();
        let targets: Vec<f64> = features.iter().map(|r| r[0] + r[1]).collect();
        Dataset::new(
            vec!["x0".to_string(), "x1".to_string()],
            features,
            targets,
        )
        .unwrap()
    }

    fn small_params(rounds: usize) -> GbdtParams {
        GbdtParams {
            num_rounds: rounds,
            early_stopping_rounds: 0,
            eval_every: 1000,
            learning_rate: 0.3,
            max_depth: 3,
            min_samples_leaf: 1,
            feature_fraction: 1.0,
            bagging_fraction: 1.0,
            lambda_l1: 0.0,
            lambda_l2: 0.0,
            seed: 2020,
        }
    }

    #[test]
    fn training_reduces_rmse() {
        let dataset = linear_dataset(60);
        let trainer = GbdtTrainer::new(small_params(30));
        let model = trainer.train(&dataset, None).unwrap();

        let preds: Vec<f64> = dataset.features.iter().map(|r| model.predict(r)).collect();
        let fitted = rmse(&dataset.targets, &preds);

        let baseline: Vec<f64> = vec![mean(&dataset.targets); dataset.len()];
        let constant = rmse(&dataset.targets, &baseline);

        assert!(fitted < constant / 2.0, "fitted {fitted} vs constant {constant}");
    }

    #[test]
    fn determinism_across_runs() {
        let dataset = linear_dataset(40);
        let mut params = small_params(10);
        params.feature_fraction = 0.5;
        params.bagging_fraction = 0.8;

        let model1 = GbdtTrainer::new(params.clone()).train(&dataset, None).unwrap();
        let model2 = GbdtTrainer::new(params).train(&dataset, None).unwrap();

        assert_eq!(model1.bias, model2.bias);
        assert_eq!(model1.trees, model2.trees);
        assert_eq!(model1.metadata.model_hash, model2.metadata.model_hash);
    }

    #[test]
    fn early_stopping_truncates_to_best_iteration() {
        let dataset = linear_dataset(60);
        let valid = dataset.select(&(0..20).collect::<Vec<_>>());

        let mut params = small_params(500);
        params.early_stopping_rounds = 5;

        let model = GbdtTrainer::new(params).train(&dataset, Some(&valid)).unwrap();

        assert_eq!(model.trees.len(), model.metadata.best_iteration);
        assert!(model.metadata.best_iteration >= 1);
        assert!(model.metadata.best_iteration <= 500);
    }

    #[test]
    fn bias_is_target_mean() {
        let dataset = Dataset::new(
            vec!["x".to_string()],
            vec![vec![1.0], vec![2.0], vec![3.0]],
            vec![10.0, 20.0, 30.0],
        )
        .unwrap();

        let model = GbdtTrainer::new(small_params(1)).train(&dataset, None).unwrap();
        assert_eq!(model.bias, 20.0);
    }

    #[test]
    fn mismatched_validation_width_is_rejected() {
        let train = linear_dataset(20);
        let valid = Dataset::new(
            vec!["x".to_string()],
            vec![vec![1.0]],
            vec![1.0],
        )
        .unwrap();

        let err = GbdtTrainer::new(small_params(1))
            .train(&train, Some(&valid))
            .unwrap_err();
        assert!(matches!(err, TrainerError::Dataset(_)));
    }
}
