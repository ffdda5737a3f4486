//! Deterministic gradient-boosted tree regression
//!
//! Trains GBDT regressors over in-memory numeric datasets with
//! reproducible results: an LCG-based RNG drives row bagging and feature
//! subsampling, split ties break deterministically, and every persisted
//! model carries a blake3 hash of its structure.

pub mod cart;
pub mod dataset;
pub mod deterministic;
pub mod errors;
pub mod importance;
pub mod kfold;
pub mod metrics;
pub mod model;
pub mod trainer;

pub use dataset::Dataset;
pub use errors::TrainerError;
pub use importance::FoldImportance;
pub use kfold::KFold;
pub use model::{GbdtModel, ModelMetadata, Node, Tree};
pub use trainer::{GbdtParams, GbdtTrainer};
