//! Training step: 4-fold cross-validation over the encoded feature table,
//! one persisted model per fold plus aggregated feature importances.

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::Local;
use tracing::info;

use nippan_batch::run_job;
use nippan_gbdt::importance::{self, aggregate, fold_importance};
use nippan_gbdt::metrics::{rmse, rmsle};
use nippan_gbdt::{Dataset, GbdtParams, GbdtTrainer, KFold};
use nippan_tabular::{load_table, to_matrix};

const N_FOLDS: usize = 4;
const SEED: i64 = 2020;
const TOP_FEATURES: usize = 50;

fn main() -> ExitCode {
    run_job("train-model", |ctx| {
        let cfg = ctx.config;
        info!("BATCH_DATE: {}", ctx.batch_date);

        let table = load_table(&cfg.feature_table)?;
        let (features, targets) = to_matrix(&table, &cfg.feature_cols, &cfg.target_col)?;
        let dataset = Dataset::new(cfg.feature_cols.clone(), features, targets)?;
        info!(
            "dataset: {} rows, {} features",
            dataset.len(),
            dataset.feature_count()
        );

        let run_dir =
            PathBuf::from(&cfg.model_dir).join(Local::now().format("%Y%m%d%H%M%S").to_string());
        std::fs::create_dir_all(&run_dir)?;
        info!("MODEL_DIR: {}", run_dir.display());

        let params = GbdtParams::default();
        let folds = KFold::new(N_FOLDS, SEED).split(dataset.len())?;

        let mut oof_preds = vec![0.0f64; dataset.len()];
        let mut records = Vec::new();

        for (fold, (train_idx, valid_idx)) in folds.iter().enumerate() {
            let fold_no = fold + 1;
            info!("==== fold {fold_no}/{N_FOLDS} ====");

            let train = dataset.select(train_idx);
            let valid = dataset.select(valid_idx);

            let model = GbdtTrainer::new(params.clone()).train(&train, Some(&valid))?;

            let preds: Vec<f64> = valid
                .features
                .iter()
                .map(|row| model.predict_non_negative(row))
                .collect();
            for (&row, &pred) in valid_idx.iter().zip(&preds) {
                oof_preds[row] = pred;
            }

            info!(
                "fold {fold_no}: best_iteration={} rmse={:.5} rmsle={:.5}",
                model.metadata.best_iteration,
                rmse(&valid.targets, &preds),
                rmsle(&valid.targets, &preds)
            );

            let model_path = run_dir.join(format!("model_fold{fold_no}.json"));
            model.save(&model_path)?;
            info!("saved {} (hash {})", model_path.display(), model.metadata.model_hash);

            records.extend(fold_importance(&model, fold_no));
        }

        info!(
            "out-of-fold: rmse={:.5} rmsle={:.5}",
            rmse(&dataset.targets, &oof_preds),
            rmsle(&dataset.targets, &oof_preds)
        );

        let agg = aggregate(&records, TOP_FEATURES);
        importance::write_csv(&agg, run_dir.join("importance.csv"))?;
        importance::render_chart(&agg, run_dir.join("importance.png"))?;
        info!("wrote feature importance chart ({} features)", agg.len());

        Ok(())
    })
}
