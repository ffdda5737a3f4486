//! Feature build step: joins the four input extracts into the training
//! table, writes the per-combination CSV slices and the encoded binary
//! feature table.

use std::process::ExitCode;

use tracing::info;

use nippan_batch::run_job;
use nippan_jobs::{assemble, drop_null_rows, slice_key_frames};
use nippan_tabular::{label_encode, load_csv, load_dat, write_csv, write_table, FileSpec};

fn main() -> ExitCode {
    run_job("build-features", |ctx| {
        let cfg = ctx.config;
        info!("BATCH_DATE: {}", ctx.batch_date);

        let sales = load_csv(&cfg.input_sales)?;
        let kyaku = load_csv(&cfg.input_kyaku)?;
        let gis = load_csv(&cfg.input_gis)?;
        let mise = load_dat(&cfg.input_mise)?;

        let joined = assemble(&sales, &kyaku, &gis, &mise)?;
        let clean = drop_null_rows(&joined, &["inhabitants", "employees"])?;
        info!(
            "training table: {} rows ({} dropped for missing gis attributes)",
            clean.height(),
            joined.height() - clean.height()
        );

        std::fs::create_dir_all(&cfg.slice_dir)?;
        let slice_base = FileSpec {
            dir: cfg.slice_dir.clone(),
            name: String::new(),
            usecols: None,
            dtypes: Vec::new(),
            outcols: None,
        };
        let slices = slice_key_frames(
            &clean,
            (cfg.group_mise_col.as_str(), cfg.group_mise_keys.as_slice()),
            (cfg.group_item_col.as_str(), cfg.group_item_keys.as_slice()),
        )?;
        for ((mise_key, item_key), frame) in &slices {
            let spec = slice_base.named(format!("slice_{mise_key}_{item_key}.csv"));
            write_csv(frame, &spec, true)?;
        }
        info!("wrote {} slice files", slices.len());

        let encoded = label_encode(&clean, &cfg.categorical_cols)?;
        std::fs::create_dir_all(&cfg.feature_table.dir)?;
        write_table(&encoded, &cfg.feature_table)?;

        Ok(())
    })
}
