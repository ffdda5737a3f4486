//! Pipeline driver: runs the feature build and training steps in order,
//! stopping at the first failure. Each step is a sibling binary invoked
//! with this process's batch date, job id and log file so the whole run
//! lands in one log.

use std::process::{Command, ExitCode};

use anyhow::{anyhow, bail};
use tracing::info;

use nippan_batch::run_job;

const STEPS: &[(&str, &str)] = &[("build-features", "feature"), ("train-model", "train")];

fn main() -> ExitCode {
    run_job("run-pipeline", |ctx| {
        let exe = std::env::current_exe()?;
        let bin_dir = exe
            .parent()
            .ok_or_else(|| anyhow!("cannot resolve binary directory"))?;

        for (step, config_name) in STEPS {
            info!("---- step {step} ----");

            let status = Command::new(bin_dir.join(step))
                .arg(&ctx.batch_date)
                .arg(config_name)
                .arg(&ctx.job_id)
                .arg(&ctx.log_path)
                .status()?;

            if !status.success() {
                bail!("step {step} failed: {status}");
            }
            info!("---- step {step} done ----");
        }

        Ok(())
    })
}
