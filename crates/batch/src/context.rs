//! Batch process lifecycle.
//!
//! Every entry point builds one [`RunContext`] at startup and tears it down
//! at exit. Startup validates the argument contract, resolves the named
//! configuration, attaches console and file logging and emits the header
//! block; teardown logs the footer with elapsed wall-clock seconds.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;
use std::time::Instant;

use chrono::{DateTime, Local};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{self, JobConfig};
use crate::errors::BatchError;

/// Job id used when the caller did not supply one.
pub const DUMMY_JOB_ID: &str = "jobid_undefined";

/// Positional argument contract shared by every batch binary:
/// `<batch_date> <config_name> [job_id] [log_file]`.
#[derive(Parser, Debug)]
#[command(disable_version_flag = true)]
struct BatchArgs {
    /// Batch date, e.g. 20200901
    batch_date: String,

    /// Name of the configuration to resolve
    config_name: String,

    /// Job id assigned by the scheduler
    job_id: Option<String>,

    /// Explicit log file path; skips the log-directory lookup
    log_file: Option<PathBuf>,
}

/// Identifying and timing fields for one batch process execution.
///
/// Mutated only during [`RunContext::start`]; read-only afterwards.
#[derive(Debug)]
pub struct RunContext {
    pub batch_date: String,
    pub config: &'static JobConfig,
    pub job_name: String,
    pub step_name: String,
    pub program_name: String,
    pub pid: u32,
    pub job_id: String,
    pub host_name: String,
    pub log_path: PathBuf,
    pub started_at: DateTime<Local>,
    logging_ready: bool,
    started: Instant,
}

impl RunContext {
    /// Initialize the batch process from its full OS argv.
    ///
    /// Fails with [`BatchError::Usage`] on any argument shape outside
    /// 3-5 total slots, before any logging sink is constructed.
    pub fn start(program_name: &str, argv: &[String]) -> Result<Self, BatchError> {
        let started = Instant::now();
        let started_at = Local::now();

        let args =
            BatchArgs::try_parse_from(argv).map_err(|err| BatchError::Usage(err.to_string()))?;

        let config = config::resolve(&args.config_name)?;
        let job_id = args.job_id.unwrap_or_else(|| DUMMY_JOB_ID.to_string());
        let host_name = host_name();

        // Log path is either supplied explicitly or derived from the
        // configured directory, which must already exist.
        let log_path = match args.log_file {
            Some(path) => path,
            None => {
                let dir = Path::new(&config.log_dir);
                if !dir.is_dir() {
                    return Err(BatchError::LogDirMissing(dir.to_path_buf()));
                }
                dir.join(format!("{}_{}_{}.log", config.job_name, host_name, job_id))
            }
        };

        let logging_ready = init_logging(&log_path)?;

        let ctx = Self {
            batch_date: args.batch_date,
            config,
            job_name: config.job_name.clone(),
            step_name: config.step_name.clone(),
            program_name: program_name.to_string(),
            pid: std::process::id(),
            job_id,
            host_name,
            log_path,
            started_at,
            logging_ready,
            started,
        };

        ctx.log_header();
        Ok(ctx)
    }

    /// Elapsed wall-clock seconds since startup.
    pub fn elapsed_secs(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    /// Whether this context attached the process's logging sinks.
    pub fn logging_ready(&self) -> bool {
        self.logging_ready
    }

    fn log_header(&self) {
        if !self.logging_ready {
            return;
        }
        info!("============   BATCH   LOG   ============");
        info!("JOB: {}", self.job_name);
        info!("STEP: {}", self.step_name);
        info!("PGM: {}", self.program_name);
        info!("PID: {}", self.pid);
        info!("JOB_ID: {}", self.job_id);
        info!("HOSTNAME: {}", self.host_name);
        info!("------------------------------------------");
        info!("");
    }

    /// Log the footer block with elapsed seconds. Best effort: when the
    /// sinks were never attached the footer is skipped entirely and only
    /// the elapsed value is returned.
    pub fn end(&self) -> f64 {
        let elapsed = self.elapsed_secs();
        if !self.logging_ready {
            return elapsed;
        }
        info!("");
        info!("------------------------------------------");
        info!("JOB: {}", self.job_name);
        info!("STEP: {}", self.step_name);
        info!("PGM: {}", self.program_name);
        info!("PID: {}", self.pid);
        info!("JOB_ID: {}", self.job_id);
        info!("HOSTNAME: {}", self.host_name);
        info!("ELAPSED: {:.2}[sec]", elapsed);
        info!("============   BATCH   LOG   ============");
        elapsed
    }
}

/// Attach a console layer and an append-mode file layer to the global
/// subscriber. Returns false when another subscriber already owns the
/// process (the sinks stay as they were).
fn init_logging(log_path: &Path) -> Result<bool, BatchError> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let ready = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(
            fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .try_init()
        .is_ok();

    Ok(ready)
}

fn host_name() -> String {
    if let Ok(host) = std::env::var("HOSTNAME") {
        if !host.is_empty() {
            return host;
        }
    }
    std::fs::read_to_string("/etc/hostname")
        .map(|s| s.trim().to_string())
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "localhost".to_string())
}

/// Top-level error boundary for a batch binary.
///
/// Starts the context (startup failures go to stderr since no sink exists
/// yet), runs the body, logs the success or failure banner, and always runs
/// teardown before returning the exit code.
pub fn run_job<F>(program_name: &str, body: F) -> ExitCode
where
    F: FnOnce(&RunContext) -> anyhow::Result<()>,
{
    let argv: Vec<String> = std::env::args().collect();

    let ctx = match RunContext::start(program_name, &argv) {
        Ok(ctx) => ctx,
        Err(err) => {
            eprintln!("{program_name}: {err}");
            return ExitCode::FAILURE;
        }
    };

    let code = match body(&ctx) {
        Ok(()) => {
            info!("========================================");
            info!("ENDED CODE=0");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("========================================");
            error!("{err:?}");
            error!("ENDED CODE=1");
            ExitCode::FAILURE
        }
    };

    ctx.end();
    code
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn too_few_arguments_fail_as_usage() {
        for args in [
            argv(&["prog"]),
            argv(&["prog", "20200901"]),
        ] {
            let err = RunContext::start("prog", &args).unwrap_err();
            assert!(matches!(err, BatchError::Usage(_)), "args: {args:?}");
        }
    }

    #[test]
    fn too_many_arguments_fail_as_usage() {
        let args = argv(&["prog", "20200901", "train", "j1", "x.log", "extra"]);
        let err = RunContext::start("prog", &args).unwrap_err();
        assert!(matches!(err, BatchError::Usage(_)));
    }

    #[test]
    fn unknown_configuration_fails() {
        let args = argv(&["prog", "20200901", "no_such_config"]);
        let err = RunContext::start("prog", &args).unwrap_err();
        assert!(matches!(err, BatchError::UnknownConfig(_)));
    }

    #[test]
    fn missing_log_directory_fails_without_explicit_log_file() {
        // Three-slot form derives the log path from the configured
        // directory, which does not exist under the test cwd.
        let args = argv(&["prog", "20200901", "train"]);
        let err = RunContext::start("prog", &args).unwrap_err();
        assert!(matches!(err, BatchError::LogDirMissing(_)));
    }

    #[test]
    fn valid_startup_populates_identity_fields() {
        let dir = TempDir::new().unwrap();
        let log_file = dir.path().join("test.log");
        let args = argv(&[
            "prog",
            "20200901",
            "train",
            "job42",
            log_file.to_str().unwrap(),
        ]);

        let ctx = RunContext::start("prog", &args).unwrap();

        assert_eq!(ctx.pid, std::process::id());
        assert_eq!(ctx.batch_date, "20200901");
        assert_eq!(ctx.job_name, "J310_TRAIN");
        assert_eq!(ctx.job_id, "job42");
        assert!(log_file.is_file());

        let elapsed = ctx.end();
        assert!(elapsed >= 0.0);
    }

    #[test]
    fn job_id_defaults_when_not_supplied() {
        let dir = TempDir::new().unwrap();
        let log_file = dir.path().join("default.log");

        // Four slots cannot express "log file but no job id", so go through
        // the five-slot form with an explicit placeholder instead.
        let args = argv(&[
            "prog",
            "20200901",
            "feature",
            DUMMY_JOB_ID,
            log_file.to_str().unwrap(),
        ]);

        let ctx = RunContext::start("prog", &args).unwrap();
        assert_eq!(ctx.job_id, DUMMY_JOB_ID);
        ctx.end();
    }
}
