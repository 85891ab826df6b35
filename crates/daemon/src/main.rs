//! App Bits Packer - runs one AppBitsPacker job from a job file

mod settings;
mod telemetry;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Instrument};

use app_bits_core::application::{
    shutdown_channel, AppBitsPacker, JobRunner, PackRequest, RetryPolicy, RunReport,
};
use app_bits_core::port::Job;
use settings::Settings;
use telemetry::{init_logging, LogFormat};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "app-bits-packer")]
#[command(about = "Repackage uploaded application bits", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Settings file (TOML, YAML or JSON)
    #[arg(long, env = "APP_BITS_CONFIG")]
    config: Option<String>,

    /// Log output format
    #[arg(long, env = "APP_BITS_LOG_FORMAT", value_enum, default_value = "pretty")]
    log_format: LogFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the job described by a JSON file
    Run {
        /// Job file: {"app_guid", "uploaded_compressed_path", "fingerprints"}
        #[arg(short, long)]
        job: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.log_format)?;
    info!("App Bits Packer v{} starting...", VERSION);

    let config_path = cli.config.as_deref().map(expand_path);
    let settings = Settings::load(config_path.as_deref())?;

    match cli.command {
        Commands::Run { job } => run(&settings, &expand_path(&job)).await,
    }
}

async fn run(settings: &Settings, job_path: &Path) -> Result<()> {
    let request = load_pack_request(job_path).await?;
    let job: Arc<dyn Job> = Arc::new(AppBitsPacker::from(request));

    let runner = JobRunner::new(RetryPolicy::new(
        settings.runner.retry_base_delay_ms,
        settings.runner.backoff_factor,
    ));

    let (shutdown_tx, shutdown_rx) = shutdown_channel();
    let run_id = uuid::Uuid::new_v4();
    let mut run_handle = tokio::spawn(
        async move { runner.run(job, shutdown_rx).await }
            .instrument(tracing::info_span!("job_run", %run_id)),
    );

    let report = tokio::select! {
        joined = &mut run_handle => joined.context("Runner task failed")?,
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("Shutdown signal received. Stopping job...");
            shutdown_tx.shutdown();
            let grace = Duration::from_secs(settings.runner.shutdown_grace_secs);
            tokio::time::timeout(grace, run_handle)
                .await
                .context("Job did not stop within the grace period")?
                .context("Runner task failed")?
        }
    };

    info!(job = %report.job, attempts = report.attempts, outcome = ?report.outcome, "Run finished");
    ensure_success(&report)
}

/// Map a finished run onto the process result; any outcome but success exits non-zero
fn ensure_success(report: &RunReport) -> Result<()> {
    if !report.is_success() {
        anyhow::bail!("Job {} did not succeed: {:?}", report.job, report.outcome);
    }
    Ok(())
}

async fn load_pack_request(path: &Path) -> Result<PackRequest> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read job file {}", path.display()))?;
    PackRequest::from_json(&raw).with_context(|| format!("Invalid job file {}", path.display()))
}

fn expand_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use app_bits_core::application::RunOutcome;
    use std::io::Write;

    fn report(outcome: RunOutcome) -> RunReport {
        RunReport {
            job: "app_bits_packer".to_string(),
            attempts: 1,
            outcome,
        }
    }

    #[test]
    fn test_ensure_success_accepts_succeeded_run() {
        assert!(ensure_success(&report(RunOutcome::Succeeded)).is_ok());
    }

    #[test]
    fn test_ensure_success_rejects_every_other_outcome() {
        let outcomes = [
            RunOutcome::Failed("droplet too large".to_string()),
            RunOutcome::TimedOut(Duration::from_secs(1)),
            RunOutcome::Panicked("boom".to_string()),
            RunOutcome::Cancelled,
        ];

        for outcome in outcomes {
            let err = ensure_success(&report(outcome.clone())).unwrap_err();
            assert!(err.to_string().contains("app_bits_packer did not succeed"));
        }
    }

    #[tokio::test]
    async fn test_load_pack_request() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"app_guid": "app_guid", "uploaded_compressed_path": "tmp/uploaded.zip",
                "fingerprints": [{{"fn": "Gemfile", "sha1": "a1b2", "size": 20}}]}}"#
        )
        .unwrap();

        let req = load_pack_request(file.path()).await.unwrap();

        assert_eq!(req.app_guid, "app_guid");
        assert_eq!(req.uploaded_compressed_path, "tmp/uploaded.zip");
        assert_eq!(req.fingerprints.len(), 1);
    }

    #[tokio::test]
    async fn test_load_pack_request_rejects_garbage() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let err = load_pack_request(file.path()).await.unwrap_err();
        assert!(err.to_string().contains("Invalid job file"));
    }

    #[test]
    fn test_expand_path_keeps_plain_paths() {
        assert_eq!(expand_path("/tmp/job.json"), PathBuf::from("/tmp/job.json"));
    }
}
