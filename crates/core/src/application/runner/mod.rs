// Job Runner - executes one job with bounded attempts and run time

pub mod constants;
mod shutdown;

pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};

use crate::application::retry::{RetryDecision, RetryPolicy};
use crate::port::Job;
use std::any::Any;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{error, info, warn};

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Succeeded,
    /// Last attempt returned an error
    Failed(String),
    /// Last attempt exceeded `max_run_time`
    TimedOut(Duration),
    /// An attempt panicked (never retried)
    Panicked(String),
    /// Shutdown was requested before the job finished
    Cancelled,
}

/// Result of running a job to completion
#[derive(Debug, Clone)]
pub struct RunReport {
    pub job: String,
    pub attempts: u32,
    pub outcome: RunOutcome,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.outcome == RunOutcome::Succeeded
    }
}

/// Runs jobs honouring `max_attempts` and `max_run_time`
pub struct JobRunner {
    retry_policy: RetryPolicy,
}

impl JobRunner {
    pub fn new(retry_policy: RetryPolicy) -> Self {
        Self { retry_policy }
    }

    /// Run `job` until it succeeds, runs out of attempts, panics or is cancelled
    pub async fn run(&self, job: Arc<dyn Job>, mut shutdown: ShutdownToken) -> RunReport {
        let name = job.name().to_string();
        let max_attempts = job.max_attempts().max(1);
        let mut attempts = 0;

        info!(
            job = %name,
            max_attempts,
            max_run_time_ms = job.max_run_time().as_millis() as u64,
            "Job started"
        );

        let outcome = loop {
            if shutdown.is_shutdown() {
                break RunOutcome::Cancelled;
            }

            attempts += 1;
            let outcome = Self::attempt(&job, &mut shutdown).await;

            // Panics and cancellations are final
            if !matches!(outcome, RunOutcome::Failed(_) | RunOutcome::TimedOut(_)) {
                break outcome;
            }

            match self.retry_policy.should_retry(&name, attempts, max_attempts) {
                RetryDecision::GiveUp => break outcome,
                RetryDecision::Retry(delay) => {
                    warn!(
                        job = %name,
                        attempt = attempts,
                        outcome = ?outcome,
                        "Attempt failed, retrying"
                    );
                    tokio::select! {
                        _ = sleep(delay) => {},
                        _ = shutdown.cancelled() => break RunOutcome::Cancelled,
                    }
                }
            }
        };

        match &outcome {
            RunOutcome::Succeeded => info!(job = %name, attempts, "Job completed"),
            RunOutcome::Cancelled => info!(job = %name, attempts, "Job cancelled by shutdown"),
            other => error!(job = %name, attempts, outcome = ?other, "Job failed"),
        }

        RunReport {
            job: name,
            attempts,
            outcome,
        }
    }

    /// One attempt on its own task, so a panic cannot take the runner down
    async fn attempt(job: &Arc<dyn Job>, shutdown: &mut ShutdownToken) -> RunOutcome {
        let limit = job.max_run_time();
        let task_job = Arc::clone(job);
        let handle = tokio::spawn(async move { task_job.perform().await });
        let abort = handle.abort_handle();

        tokio::select! {
            joined = timeout(limit, handle) => match joined {
                Err(_) => {
                    abort.abort();
                    RunOutcome::TimedOut(limit)
                }
                Ok(Ok(Ok(()))) => RunOutcome::Succeeded,
                Ok(Ok(Err(e))) => RunOutcome::Failed(e.to_string()),
                Ok(Err(join_err)) if join_err.is_panic() => {
                    RunOutcome::Panicked(panic_message(join_err.into_panic()))
                }
                Ok(Err(join_err)) => RunOutcome::Failed(join_err.to_string()),
            },
            _ = shutdown.cancelled() => {
                abort.abort();
                RunOutcome::Cancelled
            }
        }
    }
}

impl Default for JobRunner {
    fn default() -> Self {
        Self::new(RetryPolicy::default())
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, Result};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    enum Behavior {
        Succeed,
        Fail,
        Hang,
        Panic,
    }

    struct ScriptedJob {
        behavior: Behavior,
        max_attempts: u32,
        calls: AtomicU32,
    }

    impl ScriptedJob {
        fn new(behavior: Behavior, max_attempts: u32) -> Arc<Self> {
            Arc::new(Self {
                behavior,
                max_attempts,
                calls: AtomicU32::new(0),
            })
        }
    }

    #[async_trait]
    impl Job for ScriptedJob {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn perform(&self) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.behavior {
                Behavior::Succeed => Ok(()),
                Behavior::Fail => Err(AppError::Internal("boom".to_string())),
                Behavior::Hang => {
                    std::future::pending::<()>().await;
                    Ok(())
                }
                Behavior::Panic => panic!("job exploded"),
            }
        }

        fn max_attempts(&self) -> u32 {
            self.max_attempts
        }

        fn max_run_time(&self) -> Duration {
            Duration::from_secs(1)
        }
    }

    #[tokio::test]
    async fn test_success_on_first_attempt() {
        let job = ScriptedJob::new(Behavior::Succeed, 3);
        let (_tx, token) = shutdown_channel();

        let report = JobRunner::default().run(job.clone(), token).await;

        assert!(report.is_success());
        assert_eq!(report.attempts, 1);
        assert_eq!(report.job, "scripted");
    }

    #[tokio::test]
    async fn test_single_attempt_failure_is_not_retried() {
        let job = ScriptedJob::new(Behavior::Fail, 1);
        let (_tx, token) = shutdown_channel();

        let report = JobRunner::default().run(job.clone(), token).await;

        assert_eq!(report.attempts, 1);
        assert_eq!(job.calls.load(Ordering::SeqCst), 1);
        assert!(matches!(report.outcome, RunOutcome::Failed(ref msg) if msg.contains("boom")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_retried_until_max_attempts() {
        let job = ScriptedJob::new(Behavior::Fail, 3);
        let (_tx, token) = shutdown_channel();

        let report = JobRunner::new(RetryPolicy::new(10, 2.0))
            .run(job.clone(), token)
            .await;

        assert_eq!(report.attempts, 3);
        assert_eq!(job.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_reported() {
        let job = ScriptedJob::new(Behavior::Hang, 1);
        let (_tx, token) = shutdown_channel();

        let report = JobRunner::default().run(job, token).await;

        assert_eq!(report.outcome, RunOutcome::TimedOut(Duration::from_secs(1)));
    }

    #[tokio::test]
    async fn test_panic_is_isolated_and_not_retried() {
        let job = ScriptedJob::new(Behavior::Panic, 3);
        let (_tx, token) = shutdown_channel();

        let report = JobRunner::default().run(job.clone(), token).await;

        assert_eq!(report.outcome, RunOutcome::Panicked("job exploded".to_string()));
        assert_eq!(job.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_shutdown_before_start_cancels() {
        let job = ScriptedJob::new(Behavior::Succeed, 1);
        let (tx, token) = shutdown_channel();
        tx.shutdown();

        let report = JobRunner::default().run(job.clone(), token).await;

        assert_eq!(report.outcome, RunOutcome::Cancelled);
        assert_eq!(report.attempts, 0);
        assert_eq!(job.calls.load(Ordering::SeqCst), 0);
    }
}
