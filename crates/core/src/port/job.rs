// Job Port (contract between a job and whatever runs it)

use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Unit of deferred work with bounded attempts and run time
#[async_trait]
pub trait Job: Send + Sync {
    /// Stable job name, used for per-job configuration and logging
    fn name(&self) -> &str;

    /// Do the work
    async fn perform(&self) -> Result<()>;

    /// Total number of attempts a runner may make (1 = no retries)
    fn max_attempts(&self) -> u32;

    /// Upper bound for a single attempt
    fn max_run_time(&self) -> Duration;
}
