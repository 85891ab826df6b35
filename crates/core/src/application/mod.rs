// Application Layer - Jobs and the runner that executes them

pub mod jobs;
pub mod retry;
pub mod runner;

// Re-exports
pub use jobs::{AppBitsPacker, PackRequest, PackagingServices};
pub use retry::RetryPolicy;
pub use runner::{shutdown_channel, JobRunner, RunOutcome, RunReport, ShutdownSender, ShutdownToken};
