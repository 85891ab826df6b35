// Packager settings
//
// Plain data handed to the job at construction time. Loading (files, env)
// belongs to the composition root.

use crate::domain::error::{DomainError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Package size limit used when `packages.max_droplet_size` is unset (512 MiB)
pub const DEFAULT_MAX_DROPLET_SIZE: u64 = 512 * 1024 * 1024;

/// Global job timeout used when nothing is configured (4 hours)
pub const DEFAULT_JOB_TIMEOUT_SECS: u64 = 4 * 60 * 60;

/// Key of the global entry inside a `jobs` table
const GLOBAL_KEY: &str = "global";

/// Timeout of a single job type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobTimeoutConfig {
    pub timeout_in_seconds: u64,
}

impl JobTimeoutConfig {
    pub fn from_secs(timeout_in_seconds: u64) -> Self {
        Self { timeout_in_seconds }
    }

    pub fn as_duration(&self) -> Duration {
        Duration::from_secs(self.timeout_in_seconds)
    }
}

fn default_global_timeout() -> JobTimeoutConfig {
    JobTimeoutConfig::from_secs(DEFAULT_JOB_TIMEOUT_SECS)
}

/// Job timeouts: one global entry plus optional per-job overrides keyed by job name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobsConfig {
    #[serde(default = "default_global_timeout")]
    pub global: JobTimeoutConfig,

    #[serde(flatten)]
    pub overrides: HashMap<String, JobTimeoutConfig>,
}

impl JobsConfig {
    /// Override for `job_name` if present, otherwise the global timeout
    pub fn timeout_for(&self, job_name: &str) -> Duration {
        self.overrides
            .get(job_name)
            .unwrap_or(&self.global)
            .as_duration()
    }

    /// Add a per-job override. `global` is not a job name.
    pub fn with_override(
        mut self,
        job_name: impl Into<String>,
        timeout: JobTimeoutConfig,
    ) -> Result<Self> {
        let job_name = job_name.into();
        if job_name == GLOBAL_KEY {
            return Err(DomainError::ValidationError(format!(
                "'{}' is reserved for the global timeout",
                GLOBAL_KEY
            )));
        }
        self.overrides.insert(job_name, timeout);
        Ok(self)
    }
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            global: default_global_timeout(),
            overrides: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackagesConfig {
    /// Maximum total package size in bytes
    #[serde(default)]
    pub max_droplet_size: Option<u64>,
}

impl PackagesConfig {
    pub fn droplet_size_limit(&self) -> u64 {
        self.max_droplet_size.unwrap_or(DEFAULT_MAX_DROPLET_SIZE)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoriesConfig {
    /// Scratch space for unpacking and re-bundling
    pub tmpdir: PathBuf,
}

impl Default for DirectoriesConfig {
    fn default() -> Self {
        Self {
            tmpdir: std::env::temp_dir(),
        }
    }
}

/// Everything the packaging step reads from configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackagerSettings {
    #[serde(default)]
    pub jobs: JobsConfig,
    #[serde(default)]
    pub packages: PackagesConfig,
    #[serde(default)]
    pub directories: DirectoriesConfig,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_timeout_falls_back_to_global() {
        let jobs = JobsConfig {
            global: JobTimeoutConfig::from_secs(4 * 3600),
            overrides: HashMap::new(),
        };

        assert_eq!(jobs.timeout_for("app_bits_packer"), Duration::from_secs(4 * 3600));
    }

    #[test]
    fn test_timeout_override_wins() {
        let jobs = JobsConfig::default()
            .with_override("app_bits_packer", JobTimeoutConfig::from_secs(300))
            .unwrap();

        assert_eq!(jobs.timeout_for("app_bits_packer"), Duration::from_secs(300));
        assert_eq!(
            jobs.timeout_for("droplet_deletion"),
            Duration::from_secs(DEFAULT_JOB_TIMEOUT_SECS)
        );
    }

    #[test]
    fn test_override_only_jobs_table_keeps_default_global() {
        let settings: PackagerSettings = serde_json::from_value(json!({
            "jobs": {"app_bits_packer": {"timeout_in_seconds": 300}}
        }))
        .unwrap();

        assert_eq!(settings.jobs.timeout_for("app_bits_packer"), Duration::from_secs(300));
        assert_eq!(
            settings.jobs.global,
            JobTimeoutConfig::from_secs(DEFAULT_JOB_TIMEOUT_SECS)
        );
        assert_eq!(
            settings.jobs.timeout_for("droplet_deletion"),
            Duration::from_secs(DEFAULT_JOB_TIMEOUT_SECS)
        );
    }

    #[test]
    fn test_global_is_not_an_override() {
        let err = JobsConfig::default()
            .with_override("global", JobTimeoutConfig::from_secs(1))
            .unwrap_err();
        assert!(err.to_string().contains("reserved"));
    }

    #[test]
    fn test_overrides_survive_round_trip() {
        let jobs = JobsConfig::default()
            .with_override("app_bits_packer", JobTimeoutConfig::from_secs(300))
            .unwrap();

        let value = serde_json::to_value(&jobs).unwrap();
        let back: JobsConfig = serde_json::from_value(value).unwrap();

        assert_eq!(back, jobs);
    }

    #[test]
    fn test_droplet_size_default() {
        assert_eq!(PackagesConfig::default().droplet_size_limit(), 512 * 1024 * 1024);

        let packages = PackagesConfig {
            max_droplet_size: Some(256),
        };
        assert_eq!(packages.droplet_size_limit(), 256);
    }

    #[test]
    fn test_deserialize_nested_overrides() {
        let settings: PackagerSettings = serde_json::from_value(json!({
            "jobs": {
                "global": {"timeout_in_seconds": 14400},
                "app_bits_packer": {"timeout_in_seconds": 300}
            },
            "packages": {"max_droplet_size": 1024},
            "directories": {"tmpdir": "/tmp/special_temp"}
        }))
        .unwrap();

        assert_eq!(settings.jobs.timeout_for("app_bits_packer"), Duration::from_secs(300));
        assert_eq!(settings.packages.droplet_size_limit(), 1024);
        assert_eq!(settings.directories.tmpdir, PathBuf::from("/tmp/special_temp"));
    }
}
