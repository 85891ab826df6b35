//! Layered settings: built-in defaults, optional file, `APP_BITS__*` env vars

use anyhow::{Context, Result};
use app_bits_core::application::runner::constants::{
    DEFAULT_BACKOFF_FACTOR, DEFAULT_RETRY_BASE_DELAY_MS,
};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;

const ENV_PREFIX: &str = "APP_BITS";
const ENV_SEPARATOR: &str = "__";

/// Seconds to wait for an in-flight attempt after Ctrl+C
const DEFAULT_SHUTDOWN_GRACE_SECS: u64 = 5;

#[derive(Debug, Clone, Deserialize)]
pub struct RunnerSettings {
    pub retry_base_delay_ms: u64,
    pub backoff_factor: f64,
    pub shutdown_grace_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub runner: RunnerSettings,
}

impl Settings {
    /// Load settings, `file` overriding defaults and the environment overriding both
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("runner.retry_base_delay_ms", DEFAULT_RETRY_BASE_DELAY_MS)?
            .set_default("runner.backoff_factor", DEFAULT_BACKOFF_FACTOR)?
            .set_default("runner.shutdown_grace_secs", DEFAULT_SHUTDOWN_GRACE_SECS)?;

        if let Some(path) = file {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true),
            )
            .build()
            .context("Failed to read settings")?
            .try_deserialize()
            .context("Invalid settings")
    }
}
