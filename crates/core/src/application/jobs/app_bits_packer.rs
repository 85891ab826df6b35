// AppBitsPacker Job
//
// Repackages an upload: newly uploaded bits plus previously cached files
// (identified by fingerprint) go into one package in the package store.
// Packaging ships disabled; until `with_packaging` wires the collaborators
// the job only idles for a bounded time.

use crate::domain::{Fingerprint, FingerprintsCollection, PackagerSettings};
use crate::error::{AppError, Result};
use crate::port::{AppBitsPackageFactory, AppRepository, Blobstore, Job, PackageStepConfig};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Name used for logging and for the per-job timeout override
pub const JOB_NAME: &str = "app_bits_packer";

/// Iterations of the idle loop while packaging is disabled
pub const PLACEHOLDER_TICKS: u32 = 100;

/// Sleep per idle iteration (5ms)
pub const PLACEHOLDER_TICK: Duration = Duration::from_millis(5);

/// Run time limit reported while packaging is disabled (1s)
pub const PLACEHOLDER_MAX_RUN_TIME: Duration = Duration::from_secs(1);

/// Serializable job descriptor, as handed over by whoever accepted the upload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackRequest {
    pub app_guid: String,
    pub uploaded_compressed_path: String,
    #[serde(default)]
    pub fingerprints: Vec<Fingerprint>,
}

impl PackRequest {
    /// Parse a JSON job descriptor
    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// Collaborators of the packaging step
#[derive(Clone)]
pub struct PackagingServices {
    pub apps: Arc<dyn AppRepository>,
    pub package_blobstore: Arc<dyn Blobstore>,
    pub global_app_bits_cache: Arc<dyn Blobstore>,
    pub packager: Arc<dyn AppBitsPackageFactory>,
}

struct Packaging {
    settings: PackagerSettings,
    services: PackagingServices,
}

pub struct AppBitsPacker {
    app_guid: String,
    uploaded_compressed_path: String,
    fingerprints: Vec<Fingerprint>,
    packaging: Option<Packaging>,
}

impl AppBitsPacker {
    /// Store the three inputs verbatim. No validation.
    pub fn new(
        app_guid: impl Into<String>,
        uploaded_compressed_path: impl Into<String>,
        fingerprints: Vec<Fingerprint>,
    ) -> Self {
        Self {
            app_guid: app_guid.into(),
            uploaded_compressed_path: uploaded_compressed_path.into(),
            fingerprints,
            packaging: None,
        }
    }

    /// Enable packaging with explicit settings and collaborators
    pub fn with_packaging(mut self, settings: PackagerSettings, services: PackagingServices) -> Self {
        self.packaging = Some(Packaging { settings, services });
        self
    }

    pub fn app_guid(&self) -> &str {
        &self.app_guid
    }

    pub fn uploaded_compressed_path(&self) -> &str {
        &self.uploaded_compressed_path
    }

    pub fn fingerprints(&self) -> &[Fingerprint] {
        &self.fingerprints
    }

    pub fn is_packaging_enabled(&self) -> bool {
        self.packaging.is_some()
    }

    async fn idle(&self) {
        for tick in 0..PLACEHOLDER_TICKS {
            debug!(app_guid = %self.app_guid, tick, "Packaging disabled, idling");
            sleep(PLACEHOLDER_TICK).await;
        }
    }

    async fn package(&self, packaging: &Packaging) -> Result<()> {
        let services = &packaging.services;

        let app = services
            .apps
            .find_by_guid(&self.app_guid)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("app {}", self.app_guid)))?;

        let config = PackageStepConfig {
            max_droplet_size: packaging.settings.packages.droplet_size_limit(),
            tmpdir: packaging.settings.directories.tmpdir.clone(),
        };

        info!(
            app_guid = %app.guid,
            package_blobstore = services.package_blobstore.name(),
            global_app_bits_cache = services.global_app_bits_cache.name(),
            max_droplet_size = config.max_droplet_size,
            fingerprints = self.fingerprints.len(),
            "Packaging app bits"
        );

        let package = services.packager.build(
            Arc::clone(&services.package_blobstore),
            Arc::clone(&services.global_app_bits_cache),
            config,
        );

        let fingerprints = FingerprintsCollection::new(self.fingerprints.clone());
        package
            .create(&app, Path::new(&self.uploaded_compressed_path), &fingerprints)
            .await
            .inspect_err(|e| warn!(app_guid = %app.guid, error = %e, "Packaging failed"))
    }
}

impl From<PackRequest> for AppBitsPacker {
    fn from(req: PackRequest) -> Self {
        Self::new(req.app_guid, req.uploaded_compressed_path, req.fingerprints)
    }
}

impl fmt::Debug for AppBitsPacker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppBitsPacker")
            .field("app_guid", &self.app_guid)
            .field("uploaded_compressed_path", &self.uploaded_compressed_path)
            .field("fingerprints", &self.fingerprints.len())
            .field("packaging_enabled", &self.is_packaging_enabled())
            .finish()
    }
}

#[async_trait]
impl Job for AppBitsPacker {
    fn name(&self) -> &str {
        JOB_NAME
    }

    async fn perform(&self) -> Result<()> {
        match &self.packaging {
            Some(packaging) => self.package(packaging).await,
            None => {
                self.idle().await;
                Ok(())
            }
        }
    }

    fn max_attempts(&self) -> u32 {
        1
    }

    fn max_run_time(&self) -> Duration {
        match &self.packaging {
            Some(packaging) => packaging.settings.jobs.timeout_for(JOB_NAME),
            None => PLACEHOLDER_MAX_RUN_TIME,
        }
    }
}
