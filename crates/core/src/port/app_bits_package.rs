// App Bits Package Port
// The packaging step itself lives outside this crate; the job only wires it.

use crate::domain::{App, FingerprintsCollection};
use crate::error::Result;
use crate::port::Blobstore;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Limits and scratch space for one packaging step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageStepConfig {
    pub max_droplet_size: u64,
    pub tmpdir: PathBuf,
}

/// Combines the uploaded archive with cached bits and stores the package
#[async_trait]
pub trait AppBitsPackage: Send + Sync {
    async fn create(
        &self,
        app: &App,
        uploaded_compressed_path: &Path,
        fingerprints: &FingerprintsCollection,
    ) -> Result<()>;
}

/// Builds a packaging step bound to its two stores
pub trait AppBitsPackageFactory: Send + Sync {
    fn build(
        &self,
        package_blobstore: Arc<dyn Blobstore>,
        global_app_bits_cache: Arc<dyn Blobstore>,
        config: PackageStepConfig,
    ) -> Box<dyn AppBitsPackage>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::error::AppError;
    use std::sync::Mutex;

    /// Arguments a factory was built with
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct RecordedBuild {
        pub package_blobstore: String,
        pub global_app_bits_cache: String,
        pub config: PackageStepConfig,
    }

    /// Arguments `create` was called with
    #[derive(Debug, Clone, PartialEq)]
    pub struct RecordedCreate {
        pub app: App,
        pub uploaded_compressed_path: PathBuf,
        pub fingerprints: FingerprintsCollection,
    }

    #[derive(Default)]
    struct Calls {
        builds: Vec<RecordedBuild>,
        creates: Vec<RecordedCreate>,
    }

    /// Factory whose packages only record what they were asked to do
    #[derive(Clone, Default)]
    pub struct RecordingPackageFactory {
        calls: Arc<Mutex<Calls>>,
        failure: Option<String>,
    }

    impl RecordingPackageFactory {
        pub fn new() -> Self {
            Self::default()
        }

        /// Packages built by this factory fail `create` with `message`
        pub fn failing(message: impl Into<String>) -> Self {
            Self {
                calls: Arc::default(),
                failure: Some(message.into()),
            }
        }

        pub fn builds(&self) -> Vec<RecordedBuild> {
            self.calls.lock().unwrap().builds.clone()
        }

        pub fn creates(&self) -> Vec<RecordedCreate> {
            self.calls.lock().unwrap().creates.clone()
        }
    }

    impl AppBitsPackageFactory for RecordingPackageFactory {
        fn build(
            &self,
            package_blobstore: Arc<dyn Blobstore>,
            global_app_bits_cache: Arc<dyn Blobstore>,
            config: PackageStepConfig,
        ) -> Box<dyn AppBitsPackage> {
            self.calls.lock().unwrap().builds.push(RecordedBuild {
                package_blobstore: package_blobstore.name().to_string(),
                global_app_bits_cache: global_app_bits_cache.name().to_string(),
                config,
            });
            Box::new(RecordingPackage {
                calls: Arc::clone(&self.calls),
                failure: self.failure.clone(),
            })
        }
    }

    struct RecordingPackage {
        calls: Arc<Mutex<Calls>>,
        failure: Option<String>,
    }

    #[async_trait]
    impl AppBitsPackage for RecordingPackage {
        async fn create(
            &self,
            app: &App,
            uploaded_compressed_path: &Path,
            fingerprints: &FingerprintsCollection,
        ) -> Result<()> {
            self.calls.lock().unwrap().creates.push(RecordedCreate {
                app: app.clone(),
                uploaded_compressed_path: uploaded_compressed_path.to_path_buf(),
                fingerprints: fingerprints.clone(),
            });
            match &self.failure {
                Some(msg) => Err(AppError::Packaging(msg.clone())),
                None => Ok(()),
            }
        }
    }
}
