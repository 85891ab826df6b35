// Domain Layer - Pure data and value types

pub mod app;
pub mod error;
pub mod fingerprint;
pub mod settings;

// Re-exports
pub use app::{App, AppGuid};
pub use error::DomainError;
pub use fingerprint::{Fingerprint, FingerprintsCollection};
pub use settings::{
    DirectoriesConfig, JobTimeoutConfig, JobsConfig, PackagerSettings, PackagesConfig,
};
