// Port Layer - Interfaces for external dependencies

pub mod app_bits_package;
pub mod app_repository;
pub mod blobstore;
pub mod job;

// Re-exports
pub use app_bits_package::{AppBitsPackage, AppBitsPackageFactory, PackageStepConfig};
pub use app_repository::AppRepository;
pub use blobstore::{Blobstore, BlobstoreKey};
pub use job::Job;
