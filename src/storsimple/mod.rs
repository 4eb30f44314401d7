//! StorSimple legacy migration
//!
//! - [`models`] - Request and status types
//! - [`client`] - `MigrationService` and its HTTP implementation
//! - [`migration`] - The confirm-migration command and its output formatting

pub mod client;
pub mod migration;
pub mod models;

pub use client::{MigrationService, StorSimpleClient, StorSimpleContext};
pub use migration::{result_message, ConfirmLegacyVolumeContainerStatus};
pub use models::{HcsMessageInfo, MigrationConfirmStatusRequest, MigrationJobStatus, MigrationOperation};
