//! Confirm (commit or roll back) a legacy volume container migration

use super::client::MigrationService;
use super::models::{MigrationConfirmStatusRequest, MigrationJobStatus, MigrationOperation};
use anyhow::{bail, Result};

/// Shown when the service returns no diagnostic messages
pub const CONFIRM_MIGRATION_SUCCESS_MESSAGE: &str =
    "Confirm migration status request completed successfully.";

/// Arguments of the confirm-migration command
#[derive(Debug, Clone)]
pub struct ConfirmLegacyVolumeContainerStatus {
    pub legacy_config_id: String,
    /// "Commit" or "Rollback", any case
    pub migration_operation: String,
    pub legacy_container_names: Option<Vec<String>>,
}

impl ConfirmLegacyVolumeContainerStatus {
    /// Validate arguments and build the service request
    pub fn request(&self) -> Result<MigrationConfirmStatusRequest> {
        if self.legacy_config_id.trim().is_empty() {
            bail!("Legacy config id must not be empty");
        }

        let operation: MigrationOperation = self.migration_operation.parse()?;
        Ok(MigrationConfirmStatusRequest::new(
            operation,
            self.legacy_container_names.as_deref(),
        ))
    }

    /// Send the request and format the service's answer
    pub async fn execute(&self, service: &dyn MigrationService) -> Result<String> {
        let request = self.request()?;
        let status = service
            .confirm_legacy_volume_container_status(&self.legacy_config_id, &request)
            .await?;

        tracing::debug!("Migration job status: {:?}", status);
        Ok(result_message(&status))
    }
}

/// One line per non-empty service message, or the success line if there are none
pub fn result_message(status: &MigrationJobStatus) -> String {
    let mut output = String::new();
    for message in status.messages() {
        output.push_str(message);
        output.push('\n');
    }

    if output.is_empty() {
        output.push_str(CONFIRM_MIGRATION_SUCCESS_MESSAGE);
        output.push('\n');
    }

    output
}
