//! StorSimple device manager client
//!
//! The StorSimple (8000 series) device manager lives on the classic service
//! management API, addressed through its cloud service and resource name.

use super::models::{MigrationConfirmStatusRequest, MigrationJobStatus};
use crate::azure::client::AzureClient;
use anyhow::{Context, Result};
use futures::future::{BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};

/// Resource provider namespace of the device manager
pub const DEFAULT_RESOURCE_NAMESPACE: &str = "WACis.Cloud.Service";

/// Resource type of the device manager
pub const DEFAULT_RESOURCE_TYPE: &str = "CisVault";

/// Remote operations used by the migration commands
pub trait MigrationService: Send + Sync {
    fn confirm_legacy_volume_container_status<'a>(
        &'a self,
        legacy_config_id: &'a str,
        request: &'a MigrationConfirmStatusRequest,
    ) -> BoxFuture<'a, Result<MigrationJobStatus>>;
}

/// Which StorSimple device manager to talk to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorSimpleContext {
    pub cloud_service: String,
    pub resource: String,
    #[serde(default = "default_namespace")]
    pub resource_namespace: String,
    #[serde(default = "default_resource_type")]
    pub resource_type: String,
}

fn default_namespace() -> String {
    DEFAULT_RESOURCE_NAMESPACE.to_string()
}

fn default_resource_type() -> String {
    DEFAULT_RESOURCE_TYPE.to_string()
}

impl StorSimpleContext {
    pub fn new(cloud_service: &str, resource: &str) -> Self {
        Self {
            cloud_service: cloud_service.to_string(),
            resource: resource.to_string(),
            resource_namespace: default_namespace(),
            resource_type: default_resource_type(),
        }
    }

    /// Path of the device manager below the subscription
    pub fn resource_path(&self) -> String {
        format!(
            "cloudservices/{}/resources/{}/~/{}/{}",
            urlencoding::encode(&self.cloud_service),
            self.resource_namespace,
            self.resource_type,
            urlencoding::encode(&self.resource)
        )
    }
}

/// HTTP implementation of [`MigrationService`]
#[derive(Clone)]
pub struct StorSimpleClient {
    client: AzureClient,
    context: StorSimpleContext,
}

impl StorSimpleClient {
    pub fn new(client: AzureClient, context: StorSimpleContext) -> Self {
        Self { client, context }
    }

    pub fn confirm_status_path(&self, legacy_config_id: &str) -> String {
        format!(
            "{}/api/migration/{}/confirmstatus",
            self.context.resource_path(),
            urlencoding::encode(legacy_config_id)
        )
    }
}

impl MigrationService for StorSimpleClient {
    fn confirm_legacy_volume_container_status<'a>(
        &'a self,
        legacy_config_id: &'a str,
        request: &'a MigrationConfirmStatusRequest,
    ) -> BoxFuture<'a, Result<MigrationJobStatus>> {
        async move {
            tracing::info!(
                "Confirming migration of legacy config {} ({}, {} containers)",
                legacy_config_id,
                request.operation,
                request.data_container_name_list.len()
            );

            let body = serde_json::to_value(request)
                .context("Failed to serialize migration confirm request")?;
            let response = self
                .client
                .service_management_post(&self.confirm_status_path(legacy_config_id), &body)
                .await?;

            if response.is_null() {
                return Ok(MigrationJobStatus::default());
            }

            serde_json::from_value(response).context("Failed to parse migration job status")
        }
        .boxed()
    }
}
