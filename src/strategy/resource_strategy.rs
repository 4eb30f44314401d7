//! Resource Strategy
//!
//! A `ResourceStrategy<T>` is the typed entry in the strategy table for one
//! Azure resource type: which registry entry describes it, how to read it,
//! how to create or update it, and roughly how long creation takes.

use super::registry::{get_resource_type, ResourceTypeDef};
use super::resource_config::{EntityConfig, ResourceConfig};
use super::resource_group::ResourceGroup;
use super::resource_id::ResourceId;
use crate::azure::client::AzureClient;
use anyhow::{Context, Result};
use futures::future::{BoxFuture, FutureExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

/// A provider request/response body for a top-level resource
pub trait ResourceModel: Serialize + DeserializeOwned + Send + Sync + 'static {
    fn location(&self) -> Option<&str>;
    fn set_location(&mut self, location: String);
}

/// Async read operation: `None` when the resource does not exist
pub type GetFn<T> =
    for<'a> fn(&'a AzureClient, &'a ResourceId, &'a str) -> BoxFuture<'a, Result<Option<T>>>;

/// Async create-or-update operation, returns the provider's view of the model
pub type CreateOrUpdateFn<T> =
    for<'a> fn(&'a AzureClient, &'a ResourceId, &'a str, &'a T) -> BoxFuture<'a, Result<T>>;

/// Read/create registration for one resource type
pub struct ResourceStrategy<T> {
    /// Key into the resource type registry
    pub key: &'static str,
    pub get: GetFn<T>,
    pub create_or_update: CreateOrUpdateFn<T>,
    /// Estimated creation time in seconds
    pub create_time: fn(&T) -> u64,
}

impl<T: ResourceModel> ResourceStrategy<T> {
    /// Registry definition for this strategy
    pub fn definition(&self) -> Result<&'static ResourceTypeDef> {
        get_resource_type(self.key)
            .with_context(|| format!("Unknown resource type: {}", self.key))
    }

    /// Describe a resource of this type
    pub fn create_resource_config(
        &'static self,
        resource_group: Option<&Arc<ResourceConfig<ResourceGroup>>>,
        name: &str,
        create_model: impl Fn(&str) -> T + Send + Sync + 'static,
        dependencies: Vec<Arc<dyn EntityConfig>>,
    ) -> Result<Arc<ResourceConfig<T>>> {
        let definition = self.definition()?;

        Ok(Arc::new(ResourceConfig::new(
            self,
            definition,
            resource_group.cloned(),
            name,
            Box::new(create_model),
            dependencies,
        )))
    }
}

/// Read a resource through Resource Manager
pub fn arm_get<'a, T: ResourceModel>(
    client: &'a AzureClient,
    id: &'a ResourceId,
    api_version: &'a str,
) -> BoxFuture<'a, Result<Option<T>>> {
    async move {
        let Some(value) = client.get_resource(&id.to_url_path(), api_version).await? else {
            return Ok(None);
        };

        let model = serde_json::from_value(value)
            .with_context(|| format!("Failed to parse resource {}", id))?;
        Ok(Some(model))
    }
    .boxed()
}

/// Create or update a resource through Resource Manager
pub fn arm_create_or_update<'a, T: ResourceModel>(
    client: &'a AzureClient,
    id: &'a ResourceId,
    api_version: &'a str,
    model: &'a T,
) -> BoxFuture<'a, Result<T>> {
    async move {
        let body = serde_json::to_value(model)
            .with_context(|| format!("Failed to serialize resource {}", id))?;
        let response = client
            .put_resource(&id.to_url_path(), api_version, &body)
            .await?;

        // Long-running creates may answer 202 with no body
        if response.is_null() {
            return serde_json::from_value(body)
                .with_context(|| format!("Failed to parse resource {}", id));
        }

        serde_json::from_value(response)
            .with_context(|| format!("Failed to parse resource {}", id))
    }
    .boxed()
}
