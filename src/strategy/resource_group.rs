//! Resource group strategy

use super::resource_config::ResourceConfig;
use super::resource_strategy::{arm_create_or_update, arm_get, ResourceModel, ResourceStrategy};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceGroup {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
}

impl ResourceModel for ResourceGroup {
    fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    fn set_location(&mut self, location: String) {
        self.location = Some(location);
    }
}

pub static RESOURCE_GROUP_STRATEGY: ResourceStrategy<ResourceGroup> = ResourceStrategy {
    key: "resource-groups",
    get: arm_get::<ResourceGroup>,
    create_or_update: arm_create_or_update::<ResourceGroup>,
    create_time: |_| 3,
};

/// Describe a resource group in `location`
pub fn create_resource_group_config(
    name: &str,
    location: &str,
) -> Result<Arc<ResourceConfig<ResourceGroup>>> {
    let location = location.to_string();
    RESOURCE_GROUP_STRATEGY.create_resource_config(
        None,
        name,
        move |_| ResourceGroup {
            location: Some(location.clone()),
            ..Default::default()
        },
        Vec::new(),
    )
}
