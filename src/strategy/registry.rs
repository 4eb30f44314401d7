//! Resource Type Registry - Load provider definitions from JSON
//!
//! Each Azure resource type the strategies know about is described once in
//! an embedded JSON file: its provider namespace, the api-version used for
//! reads and writes, and a display name for log and plan output.

use serde::Deserialize;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Embedded resource JSON files (compiled into the binary)
const RESOURCE_FILES: &[&str] = &[
    include_str!("../resources/resources.json"),
    include_str!("../resources/network.json"),
    include_str!("../resources/compute.json"),
];

/// Resource type definition from JSON
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceTypeDef {
    pub display_name: String,
    pub namespace: String,
    pub resource_type: String,
    pub api_version: String,
}

/// Root structure of resources/*.json
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ResourceTypeRegistry {
    #[serde(default)]
    pub resource_types: HashMap<String, ResourceTypeDef>,
}

static REGISTRY: OnceLock<ResourceTypeRegistry> = OnceLock::new();

/// Get the registry (loads from embedded JSON on first access)
pub fn get_registry() -> &'static ResourceTypeRegistry {
    REGISTRY.get_or_init(|| {
        let mut registry = ResourceTypeRegistry::default();

        for content in RESOURCE_FILES {
            let partial: ResourceTypeRegistry = serde_json::from_str(content)
                .unwrap_or_else(|e| panic!("Failed to parse embedded resource JSON: {}", e));
            registry.resource_types.extend(partial.resource_types);
        }

        registry
    })
}

/// Get a resource type definition by key
pub fn get_resource_type(key: &str) -> Option<&'static ResourceTypeDef> {
    get_registry().resource_types.get(key)
}
