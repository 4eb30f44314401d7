//! Resource strategies
//!
//! A typed strategy table for Azure resource types plus configs that
//! describe resources and their prerequisites without touching the network.
//!
//! # Architecture
//!
//! - [`registry`] - Provider namespaces and api-versions from embedded JSON
//! - [`resource_id`] - ARM resource id rendering
//! - [`resource_strategy`] - `ResourceStrategy<T>` and the generic ARM read/write calls
//! - [`resource_config`] - `ResourceConfig<T>`, nested configs, dependency walks
//! - [`resource_group`], [`network`], [`compute`] - per-type strategies and builders
//!
//! # Example
//!
//! ```ignore
//! let rg = create_resource_group_config("demo", "westus2")?;
//! let vnet = create_virtual_network_config(&rg, "vnet", "10.0.0.0/16", subnets)?;
//! let subnet = create_subnet_config(&vnet, "default");
//! // ... load balancer, pools ...
//! let vmss = create_virtual_machine_scale_set_config(&rg, params)?;
//! for step in creation_plan(vmss.clone(), &subscription_id) {
//!     println!("{} {}", step.type_name, step.id);
//! }
//! ```

pub mod compute;
pub mod network;
pub mod registry;
pub mod resource_config;
pub mod resource_group;
pub mod resource_id;
pub mod resource_strategy;

pub use resource_config::{
    creation_plan, missing_dependencies, EntityConfig, NestedResourceConfig, PlanEntry,
    ResourceConfig,
};
pub use resource_id::ResourceId;
pub use resource_strategy::{ResourceModel, ResourceStrategy};
