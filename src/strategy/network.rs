//! Network strategies: virtual networks with subnets, load balancers with
//! frontend IP configurations and backend address pools.

use super::resource_config::{EntityConfig, NestedResourceConfig, ResourceConfig};
use super::resource_group::ResourceGroup;
use super::resource_strategy::{arm_create_or_update, arm_get, ResourceModel, ResourceStrategy};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Reference to another resource by id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubResource {
    pub id: String,
}

// =============================================================================
// Virtual network
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualNetwork {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default)]
    pub properties: VirtualNetworkProperties,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualNetworkProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_space: Option<AddressSpace>,
    #[serde(default)]
    pub subnets: Vec<Subnet>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressSpace {
    pub address_prefixes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subnet {
    pub name: String,
    #[serde(default)]
    pub properties: SubnetProperties,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubnetProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_prefix: Option<String>,
}

impl ResourceModel for VirtualNetwork {
    fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    fn set_location(&mut self, location: String) {
        self.location = Some(location);
    }
}

pub static VIRTUAL_NETWORK_STRATEGY: ResourceStrategy<VirtualNetwork> = ResourceStrategy {
    key: "virtual-networks",
    get: arm_get::<VirtualNetwork>,
    create_or_update: arm_create_or_update::<VirtualNetwork>,
    create_time: |_| 15,
};

/// A subnet to carve out of a virtual network
#[derive(Debug, Clone)]
pub struct SubnetSpec {
    pub name: String,
    pub address_prefix: String,
}

pub fn create_virtual_network_config(
    resource_group: &Arc<ResourceConfig<ResourceGroup>>,
    name: &str,
    address_prefix: &str,
    subnets: Vec<SubnetSpec>,
) -> Result<Arc<ResourceConfig<VirtualNetwork>>> {
    let address_prefix = address_prefix.to_string();
    VIRTUAL_NETWORK_STRATEGY.create_resource_config(
        Some(resource_group),
        name,
        move |_| VirtualNetwork {
            properties: VirtualNetworkProperties {
                address_space: Some(AddressSpace {
                    address_prefixes: vec![address_prefix.clone()],
                }),
                subnets: subnets
                    .iter()
                    .map(|s| Subnet {
                        name: s.name.clone(),
                        properties: SubnetProperties {
                            address_prefix: Some(s.address_prefix.clone()),
                        },
                    })
                    .collect(),
            },
            ..Default::default()
        },
        Vec::new(),
    )
}

/// Address one subnet of a virtual network
pub fn create_subnet_config(
    virtual_network: &Arc<ResourceConfig<VirtualNetwork>>,
    name: &str,
) -> Arc<NestedResourceConfig<Subnet, VirtualNetwork>> {
    NestedResourceConfig::new(virtual_network, "subnets", "subnet", name, |vnet, name| {
        vnet.properties
            .subnets
            .iter()
            .find(|s| s.name == name)
            .cloned()
    })
}

// =============================================================================
// Load balancer
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadBalancer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default)]
    pub properties: LoadBalancerProperties,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadBalancerProperties {
    #[serde(default, rename = "frontendIPConfigurations")]
    pub frontend_ip_configurations: Vec<FrontendIpConfiguration>,
    #[serde(default)]
    pub backend_address_pools: Vec<BackendAddressPool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrontendIpConfiguration {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zones: Option<Vec<String>>,
    #[serde(default)]
    pub properties: FrontendIpConfigurationProperties,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrontendIpConfigurationProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnet: Option<SubResource>,
    #[serde(
        default,
        rename = "privateIPAllocationMethod",
        skip_serializing_if = "Option::is_none"
    )]
    pub private_ip_allocation_method: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendAddressPool {
    pub name: String,
}

impl ResourceModel for LoadBalancer {
    fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    fn set_location(&mut self, location: String) {
        self.location = Some(location);
    }
}

pub static LOAD_BALANCER_STRATEGY: ResourceStrategy<LoadBalancer> = ResourceStrategy {
    key: "load-balancers",
    get: arm_get::<LoadBalancer>,
    create_or_update: arm_create_or_update::<LoadBalancer>,
    create_time: |_| 30,
};

/// A private frontend IP configuration inside a subnet
#[derive(Clone)]
pub struct FrontendSpec {
    pub name: String,
    /// Availability zones; empty means zone-redundant / unset
    pub zones: Vec<String>,
    pub subnet: Arc<NestedResourceConfig<Subnet, VirtualNetwork>>,
}

pub fn create_load_balancer_config(
    resource_group: &Arc<ResourceConfig<ResourceGroup>>,
    name: &str,
    frontends: Vec<FrontendSpec>,
    backend_pools: Vec<String>,
) -> Result<Arc<ResourceConfig<LoadBalancer>>> {
    let mut dependencies: Vec<Arc<dyn EntityConfig>> = Vec::new();
    for frontend in &frontends {
        dependencies.push(frontend.subnet.clone());
    }

    LOAD_BALANCER_STRATEGY.create_resource_config(
        Some(resource_group),
        name,
        move |subscription_id| LoadBalancer {
            properties: LoadBalancerProperties {
                frontend_ip_configurations: frontends
                    .iter()
                    .map(|f| FrontendIpConfiguration {
                        name: f.name.clone(),
                        zones: (!f.zones.is_empty()).then(|| f.zones.clone()),
                        properties: FrontendIpConfigurationProperties {
                            subnet: Some(SubResource {
                                id: f.subnet.get_id(subscription_id).to_string(),
                            }),
                            private_ip_allocation_method: Some("Dynamic".to_string()),
                        },
                    })
                    .collect(),
                backend_address_pools: backend_pools
                    .iter()
                    .map(|name| BackendAddressPool { name: name.clone() })
                    .collect(),
            },
            ..Default::default()
        },
        dependencies,
    )
}

/// Address one frontend IP configuration of a load balancer
pub fn create_frontend_ip_configuration_config(
    load_balancer: &Arc<ResourceConfig<LoadBalancer>>,
    name: &str,
) -> Arc<NestedResourceConfig<FrontendIpConfiguration, LoadBalancer>> {
    NestedResourceConfig::new(
        load_balancer,
        "frontendIPConfigurations",
        "frontend IP configuration",
        name,
        |lb, name| {
            lb.properties
                .frontend_ip_configurations
                .iter()
                .find(|f| f.name == name)
                .cloned()
        },
    )
}

/// Address one backend address pool of a load balancer
pub fn create_backend_address_pool_config(
    load_balancer: &Arc<ResourceConfig<LoadBalancer>>,
    name: &str,
) -> Arc<NestedResourceConfig<BackendAddressPool, LoadBalancer>> {
    NestedResourceConfig::new(
        load_balancer,
        "backendAddressPools",
        "backend address pool",
        name,
        |lb, name| {
            lb.properties
                .backend_address_pools
                .iter()
                .find(|p| p.name == name)
                .cloned()
        },
    )
}
