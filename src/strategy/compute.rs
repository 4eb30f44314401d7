//! Virtual machine scale set strategy and config builder

use super::network::{
    BackendAddressPool, FrontendIpConfiguration, LoadBalancer, SubResource, Subnet,
    VirtualNetwork,
};
use super::resource_config::{EntityConfig, NestedResourceConfig, ResourceConfig};
use super::resource_group::ResourceGroup;
use super::resource_strategy::{arm_create_or_update, arm_get, ResourceModel, ResourceStrategy};
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Longest computer name prefix a scale set accepts
pub const COMPUTER_NAME_PREFIX_MAX: usize = 9;

/// First `min(9, len)` characters of the scale set name
pub fn computer_name_prefix(name: &str) -> String {
    name.chars().take(COMPUTER_NAME_PREFIX_MAX).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UpgradeMode {
    Automatic,
    #[default]
    Manual,
    Rolling,
}

impl FromStr for UpgradeMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "automatic" => Ok(Self::Automatic),
            "manual" => Ok(Self::Manual),
            "rolling" => Ok(Self::Rolling),
            _ => bail!(
                "Invalid upgrade mode '{}'. Expected Automatic, Manual or Rolling",
                s
            ),
        }
    }
}

/// Marketplace image coordinates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub publisher: String,
    pub offer: String,
    pub sku: String,
    pub version: String,
}

impl FromStr for Image {
    type Err = anyhow::Error;

    /// Parses the `publisher:offer:sku:version` URN form
    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split(':').collect();
        match parts.as_slice() {
            [publisher, offer, sku, version]
                if parts.iter().all(|p| !p.trim().is_empty()) =>
            {
                Ok(Self {
                    publisher: publisher.to_string(),
                    offer: offer.to_string(),
                    sku: sku.to_string(),
                    version: version.to_string(),
                })
            }
            _ => bail!(
                "Invalid image '{}'. Expected publisher:offer:sku:version",
                s
            ),
        }
    }
}

impl fmt::Display for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.publisher, self.offer, self.sku, self.version
        )
    }
}

// =============================================================================
// Wire model
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineScaleSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zones: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<Sku>,
    #[serde(default)]
    pub properties: VirtualMachineScaleSetProperties,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sku {
    pub name: String,
    pub capacity: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineScaleSetProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upgrade_policy: Option<UpgradePolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtual_machine_profile: Option<VirtualMachineProfile>,
    /// Set by the service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradePolicy {
    pub mode: UpgradeMode,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os_profile: Option<OsProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_profile: Option<StorageProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_profile: Option<NetworkProfile>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OsProfile {
    pub computer_name_prefix: String,
    pub admin_username: String,
    /// Never returned by the service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub windows_configuration: Option<WindowsConfiguration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linux_configuration: Option<LinuxConfiguration>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowsConfiguration {}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinuxConfiguration {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageProfile {
    pub image_reference: ImageReference,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageReference {
    pub publisher: String,
    pub offer: String,
    pub sku: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkProfile {
    pub network_interface_configurations: Vec<NetworkInterfaceConfiguration>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInterfaceConfiguration {
    pub name: String,
    pub properties: NetworkInterfaceConfigurationProperties,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInterfaceConfigurationProperties {
    pub primary: bool,
    pub ip_configurations: Vec<IpConfiguration>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpConfiguration {
    pub name: String,
    pub properties: IpConfigurationProperties,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpConfigurationProperties {
    pub subnet: SubResource,
    #[serde(default)]
    pub load_balancer_backend_address_pools: Vec<SubResource>,
}

impl ResourceModel for VirtualMachineScaleSet {
    fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    fn set_location(&mut self, location: String) {
        self.location = Some(location);
    }
}

pub static VIRTUAL_MACHINE_SCALE_SET_STRATEGY: ResourceStrategy<VirtualMachineScaleSet> =
    ResourceStrategy {
        key: "virtual-machine-scale-sets",
        get: arm_get::<VirtualMachineScaleSet>,
        create_or_update: arm_create_or_update::<VirtualMachineScaleSet>,
        create_time: |_| 180,
    };

// =============================================================================
// Config builder
// =============================================================================

/// Everything needed to describe a scale set behind a load balancer
pub struct ScaleSetParams {
    pub name: String,
    pub subnet: Arc<NestedResourceConfig<Subnet, VirtualNetwork>>,
    pub frontend_ip_configurations: Vec<Arc<NestedResourceConfig<FrontendIpConfiguration, LoadBalancer>>>,
    pub backend_address_pool: Arc<NestedResourceConfig<BackendAddressPool, LoadBalancer>>,
    pub is_windows: bool,
    pub admin_username: String,
    pub admin_password: Option<String>,
    pub image: Image,
    pub vm_size: String,
    pub instance_count: u32,
    pub upgrade_mode: Option<UpgradeMode>,
}

/// Describe a scale set in `resource_group`
///
/// Depends on the subnet, then the backend pool, then each frontend IP
/// configuration. Zones are the union of the frontends' zones, first seen first.
pub fn create_virtual_machine_scale_set_config(
    resource_group: &Arc<ResourceConfig<ResourceGroup>>,
    params: ScaleSetParams,
) -> Result<Arc<ResourceConfig<VirtualMachineScaleSet>>> {
    let mut dependencies: Vec<Arc<dyn EntityConfig>> = Vec::new();
    dependencies.push(params.subnet.clone());
    dependencies.push(params.backend_address_pool.clone());
    for frontend in &params.frontend_ip_configurations {
        dependencies.push(frontend.clone());
    }

    let name = params.name.clone();
    VIRTUAL_MACHINE_SCALE_SET_STRATEGY.create_resource_config(
        Some(resource_group),
        &name,
        move |subscription_id| scale_set_model(&params, subscription_id),
        dependencies,
    )
}

fn scale_set_model(params: &ScaleSetParams, subscription_id: &str) -> VirtualMachineScaleSet {
    let mut seen = HashSet::new();
    let zones: Vec<String> = params
        .frontend_ip_configurations
        .iter()
        .filter_map(|f| f.create_model(subscription_id))
        .filter_map(|f| f.zones)
        .flatten()
        .filter(|zone| seen.insert(zone.clone()))
        .collect();

    let ip_configuration = IpConfiguration {
        name: params.name.clone(),
        properties: IpConfigurationProperties {
            subnet: SubResource {
                id: params.subnet.get_id(subscription_id).to_string(),
            },
            load_balancer_backend_address_pools: vec![SubResource {
                id: params
                    .backend_address_pool
                    .get_id(subscription_id)
                    .to_string(),
            }],
        },
    };

    VirtualMachineScaleSet {
        zones: (!zones.is_empty()).then_some(zones),
        sku: Some(Sku {
            name: params.vm_size.clone(),
            capacity: params.instance_count,
        }),
        properties: VirtualMachineScaleSetProperties {
            upgrade_policy: Some(UpgradePolicy {
                mode: params.upgrade_mode.unwrap_or_default(),
            }),
            virtual_machine_profile: Some(VirtualMachineProfile {
                os_profile: Some(OsProfile {
                    computer_name_prefix: computer_name_prefix(&params.name),
                    admin_username: params.admin_username.clone(),
                    admin_password: params.admin_password.clone(),
                    windows_configuration: params.is_windows.then(WindowsConfiguration::default),
                    linux_configuration: (!params.is_windows).then(LinuxConfiguration::default),
                }),
                storage_profile: Some(StorageProfile {
                    image_reference: ImageReference {
                        publisher: params.image.publisher.clone(),
                        offer: params.image.offer.clone(),
                        sku: params.image.sku.clone(),
                        version: params.image.version.clone(),
                    },
                }),
                network_profile: Some(NetworkProfile {
                    network_interface_configurations: vec![NetworkInterfaceConfiguration {
                        name: params.name.clone(),
                        properties: NetworkInterfaceConfigurationProperties {
                            primary: true,
                            ip_configurations: vec![ip_configuration],
                        },
                    }],
                }),
            }),
            provisioning_state: None,
        },
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::network::{
        create_backend_address_pool_config, create_frontend_ip_configuration_config,
        create_load_balancer_config, create_subnet_config, create_virtual_network_config,
        FrontendSpec, SubnetSpec,
    };
    use crate::strategy::resource_config::creation_plan;
    use crate::strategy::resource_group::create_resource_group_config;

    const SUB: &str = "00000000-0000-0000-0000-000000000001";

    fn scale_set(
        name: &str,
        is_windows: bool,
        zones: Vec<String>,
        upgrade_mode: Option<UpgradeMode>,
    ) -> Arc<ResourceConfig<VirtualMachineScaleSet>> {
        let rg = create_resource_group_config("rg", "westeurope").unwrap();
        let vnet = create_virtual_network_config(
            &rg,
            "vnet",
            "10.0.0.0/16",
            vec![SubnetSpec {
                name: "default".to_string(),
                address_prefix: "10.0.0.0/24".to_string(),
            }],
        )
        .unwrap();
        let subnet = create_subnet_config(&vnet, "default");
        let lb = create_load_balancer_config(
            &rg,
            "lb",
            vec![FrontendSpec {
                name: "fe".to_string(),
                zones,
                subnet: subnet.clone(),
            }],
            vec!["pool".to_string()],
        )
        .unwrap();

        create_virtual_machine_scale_set_config(
            &rg,
            ScaleSetParams {
                name: name.to_string(),
                subnet,
                frontend_ip_configurations: vec![create_frontend_ip_configuration_config(
                    &lb, "fe",
                )],
                backend_address_pool: create_backend_address_pool_config(&lb, "pool"),
                is_windows,
                admin_username: "azureuser".to_string(),
                admin_password: Some("P@ssw0rd!".to_string()),
                image: "Canonical:UbuntuServer:16.04-LTS:latest".parse().unwrap(),
                vm_size: "Standard_DS1_v2".to_string(),
                instance_count: 2,
                upgrade_mode,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_computer_name_prefix() {
        assert_eq!(computer_name_prefix("myscaleset01"), "myscalese");
        assert_eq!(computer_name_prefix("vmss"), "vmss");
        assert_eq!(computer_name_prefix(""), "");
    }

    #[test]
    fn test_linux_model() {
        let config = scale_set("myscaleset01", false, Vec::new(), None);
        let model = config.create_model(SUB);

        assert_eq!(model.location.as_deref(), Some("westeurope"));
        assert_eq!(model.zones, None);
        assert_eq!(
            model.sku,
            Some(Sku {
                name: "Standard_DS1_v2".to_string(),
                capacity: 2
            })
        );
        assert_eq!(
            model.properties.upgrade_policy.as_ref().unwrap().mode,
            UpgradeMode::Manual
        );

        let profile = model.properties.virtual_machine_profile.unwrap();
        let os = profile.os_profile.unwrap();
        assert_eq!(os.computer_name_prefix, "myscalese");
        assert!(os.linux_configuration.is_some());
        assert!(os.windows_configuration.is_none());

        let image = profile.storage_profile.unwrap().image_reference;
        assert_eq!(image.publisher, "Canonical");
        assert_eq!(image.version, "latest");

        let nic = &profile.network_profile.unwrap().network_interface_configurations[0];
        assert_eq!(nic.name, "myscaleset01");
        assert!(nic.properties.primary);
        let ip = &nic.properties.ip_configurations[0];
        assert_eq!(ip.name, "myscaleset01");
        assert!(ip.properties.subnet.id.ends_with("/virtualNetworks/vnet/subnets/default"));
        assert!(ip.properties.load_balancer_backend_address_pools[0]
            .id
            .ends_with("/loadBalancers/lb/backendAddressPools/pool"));
    }

    #[test]
    fn test_windows_model_with_zones_and_upgrade_mode() {
        let config = scale_set(
            "win",
            true,
            vec!["1".to_string(), "2".to_string()],
            Some(UpgradeMode::Automatic),
        );
        let model = config.create_model(SUB);

        assert_eq!(model.zones, Some(vec!["1".to_string(), "2".to_string()]));
        assert_eq!(
            model.properties.upgrade_policy.unwrap().mode,
            UpgradeMode::Automatic
        );
        let os = model
            .properties
            .virtual_machine_profile
            .unwrap()
            .os_profile
            .unwrap();
        assert!(os.windows_configuration.is_some());
        assert!(os.linux_configuration.is_none());
    }

    #[test]
    fn test_zones_are_union_of_frontend_zones() {
        let rg = create_resource_group_config("rg", "westeurope").unwrap();
        let vnet = create_virtual_network_config(&rg, "vnet", "10.0.0.0/16", Vec::new()).unwrap();
        let subnet = create_subnet_config(&vnet, "default");
        let frontend = |name: &str, zones: &[&str]| FrontendSpec {
            name: name.to_string(),
            zones: zones.iter().map(|z| z.to_string()).collect(),
            subnet: subnet.clone(),
        };
        let lb = create_load_balancer_config(
            &rg,
            "lb",
            vec![
                frontend("fe1", &["1", "2"]),
                frontend("fe2", &["2", "3"]),
                frontend("fe3", &["1"]),
            ],
            vec!["pool".to_string()],
        )
        .unwrap();

        let config = create_virtual_machine_scale_set_config(
            &rg,
            ScaleSetParams {
                name: "vmss".to_string(),
                subnet: subnet.clone(),
                frontend_ip_configurations: ["fe1", "fe2", "fe3"]
                    .iter()
                    .map(|name| create_frontend_ip_configuration_config(&lb, name))
                    .collect(),
                backend_address_pool: create_backend_address_pool_config(&lb, "pool"),
                is_windows: false,
                admin_username: "azureuser".to_string(),
                admin_password: None,
                image: "Canonical:UbuntuServer:16.04-LTS:latest".parse().unwrap(),
                vm_size: "Standard_DS1_v2".to_string(),
                instance_count: 2,
                upgrade_mode: None,
            },
        )
        .unwrap();

        assert_eq!(
            config.create_model(SUB).zones,
            Some(vec!["1".to_string(), "2".to_string(), "3".to_string()])
        );
    }

    #[test]
    fn test_wire_format_field_names() {
        let json = serde_json::to_value(scale_set("vmss", false, Vec::new(), None).create_model(SUB))
            .unwrap();

        assert_eq!(json["properties"]["upgradePolicy"]["mode"], "Manual");
        let os = &json["properties"]["virtualMachineProfile"]["osProfile"];
        assert_eq!(os["computerNamePrefix"], "vmss");
        assert_eq!(os["linuxConfiguration"], serde_json::json!({}));
        assert!(os.get("windowsConfiguration").is_none());
        assert!(json.get("zones").is_none());
    }

    #[test]
    fn test_dependencies_order() {
        let config = scale_set("vmss", false, Vec::new(), None);
        let names: Vec<&str> = config.dependencies.iter().map(|d| d.name()).collect();
        assert_eq!(names, vec!["default", "pool", "fe"]);
    }

    #[test]
    fn test_creation_plan_puts_dependencies_first() {
        let config = scale_set("vmss", false, Vec::new(), None);
        let plan = creation_plan(config, SUB);
        let ids: Vec<String> = plan.iter().map(|e| e.id.to_string()).collect();

        let position = |suffix: &str| ids.iter().position(|id| id.ends_with(suffix)).unwrap();
        assert_eq!(position("/resourceGroups/rg"), 0);
        assert!(position("/virtualNetworks/vnet") < position("/subnets/default"));
        assert!(position("/subnets/default") < position("/loadBalancers/lb"));
        assert!(position("/loadBalancers/lb") < position("/backendAddressPools/pool"));
        assert_eq!(position("/virtualMachineScaleSets/vmss"), ids.len() - 1);

        let unique: HashSet<&String> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len());
        assert_eq!(plan.last().unwrap().create_time, 180);
    }

    #[test]
    fn test_parse_image_and_upgrade_mode() {
        assert!("a:b:c".parse::<Image>().is_err());
        assert!("a::c:d".parse::<Image>().is_err());
        assert_eq!("rolling".parse::<UpgradeMode>().unwrap(), UpgradeMode::Rolling);
        assert!("sometimes".parse::<UpgradeMode>().is_err());
    }
}
