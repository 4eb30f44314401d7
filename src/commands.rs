//! Command implementations shared by the binary
//!
//! Turns flat command-line options into resource configs and runs them.

use crate::azure::client::AzureClient;
use crate::strategy::compute::{
    create_virtual_machine_scale_set_config, Image, ScaleSetParams, UpgradeMode,
    VirtualMachineScaleSet,
};
use crate::strategy::network::{
    create_backend_address_pool_config, create_frontend_ip_configuration_config,
    create_load_balancer_config, create_subnet_config, create_virtual_network_config,
    FrontendSpec, SubnetSpec,
};
use crate::strategy::resource_group::create_resource_group_config;
use crate::strategy::{creation_plan, missing_dependencies, PlanEntry, ResourceConfig};
use anyhow::{bail, Result};
use serde::Serialize;
use std::sync::Arc;

/// Flat description of a scale set and the network around it
#[derive(Debug, Clone)]
pub struct ScaleSetOptions {
    pub name: String,
    pub resource_group: String,
    pub location: String,
    pub virtual_network: String,
    pub virtual_network_address_prefix: String,
    pub subnet: String,
    pub subnet_address_prefix: String,
    pub load_balancer: String,
    pub frontend_ip_configurations: Vec<String>,
    pub backend_pool: String,
    pub zones: Vec<String>,
    pub is_windows: bool,
    pub admin_username: String,
    pub admin_password: Option<String>,
    pub image: String,
    pub vm_size: String,
    pub instance_count: u32,
    pub upgrade_mode: Option<String>,
}

impl ScaleSetOptions {
    /// Defaults every related resource name to the scale set name
    pub fn named(name: &str, admin_username: &str) -> Self {
        Self {
            name: name.to_string(),
            resource_group: name.to_string(),
            location: "westus".to_string(),
            virtual_network: name.to_string(),
            virtual_network_address_prefix: "192.168.0.0/16".to_string(),
            subnet: name.to_string(),
            subnet_address_prefix: "192.168.1.0/24".to_string(),
            load_balancer: name.to_string(),
            frontend_ip_configurations: vec![name.to_string()],
            backend_pool: name.to_string(),
            zones: Vec::new(),
            is_windows: false,
            admin_username: admin_username.to_string(),
            admin_password: None,
            image: "Canonical:UbuntuServer:16.04-LTS:latest".to_string(),
            vm_size: "Standard_DS1_v2".to_string(),
            instance_count: 2,
            upgrade_mode: None,
        }
    }
}

/// Build the scale set config and everything it depends on
pub fn build_scale_set_config(
    options: &ScaleSetOptions,
) -> Result<Arc<ResourceConfig<VirtualMachineScaleSet>>> {
    if options.name.trim().is_empty() {
        bail!("Scale set name must not be empty");
    }
    if options.frontend_ip_configurations.is_empty() {
        bail!("At least one frontend IP configuration is required");
    }

    let image: Image = options.image.parse()?;
    let upgrade_mode = options
        .upgrade_mode
        .as_deref()
        .map(str::parse::<UpgradeMode>)
        .transpose()?;

    let rg = create_resource_group_config(&options.resource_group, &options.location)?;
    let vnet = create_virtual_network_config(
        &rg,
        &options.virtual_network,
        &options.virtual_network_address_prefix,
        vec![SubnetSpec {
            name: options.subnet.clone(),
            address_prefix: options.subnet_address_prefix.clone(),
        }],
    )?;
    let subnet = create_subnet_config(&vnet, &options.subnet);

    let frontends = options
        .frontend_ip_configurations
        .iter()
        .map(|name| FrontendSpec {
            name: name.clone(),
            zones: options.zones.clone(),
            subnet: subnet.clone(),
        })
        .collect();
    let lb = create_load_balancer_config(
        &rg,
        &options.load_balancer,
        frontends,
        vec![options.backend_pool.clone()],
    )?;

    create_virtual_machine_scale_set_config(
        &rg,
        ScaleSetParams {
            name: options.name.clone(),
            subnet,
            frontend_ip_configurations: options
                .frontend_ip_configurations
                .iter()
                .map(|name| create_frontend_ip_configuration_config(&lb, name))
                .collect(),
            backend_address_pool: create_backend_address_pool_config(&lb, &options.backend_pool),
            is_windows: options.is_windows,
            admin_username: options.admin_username.clone(),
            admin_password: options.admin_password.clone(),
            image,
            vm_size: options.vm_size.clone(),
            instance_count: options.instance_count,
            upgrade_mode,
        },
    )
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanStep {
    pub id: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub estimated_seconds: u64,
}

impl From<PlanEntry> for PlanStep {
    fn from(entry: PlanEntry) -> Self {
        Self {
            id: entry.id.to_string(),
            type_name: entry.type_name,
            estimated_seconds: entry.create_time,
        }
    }
}

/// Creation plan plus the scale set body that would be sent
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaleSetPlan {
    pub steps: Vec<PlanStep>,
    pub estimated_seconds: u64,
    pub model: VirtualMachineScaleSet,
}

pub fn plan_scale_set(
    config: &Arc<ResourceConfig<VirtualMachineScaleSet>>,
    subscription_id: &str,
) -> ScaleSetPlan {
    let steps: Vec<PlanStep> = creation_plan(config.clone(), subscription_id)
        .into_iter()
        .map(PlanStep::from)
        .collect();
    let estimated_seconds = steps.iter().map(|s| s.estimated_seconds).sum();

    let mut model = config.create_model(subscription_id);
    if let Some(os) = model
        .properties
        .virtual_machine_profile
        .as_mut()
        .and_then(|p| p.os_profile.as_mut())
    {
        if os.admin_password.is_some() {
            os.admin_password = Some("********".to_string());
        }
    }

    ScaleSetPlan {
        steps,
        estimated_seconds,
        model,
    }
}

/// Create or update the scale set once its dependencies exist
pub async fn create_scale_set(
    config: &Arc<ResourceConfig<VirtualMachineScaleSet>>,
    client: &AzureClient,
    check_dependencies: bool,
) -> Result<VirtualMachineScaleSet> {
    if check_dependencies {
        let missing = missing_dependencies(config.clone(), client).await?;
        if !missing.is_empty() {
            let ids: Vec<String> = missing.iter().map(|id| id.to_string()).collect();
            bail!(
                "Missing dependencies, create them first:\n  {}",
                ids.join("\n  ")
            );
        }
    }

    config.create_or_update(client).await
}
