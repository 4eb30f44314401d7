//! Resource configs
//!
//! A config describes a resource that should exist: where it lives, how to
//! build its request body for a given subscription, and which other configs
//! must exist first.

use super::registry::ResourceTypeDef;
use super::resource_group::ResourceGroup;
use super::resource_id::ResourceId;
use super::resource_strategy::{ResourceModel, ResourceStrategy};
use crate::azure::client::AzureClient;
use anyhow::Result;
use futures::future::{BoxFuture, FutureExt};
use std::collections::HashSet;
use std::sync::Arc;

type ModelFactory<T> = Box<dyn Fn(&str) -> T + Send + Sync>;

/// Type-erased view of any config, used for dependency walks
pub trait EntityConfig: Send + Sync {
    fn name(&self) -> &str;

    /// Human-readable resource type, e.g. "virtual machine scale set"
    fn type_name(&self) -> &str;

    fn resource_id(&self, subscription_id: &str) -> ResourceId;

    /// Configs that must exist before this one can be created
    fn dependencies(&self) -> Vec<Arc<dyn EntityConfig>>;

    /// Estimated creation time in seconds
    fn create_time(&self, subscription_id: &str) -> u64;

    fn exists<'a>(&'a self, client: &'a AzureClient) -> BoxFuture<'a, Result<bool>>;
}

/// A top-level resource: a resource group, or a resource inside one
pub struct ResourceConfig<T: ResourceModel> {
    pub strategy: &'static ResourceStrategy<T>,
    pub definition: &'static ResourceTypeDef,
    /// `None` only for resource groups themselves
    pub resource_group: Option<Arc<ResourceConfig<ResourceGroup>>>,
    pub name: String,
    /// Explicit prerequisites, in declaration order
    pub dependencies: Vec<Arc<dyn EntityConfig>>,
    create_model: ModelFactory<T>,
}

impl<T: ResourceModel> ResourceConfig<T> {
    pub(super) fn new(
        strategy: &'static ResourceStrategy<T>,
        definition: &'static ResourceTypeDef,
        resource_group: Option<Arc<ResourceConfig<ResourceGroup>>>,
        name: &str,
        create_model: ModelFactory<T>,
        dependencies: Vec<Arc<dyn EntityConfig>>,
    ) -> Self {
        Self {
            strategy,
            definition,
            resource_group,
            name: name.to_string(),
            dependencies,
            create_model,
        }
    }

    pub fn get_id(&self, subscription_id: &str) -> ResourceId {
        match &self.resource_group {
            None => ResourceId::resource_group(subscription_id, &self.name),
            Some(rg) => ResourceId::resource(
                subscription_id,
                &rg.name,
                &self.definition.namespace,
                &self.definition.resource_type,
                &self.name,
            ),
        }
    }

    /// Build the request body. Resources without a location inherit the
    /// resource group's.
    pub fn create_model(&self, subscription_id: &str) -> T {
        let mut model = (self.create_model)(subscription_id);

        if model.location().is_none() {
            let inherited = self.resource_group.as_ref().and_then(|rg| {
                rg.create_model(subscription_id)
                    .location()
                    .map(str::to_string)
            });
            if let Some(location) = inherited {
                model.set_location(location);
            }
        }

        model
    }

    /// Read the current state, `None` if it does not exist
    pub async fn get(&self, client: &AzureClient) -> Result<Option<T>> {
        let id = self.get_id(&client.subscription_id);
        tracing::info!("Reading {} {}", self.definition.display_name, id);
        (self.strategy.get)(client, &id, &self.definition.api_version).await
    }

    /// Create or update the resource from its model
    pub async fn create_or_update(&self, client: &AzureClient) -> Result<T> {
        let id = self.get_id(&client.subscription_id);
        let model = self.create_model(&client.subscription_id);
        tracing::info!(
            "Creating or updating {} {} (estimated {}s)",
            self.definition.display_name,
            id,
            (self.strategy.create_time)(&model)
        );
        (self.strategy.create_or_update)(client, &id, &self.definition.api_version, &model).await
    }
}

impl<T: ResourceModel> EntityConfig for ResourceConfig<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn type_name(&self) -> &str {
        &self.definition.display_name
    }

    fn resource_id(&self, subscription_id: &str) -> ResourceId {
        self.get_id(subscription_id)
    }

    fn dependencies(&self) -> Vec<Arc<dyn EntityConfig>> {
        let mut deps: Vec<Arc<dyn EntityConfig>> = Vec::new();
        if let Some(rg) = &self.resource_group {
            deps.push(rg.clone());
        }
        deps.extend(self.dependencies.iter().cloned());
        deps
    }

    fn create_time(&self, subscription_id: &str) -> u64 {
        (self.strategy.create_time)(&self.create_model(subscription_id))
    }

    fn exists<'a>(&'a self, client: &'a AzureClient) -> BoxFuture<'a, Result<bool>> {
        async move { Ok(self.get(client).await?.is_some()) }.boxed()
    }
}

/// A child resource addressed through its parent (subnet, pool, frontend)
///
/// Child models are carried inside the parent's model, so the child is
/// read back out of it by name.
pub struct NestedResourceConfig<T, P: ResourceModel> {
    pub parent: Arc<ResourceConfig<P>>,
    pub child_type: &'static str,
    pub type_name: &'static str,
    pub name: String,
    extract: fn(&P, &str) -> Option<T>,
}

impl<T, P: ResourceModel> NestedResourceConfig<T, P> {
    pub fn new(
        parent: &Arc<ResourceConfig<P>>,
        child_type: &'static str,
        type_name: &'static str,
        name: &str,
        extract: fn(&P, &str) -> Option<T>,
    ) -> Arc<Self> {
        Arc::new(Self {
            parent: parent.clone(),
            child_type,
            type_name,
            name: name.to_string(),
            extract,
        })
    }

    pub fn get_id(&self, subscription_id: &str) -> ResourceId {
        self.parent
            .get_id(subscription_id)
            .child(self.child_type, &self.name)
    }

    /// The child's model as the parent would create it
    pub fn create_model(&self, subscription_id: &str) -> Option<T> {
        (self.extract)(&self.parent.create_model(subscription_id), &self.name)
    }
}

impl<T: Send + Sync + 'static, P: ResourceModel> EntityConfig for NestedResourceConfig<T, P> {
    fn name(&self) -> &str {
        &self.name
    }

    fn type_name(&self) -> &str {
        self.type_name
    }

    fn resource_id(&self, subscription_id: &str) -> ResourceId {
        self.get_id(subscription_id)
    }

    fn dependencies(&self) -> Vec<Arc<dyn EntityConfig>> {
        vec![self.parent.clone() as Arc<dyn EntityConfig>]
    }

    fn create_time(&self, _subscription_id: &str) -> u64 {
        0
    }

    fn exists<'a>(&'a self, client: &'a AzureClient) -> BoxFuture<'a, Result<bool>> {
        async move {
            let parent = self.parent.get(client).await?;
            Ok(parent
                .map(|p| (self.extract)(&p, &self.name).is_some())
                .unwrap_or(false))
        }
        .boxed()
    }
}

/// One step of a creation plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanEntry {
    pub id: ResourceId,
    pub type_name: String,
    pub create_time: u64,
}

/// Every config reachable from `root`, dependencies first, each id once
pub fn creation_plan(root: Arc<dyn EntityConfig>, subscription_id: &str) -> Vec<PlanEntry> {
    fn visit(
        config: &Arc<dyn EntityConfig>,
        subscription_id: &str,
        seen: &mut HashSet<String>,
        plan: &mut Vec<PlanEntry>,
    ) {
        let id = config.resource_id(subscription_id);
        if !seen.insert(id.to_string()) {
            return;
        }

        for dependency in config.dependencies() {
            visit(&dependency, subscription_id, seen, plan);
        }

        plan.push(PlanEntry {
            id,
            type_name: config.type_name().to_string(),
            create_time: config.create_time(subscription_id),
        });
    }

    let mut seen = HashSet::new();
    let mut plan = Vec::new();
    visit(&root, subscription_id, &mut seen, &mut plan);
    plan
}

/// Ids of dependencies of `root` that do not exist yet
pub async fn missing_dependencies(
    root: Arc<dyn EntityConfig>,
    client: &AzureClient,
) -> Result<Vec<ResourceId>> {
    let root_id = root.resource_id(&client.subscription_id);
    let mut missing = Vec::new();

    let mut seen = HashSet::new();
    let mut stack = root.dependencies();
    while let Some(config) = stack.pop() {
        let id = config.resource_id(&client.subscription_id);
        if id == root_id || !seen.insert(id.to_string()) {
            continue;
        }
        if !config.exists(client).await? {
            tracing::warn!("Missing dependency: {} {}", config.type_name(), id);
            missing.push(id);
        }
        stack.extend(config.dependencies());
    }

    Ok(missing)
}
