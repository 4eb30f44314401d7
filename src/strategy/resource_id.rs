//! Azure Resource Manager resource ids

use std::fmt;

/// One `{type}/{name}` pair below a provider namespace
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypedName {
    pub resource_type: String,
    pub name: String,
}

/// A parsed ARM resource id
///
/// Renders as `/subscriptions/{sub}/resourceGroups/{rg}` for a resource group,
/// or `/subscriptions/{sub}/resourceGroups/{rg}/providers/{ns}/{type}/{name}`
/// followed by any nested `{childType}/{childName}` segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceId {
    pub subscription_id: String,
    pub resource_group: String,
    pub namespace: Option<String>,
    pub segments: Vec<TypedName>,
}

impl ResourceId {
    pub fn resource_group(subscription_id: &str, resource_group: &str) -> Self {
        Self {
            subscription_id: subscription_id.to_string(),
            resource_group: resource_group.to_string(),
            namespace: None,
            segments: Vec::new(),
        }
    }

    pub fn resource(
        subscription_id: &str,
        resource_group: &str,
        namespace: &str,
        resource_type: &str,
        name: &str,
    ) -> Self {
        Self {
            subscription_id: subscription_id.to_string(),
            resource_group: resource_group.to_string(),
            namespace: Some(namespace.to_string()),
            segments: vec![TypedName {
                resource_type: resource_type.to_string(),
                name: name.to_string(),
            }],
        }
    }

    /// Id of a child resource nested under this one
    pub fn child(&self, resource_type: &str, name: &str) -> Self {
        let mut id = self.clone();
        id.segments.push(TypedName {
            resource_type: resource_type.to_string(),
            name: name.to_string(),
        });
        id
    }

    /// Id with every name percent-encoded, for use as a request path
    pub fn to_url_path(&self) -> String {
        self.render(|name| urlencoding::encode(name).into_owned())
    }

    fn render(&self, name: impl Fn(&str) -> String) -> String {
        let mut id = format!(
            "/subscriptions/{}/resourceGroups/{}",
            name(&self.subscription_id),
            name(&self.resource_group)
        );

        if let Some(namespace) = &self.namespace {
            id.push_str("/providers/");
            id.push_str(namespace);
            for segment in &self.segments {
                id.push('/');
                id.push_str(&segment.resource_type);
                id.push('/');
                id.push_str(&name(&segment.name));
            }
        }

        id
    }
}

/// The ARM id as the service writes it, names unescaped
impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(str::to_string))
    }
}
