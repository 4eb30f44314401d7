//! Azure Client
//!
//! Main client for interacting with Azure APIs, combining authentication
//! and HTTP functionality.

use super::auth::{AzureCredentials, ARM_RESOURCE, SERVICE_MANAGEMENT_RESOURCE};
pub use super::http::format_azure_error;
use super::http::AzureHttpClient;
use anyhow::{Context, Result};
use serde_json::Value;
use url::Url;

/// Public cloud Resource Manager endpoint
pub const DEFAULT_ARM_ENDPOINT: &str = "https://management.azure.com/";

/// Public cloud classic service management endpoint
pub const DEFAULT_SERVICE_MANAGEMENT_ENDPOINT: &str = "https://management.core.windows.net/";

/// Endpoints the client talks to. Overridable for sovereign clouds and tests.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub resource_manager: Url,
    pub service_management: Url,
}

impl Endpoints {
    pub fn new(resource_manager: &str, service_management: &str) -> Result<Self> {
        Ok(Self {
            resource_manager: parse_base(resource_manager)?,
            service_management: parse_base(service_management)?,
        })
    }
}

/// `Url::join` drops the last path segment unless the base ends in '/'
fn parse_base(raw: &str) -> Result<Url> {
    let normalized = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{}/", raw)
    };
    Url::parse(&normalized).with_context(|| format!("Invalid endpoint URL: {}", raw))
}

/// Main Azure client
#[derive(Clone)]
pub struct AzureClient {
    pub credentials: AzureCredentials,
    pub http: AzureHttpClient,
    pub subscription_id: String,
    pub endpoints: Endpoints,
}

impl AzureClient {
    pub fn new(
        subscription_id: &str,
        credentials: AzureCredentials,
        endpoints: Endpoints,
    ) -> Result<Self> {
        let http = AzureHttpClient::new()?;

        Ok(Self {
            credentials,
            http,
            subscription_id: subscription_id.to_string(),
            endpoints,
        })
    }

    // =========================================================================
    // Resource Manager API helpers
    // =========================================================================

    /// Build a Resource Manager URL for a resource id
    pub fn arm_url(&self, resource_id: &str, api_version: &str) -> Result<String> {
        let mut url = self
            .endpoints
            .resource_manager
            .join(resource_id.trim_start_matches('/'))
            .with_context(|| format!("Invalid resource id: {}", resource_id))?;
        url.query_pairs_mut().append_pair("api-version", api_version);
        Ok(url.to_string())
    }

    /// Read a resource, `None` if it does not exist
    pub async fn get_resource(&self, resource_id: &str, api_version: &str) -> Result<Option<Value>> {
        let url = self.arm_url(resource_id, api_version)?;
        let token = self.credentials.get_token(ARM_RESOURCE).await?;
        self.http.get_optional(&url, &token).await
    }

    /// Create or update a resource with the given body
    pub async fn put_resource(
        &self,
        resource_id: &str,
        api_version: &str,
        body: &Value,
    ) -> Result<Value> {
        let url = self.arm_url(resource_id, api_version)?;
        let token = self.credentials.get_token(ARM_RESOURCE).await?;
        self.http.put(&url, &token, body).await
    }

    // =========================================================================
    // Service Management API helpers
    // =========================================================================

    /// Build a classic service management URL under the current subscription
    pub fn service_management_url(&self, path: &str) -> Result<String> {
        let url = self
            .endpoints
            .service_management
            .join(&format!(
                "{}/{}",
                self.subscription_id,
                path.trim_start_matches('/')
            ))
            .with_context(|| format!("Invalid service management path: {}", path))?;
        Ok(url.to_string())
    }

    /// POST to the classic service management API
    pub async fn service_management_post(&self, path: &str, body: &Value) -> Result<Value> {
        let url = self.service_management_url(path)?;
        let token = self
            .credentials
            .get_token(SERVICE_MANAGEMENT_RESOURCE)
            .await?;
        self.http.post(&url, &token, Some(body)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::azure::auth::TokenSource;

    fn client(arm: &str) -> AzureClient {
        AzureClient::new(
            "00000000-0000-0000-0000-000000000001",
            AzureCredentials::new(TokenSource::Static("t".to_string())),
            Endpoints::new(arm, "https://sm.example.com/base").unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_arm_url_appends_api_version() {
        let client = client("https://arm.example.com");
        let url = client
            .arm_url("/subscriptions/s/resourceGroups/rg", "2021-04-01")
            .unwrap();
        assert_eq!(
            url,
            "https://arm.example.com/subscriptions/s/resourceGroups/rg?api-version=2021-04-01"
        );
    }

    #[test]
    fn test_service_management_url_keeps_base_path() {
        let client = client("https://arm.example.com");
        let url = client.service_management_url("/cloudservices/cs").unwrap();
        assert_eq!(
            url,
            "https://sm.example.com/base/00000000-0000-0000-0000-000000000001/cloudservices/cs"
        );
    }

    #[test]
    fn test_invalid_endpoint_rejected() {
        assert!(Endpoints::new("not a url", DEFAULT_SERVICE_MANAGEMENT_ENDPOINT).is_err());
    }
}
