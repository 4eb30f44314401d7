//! Azure Authentication
//!
//! Obtains bearer tokens either from the `AZURE_ACCESS_TOKEN` environment
//! variable or from the Azure CLI (`az account get-access-token`), and caches
//! them per audience.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Audience for Azure Resource Manager calls
pub const ARM_RESOURCE: &str = "https://management.azure.com/";

/// Audience for classic service management calls (StorSimple)
pub const SERVICE_MANAGEMENT_RESOURCE: &str = "https://management.core.windows.net/";

/// Token expiry buffer - refresh tokens this much before they actually expire
const TOKEN_EXPIRY_BUFFER: Duration = Duration::from_secs(60);

/// Default token TTL if we can't determine expiry (conservative: 30 minutes)
const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(30 * 60);

/// Where access tokens come from
#[derive(Debug, Clone)]
pub enum TokenSource {
    /// A fixed token, used for every audience
    Static(String),
    /// Shell out to `az account get-access-token`
    AzureCli,
}

impl TokenSource {
    /// Pick the token source from the environment
    pub fn from_env() -> Self {
        match std::env::var("AZURE_ACCESS_TOKEN") {
            Ok(token) if !token.trim().is_empty() => Self::Static(token.trim().to_string()),
            _ => Self::AzureCli,
        }
    }
}

/// Azure credentials holder with per-audience token caching
#[derive(Clone)]
pub struct AzureCredentials {
    source: TokenSource,
    token_cache: Arc<RwLock<HashMap<String, CachedToken>>>,
}

#[derive(Clone)]
struct CachedToken {
    token: String,
    /// When this token expires (with buffer applied)
    expires_at: Instant,
}

impl CachedToken {
    fn is_valid(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CliAccessToken {
    access_token: String,
}

impl AzureCredentials {
    pub fn new(source: TokenSource) -> Self {
        Self {
            source,
            token_cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Get an access token for the given audience
    pub async fn get_token(&self, resource: &str) -> Result<String> {
        {
            let cache = self.token_cache.read().await;
            if let Some(cached) = cache.get(resource) {
                if cached.is_valid() {
                    return Ok(cached.token.clone());
                }
                tracing::debug!("Cached token for {} expired, fetching new token", resource);
            }
        }

        let token = match &self.source {
            TokenSource::Static(token) => token.clone(),
            TokenSource::AzureCli => fetch_cli_token(resource).await?,
        };

        let expires_at = Instant::now() + DEFAULT_TOKEN_TTL - TOKEN_EXPIRY_BUFFER;

        {
            let mut cache = self.token_cache.write().await;
            cache.insert(
                resource.to_string(),
                CachedToken {
                    token: token.clone(),
                    expires_at,
                },
            );
        }

        tracing::debug!(
            "New token cached for {}, expires in ~{} minutes",
            resource,
            (DEFAULT_TOKEN_TTL - TOKEN_EXPIRY_BUFFER).as_secs() / 60
        );

        Ok(token)
    }
}

async fn fetch_cli_token(resource: &str) -> Result<String> {
    let output = tokio::process::Command::new("az")
        .args([
            "account",
            "get-access-token",
            "--resource",
            resource,
            "--output",
            "json",
        ])
        .output()
        .await
        .context("Failed to run 'az account get-access-token'. Is the Azure CLI installed?")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        tracing::error!("az account get-access-token failed: {}", stderr.trim());
        bail!("Failed to get access token. Run 'az login' first");
    }

    let parsed: CliAccessToken = serde_json::from_slice(&output.stdout)
        .context("Failed to parse Azure CLI token response")?;
    Ok(parsed.access_token)
}

/// Get the Azure CLI configuration directory
pub fn get_azure_config_dir() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("AZURE_CONFIG_DIR") {
        return Some(PathBuf::from(path));
    }
    dirs::home_dir().map(|p| p.join(".azure"))
}

/// Subscription ids are GUIDs
pub fn validate_subscription_id(subscription: &str) -> bool {
    uuid::Uuid::parse_str(subscription).is_ok()
}

#[derive(Deserialize)]
struct AzureProfile {
    #[serde(default)]
    subscriptions: Vec<ProfileSubscription>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfileSubscription {
    id: String,
    #[serde(default)]
    is_default: bool,
}

/// Read the default subscription from the environment or the Azure CLI profile
pub fn get_default_subscription() -> Option<String> {
    if let Ok(subscription) = std::env::var("AZURE_SUBSCRIPTION_ID") {
        if validate_subscription_id(&subscription) {
            return Some(subscription);
        }
        tracing::warn!("Invalid subscription id format in AZURE_SUBSCRIPTION_ID");
    }

    let profile_path = get_azure_config_dir()?.join("azureProfile.json");
    let content = std::fs::read_to_string(profile_path).ok()?;
    default_subscription_from_profile(&content)
}

/// Pick the default subscription out of an `azureProfile.json` document
pub fn default_subscription_from_profile(content: &str) -> Option<String> {
    // The CLI writes this file with a UTF-8 BOM
    let content = content.trim_start_matches('\u{feff}');
    let profile: AzureProfile = serde_json::from_str(content).ok()?;

    profile
        .subscriptions
        .into_iter()
        .find(|s| s.is_default)
        .map(|s| s.id)
        .filter(|id| validate_subscription_id(id))
}
