//! Configuration Management
//!
//! Handles persistent configuration storage for azctl.

use crate::azure::client::{Endpoints, DEFAULT_ARM_ENDPOINT, DEFAULT_SERVICE_MANAGEMENT_ENDPOINT};
use crate::storsimple::StorSimpleContext;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Last used subscription id
    #[serde(default)]
    pub subscription_id: Option<String>,
    /// Default resource group for new resources
    #[serde(default)]
    pub resource_group: Option<String>,
    /// Default location for new resource groups
    #[serde(default)]
    pub location: Option<String>,
    /// StorSimple device manager used by migration commands
    #[serde(default)]
    pub storsimple: Option<StorSimpleContext>,
    /// Resource Manager endpoint override
    #[serde(default)]
    pub resource_manager_endpoint: Option<String>,
    /// Service management endpoint override
    #[serde(default)]
    pub service_management_endpoint: Option<String>,
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("azctl").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load configuration from a specific file, falling back to defaults
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring invalid config file {:?}: {}", path, e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Get effective subscription (CLI > config > Azure CLI default)
    pub fn effective_subscription(&self) -> String {
        self.subscription_id
            .clone()
            .or_else(crate::azure::auth::get_default_subscription)
            .unwrap_or_default()
    }

    /// Get effective location (CLI > config > westus)
    pub fn effective_location(&self) -> String {
        self.location
            .clone()
            .unwrap_or_else(|| "westus".to_string())
    }

    /// Endpoints with any configured overrides applied
    pub fn endpoints(&self) -> Result<Endpoints> {
        Endpoints::new(
            self.resource_manager_endpoint
                .as_deref()
                .unwrap_or(DEFAULT_ARM_ENDPOINT),
            self.service_management_endpoint
                .as_deref()
                .unwrap_or(DEFAULT_SERVICE_MANAGEMENT_ENDPOINT),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("azctl-test-{}", uuid::Uuid::new_v4()))
            .join(name)
    }

    #[test]
    fn test_round_trip_through_file() {
        let path = temp_path("config.json");
        let config = Config {
            subscription_id: Some("00000000-0000-0000-0000-000000000001".to_string()),
            storsimple: Some(StorSimpleContext::new("cs", "vault")),
            ..Default::default()
        };

        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path), config);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_missing_or_invalid_file_gives_defaults() {
        let path = temp_path("config.json");
        assert_eq!(Config::load_from(&path), Config::default());

        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(Config::load_from(&path), Config::default());

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_endpoint_overrides() {
        let config = Config {
            resource_manager_endpoint: Some("http://localhost:8080".to_string()),
            ..Default::default()
        };
        let endpoints = config.endpoints().unwrap();
        assert_eq!(endpoints.resource_manager.as_str(), "http://localhost:8080/");
        assert_eq!(
            endpoints.service_management.as_str(),
            DEFAULT_SERVICE_MANAGEMENT_ENDPOINT
        );
    }
}
