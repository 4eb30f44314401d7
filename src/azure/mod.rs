//! Azure API interaction module
//!
//! This module provides the core functionality for talking to the Azure
//! management APIs: authentication, the HTTP wrapper, and the client that
//! builds Resource Manager and service management URLs.
//!
//! # Module Structure
//!
//! - [`auth`] - Bearer tokens from the environment or the Azure CLI
//! - [`client`] - Main Azure client for making API requests
//! - [`http`] - HTTP utilities for REST API calls
//!
//! # Example
//!
//! ```ignore
//! use crate::azure::auth::{AzureCredentials, TokenSource};
//! use crate::azure::client::{AzureClient, Endpoints, DEFAULT_ARM_ENDPOINT, DEFAULT_SERVICE_MANAGEMENT_ENDPOINT};
//!
//! async fn example() -> anyhow::Result<()> {
//!     let credentials = AzureCredentials::new(TokenSource::from_env());
//!     let client = AzureClient::new(
//!         "<subscription>",
//!         credentials,
//!         Endpoints::new(DEFAULT_ARM_ENDPOINT, DEFAULT_SERVICE_MANAGEMENT_ENDPOINT)?,
//!     )?;
//!     let rg = client
//!         .get_resource("/subscriptions/<subscription>/resourceGroups/demo", "2021-04-01")
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod http;
