//! Integration tests for the Azure clients using wiremock
//!
//! These tests run the real strategy and StorSimple clients against mocked
//! Resource Manager and service management endpoints.

use azctl::azure::auth::{AzureCredentials, TokenSource};
use azctl::azure::client::{format_azure_error, AzureClient, Endpoints};
use azctl::commands::{build_scale_set_config, create_scale_set, ScaleSetOptions};
use azctl::storsimple::{ConfirmLegacyVolumeContainerStatus, StorSimpleClient, StorSimpleContext};
use serde_json::json;
use wiremock::matchers::{bearer_token, body_json, body_partial_json, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SUB: &str = "11111111-2222-3333-4444-555555555555";

fn client(server: &MockServer) -> AzureClient {
    AzureClient::new(
        SUB,
        AzureCredentials::new(TokenSource::Static("test-token".to_string())),
        Endpoints::new(&server.uri(), &server.uri()).expect("mock server uri is valid"),
    )
    .expect("client should build")
}

fn rg_path() -> String {
    format!("/subscriptions/{}/resourceGroups/web", SUB)
}

fn provider_path(namespace: &str, resource_type: &str) -> String {
    format!("{}/providers/{}/{}/web", rg_path(), namespace, resource_type)
}

/// Test module for scale set strategy calls
mod scale_set_tests {
    use super::*;

    /// Reading a scale set that does not exist yields None
    #[tokio::test]
    async fn test_get_missing_scale_set_returns_none() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(provider_path("Microsoft.Compute", "virtualMachineScaleSets")))
            .and(query_param("api-version", "2017-12-01"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": { "code": "ResourceNotFound", "message": "not found" }
            })))
            .mount(&server)
            .await;

        let config = build_scale_set_config(&ScaleSetOptions::named("web", "azureuser")).unwrap();
        let found = config.get(&client(&server)).await.expect("404 is not an error");
        assert!(found.is_none());
    }

    /// Reading an existing scale set parses the service model
    #[tokio::test]
    async fn test_get_existing_scale_set() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(provider_path("Microsoft.Compute", "virtualMachineScaleSets")))
            .and(bearer_token("test-token"))
            .and(header_exists("x-ms-client-request-id"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": provider_path("Microsoft.Compute", "virtualMachineScaleSets"),
                "location": "westus",
                "sku": { "name": "Standard_DS1_v2", "capacity": 3 },
                "properties": {
                    "upgradePolicy": { "mode": "Rolling" },
                    "provisioningState": "Succeeded"
                }
            })))
            .mount(&server)
            .await;

        let config = build_scale_set_config(&ScaleSetOptions::named("web", "azureuser")).unwrap();
        let found = config
            .get(&client(&server))
            .await
            .expect("request should succeed")
            .expect("scale set should exist");

        assert_eq!(found.sku.unwrap().capacity, 3);
        assert_eq!(found.properties.provisioning_state.as_deref(), Some("Succeeded"));
    }

    /// Creation stops before the PUT when network resources are missing
    #[tokio::test]
    async fn test_create_reports_missing_dependencies() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(rg_path()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "web", "location": "westus"
            })))
            .mount(&server)
            .await;

        // Unmatched requests (every network GET) get wiremock's default 404
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let config = build_scale_set_config(&ScaleSetOptions::named("web", "azureuser")).unwrap();
        let err = create_scale_set(&config, &client(&server), true)
            .await
            .unwrap_err()
            .to_string();

        assert!(err.contains("Missing dependencies"));
        assert!(err.contains("/virtualNetworks/web/subnets/web"));
        assert!(err.contains("/loadBalancers/web/backendAddressPools/web"));
        assert!(err.contains("/loadBalancers/web/frontendIPConfigurations/web"));
        assert!(!err.contains(&format!("{}\n", rg_path())));
    }

    /// With every dependency present the scale set body is PUT
    #[tokio::test]
    async fn test_create_puts_scale_set_model() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(rg_path()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "web", "location": "westus"
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path(provider_path("Microsoft.Network", "virtualNetworks")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "location": "westus",
                "properties": { "subnets": [ { "name": "web", "properties": {} } ] }
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path(provider_path("Microsoft.Network", "loadBalancers")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "location": "westus",
                "properties": {
                    "frontendIPConfigurations": [ { "name": "web", "properties": {} } ],
                    "backendAddressPools": [ { "name": "web" } ]
                }
            })))
            .mount(&server)
            .await;

        Mock::given(method("PUT"))
            .and(path(provider_path("Microsoft.Compute", "virtualMachineScaleSets")))
            .and(query_param("api-version", "2017-12-01"))
            .and(body_partial_json(json!({
                "location": "westus",
                "sku": { "name": "Standard_DS1_v2", "capacity": 2 },
                "properties": {
                    "upgradePolicy": { "mode": "Manual" },
                    "virtualMachineProfile": {
                        "osProfile": { "computerNamePrefix": "web", "adminUsername": "azureuser" }
                    }
                }
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "location": "westus",
                "sku": { "name": "Standard_DS1_v2", "capacity": 2 },
                "properties": { "provisioningState": "Creating" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let config = build_scale_set_config(&ScaleSetOptions::named("web", "azureuser")).unwrap();
        let created = create_scale_set(&config, &client(&server), true)
            .await
            .expect("create should succeed");

        assert_eq!(created.properties.provisioning_state.as_deref(), Some("Creating"));
    }

    /// A 202 with no body falls back to the model that was sent
    #[tokio::test]
    async fn test_create_accepted_without_body() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path(provider_path("Microsoft.Compute", "virtualMachineScaleSets")))
            .respond_with(ResponseTemplate::new(202))
            .mount(&server)
            .await;

        let config = build_scale_set_config(&ScaleSetOptions::named("web", "azureuser")).unwrap();
        let created = create_scale_set(&config, &client(&server), false)
            .await
            .expect("create should succeed");

        assert_eq!(created.sku.unwrap().name, "Standard_DS1_v2");
    }
}

/// Test module for StorSimple migration confirmation
mod storsimple_tests {
    use super::*;

    fn confirm_path() -> String {
        format!(
            "/{}/cloudservices/cs-west/resources/WACis.Cloud.Service/~/CisVault/vault1/api/migration/cfg-1/confirmstatus",
            SUB
        )
    }

    fn command(operation: &str, names: &[&str]) -> ConfirmLegacyVolumeContainerStatus {
        ConfirmLegacyVolumeContainerStatus {
            legacy_config_id: "cfg-1".to_string(),
            migration_operation: operation.to_string(),
            legacy_container_names: Some(names.iter().map(|n| n.to_string()).collect()),
        }
    }

    /// Service messages are printed one per line
    #[tokio::test]
    async fn test_confirm_returns_service_messages() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(confirm_path()))
            .and(bearer_token("test-token"))
            .and(body_json(json!({
                "Operation": "Commit",
                "DataContainerNameList": ["dc1", "dc2"]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "MessageInfoList": [
                    { "Message": "dc1 has backups in progress" },
                    { "Message": "" },
                    { "Message": "dc2 has backups in progress" }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let service = StorSimpleClient::new(
            client(&server),
            StorSimpleContext::new("cs-west", "vault1"),
        );
        let output = command("commit", &["dc1", "dc2", "dc1"])
            .execute(&service)
            .await
            .expect("confirm should succeed");

        assert_eq!(
            output,
            "dc1 has backups in progress\ndc2 has backups in progress\n"
        );
    }

    /// An empty status means success
    #[tokio::test]
    async fn test_confirm_without_messages_reports_success() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(confirm_path()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let service = StorSimpleClient::new(
            client(&server),
            StorSimpleContext::new("cs-west", "vault1"),
        );
        let output = command("Rollback", &[]).execute(&service).await.unwrap();

        assert_eq!(
            output,
            format!(
                "{}\n",
                azctl::storsimple::migration::CONFIRM_MIGRATION_SUCCESS_MESSAGE
            )
        );
    }

    /// Service failures surface as errors with a friendly rendering
    #[tokio::test]
    async fn test_confirm_service_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(confirm_path()))
            .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
            .mount(&server)
            .await;

        let service = StorSimpleClient::new(
            client(&server),
            StorSimpleContext::new("cs-west", "vault1"),
        );
        let err = command("Commit", &[]).execute(&service).await.unwrap_err();

        assert_eq!(
            format_azure_error(&err),
            "Azure service temporarily unavailable. Please try again."
        );
    }
}
