//! HTTP utilities for Azure REST API calls

use anyhow::{Context, Result};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::Value;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Header Azure echoes back so a request can be traced server-side
const CLIENT_REQUEST_ID_HEADER: &str = "x-ms-client-request-id";

/// Start of every non-success response error
const API_FAILURE_PREFIX: &str = "API request failed: ";

/// Sanitize response body for logging
/// Truncates long responses and strips control characters
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let cut = (0..=MAX_LOG_BODY_LENGTH)
            .rev()
            .find(|i| body.is_char_boundary(*i))
            .unwrap_or(0);
        format!("{}... [truncated, {} bytes total]", &body[..cut], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// HTTP client wrapper for Azure API calls
#[derive(Clone)]
pub struct AzureHttpClient {
    client: Client,
}

impl AzureHttpClient {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("azctl/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }

    /// Make a GET request, mapping 404 to `None`
    pub async fn get_optional(&self, url: &str, token: &str) -> Result<Option<Value>> {
        tracing::debug!("GET {}", url);
        let request = self.client.get(url).bearer_auth(token);
        let (status, body) = send(request).await?;

        if status == StatusCode::NOT_FOUND {
            tracing::debug!("Resource not found: {}", url);
            return Ok(None);
        }

        parse_body(status, &body).map(Some)
    }

    /// Make a PUT request with a JSON body
    pub async fn put(&self, url: &str, token: &str, body: &Value) -> Result<Value> {
        tracing::debug!("PUT {}", url);
        let request = self.client.put(url).bearer_auth(token).json(body);
        let (status, response_body) = send(request).await?;
        parse_body(status, &response_body)
    }

    /// Make a POST request
    pub async fn post(&self, url: &str, token: &str, body: Option<&Value>) -> Result<Value> {
        tracing::debug!("POST {}", url);

        let mut request = self.client.post(url).bearer_auth(token);
        if let Some(body) = body {
            request = request.json(body);
        }

        let (status, response_body) = send(request).await?;
        parse_body(status, &response_body)
    }
}

async fn send(request: RequestBuilder) -> Result<(StatusCode, String)> {
    let request_id = uuid::Uuid::new_v4().to_string();
    tracing::trace!("{}: {}", CLIENT_REQUEST_ID_HEADER, request_id);

    let response = request
        .header(CLIENT_REQUEST_ID_HEADER, request_id)
        .send()
        .await
        .context("Failed to send request")?;

    let status = response.status();
    let body = response
        .text()
        .await
        .context("Failed to read response body")?;

    Ok((status, body))
}

fn parse_body(status: StatusCode, body: &str) -> Result<Value> {
    if !status.is_success() {
        // Security: Only log sanitized/truncated error body to avoid leaking sensitive data
        tracing::error!("API error: {} - {}", status, sanitize_for_log(body));
        return Err(anyhow::anyhow!("{}{}", API_FAILURE_PREFIX, status));
    }

    // 202 Accepted and 204 No Content often come back empty
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }

    serde_json::from_str(body).context("Failed to parse response JSON")
}

/// Format an Azure API error for display
/// Security: API failures map to fixed messages so response details never reach the terminal
pub fn format_azure_error(error: &anyhow::Error) -> String {
    let api_failure = error
        .chain()
        .find_map(|cause| cause.to_string().strip_prefix(API_FAILURE_PREFIX).map(str::to_string));

    // Local errors (bad arguments, missing config, missing dependencies) are safe to show
    let Some(status) = api_failure else {
        return format!("{:#}", error);
    };

    match status.split_whitespace().next().unwrap_or_default() {
        "403" => "Permission denied. Check your Azure role assignments.".to_string(),
        "401" => "Authentication failed. Run 'az login'.".to_string(),
        "404" => "Resource not found.".to_string(),
        "429" => "Rate limit exceeded. Please try again later.".to_string(),
        "400" => "Invalid request. Check your parameters.".to_string(),
        "500" | "503" => "Azure service temporarily unavailable. Please try again.".to_string(),
        "409" => "Resource conflict. The resource may already exist or be in use.".to_string(),
        _ => "Request failed. Check your network connection and try again.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_truncates_long_bodies() {
        let body = "x".repeat(500);
        let sanitized = sanitize_for_log(&body);
        assert!(sanitized.starts_with(&"x".repeat(MAX_LOG_BODY_LENGTH)));
        assert!(sanitized.contains("500 bytes total"));
    }

    #[test]
    fn test_sanitize_handles_multibyte_boundary() {
        let body = "é".repeat(150);
        let sanitized = sanitize_for_log(&body);
        assert!(sanitized.contains("300 bytes total"));
    }

    #[test]
    fn test_format_error_by_status() {
        let err = anyhow::anyhow!("API request failed: 403 Forbidden");
        assert_eq!(
            format_azure_error(&err),
            "Permission denied. Check your Azure role assignments."
        );

        let err = anyhow::anyhow!("API request failed: 502 Bad Gateway");
        assert_eq!(
            format_azure_error(&err),
            "Request failed. Check your network connection and try again."
        );
    }

    #[test]
    fn test_format_error_passes_local_errors_through() {
        let err = anyhow::anyhow!("Invalid migration operation 'Abort'");
        assert_eq!(format_azure_error(&err), "Invalid migration operation 'Abort'");

        let err = anyhow::anyhow!("Missing dependencies:\n  /subscriptions/404-500/resourceGroups/rg");
        assert_eq!(
            format_azure_error(&err),
            "Missing dependencies:\n  /subscriptions/404-500/resourceGroups/rg"
        );
    }

    #[test]
    fn test_empty_success_body_is_null() {
        assert_eq!(parse_body(StatusCode::ACCEPTED, "").unwrap(), Value::Null);
        assert!(parse_body(StatusCode::CONFLICT, "{}").is_err());
    }
}
