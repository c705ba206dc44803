//! HTTP plumbing for the Vault-style REST API

use crate::error::{MapperError, Result};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::Value;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

const TOKEN_HEADER: &str = "X-Vault-Token";
const NAMESPACE_HEADER: &str = "X-Vault-Namespace";

/// Sanitize response body for logging.
/// Truncates long responses and strips non-printable characters.
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        // back the cut off onto a char boundary so multibyte text cannot
        // panic inside the error-reporting path
        let mut end = MAX_LOG_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!(
            "{}... [truncated, {} bytes total]",
            &body[..end],
            body.len()
        )
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// Extract the message list from a Vault-convention error body
/// (`{"errors": ["..."]}`), falling back to the HTTP status.
fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
        if let Some(Value::Array(errors)) = map.get("errors") {
            let messages: Vec<&str> = errors.iter().filter_map(Value::as_str).collect();
            if !messages.is_empty() {
                return format!("{} ({})", messages.join("; "), status);
            }
        }
    }
    format!("API request failed: {status}")
}

/// HTTP transport for the remote API, carrying the session token.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    token: String,
    namespace: Option<String>,
}

impl HttpTransport {
    pub fn new(token: String, namespace: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("vaultmap/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| MapperError::invalid(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            token,
            namespace,
        })
    }

    fn apply_headers(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.header(TOKEN_HEADER, &self.token);
        match &self.namespace {
            Some(ns) => request.header(NAMESPACE_HEADER, ns),
            None => request,
        }
    }

    /// GET a path; `Ok(None)` on 404.
    pub async fn get(&self, url: &str) -> Result<Option<Value>> {
        tracing::debug!("GET {}", url);

        let response = self
            .apply_headers(self.client.get(url))
            .send()
            .await
            .map_err(|e| MapperError::remote(url, format!("failed to send request: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| MapperError::remote(url, format!("failed to read response body: {e}")))?;

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !status.is_success() {
            tracing::error!("API error: {} - {}", status, sanitize_for_log(&body));
            return Err(MapperError::remote(url, error_message(status, &body)));
        }

        let value = serde_json::from_str(&body)
            .map_err(|e| MapperError::remote(url, format!("failed to parse response JSON: {e}")))?;
        Ok(Some(value))
    }

    /// POST a JSON body; `Ok(None)` when the endpoint answers empty.
    pub async fn post(&self, url: &str, body: &Value) -> Result<Option<Value>> {
        tracing::debug!("POST {}", url);

        let response = self
            .apply_headers(self.client.post(url).json(body))
            .send()
            .await
            .map_err(|e| MapperError::remote(url, format!("failed to send request: {e}")))?;

        let status = response.status();
        let response_body = response
            .text()
            .await
            .map_err(|e| MapperError::remote(url, format!("failed to read response body: {e}")))?;

        if !status.is_success() {
            tracing::error!("API error: {} - {}", status, sanitize_for_log(&response_body));
            return Err(MapperError::remote(url, error_message(status, &response_body)));
        }

        if response_body.is_empty() {
            return Ok(None);
        }

        let value = serde_json::from_str(&response_body)
            .map_err(|e| MapperError::remote(url, format!("failed to parse response JSON: {e}")))?;
        Ok(Some(value))
    }

    /// DELETE a path. 404 counts as success (idempotent delete).
    pub async fn delete(&self, url: &str) -> Result<()> {
        tracing::debug!("DELETE {}", url);

        let response = self
            .apply_headers(self.client.delete(url))
            .send()
            .await
            .map_err(|e| MapperError::remote(url, format!("failed to send request: {e}")))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND || status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        tracing::error!("API error: {} - {}", status, sanitize_for_log(&body));
        Err(MapperError::remote(url, error_message(status, &body)))
    }
}
