//! Vault client
//!
//! Combines the session configuration (address, token, namespace) with the
//! HTTP transport and implements the [`RemoteApi`] key-value interface,
//! including the `/v1/` path prefix and `data` envelope the API wraps
//! payloads in. Timeouts, retries and connection pooling are left entirely to
//! the underlying reqwest client.

use super::http::HttpTransport;
use super::RemoteApi;
use crate::error::{MapperError, Result};
use crate::record::FieldMap;
use serde_json::Value;
use url::Url;

const ENV_ADDR: &str = "VAULT_ADDR";
const ENV_TOKEN: &str = "VAULT_TOKEN";
const ENV_NAMESPACE: &str = "VAULT_NAMESPACE";

const DEFAULT_ADDR: &str = "https://127.0.0.1:8200";

/// Session configuration for the remote API.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub address: String,
    pub token: String,
    pub namespace: Option<String>,
}

impl ClientConfig {
    pub fn new(address: impl Into<String>, token: impl Into<String>) -> Self {
        ClientConfig {
            address: address.into(),
            token: token.into(),
            namespace: None,
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Read the configuration from the conventional environment variables.
    /// The address falls back to the CLI default; the token is required.
    pub fn from_env() -> Result<Self> {
        let address = std::env::var(ENV_ADDR).unwrap_or_else(|_| DEFAULT_ADDR.to_string());
        let token = std::env::var(ENV_TOKEN)
            .map_err(|_| MapperError::invalid(format!("{ENV_TOKEN} is not set")))?;
        let namespace = std::env::var(ENV_NAMESPACE).ok();
        Ok(ClientConfig {
            address,
            token,
            namespace,
        })
    }
}

/// Client for a Vault-style HTTP API.
#[derive(Clone)]
pub struct VaultClient {
    base: String,
    http: HttpTransport,
}

impl VaultClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let base = Url::parse(&config.address)
            .map_err(|e| MapperError::invalid(format!("invalid API address {:?}: {e}", config.address)))?;
        let http = HttpTransport::new(config.token, config.namespace)?;

        Ok(Self {
            base: base.as_str().trim_end_matches('/').to_string(),
            http,
        })
    }

    /// Build the versioned API URL for a logical path.
    fn api_url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.base, path.trim_start_matches('/'))
    }
}

/// Unwrap the `data` envelope of a response body, falling back to the body
/// itself for endpoints that answer flat objects.
fn unwrap_data(value: Value) -> Option<FieldMap> {
    match value {
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Object(data)) => Some(data),
            _ => Some(map),
        },
        _ => None,
    }
}

impl RemoteApi for VaultClient {
    async fn write(&self, path: &str, payload: &FieldMap) -> Result<Option<FieldMap>> {
        let url = self.api_url(path);
        let body = Value::Object(payload.clone());
        let response = self.http.post(&url, &body).await?;
        Ok(response.and_then(unwrap_data))
    }

    async fn read(&self, path: &str) -> Result<Option<FieldMap>> {
        let url = self.api_url(path);
        let response = self.http.get(&url).await?;
        Ok(response.and_then(unwrap_data))
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let url = self.api_url(path);
        self.http.delete(&url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn api_url_applies_version_prefix() {
        let client = VaultClient::new(ClientConfig::new("http://127.0.0.1:8200", "t")).unwrap();
        assert_eq!(
            client.api_url("sys/managed-keys/awskms/k1"),
            "http://127.0.0.1:8200/v1/sys/managed-keys/awskms/k1"
        );
        assert_eq!(client.api_url("/identity/entity-alias"), "http://127.0.0.1:8200/v1/identity/entity-alias");
    }

    #[test]
    fn invalid_address_is_rejected() {
        // match on the result directly: the client carries the session token
        // and deliberately does not implement Debug
        let result = VaultClient::new(ClientConfig::new("not a url", "t"));
        assert!(matches!(
            result,
            Err(MapperError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn data_envelope_is_unwrapped() {
        let body = json!({"request_id": "r", "data": {"id": "abc"}});
        let map = unwrap_data(body).unwrap();
        assert_eq!(map.get("id"), Some(&json!("abc")));

        // flat responses pass through
        let body = json!({"id": "abc"});
        let map = unwrap_data(body).unwrap();
        assert_eq!(map.get("id"), Some(&json!("abc")));
    }
}
