//! # Remote Gateway
//!
//! The stateless request/response client for the remote store.
//!
//! ## Wire Contract
//! One HTTP GET per call:
//! ```text
//! GET <endpoint>?action=<verb>&data=<urlencoded JSON>&_=<millis>
//! ```
//! The response body is a JSON envelope:
//! ```text
//! { "success": true,  "data": … }
//! { "success": false, "error": "…", "fallback": true? }
//! ```
//! `fallback: true` hints the caller to serve from local cache without
//! alarming the user.
//!
//! ## Error Mapping
//! - transport failure, timeout, non-2xx status  → `Network`
//! - body that is not a well-formed envelope     → `Parse`
//! - `success: false`                            → `Remote`
//!
//! The gateway never caches and never retries; retry policy belongs to the
//! sync engine. Every write obtains a readable, parseable response. A
//! response that cannot be read is a `Network` failure, never an implied
//! success.

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::error::SyncError;
use crate::settings::SyncSettings;

// =============================================================================
// Actions
// =============================================================================

/// Domain verbs understood by the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Lightweight connectivity probe.
    Probe,
    GetProducts,
    AddProduct,
    UpdateProduct,
    DeleteProduct,
    GetSales,
    AddSale,
}

impl Action {
    /// Wire name of the verb.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Action::Probe => "test",
            Action::GetProducts => "getProducts",
            Action::AddProduct => "addProduct",
            Action::UpdateProduct => "updateProduct",
            Action::DeleteProduct => "deleteProduct",
            Action::GetSales => "getSales",
            Action::AddSale => "addSale",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Gateway Errors
// =============================================================================

/// Failures of a single remote call.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// No usable transport: connection refused, DNS failure, timeout,
    /// non-2xx status, device offline.
    #[error("Network failure: {0}")]
    Network(String),

    /// The remote store processed the request and reported failure.
    #[error("Remote reported failure: {message}")]
    Remote {
        message: String,
        /// Hint to serve from local cache without alarming the user.
        fallback: bool,
    },

    /// The response body was not a well-formed envelope.
    #[error("Unparseable remote response: {0}")]
    Parse(String),
}

/// Result type for gateway calls.
pub type GatewayResult<T> = Result<T, GatewayError>;

// =============================================================================
// Gateway Trait
// =============================================================================

/// The seam between the sync engine and the remote store.
///
/// Implementations translate domain verbs into remote calls and normalize
/// responses and errors. They hold no state and make no retry decisions.
/// The engine receives this as a trait object, so tests drive it with a
/// scripted implementation.
#[async_trait]
pub trait RemoteGateway: Send + Sync {
    /// Performs one remote call. Returns the envelope's `data` on success
    /// (`Value::Null` when the remote sent none).
    async fn call(&self, action: Action, payload: Option<&Value>) -> GatewayResult<Value>;
}

// =============================================================================
// Response Envelope
// =============================================================================

#[derive(Debug, Deserialize)]
struct Envelope {
    success: bool,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    fallback: bool,
}

// =============================================================================
// HTTP Gateway
// =============================================================================

/// The production gateway: HTTP against a spreadsheet-backed script
/// endpoint.
#[derive(Debug)]
pub struct HttpGateway {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpGateway {
    /// Builds a gateway for the given endpoint with a per-request timeout.
    ///
    /// The timeout is the remote-call bound: a call that does not resolve
    /// within it is a `Network` failure.
    pub fn new(endpoint: &str, request_timeout: Duration) -> Result<Self, SyncError> {
        let endpoint = Url::parse(endpoint)?;

        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(SyncError::InvalidEndpoint(format!(
                "unsupported scheme: {}",
                endpoint.scheme()
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| SyncError::InvalidSettings(e.to_string()))?;

        Ok(HttpGateway { client, endpoint })
    }

    /// Builds a gateway from loaded sync settings.
    pub fn from_settings(settings: &SyncSettings) -> Result<Self, SyncError> {
        HttpGateway::new(&settings.endpoint, settings.request_timeout())
    }

    fn request_url(&self, action: Action, payload: Option<&Value>) -> Url {
        let mut url = self.endpoint.clone();

        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("action", action.as_str());
            if let Some(payload) = payload {
                pairs.append_pair("data", &payload.to_string());
            }
            // Cache-busting nonce; intermediaries must not replay answers.
            pairs.append_pair("_", &Utc::now().timestamp_millis().to_string());
        }

        url
    }
}

#[async_trait]
impl RemoteGateway for HttpGateway {
    async fn call(&self, action: Action, payload: Option<&Value>) -> GatewayResult<Value> {
        let url = self.request_url(action, payload);

        debug!(action = %action, "Calling remote store");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Network(format!("HTTP {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        let envelope: Envelope =
            serde_json::from_str(&body).map_err(|e| GatewayError::Parse(e.to_string()))?;

        if !envelope.success {
            return Err(GatewayError::Remote {
                message: envelope
                    .error
                    .unwrap_or_else(|| "remote reported failure".to_string()),
                fallback: envelope.fallback,
            });
        }

        Ok(envelope.data.unwrap_or(Value::Null))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_wire_names() {
        assert_eq!(Action::GetProducts.as_str(), "getProducts");
        assert_eq!(Action::AddSale.as_str(), "addSale");
        assert_eq!(Action::Probe.as_str(), "test");
    }

    #[test]
    fn test_request_url_shape() {
        let gateway = HttpGateway::new("https://example.com/exec", Duration::from_secs(5)).unwrap();
        let payload = serde_json::json!({"id": "p1"});
        let url = gateway.request_url(Action::AddProduct, Some(&payload));

        let query: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        assert_eq!(query[0], ("action".to_string(), "addProduct".to_string()));
        assert_eq!(query[1].0, "data");
        assert!(query[1].1.contains("p1"));
        assert_eq!(query[2].0, "_");
    }

    #[test]
    fn test_rejects_non_http_endpoint() {
        let err = HttpGateway::new("ftp://example.com", Duration::from_secs(5)).unwrap_err();
        assert!(matches!(err, SyncError::InvalidEndpoint(_)));
    }

    #[test]
    fn test_envelope_parsing() {
        let ok: Envelope = serde_json::from_str(r#"{"success":true,"data":[1,2]}"#).unwrap();
        assert!(ok.success);
        assert_eq!(ok.data.unwrap(), serde_json::json!([1, 2]));

        let failed: Envelope =
            serde_json::from_str(r#"{"success":false,"error":"quota exceeded","fallback":true}"#)
                .unwrap();
        assert!(!failed.success);
        assert_eq!(failed.error.as_deref(), Some("quota exceeded"));
        assert!(failed.fallback);

        assert!(serde_json::from_str::<Envelope>("not json").is_err());
    }
}
