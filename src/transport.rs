//! Outbound HTTP for the gazette upstream.
//!
//! The upstream only answers its own browser AJAX client, so every request
//! carries a fixed browser-like identity ([`ClientIdentity`]). The identity
//! and the TLS policy are injected at construction instead of living in a
//! process-wide client, which lets tests swap [`HttpTransport`] for any other
//! [`Transport`].
//!
//! # TLS
//!
//! `diogrande.campogrande.ms.gov.br` serves an incomplete certificate chain.
//! Setting `upstream.accept_invalid_certs = true` disables certificate
//! validation for every request made by the transport. It is off by default
//! and logs a warning whenever a client is built with it enabled.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, USER_AGENT};
use std::time::Duration;

use crate::config::UpstreamConfig;
use crate::error::NetworkError;

/// `Accept` sent to the JSON listing endpoint (what jQuery sends).
pub const ACCEPT_LISTING: &str = "application/json, text/javascript, */*; q=0.01";
/// `Accept` sent when downloading an edition.
pub const ACCEPT_PDF: &str = "application/pdf";

const X_REQUESTED_WITH: &str = "x-requested-with";
const XML_HTTP_REQUEST: &str = "XMLHttpRequest";

/// A single GET returning the raw body.
///
/// Implementations must fail with [`NetworkError`] on any status outside
/// `[200, 300)` and on transport-level failures. No retries.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch_bytes(&self, url: &str, headers: &HeaderMap) -> Result<Vec<u8>, NetworkError>;
}

/// The header set that makes requests look like the upstream's own page.
#[derive(Debug, Clone)]
pub struct ClientIdentity {
    user_agent: String,
}

impl ClientIdentity {
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
        }
    }

    pub fn from_config(config: &UpstreamConfig) -> Self {
        Self::new(config.user_agent.clone())
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Headers for `admin-ajax.php?action=edicoes_json`.
    pub fn listing_headers(&self) -> Result<HeaderMap, NetworkError> {
        self.headers_with_accept(ACCEPT_LISTING)
    }

    /// Headers for `download_edicao/<payload>.pdf`.
    pub fn download_headers(&self) -> Result<HeaderMap, NetworkError> {
        self.headers_with_accept(ACCEPT_PDF)
    }

    fn headers_with_accept(&self, accept: &'static str) -> Result<HeaderMap, NetworkError> {
        let mut headers = HeaderMap::new();
        let agent = HeaderValue::from_str(&self.user_agent)
            .map_err(|e| NetworkError::InvalidRequest(format!("user agent: {}", e)))?;
        headers.insert(USER_AGENT, agent);
        headers.insert(ACCEPT, HeaderValue::from_static(accept));
        headers.insert(
            HeaderName::from_static(X_REQUESTED_WITH),
            HeaderValue::from_static(XML_HTTP_REQUEST),
        );
        Ok(headers)
    }
}

/// [`Transport`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: &UpstreamConfig) -> Result<Self, NetworkError> {
        let mut builder = reqwest::Client::builder();

        if config.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.timeout_secs));
        }

        if config.accept_invalid_certs {
            tracing::warn!(
                base_url = %config.base_url,
                "TLS certificate validation is disabled for the gazette upstream"
            );
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder
            .build()
            .map_err(|e| NetworkError::InvalidRequest(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch_bytes(&self, url: &str, headers: &HeaderMap) -> Result<Vec<u8>, NetworkError> {
        tracing::debug!(%url, "GET");

        let resp = self
            .client
            .get(url)
            .headers(headers.clone())
            .send()
            .await
            .map_err(|e| classify(url, e))?;

        let status = resp.status();
        if !status.is_success() {
            tracing::warn!(%url, status = status.as_u16(), "upstream returned an error status");
            return Err(NetworkError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = resp.bytes().await.map_err(|e| classify(url, e))?;
        tracing::debug!(%url, bytes = body.len(), "response received");
        Ok(body.to_vec())
    }
}

fn classify(url: &str, err: reqwest::Error) -> NetworkError {
    if err.is_timeout() {
        NetworkError::Timeout {
            url: url.to_string(),
        }
    } else {
        NetworkError::Request {
            url: url.to_string(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_headers_mimic_ajax_client() {
        let identity = ClientIdentity::new("Agent/1.0");
        let headers = identity.listing_headers().unwrap();
        assert_eq!(headers[USER_AGENT], "Agent/1.0");
        assert_eq!(headers[ACCEPT], ACCEPT_LISTING);
        assert_eq!(headers["X-Requested-With"], "XMLHttpRequest");
    }

    #[test]
    fn download_headers_ask_for_pdf() {
        let identity = ClientIdentity::new("Agent/1.0");
        let headers = identity.download_headers().unwrap();
        assert_eq!(headers[ACCEPT], ACCEPT_PDF);
        assert_eq!(headers["X-Requested-With"], "XMLHttpRequest");
    }

    #[test]
    fn identity_from_config_uses_configured_agent() {
        let config = UpstreamConfig {
            user_agent: "Agent/2.0".into(),
            ..UpstreamConfig::default()
        };
        let identity = ClientIdentity::from_config(&config);
        assert_eq!(identity.user_agent(), "Agent/2.0");
        assert_eq!(identity.download_headers().unwrap()[USER_AGENT], "Agent/2.0");
    }

    #[test]
    fn invalid_user_agent_is_rejected() {
        let identity = ClientIdentity::new("bad\nagent");
        assert!(matches!(
            identity.listing_headers(),
            Err(NetworkError::InvalidRequest(_))
        ));
    }

    #[test]
    fn transport_builds_with_relaxed_tls() {
        let config = UpstreamConfig {
            accept_invalid_certs: true,
            ..UpstreamConfig::default()
        };
        assert!(HttpTransport::new(&config).is_ok());
    }
}
