//! Gazette directory: listing queries and download URL derivation.
//!
//! # Listing
//!
//! `GET <base>/wp-admin/admin-ajax.php?action=edicoes_json&palavra=&numero=&de=&ate=`
//! returns `{ "data": [ { numero, dia, arquivo, desctpd, codigodia }, ... ] }`.
//!
//! | Filter | Upstream behaviour |
//! |--------|--------------------|
//! | empty | most recent editions |
//! | `palavra` only | every edition whose text contains the keyword |
//! | `numero` | rows for that issue number (one per kind) |
//! | `de` / `ate` | date range, passed through as given |
//!
//! # Download URLs
//!
//! The upstream identifies an edition by `codigodia`. Its download link is
//! `<base>/download_edicao/<payload>.pdf` where `payload` is
//! the percent-encoded standard base64 of the compact JSON
//! `{"codigodia":<number>}`. The upstream only accepts this exact byte
//! sequence.

use anyhow::{anyhow, Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::Value;
use std::sync::Arc;

use crate::config::UpstreamConfig;
use crate::error::{DirectoryError, NetworkError};
use crate::models::{Gazette, GazetteFilter, ListingResponse};
use crate::transport::{ClientIdentity, HttpTransport, Transport};

const LISTING_PATH: &str = "/wp-admin/admin-ajax.php";
const LISTING_ACTION: &str = "edicoes_json";
const DOWNLOAD_PATH: &str = "/download_edicao/";

/// Queries the upstream listing and downloads editions.
#[derive(Clone)]
pub struct GazetteDirectory {
    base_url: String,
    identity: ClientIdentity,
    transport: Arc<dyn Transport>,
}

impl GazetteDirectory {
    pub fn new(
        base_url: impl Into<String>,
        identity: ClientIdentity,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            identity,
            transport,
        }
    }

    /// Directory over a real [`HttpTransport`] built from config.
    pub fn from_config(config: &UpstreamConfig) -> Result<Self, NetworkError> {
        let transport = HttpTransport::new(config)?;
        Ok(Self::new(
            config.base_url.clone(),
            ClientIdentity::from_config(config),
            Arc::new(transport),
        ))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Run one listing query. Either every row maps or the call fails.
    pub async fn list(&self, filter: &GazetteFilter) -> Result<Vec<Gazette>, DirectoryError> {
        let url = listing_url(&self.base_url, filter)?;
        let headers = self.identity.listing_headers()?;
        let body = self.transport.fetch_bytes(&url, &headers).await?;

        let gazettes = parse_listing(&self.base_url, &body)?;
        tracing::debug!(
            numero = filter.numero.as_deref().unwrap_or(""),
            palavra = filter.palavra.as_deref().unwrap_or(""),
            rows = gazettes.len(),
            "gazette listing fetched"
        );
        Ok(gazettes)
    }

    /// Download the PDF bytes of an edition.
    pub async fn download(&self, gazette: &Gazette) -> Result<Vec<u8>, NetworkError> {
        let headers = self.identity.download_headers()?;
        let bytes = self
            .transport
            .fetch_bytes(gazette.download_url(), &headers)
            .await?;
        tracing::debug!(
            numero = gazette.number(),
            tipo = gazette.kind(),
            bytes = bytes.len(),
            "gazette downloaded"
        );
        Ok(bytes)
    }
}

/// Build the listing URL. Missing filter fields are sent as empty values.
pub fn listing_url(base_url: &str, filter: &GazetteFilter) -> Result<String, DirectoryError> {
    let endpoint = format!("{}{}", base_url.trim_end_matches('/'), LISTING_PATH);
    let params = [
        ("action", LISTING_ACTION),
        ("palavra", filter.palavra.as_deref().unwrap_or("")),
        ("numero", filter.numero.as_deref().unwrap_or("")),
        ("de", filter.de.as_deref().unwrap_or("")),
        ("ate", filter.ate.as_deref().unwrap_or("")),
    ];
    let url = reqwest::Url::parse_with_params(&endpoint, &params)
        .map_err(|e| DirectoryError::InvalidBaseUrl(format!("{}: {}", base_url, e)))?;
    Ok(url.to_string())
}

/// Parse a listing body into descriptors.
pub fn parse_listing(base_url: &str, body: &[u8]) -> Result<Vec<Gazette>, DirectoryError> {
    let response: ListingResponse =
        serde_json::from_slice(body).map_err(DirectoryError::InvalidResponse)?;
    Ok(response
        .data
        .into_iter()
        .map(|row| Gazette::from_row(base_url, row))
        .collect())
}

/// Derive the download URL for an internal code.
pub fn download_url(base_url: &str, codigo: &str) -> String {
    let payload = serde_json::json!({ "codigodia": coerce_code(codigo) }).to_string();
    let encoded = STANDARD.encode(payload.as_bytes());
    format!(
        "{}{}{}.pdf",
        base_url.trim_end_matches('/'),
        DOWNLOAD_PATH,
        urlencoding::encode(&encoded)
    )
}

/// Recover the `{"codigodia": ...}` payload from a download URL.
pub fn decode_download_payload(url: &str) -> Result<Value> {
    let start = url
        .find(DOWNLOAD_PATH)
        .map(|i| i + DOWNLOAD_PATH.len())
        .ok_or_else(|| anyhow!("not a download_edicao URL: {}", url))?;
    let segment = url[start..]
        .strip_suffix(".pdf")
        .ok_or_else(|| anyhow!("download URL must end in .pdf: {}", url))?;

    let unescaped = urlencoding::decode(segment).context("payload is not valid percent-encoding")?;
    let raw = STANDARD
        .decode(unescaped.as_bytes())
        .context("payload is not valid base64")?;
    let json = String::from_utf8(raw).context("payload is not UTF-8")?;
    serde_json::from_str(&json).context("payload is not JSON")
}

/// Numeric coercion of the code as the upstream page performs it:
/// blank is `0`, integers stay integers, other finite numbers become floats,
/// anything else is `null`.
fn coerce_code(codigo: &str) -> Value {
    let trimmed = codigo.trim();
    if trimmed.is_empty() {
        return Value::from(0);
    }
    if let Ok(n) = trimmed.parse::<i64>() {
        return Value::from(n);
    }
    match trimmed.parse::<f64>() {
        Ok(f) if f.is_finite() => {
            if f.fract() == 0.0 && f.abs() < 9_007_199_254_740_992.0 {
                Value::from(f as i64)
            } else {
                serde_json::Number::from_f64(f)
                    .map(Value::Number)
                    .unwrap_or(Value::Null)
            }
        }
        _ => Value::Null,
    }
}
