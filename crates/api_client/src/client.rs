//! Catalog HTTP client.
//!
//! Blocking reqwest client (no Tokio runtime required). The grid editor calls
//! it from a worker thread; the headless commands call it directly.

use std::time::Duration;

use serde_json::Value;
use stockgrid_core::{CatalogBackend, PageRequest, PageResponse};

/// Request timeout when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Catalog API client (blocking).
#[derive(Clone)]
pub struct CatalogClient {
    http: reqwest::blocking::Client,
    api_base: String,
}

/// Error type for catalog operations.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Connection refused, DNS failure, timeout
    #[error("Network error: {0}")]
    Network(String),
    /// Non-2xx response not covered below
    #[error("HTTP {0}: {1}")]
    Http(u16, String),
    /// Server rejected the request body (400/422)
    #[error("{0}")]
    Validation(String),
    /// 404
    #[error("{0}")]
    NotFound(String),
    /// Response body was not the expected JSON
    #[error("Parse error: {0}")]
    Parse(String),
}

impl CatalogClient {
    /// Create a client for the API rooted at `api_base`
    /// (for example `http://localhost:5000`).
    pub fn new(api_base: &str, timeout: Duration) -> Result<Self, ApiError> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(format!("stockgrid/{}", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Fetch one page of the list or search endpoint.
    pub fn fetch_page(&self, request: &PageRequest) -> Result<PageResponse, ApiError> {
        let url = format!("{}{}", self.api_base, request.path());
        log::debug!("GET {} page={} limit={}", url, request.page, request.limit);

        let response = self.http.get(&url)
            .query(&request.query_pairs())
            .send()
            .map_err(network_error)?;
        let response = check_status(response)?;
        response.json::<PageResponse>().map_err(|e| ApiError::Parse(e.to_string()))
    }

    /// Fetch a single raw record.
    pub fn fetch_product(&self, item_id: &str) -> Result<Value, ApiError> {
        let url = self.product_url(item_id);
        log::debug!("GET {}", url);

        let response = self.http.get(&url).send().map_err(network_error)?;
        let response = check_status(response)?;
        let json: Value = response.json().map_err(|e| ApiError::Parse(e.to_string()))?;
        if !json.is_object() {
            return Err(ApiError::Parse(format!("expected a product object, got {}", json)));
        }
        Ok(json)
    }

    /// Send a partial record (`{ "estoque_pdv3": 12 }`). Returns the updated
    /// record when the server sends one back.
    pub fn update_product(&self, item_id: &str, body: &Value) -> Result<Option<Value>, ApiError> {
        let url = self.product_url(item_id);
        log::debug!("PUT {} {}", url, body);

        let response = self.http.put(&url).json(body).send().map_err(network_error)?;
        let response = check_status(response)?;

        let text = response.text().map_err(|e| ApiError::Parse(e.to_string()))?;
        if text.trim().is_empty() {
            return Ok(None);
        }
        match serde_json::from_str::<Value>(&text) {
            Ok(json) if json.is_object() => Ok(Some(json)),
            Ok(_) => Ok(None),
            Err(e) => {
                log::debug!("ignoring non-JSON update response: {}", e);
                Ok(None)
            }
        }
    }

    // ── Internal helpers ────────────────────────────────────────────

    fn product_url(&self, item_id: &str) -> String {
        format!("{}/api/produtos/{}", self.api_base, item_id.trim())
    }
}

impl CatalogBackend for CatalogClient {
    type Error = ApiError;

    fn fetch_page(&self, request: &PageRequest) -> Result<PageResponse, ApiError> {
        CatalogClient::fetch_page(self, request)
    }

    fn update_product(&self, item_id: &str, body: &Value) -> Result<Option<Value>, ApiError> {
        CatalogClient::update_product(self, item_id, body)
    }

    fn fetch_product(&self, item_id: &str) -> Result<Value, ApiError> {
        CatalogClient::fetch_product(self, item_id)
    }
}

fn network_error(e: reqwest::Error) -> ApiError {
    if e.is_timeout() {
        ApiError::Network(format!("request timed out ({})", e))
    } else {
        ApiError::Network(e.to_string())
    }
}

fn check_status(response: reqwest::blocking::Response) -> Result<reqwest::blocking::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let code = status.as_u16();
    let body = response.text().unwrap_or_default();
    let message = error_message(&body)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
    log::debug!("HTTP {}: {}", code, message);

    Err(match code {
        400 | 422 => ApiError::Validation(message),
        404 => ApiError::NotFound(message),
        _ => ApiError::Http(code, message),
    })
}

/// The backend reports errors as `{ "message": ... }`; fall back to the raw
/// body when it is short plain text.
fn error_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(json) = serde_json::from_str::<Value>(trimmed) {
        return ["message", "error"]
            .iter()
            .find_map(|k| json.get(*k).and_then(Value::as_str))
            .map(str::to_string);
    }
    (trimmed.len() <= 200 && !trimmed.starts_with('<')).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_json() {
        assert_eq!(
            error_message(r#"{"message":"Produto não encontrado"}"#),
            Some("Produto não encontrado".to_string())
        );
        assert_eq!(error_message(r#"{"error":"bad"}"#), Some("bad".to_string()));
        assert_eq!(error_message(r#"{"other":1}"#), None);
    }

    #[test]
    fn test_error_message_text() {
        assert_eq!(error_message("  "), None);
        assert_eq!(error_message("Service Unavailable"), Some("Service Unavailable".to_string()));
        assert_eq!(error_message("<html><body>502</body></html>"), None);
    }

    #[test]
    fn test_error_display() {
        assert_eq!(ApiError::Http(500, "boom".into()).to_string(), "HTTP 500: boom");
        assert_eq!(ApiError::Validation("Campos numéricos inválidos".into()).to_string(), "Campos numéricos inválidos");
    }

    #[test]
    fn test_api_base_trailing_slash() {
        let client = CatalogClient::new("http://localhost:5000/", DEFAULT_TIMEOUT).unwrap();
        assert_eq!(client.api_base(), "http://localhost:5000");
        assert_eq!(client.product_url(" 42 "), "http://localhost:5000/api/produtos/42");
    }
}
