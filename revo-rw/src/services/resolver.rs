//! Identifier resolver: scanned code → product record
//!
//! Thin client over the backend `/scan` endpoint. `NotFound` is a normal
//! outcome (the code has no matching product) and is kept distinct from
//! `Transient` transport failures, which the caller may retry unchanged.
//! The resolver holds no state beyond the injected HTTP client.

use crate::models::Product;
use crate::services::{transport_error, ApiEnvelope};
use revo_common::{Error, Result};
use serde_json::json;

/// Outcome of a successful lookup round-trip
#[derive(Debug, Clone)]
pub enum Resolution {
    Found(Product),
    NotFound,
}

/// Client for the backend product lookup
#[derive(Debug, Clone)]
pub struct ProductResolver {
    http: reqwest::Client,
    base_url: String,
}

impl ProductResolver {
    /// The HTTP client is constructor-injected; no process-wide singleton.
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    /// Resolve a scanned code to a product.
    ///
    /// Accepts any symbology the backend understands; the only local
    /// validation is rejecting empty input before going to the network.
    pub async fn resolve(&self, code: &str) -> Result<Resolution> {
        let code = code.trim();
        if code.is_empty() {
            return Err(Error::Validation("Scanned code must not be empty".to_string()));
        }

        let url = format!("{}/scan", self.base_url);
        tracing::debug!(code = %code, url = %url, "Resolving scanned code");

        let response = self
            .http
            .post(&url)
            .json(&json!({ "barcode": code }))
            .send()
            .await
            .map_err(|e| transport_error("Product lookup failed", e))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(Resolution::NotFound);
        }
        if status.is_server_error() {
            return Err(Error::Transient(format!(
                "Product lookup returned {}",
                status
            )));
        }
        if !status.is_success() {
            return Err(Error::Internal(format!(
                "Product lookup returned unexpected status {}",
                status
            )));
        }

        let envelope: ApiEnvelope<Product> = response
            .json()
            .await
            .map_err(|e| transport_error("Product lookup response unreadable", e))?;

        if !envelope.success {
            tracing::debug!(code = %code, detail = %envelope.failure_detail(), "No product for code");
            return Ok(Resolution::NotFound);
        }

        match envelope.data {
            Some(product) => {
                tracing::info!(code = %code, product_id = %product.id, "Product resolved");
                Ok(Resolution::Found(product))
            }
            None => Ok(Resolution::NotFound),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_code_is_rejected_before_any_network_call() {
        // Unroutable base URL: a network attempt would fail differently
        let resolver = ProductResolver::new(reqwest::Client::new(), "http://127.0.0.1:1");

        let result = resolver.resolve("   ").await;
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[tokio::test]
    async fn unreachable_backend_is_transient() {
        let resolver = ProductResolver::new(reqwest::Client::new(), "http://127.0.0.1:1");

        let result = resolver.resolve("0123456789").await;
        match result {
            Err(err) => assert!(err.is_retryable(), "expected retryable, got {err}"),
            Ok(_) => panic!("expected transport failure"),
        }
    }
}
