// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

//! Remote catalog API loader.
//!
//! Issues a single `GET <base>/products?limit=N` with a bounded timeout and
//! expects `{ "products": [ ... ] }`. Anything else (transport error,
//! timeout, non-2xx status, a different body shape, an empty list) is
//! reported as [`SourceError::Unavailable`]. There is no retry.

use anyhow::{Context, Result};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::catalog::{Entity, EntityKind, RawRecord};
use crate::sources::{Origin, Source, SourceError};

/// Default request budget.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default page size requested from the API.
pub const DEFAULT_LIMIT: u32 = 100;

/// Loader for the remote catalog API.
#[derive(Debug, Clone)]
pub struct RemoteSource {
    client: reqwest::Client,
    endpoint: Url,
    limit: u32,
    timeout: Duration,
}

impl RemoteSource {
    /// Creates a loader for the API rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` is not a valid URL or the HTTP client
    /// cannot be built.
    pub fn new(base_url: &str, limit: u32, timeout: Duration) -> Result<Self> {
        let mut base =
            Url::parse(base_url).with_context(|| format!("Invalid remote base URL {base_url:?}"))?;

        // Url::join replaces the last segment unless the path ends in '/'.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let endpoint = base
            .join("products")
            .with_context(|| format!("Cannot build products endpoint from {base_url:?}"))?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            endpoint,
            limit,
            timeout,
        })
    }

    /// The products endpoint (without the `limit` query).
    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Fetches one page of products.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Unavailable`] on any failure described in the
    /// module docs.
    pub async fn fetch(&self) -> Result<Vec<Entity>, SourceError> {
        let unavailable = |reason: String| SourceError::unavailable(Origin::Remote, reason);

        debug!("Fetching {} (limit {})", self.endpoint, self.limit);
        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&[("limit", self.limit)])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    unavailable(format!("timed out after {}ms", self.timeout.as_millis()))
                } else if e.is_connect() {
                    unavailable(format!("cannot connect: {e}"))
                } else {
                    unavailable(format!("request failed: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(unavailable(format!("HTTP {status}")));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| unavailable(format!("unreadable body: {e}")))?;

        let products = parse_products(body).map_err(unavailable)?;
        debug!("Remote returned {} products", products.len());
        Ok(products)
    }
}

impl Source for RemoteSource {
    fn origin(&self) -> Origin {
        Origin::Remote
    }

    async fn load(&self) -> Result<Vec<Entity>, SourceError> {
        self.fetch().await
    }
}

/// Extracts and validates the `products` array of a response body.
///
/// Each product keeps the kind it declares (`kind` or `type`), defaulting to
/// server.
///
/// # Errors
///
/// Returns a reason string if the body is not `{ "products": [..] }` or the
/// array is empty.
pub fn parse_products(body: Value) -> Result<Vec<Entity>, String> {
    let Value::Object(mut object) = body else {
        return Err("response is not a JSON object".to_string());
    };
    let Some(Value::Array(products)) = object.remove("products") else {
        return Err("response has no products array".to_string());
    };
    if products.is_empty() {
        return Err("empty product list".to_string());
    }

    let entities: Vec<Entity> = products
        .into_iter()
        .filter_map(|value| {
            let record = serde_json::from_value::<RawRecord>(value)
                .map_err(|e| SourceError::InvalidRecord(e.to_string()))
                .and_then(|record| {
                    let kind = record.declared_kind().unwrap_or(EntityKind::Server);
                    record.into_entity(kind)
                });
            record
                .map_err(|e| warn!("Skipping remote product: {e}"))
                .ok()
        })
        .collect();

    if entities.is_empty() {
        return Err("no valid products in response".to_string());
    }
    Ok(entities)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_endpoint_keeps_base_path() -> Result<()> {
        let remote = RemoteSource::new("https://api.example.com/v1", 10, DEFAULT_TIMEOUT)?;
        assert_eq!(remote.endpoint().as_str(), "https://api.example.com/v1/products");

        let remote = RemoteSource::new("https://api.example.com/", 10, DEFAULT_TIMEOUT)?;
        assert_eq!(remote.endpoint().as_str(), "https://api.example.com/products");
        Ok(())
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(RemoteSource::new("not a url", 10, DEFAULT_TIMEOUT).is_err());
    }

    #[test]
    fn test_parse_products_kinds() -> Result<()> {
        let entities = parse_products(json!({
            "products": [
                {"id": "github", "name": "GitHub"},
                {"id": "cursor", "name": "Cursor", "type": "client"},
                {"id": "devin", "name": "Devin", "kind": "agent"},
                {"description": "no name or id"}
            ]
        }))
        .map_err(anyhow::Error::msg)?;

        let kinds: Vec<EntityKind> = entities.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![EntityKind::Server, EntityKind::Client, EntityKind::Agent]
        );
        assert_eq!(entities[1].id, "client-cursor");
        Ok(())
    }

    #[test]
    fn test_parse_products_rejects_other_shapes() {
        assert!(parse_products(json!([])).is_err());
        assert!(parse_products(json!({"items": []})).is_err());
        assert!(parse_products(json!({"products": {}})).is_err());
        assert!(parse_products(json!({"products": []})).is_err());
        assert!(parse_products(json!({"products": [{"stars": 3}]})).is_err());
    }
}
