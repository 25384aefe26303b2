//! Network access for the vault

use crate::errors::{Result, VaultError};
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

const JSON_LD: &str = "application/ld+json, application/json;q=0.9";

/// Retrieves one JSON resource by URI
#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    async fn fetch(&self, uri: &str) -> Result<Value>;
}

/// [`ResourceFetcher`] over HTTP GET
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("tpen/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| VaultError::Client {
                message: e.to_string(),
            })?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ResourceFetcher for HttpFetcher {
    async fn fetch(&self, uri: &str) -> Result<Value> {
        debug!(uri = %uri, "Fetching resource");
        let response = self
            .client
            .get(uri)
            .header(ACCEPT, JSON_LD)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    VaultError::Timeout {
                        uri: uri.to_string(),
                    }
                } else {
                    VaultError::transport(uri, e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(VaultError::status(uri, status.as_u16()));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| VaultError::invalid_json(uri, e.to_string()))
    }
}
