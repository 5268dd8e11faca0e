// src/fetcher.rs
use crate::error::{Result, ServiceError};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::info;

/// Outbound price source. Implementations return the raw textual payload
/// verbatim; parsing belongs to the normalizer.
#[async_trait]
pub trait PriceFetcher: Send + Sync {
    async fn fetch(&self) -> Result<String>;
}

/// Single fixed-endpoint GET against the CoinDesk current-price API
pub struct CoindeskFetcher {
    client: Client,
    url: String,
}

impl CoindeskFetcher {
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServiceError::Network(e.to_string()))?;
        Ok(CoindeskFetcher {
            client,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl PriceFetcher for CoindeskFetcher {
    async fn fetch(&self) -> Result<String> {
        info!("Fetching coindesk payload from {}", self.url);

        let resp = self
            .client
            .get(&self.url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| ServiceError::Network(e.to_string()))?;

        let text = resp
            .text()
            .await
            .map_err(|e| ServiceError::Network(e.to_string()))?;

        Ok(text)
    }
}
