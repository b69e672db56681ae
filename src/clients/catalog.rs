//! Item Catalog client
//!
//! The catalog owns item records and the availability counter. Availability
//! changes go through the relative adjustment operation only: the catalog
//! applies `±1` and checks the `0 ≤ available ≤ total` bound atomically on
//! its side, so concurrent reservations from other loans stay correct. The
//! core never computes the new count itself.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{
    config::RemoteServiceConfig,
    error::{AppError, AppResult},
};

use super::transport_error;

const SERVICE_NAME: &str = "Item Catalog";

/// Item record as returned by the catalog
#[derive(Debug, Clone, Deserialize)]
pub struct ItemRecord {
    pub id: i32,
    pub title: String,
    #[serde(default)]
    pub author: Option<String>,
    pub total_count: i32,
    pub available_count: i32,
}

/// Relative availability adjustment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjustOperation {
    Increment,
    Decrement,
}

#[derive(Serialize)]
struct AdjustRequest {
    operation: AdjustOperation,
}

#[derive(Debug, Deserialize)]
struct AdjustResponse {
    #[allow(dead_code)]
    id: i32,
    available_count: i32,
}

/// Read and adjustment capability against the Item Catalog
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ItemCatalog: Send + Sync {
    /// Fetch an item record. `ItemNotFound` on 404.
    async fn get_item(&self, item_id: i32) -> AppResult<ItemRecord>;

    /// Apply a `±1` adjustment to the availability counter. Returns the new
    /// available count. `ItemUnavailable` when the catalog rejects a
    /// decrement at zero (400), `ItemNotFound` on 404,
    /// `DependencyUnavailable` on timeout or 5xx.
    async fn adjust_availability(
        &self,
        item_id: i32,
        operation: AdjustOperation,
    ) -> AppResult<i32>;
}

/// HTTP implementation talking to the real catalog service
#[derive(Clone)]
pub struct HttpItemCatalog {
    client: reqwest::Client,
    base_url: String,
}

impl HttpItemCatalog {
    pub fn new(config: &RemoteServiceConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ItemCatalog for HttpItemCatalog {
    async fn get_item(&self, item_id: i32) -> AppResult<ItemRecord> {
        let url = format!("{}/api/items/{}", self.base_url, item_id);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| transport_error(SERVICE_NAME, e))?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(AppError::ItemNotFound(item_id)),
            status if status.is_server_error() => {
                tracing::error!("{} returned {}", SERVICE_NAME, status);
                Err(AppError::DependencyUnavailable(SERVICE_NAME))
            }
            status if !status.is_success() => Err(AppError::Internal(format!(
                "{} returned unexpected status {}",
                SERVICE_NAME, status
            ))),
            _ => response
                .json::<ItemRecord>()
                .await
                .map_err(|e| transport_error(SERVICE_NAME, e)),
        }
    }

    async fn adjust_availability(
        &self,
        item_id: i32,
        operation: AdjustOperation,
    ) -> AppResult<i32> {
        let url = format!("{}/api/items/{}/availability", self.base_url, item_id);

        let response = self
            .client
            .patch(&url)
            .json(&AdjustRequest { operation })
            .send()
            .await
            .map_err(|e| transport_error(SERVICE_NAME, e))?;

        match response.status() {
            // The catalog rejects a decrement that would go below zero.
            StatusCode::BAD_REQUEST => Err(AppError::ItemUnavailable(item_id)),
            StatusCode::NOT_FOUND => Err(AppError::ItemNotFound(item_id)),
            status if status.is_server_error() => {
                tracing::error!("{} returned {}", SERVICE_NAME, status);
                Err(AppError::DependencyUnavailable(SERVICE_NAME))
            }
            status if !status.is_success() => Err(AppError::Internal(format!(
                "{} returned unexpected status {}",
                SERVICE_NAME, status
            ))),
            _ => {
                let body = response
                    .json::<AdjustResponse>()
                    .await
                    .map_err(|e| transport_error(SERVICE_NAME, e))?;
                Ok(body.available_count)
            }
        }
    }
}
