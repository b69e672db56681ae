//! Identity Directory client
//!
//! The directory owns user records; the loan core only ever asks it to
//! resolve a user id.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;

use crate::{
    config::RemoteServiceConfig,
    error::{AppError, AppResult},
};

use super::transport_error;

const SERVICE_NAME: &str = "Identity Directory";

/// User record as returned by the directory
#[derive(Debug, Clone, Deserialize)]
pub struct UserRecord {
    pub id: i32,
    pub name: String,
    pub email: String,
}

/// Lookup capability against the Identity Directory
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    /// Resolve a user by id. `UserNotFound` when the directory answers 404,
    /// `DependencyUnavailable` on timeout or 5xx.
    async fn get_user(&self, user_id: i32) -> AppResult<UserRecord>;
}

/// HTTP implementation talking to the real directory service
#[derive(Clone)]
pub struct HttpIdentityDirectory {
    client: reqwest::Client,
    base_url: String,
}

impl HttpIdentityDirectory {
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
impl IdentityDirectory for HttpIdentityDirectory {
    async fn get_user(&self, user_id: i32) -> AppResult<UserRecord> {
        let url = format!("{}/api/users/{}", self.base_url, user_id);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| transport_error(SERVICE_NAME, e))?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(AppError::UserNotFound(user_id)),
            status if status.is_server_error() => {
                tracing::error!("{} returned {}", SERVICE_NAME, status);
                Err(AppError::DependencyUnavailable(SERVICE_NAME))
            }
            status if !status.is_success() => Err(AppError::Internal(format!(
                "{} returned unexpected status {}",
                SERVICE_NAME, status
            ))),
            _ => response
                .json::<UserRecord>()
                .await
                .map_err(|e| transport_error(SERVICE_NAME, e)),
        }
    }
}
