//! Circulate - Loan Lifecycle Service
//!
//! REST JSON API for issuing, returning and extending loans of physical
//! items. Loan records live in the local ledger; user and item records are
//! owned by the Identity Directory and Item Catalog services, reached over
//! HTTP.

use std::sync::Arc;

pub mod api;
pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
    pub pool: sqlx::PgPool,
}
