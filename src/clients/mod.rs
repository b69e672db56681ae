//! HTTP clients for the remote collaborator services.
//!
//! Each collaborator is modeled as a narrow trait so the lifecycle manager
//! can be exercised in tests with in-memory substitutes. The HTTP
//! implementations are thin: one attempt per call with a bounded timeout,
//! no automatic retry (a blind retry of a non-idempotent availability
//! adjustment could double-count).

pub mod catalog;
pub mod directory;

pub use catalog::{AdjustOperation, HttpItemCatalog, ItemCatalog, ItemRecord};
pub use directory::{HttpIdentityDirectory, IdentityDirectory, UserRecord};

use crate::error::AppError;

/// Classify a transport-level failure (timeout, connection refused, bad
/// body) as the named dependency being unavailable.
pub(crate) fn transport_error(service: &'static str, err: reqwest::Error) -> AppError {
    tracing::error!("Error calling {}: {}", service, err);
    AppError::DependencyUnavailable(service)
}
