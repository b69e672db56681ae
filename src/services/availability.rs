//! Availability coordination against the Item Catalog.
//!
//! Reserving (decrement on create) and releasing (increment on return) are
//! the two halves of the cross-service hand-off. They fail differently on
//! purpose: a failed reserve aborts the create, while a failed release must
//! not un-return the loan, so it lands in the reconciliation journal
//! instead.

use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};

use crate::{
    clients::{AdjustOperation, ItemCatalog},
    error::AppResult,
};

/// A release adjustment that never reached the catalog. The loan is already
/// RETURNED; an operator replays the increment from this record.
#[derive(Debug, Clone)]
pub struct ReconciliationEntry {
    pub loan_id: i32,
    pub item_id: i32,
    pub recorded_at: DateTime<Utc>,
    pub reason: String,
}

/// In-process journal of failed releases.
#[derive(Debug, Default)]
pub struct ReconciliationLog {
    entries: Mutex<Vec<ReconciliationEntry>>,
}

impl ReconciliationLog {
    pub fn record(&self, entry: ReconciliationEntry) {
        tracing::warn!(
            target: "reconciliation",
            loan_id = entry.loan_id,
            item_id = entry.item_id,
            reason = %entry.reason,
            "Availability release failed; manual adjustment required"
        );
        self.entries.lock().unwrap().push(entry);
    }

    pub fn entries(&self) -> Vec<ReconciliationEntry> {
        self.entries.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Pairs the catalog adjustments with their failure policies.
#[derive(Clone)]
pub struct AvailabilityCoordinator {
    catalog: Arc<dyn ItemCatalog>,
    reconciliation: Arc<ReconciliationLog>,
}

impl AvailabilityCoordinator {
    pub fn new(catalog: Arc<dyn ItemCatalog>, reconciliation: Arc<ReconciliationLog>) -> Self {
        Self {
            catalog,
            reconciliation,
        }
    }

    /// Decrement the item's availability. Errors propagate; the caller is
    /// responsible for compensating whatever it did before reserving.
    pub async fn reserve(&self, item_id: i32) -> AppResult<i32> {
        self.catalog
            .adjust_availability(item_id, AdjustOperation::Decrement)
            .await
    }

    /// Increment the item's availability. Failures are journaled, never
    /// propagated: the return already happened and must stand.
    pub async fn release(&self, loan_id: i32, item_id: i32) {
        if let Err(e) = self
            .catalog
            .adjust_availability(item_id, AdjustOperation::Increment)
            .await
        {
            self.reconciliation.record(ReconciliationEntry {
                loan_id,
                item_id,
                recorded_at: Utc::now(),
                reason: e.to_string(),
            });
        }
    }
}
