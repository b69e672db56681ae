//! Ledger layer for loan persistence

pub mod loans;

pub use loans::PgLoanLedger;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    error::AppResult,
    models::loan::{Loan, LoanStatus, NewLoan},
};

/// Durable store of loan records.
///
/// Write operations that depend on the loan's prior state take the form of
/// conditional updates: the store asserts the expected state together with
/// the write, so two racing requests on the same loan cannot both succeed.
/// A plain read-then-write would be a race.
#[async_trait]
pub trait LoanLedger: Send + Sync {
    /// Insert a new ACTIVE loan. Fails with `DuplicateActiveLoan` when an
    /// active loan for the same (user, item) already exists, including when
    /// a concurrent insert wins the race.
    async fn insert(&self, new_loan: &NewLoan) -> AppResult<Loan>;

    async fn get_by_id(&self, loan_id: i32) -> AppResult<Option<Loan>>;

    /// Active loan for (user, item), if any.
    async fn find_active(&self, user_id: i32, item_id: i32) -> AppResult<Option<Loan>>;

    /// Transition an ACTIVE or OVERDUE loan to RETURNED. Returns `None`
    /// when the loan is missing or no longer open.
    async fn mark_returned(
        &self,
        loan_id: i32,
        returned_at: DateTime<Utc>,
    ) -> AppResult<Option<Loan>>;

    /// Advance the due time by `extension_days` and bump the extension
    /// count, provided the loan is still open and under `max_extensions`.
    /// Returns `None` when the conditions no longer hold.
    async fn extend(
        &self,
        loan_id: i32,
        extension_days: i32,
        max_extensions: i16,
    ) -> AppResult<Option<Loan>>;

    /// Physically delete a loan row. Only used to compensate a failed
    /// reservation during create; loans are otherwise retained for audit.
    async fn delete(&self, loan_id: i32) -> AppResult<()>;

    /// All loans for a user, newest first.
    async fn list_for_user(&self, user_id: i32) -> AppResult<Vec<Loan>>;

    /// Paginated listing with optional status filter.
    async fn list(
        &self,
        page: i64,
        per_page: i64,
        status: Option<LoanStatus>,
    ) -> AppResult<(Vec<Loan>, i64)>;

    /// Relabel ACTIVE loans past their due time as OVERDUE. Idempotent:
    /// already-relabeled loans do not match. Returns the number relabeled.
    async fn mark_overdue(&self, now: DateTime<Utc>) -> AppResult<u64>;

    /// All loans currently labeled OVERDUE, soonest due first.
    async fn list_overdue(&self) -> AppResult<Vec<Loan>>;
}
