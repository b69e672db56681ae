//! Loan lifecycle management.
//!
//! The service owns the ordering of each operation's steps across the
//! ledger and the two remote collaborators. Creation runs as a small saga:
//! the loan row is written first, then the availability reservation; a
//! failed reservation triggers a compensating delete of the row. Returns
//! invert the order of strictness: once the row is RETURNED the release
//! adjustment may fail without undoing anything.

use chrono::{Duration, Utc};
use std::sync::Arc;

use crate::{
    clients::{IdentityDirectory, ItemCatalog},
    config::PolicyConfig,
    error::{AppError, AppResult},
    models::loan::{ItemSummary, Loan, LoanStatus, LoanWithDetails, NewLoan, UserSummary},
    repository::LoanLedger,
};

use super::availability::{AvailabilityCoordinator, ReconciliationLog};

pub struct LoansService {
    ledger: Arc<dyn LoanLedger>,
    directory: Arc<dyn IdentityDirectory>,
    catalog: Arc<dyn ItemCatalog>,
    availability: AvailabilityCoordinator,
    policy: PolicyConfig,
}

impl LoansService {
    pub fn new(
        ledger: Arc<dyn LoanLedger>,
        directory: Arc<dyn IdentityDirectory>,
        catalog: Arc<dyn ItemCatalog>,
        reconciliation: Arc<ReconciliationLog>,
        policy: PolicyConfig,
    ) -> Self {
        let availability = AvailabilityCoordinator::new(catalog.clone(), reconciliation);
        Self {
            ledger,
            directory,
            catalog,
            availability,
            policy,
        }
    }

    /// Issue a loan: validate the user and the item, insert the ACTIVE row,
    /// then reserve a copy. A failed reservation deletes the row again so
    /// no loan exists without a reserved copy.
    ///
    /// The cheap precondition checks run before the insert; they are
    /// advisory under concurrency. The ledger's unique constraint and the
    /// catalog's own bounds check are what actually hold.
    pub async fn create_loan(
        &self,
        user_id: i32,
        item_id: i32,
        due_time: Option<chrono::DateTime<Utc>>,
    ) -> AppResult<Loan> {
        tracing::info!(user_id, item_id, "Creating loan");

        let now = Utc::now();
        if let Some(due) = due_time {
            if due <= now {
                return Err(AppError::Validation(
                    "due_time must be in the future".to_string(),
                ));
            }
        }

        self.directory.get_user(user_id).await?;

        let item = self.catalog.get_item(item_id).await?;
        if item.available_count <= 0 {
            tracing::warn!(item_id, "Item has no available copies");
            return Err(AppError::ItemUnavailable(item_id));
        }

        if self.ledger.find_active(user_id, item_id).await?.is_some() {
            tracing::warn!(user_id, item_id, "User already holds this item");
            return Err(AppError::DuplicateActiveLoan { user_id, item_id });
        }

        let due_time =
            due_time.unwrap_or_else(|| now + Duration::days(self.policy.default_loan_days));

        let loan = self
            .ledger
            .insert(&NewLoan {
                user_id,
                item_id,
                due_time,
            })
            .await?;

        if let Err(reserve_err) = self.availability.reserve(item_id).await {
            tracing::warn!(
                loan_id = loan.id,
                item_id,
                "Reservation failed; rolling back loan"
            );
            if let Err(delete_err) = self.ledger.delete(loan.id).await {
                // The orphan row is harmless to availability accounting but
                // blocks this user from re-borrowing until cleaned up.
                tracing::error!(
                    loan_id = loan.id,
                    error = %delete_err,
                    "Failed to roll back loan after reservation failure"
                );
            }
            return Err(reserve_err);
        }

        tracing::info!(loan_id = loan.id, due_time = %loan.due_time, "Loan created");
        Ok(loan)
    }

    /// Close a loan and release its copy back to the catalog. The release
    /// is fire-and-record: a catalog outage leaves the loan RETURNED and a
    /// reconciliation entry behind.
    pub async fn return_loan(&self, loan_id: i32) -> AppResult<Loan> {
        tracing::info!(loan_id, "Returning loan");

        if self.ledger.get_by_id(loan_id).await?.is_none() {
            return Err(AppError::LoanNotFound(loan_id));
        }

        let loan = self
            .ledger
            .mark_returned(loan_id, Utc::now())
            .await?
            .ok_or(AppError::LoanNotActive(loan_id))?;

        self.availability.release(loan.id, loan.item_id).await;

        tracing::info!(loan_id, "Loan returned");
        Ok(loan)
    }

    /// Push the due time out by `days` (policy default when unspecified).
    /// Purely local: no collaborator is consulted. A loan the sweep already
    /// relabeled OVERDUE becomes ACTIVE again.
    pub async fn extend_loan(&self, loan_id: i32, days: Option<i64>) -> AppResult<Loan> {
        let days = days.unwrap_or(self.policy.extension_days);
        tracing::info!(loan_id, days, "Extending loan");

        let loan = self
            .ledger
            .get_by_id(loan_id)
            .await?
            .ok_or(AppError::LoanNotFound(loan_id))?;

        if !loan.is_open() {
            return Err(AppError::LoanNotActive(loan_id));
        }
        if loan.extension_count >= self.policy.max_extensions {
            return Err(AppError::MaxExtensionsReached(loan_id));
        }

        match self
            .ledger
            .extend(loan_id, days as i32, self.policy.max_extensions)
            .await?
        {
            Some(updated) => {
                tracing::info!(loan_id, due_time = %updated.due_time, "Loan extended");
                Ok(updated)
            }
            // Lost a race since the read above; re-read to classify.
            None => match self.ledger.get_by_id(loan_id).await? {
                Some(current) if !current.is_open() => Err(AppError::LoanNotActive(loan_id)),
                Some(_) => Err(AppError::MaxExtensionsReached(loan_id)),
                None => Err(AppError::LoanNotFound(loan_id)),
            },
        }
    }

    pub async fn get_loan(&self, loan_id: i32) -> AppResult<Loan> {
        self.ledger
            .get_by_id(loan_id)
            .await?
            .ok_or(AppError::LoanNotFound(loan_id))
    }

    /// Loan enriched with user and item summaries. Collaborator failures
    /// degrade to placeholder summaries rather than failing the read.
    pub async fn get_loan_with_details(&self, loan_id: i32) -> AppResult<LoanWithDetails> {
        let loan = self.get_loan(loan_id).await?;

        let user = match self.directory.get_user(loan.user_id).await {
            Ok(record) => UserSummary {
                id: record.id,
                name: record.name,
                email: record.email,
            },
            Err(e) => {
                tracing::warn!(loan_id, error = %e, "Falling back to placeholder user details");
                UserSummary::unknown(loan.user_id)
            }
        };

        let item = self.item_summary(loan.item_id).await;

        Ok(LoanWithDetails::assemble(&loan, user, item, Utc::now()))
    }

    /// All loans for a user, enriched. The user must exist; item lookups
    /// degrade to placeholders per loan.
    pub async fn get_user_loans(&self, user_id: i32) -> AppResult<Vec<LoanWithDetails>> {
        let record = self.directory.get_user(user_id).await?;
        let user = UserSummary {
            id: record.id,
            name: record.name,
            email: record.email,
        };

        let loans = self.ledger.list_for_user(user_id).await?;
        let now = Utc::now();

        let mut result = Vec::with_capacity(loans.len());
        for loan in &loans {
            let item = self.item_summary(loan.item_id).await;
            result.push(LoanWithDetails::assemble(loan, user.clone(), item, now));
        }
        Ok(result)
    }

    /// Paginated listing. Statuses are reported as derived at read time;
    /// the `status` filter matches the stored label, which may lag until
    /// the next sweep.
    pub async fn list_loans(
        &self,
        page: i64,
        per_page: i64,
        status: Option<LoanStatus>,
    ) -> AppResult<(Vec<Loan>, i64)> {
        let (mut loans, total) = self
            .ledger
            .list(page.max(1), per_page.clamp(1, 100), status)
            .await?;

        let now = Utc::now();
        for loan in &mut loans {
            loan.status = loan.status_at(now);
        }
        Ok((loans, total))
    }

    /// Relabel then list: loans past due are persisted as OVERDUE on the
    /// way through, so the listing and the stored status agree.
    pub async fn overdue_loans(&self) -> AppResult<Vec<Loan>> {
        let relabeled = self.sweep_overdue().await?;
        if relabeled > 0 {
            tracing::info!(relabeled, "Relabeled loans as overdue");
        }
        self.ledger.list_overdue().await
    }

    /// One pass of the overdue relabeling. Also driven periodically by the
    /// background task when configured.
    pub async fn sweep_overdue(&self) -> AppResult<u64> {
        self.ledger.mark_overdue(Utc::now()).await
    }

    async fn item_summary(&self, item_id: i32) -> ItemSummary {
        match self.catalog.get_item(item_id).await {
            Ok(record) => ItemSummary {
                id: record.id,
                title: record.title,
                author: record.author.unwrap_or_else(|| "unknown".to_string()),
            },
            Err(e) => {
                tracing::warn!(item_id, error = %e, "Falling back to placeholder item details");
                ItemSummary::unknown(item_id)
            }
        }
    }
}
