//! Postgres-backed loan ledger

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::{
    error::{AppError, AppResult},
    models::loan::{Loan, LoanStatus, NewLoan},
};

use super::LoanLedger;

const LOAN_COLUMNS: &str = "id, user_id, item_id, issue_time, due_time, return_time, \
     status, extension_count, created_at, updated_at";

#[derive(Clone)]
pub struct PgLoanLedger {
    pool: PgPool,
}

impl PgLoanLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn loan_from_row(row: &PgRow) -> AppResult<Loan> {
    let status_raw: String = row.get("status");
    let status = LoanStatus::parse(&status_raw).ok_or_else(|| {
        AppError::Internal(format!("Unknown loan status '{}' in ledger", status_raw))
    })?;

    Ok(Loan {
        id: row.get("id"),
        user_id: row.get("user_id"),
        item_id: row.get("item_id"),
        issue_time: row.get("issue_time"),
        due_time: row.get("due_time"),
        return_time: row.get("return_time"),
        status,
        extension_count: row.get("extension_count"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

/// Unique violation on the partial index guarding one active loan per
/// (user, item).
fn is_duplicate_active(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db) if db.constraint() == Some("idx_loans_unique_active")
    )
}

#[async_trait]
impl LoanLedger for PgLoanLedger {
    async fn insert(&self, new_loan: &NewLoan) -> AppResult<Loan> {
        let query = format!(
            "INSERT INTO loans (user_id, item_id, due_time)
             VALUES ($1, $2, $3)
             RETURNING {}",
            LOAN_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(new_loan.user_id)
            .bind(new_loan.item_id)
            .bind(new_loan.due_time)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if is_duplicate_active(&e) {
                    AppError::DuplicateActiveLoan {
                        user_id: new_loan.user_id,
                        item_id: new_loan.item_id,
                    }
                } else {
                    AppError::Database(e)
                }
            })?;

        loan_from_row(&row)
    }

    async fn get_by_id(&self, loan_id: i32) -> AppResult<Option<Loan>> {
        let query = format!("SELECT {} FROM loans WHERE id = $1", LOAN_COLUMNS);

        let row = sqlx::query(&query)
            .bind(loan_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(loan_from_row).transpose()
    }

    async fn find_active(&self, user_id: i32, item_id: i32) -> AppResult<Option<Loan>> {
        let query = format!(
            "SELECT {} FROM loans
             WHERE user_id = $1 AND item_id = $2 AND status = 'ACTIVE'",
            LOAN_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(user_id)
            .bind(item_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(loan_from_row).transpose()
    }

    async fn mark_returned(
        &self,
        loan_id: i32,
        returned_at: DateTime<Utc>,
    ) -> AppResult<Option<Loan>> {
        // The status predicate is part of the UPDATE so a concurrent return
        // of the same loan matches zero rows instead of double-returning.
        let query = format!(
            "UPDATE loans
             SET status = 'RETURNED', return_time = $2, updated_at = NOW()
             WHERE id = $1 AND status IN ('ACTIVE', 'OVERDUE')
             RETURNING {}",
            LOAN_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(loan_id)
            .bind(returned_at)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(loan_from_row).transpose()
    }

    async fn extend(
        &self,
        loan_id: i32,
        extension_days: i32,
        max_extensions: i16,
    ) -> AppResult<Option<Loan>> {
        // Resets OVERDUE back to ACTIVE: the new due time is in the future,
        // and the next sweep would only relabel it if that stops being true.
        let query = format!(
            "UPDATE loans
             SET due_time = due_time + make_interval(days => $2),
                 extension_count = extension_count + 1,
                 status = 'ACTIVE',
                 updated_at = NOW()
             WHERE id = $1
               AND status IN ('ACTIVE', 'OVERDUE')
               AND extension_count < $3
             RETURNING {}",
            LOAN_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(loan_id)
            .bind(extension_days)
            .bind(max_extensions)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(loan_from_row).transpose()
    }

    async fn delete(&self, loan_id: i32) -> AppResult<()> {
        sqlx::query("DELETE FROM loans WHERE id = $1")
            .bind(loan_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn list_for_user(&self, user_id: i32) -> AppResult<Vec<Loan>> {
        let query = format!(
            "SELECT {} FROM loans WHERE user_id = $1 ORDER BY issue_time DESC",
            LOAN_COLUMNS
        );

        let rows = sqlx::query(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(loan_from_row).collect()
    }

    async fn list(
        &self,
        page: i64,
        per_page: i64,
        status: Option<LoanStatus>,
    ) -> AppResult<(Vec<Loan>, i64)> {
        let offset = (page - 1) * per_page;

        let (rows, total) = match status {
            Some(status) => {
                let query = format!(
                    "SELECT {} FROM loans WHERE status = $1
                     ORDER BY issue_time DESC LIMIT $2 OFFSET $3",
                    LOAN_COLUMNS
                );
                let rows = sqlx::query(&query)
                    .bind(status.as_str())
                    .bind(per_page)
                    .bind(offset)
                    .fetch_all(&self.pool)
                    .await?;
                let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM loans WHERE status = $1")
                    .bind(status.as_str())
                    .fetch_one(&self.pool)
                    .await?;
                (rows, total)
            }
            None => {
                let query = format!(
                    "SELECT {} FROM loans ORDER BY issue_time DESC LIMIT $1 OFFSET $2",
                    LOAN_COLUMNS
                );
                let rows = sqlx::query(&query)
                    .bind(per_page)
                    .bind(offset)
                    .fetch_all(&self.pool)
                    .await?;
                let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM loans")
                    .fetch_one(&self.pool)
                    .await?;
                (rows, total)
            }
        };

        let loans = rows.iter().map(loan_from_row).collect::<AppResult<_>>()?;
        Ok((loans, total))
    }

    async fn mark_overdue(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE loans
             SET status = 'OVERDUE', updated_at = NOW()
             WHERE status = 'ACTIVE' AND due_time < $1",
        )
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn list_overdue(&self) -> AppResult<Vec<Loan>> {
        let query = format!(
            "SELECT {} FROM loans WHERE status = 'OVERDUE' ORDER BY due_time ASC",
            LOAN_COLUMNS
        );

        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;

        rows.iter().map(loan_from_row).collect()
    }
}
