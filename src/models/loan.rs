//! Loan model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Lifecycle status of a loan.
///
/// `Overdue` is a derived classification: it means the loan was observed
/// past its due time while still active. It is persisted lazily (by the
/// overdue sweep) and never blocks a return or an extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum LoanStatus {
    Active,
    Returned,
    Overdue,
}

impl LoanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanStatus::Active => "ACTIVE",
            LoanStatus::Returned => "RETURNED",
            LoanStatus::Overdue => "OVERDUE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ACTIVE" => Some(LoanStatus::Active),
            "RETURNED" => Some(LoanStatus::Returned),
            "OVERDUE" => Some(LoanStatus::Overdue),
            _ => None,
        }
    }
}

/// Loan record as persisted in the ledger
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Loan {
    pub id: i32,
    pub user_id: i32,
    pub item_id: i32,
    pub issue_time: DateTime<Utc>,
    pub due_time: DateTime<Utc>,
    pub return_time: Option<DateTime<Utc>>,
    pub status: LoanStatus,
    pub extension_count: i16,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Loan {
    /// Status as observed at `now`.
    ///
    /// Pure function of (persisted status, due_time, now): a returned loan
    /// stays returned, anything else past its due time reads as overdue.
    /// The persisted column may lag behind this value until the next sweep;
    /// it may also say OVERDUE for a loan whose due time was extended since,
    /// in which case the derived value wins.
    pub fn status_at(&self, now: DateTime<Utc>) -> LoanStatus {
        match self.status {
            LoanStatus::Returned => LoanStatus::Returned,
            LoanStatus::Active | LoanStatus::Overdue => {
                if self.due_time < now {
                    LoanStatus::Overdue
                } else {
                    LoanStatus::Active
                }
            }
        }
    }

    /// Whether the loan still counts as holding the item.
    pub fn is_open(&self) -> bool {
        self.status != LoanStatus::Returned
    }
}

/// Fields for inserting a new loan into the ledger
#[derive(Debug, Clone)]
pub struct NewLoan {
    pub user_id: i32,
    pub item_id: i32,
    pub due_time: DateTime<Utc>,
}

/// User summary fetched from the Identity Directory for display.
/// Placeholder values are substituted when the directory cannot be reached.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserSummary {
    pub id: i32,
    pub name: String,
    pub email: String,
}

impl UserSummary {
    pub fn unknown(id: i32) -> Self {
        Self {
            id,
            name: "unknown".to_string(),
            email: "unknown".to_string(),
        }
    }
}

/// Item summary fetched from the Item Catalog for display.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ItemSummary {
    pub id: i32,
    pub title: String,
    pub author: String,
}

impl ItemSummary {
    pub fn unknown(id: i32) -> Self {
        Self {
            id,
            title: "unknown".to_string(),
            author: "unknown".to_string(),
        }
    }
}

/// Loan enriched with user and item details for display
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoanWithDetails {
    pub id: i32,
    pub user: UserSummary,
    pub item: ItemSummary,
    pub issue_time: DateTime<Utc>,
    pub due_time: DateTime<Utc>,
    pub return_time: Option<DateTime<Utc>>,
    pub status: LoanStatus,
    pub extension_count: i16,
}

impl LoanWithDetails {
    /// Combine a ledger row with (possibly placeholder) remote summaries,
    /// reporting the status as derived at `now`.
    pub fn assemble(loan: &Loan, user: UserSummary, item: ItemSummary, now: DateTime<Utc>) -> Self {
        Self {
            id: loan.id,
            user,
            item,
            issue_time: loan.issue_time,
            due_time: loan.due_time,
            return_time: loan.return_time,
            status: loan.status_at(now),
            extension_count: loan.extension_count,
        }
    }
}
