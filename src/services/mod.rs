//! Business logic layer

pub mod availability;
pub mod loans;

pub use availability::{AvailabilityCoordinator, ReconciliationEntry, ReconciliationLog};
pub use loans::LoansService;

use std::sync::Arc;

use crate::{
    clients::{HttpIdentityDirectory, HttpItemCatalog},
    config::AppConfig,
    error::AppResult,
    repository::PgLoanLedger,
};

/// Container wiring the services to their collaborators.
pub struct Services {
    pub loans: LoansService,
    pub reconciliation: Arc<ReconciliationLog>,
}

impl Services {
    pub fn new(pool: sqlx::PgPool, config: &AppConfig) -> AppResult<Self> {
        let ledger = Arc::new(PgLoanLedger::new(pool));
        let directory = Arc::new(HttpIdentityDirectory::new(&config.directory)?);
        let catalog = Arc::new(HttpItemCatalog::new(&config.catalog)?);
        let reconciliation = Arc::new(ReconciliationLog::default());

        let loans = LoansService::new(
            ledger,
            directory,
            catalog,
            reconciliation.clone(),
            config.policy.clone(),
        );

        Ok(Self {
            loans,
            reconciliation,
        })
    }
}
