//! Data models

pub mod loan;
