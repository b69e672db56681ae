//! API handlers for the Circulate REST endpoints

pub mod health;
pub mod loans;
pub mod openapi;
