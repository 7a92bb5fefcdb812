//! Request handlers

pub mod contracts;
pub mod fleet;
pub mod health;
pub mod invoices;
pub mod reports;
