//! HTTP request handlers organized by domain
//!
//! Each submodule contains handlers for a specific API area.

pub mod audit;
pub mod auth;
pub mod bank_accounts;
pub mod dashboard;
pub mod entities;
pub mod ledger_accounts;
pub mod reports;
pub mod transactions;

// Re-export all handlers for use in router
pub use audit::*;
pub use auth::*;
pub use bank_accounts::*;
pub use dashboard::*;
pub use entities::*;
pub use ledger_accounts::*;
pub use reports::*;
pub use transactions::*;
