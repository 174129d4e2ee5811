#![doc(test(attr(deny(warnings))))]

//! Cookie Tin keeps per-holiday spending sessions, gates over-budget purchases
//! behind a small arithmetic challenge, and persists everything as one blob.

pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod errors;
pub mod storage;
pub mod utils;

pub use crate::core::{AddOutcome, BudgetGate, LedgerManager};
pub use crate::domain::{Expense, ExpenseCandidate, OpenSession, Session, SettingsUpdate};
pub use crate::errors::{Result, TinError};

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Cookie Tin tracing initialized.");
    });
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_does_not_panic() {
        super::init();
        super::init();
    }
}
