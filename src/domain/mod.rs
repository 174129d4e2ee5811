//! Session and expense entities together with their field-level invariants.

pub mod common;
pub mod expense;
pub mod session;

pub use common::Identifiable;
pub use expense::{parse_amount, Expense, ExpenseCandidate};
pub use session::{OpenSession, Session, SettingsUpdate, DEFAULT_CURRENCY_SYMBOL};
