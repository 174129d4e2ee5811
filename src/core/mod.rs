pub mod clock;
pub mod gate;
pub mod ledger_manager;
pub mod lookup;
pub mod metrics;
pub mod services;

pub use clock::{Clock, FixedClock, SystemClock};
pub use gate::{BudgetGate, Challenge, Decision, PendingChallenge, Resolution};
pub use ledger_manager::{AddOutcome, LedgerManager};
pub use lookup::{CatalogEntry, CatalogLookup, LookupError, LookupResult, NutritionLookup};
pub use metrics::{SessionMetrics, SpendLevel};
