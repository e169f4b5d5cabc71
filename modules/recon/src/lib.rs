pub mod config;
pub mod db;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;

pub use routes::{router, AppState};
pub use services::reconciliation::{reconcile, ReconcileError, ReconcileOutcome};
pub use store::{
    ApplyOutcome, InMemoryStore, LedgerApply, LedgerError, LedgerStore, OrderTransition, PgStore,
};
