//! Roster reconciliation engine, run executor, report renderer, and sinks.

pub mod executor;
pub mod reconcile;
pub mod reporter;
pub mod run;
pub mod sink;

pub use executor::Executor;
pub use reconcile::Reconciler;
pub use run::{run_once, RunContext};
