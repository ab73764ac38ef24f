//! Domain models, shared types, configuration, and error definitions.
//!
//! Foundation crate -- no async dependencies.

pub mod config;
pub mod error;
pub mod types;

pub use config::SyncConfig;
pub use error::{SyncError, SyncResult};
pub use types::{
    Action, CalendarDay, DayKey, DayRoster, ExemptSet, Outcome, OutcomeStatus, RosterTable,
    RunReport, RunWindow, UserId, WorkItem, WorkPlan,
};
