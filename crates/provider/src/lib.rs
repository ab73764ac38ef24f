//! External collaborators of the reconciler: wall-clock calendar, roster
//! source, and the license pool.

pub mod calendar;
pub mod schedule;
pub mod zoom;

use async_trait::async_trait;
use seatsync_core::error::SyncResult;
use seatsync_core::{CalendarDay, RosterTable, UserId};

pub use schedule::ScheduleRosterProvider;
pub use zoom::ZoomActuator;

/// Supplies day rosters with exam overrides already applied for `days`.
///
/// An `Err` or an empty table means no reconciliation can happen.
#[async_trait]
pub trait RosterProvider: Send + Sync {
    async fn get_roster(&self, days: &[CalendarDay]) -> SyncResult<RosterTable>;
}

/// What the license pool answered for a grant or revoke.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actuation {
    Applied,
    Rejected { reason: String },
}

/// Grant/revoke against the license pool.
///
/// `Err` means the call itself failed; `Rejected` means the pool refused.
#[async_trait]
pub trait LicenseActuator: Send + Sync {
    async fn grant(&self, user: &UserId) -> SyncResult<Actuation>;
    async fn revoke(&self, user: &UserId) -> SyncResult<Actuation>;
}
