//! One reconciliation run, end to end.
//!
//! Pipeline: fetch rosters -> reconcile -> execute -> report -> notify.
//!
//! Only a roster failure aborts the run, and it does so before any license
//! call is made. Per-user failures live in the report; notifier failures are
//! logged and otherwise ignored.

use crate::executor::Executor;
use crate::reconcile::Reconciler;
use crate::sink::Notifier;
use chrono::Local;
use seatsync_core::error::{SyncError, SyncResult};
use seatsync_core::{DayRoster, RunReport, RunWindow, WorkPlan};
use seatsync_provider::{LicenseActuator, RosterProvider};

/// Collaborators for a run. Built once at startup from the configuration.
pub struct RunContext<'a> {
    pub roster: &'a dyn RosterProvider,
    pub actuator: &'a dyn LicenseActuator,
    pub reconciler: &'a Reconciler,
    pub notifier: Option<&'a dyn Notifier>,
}

/// Resolved rosters for the run window.
#[derive(Debug, Clone)]
pub struct WindowRosters {
    pub today: DayRoster,
    pub yesterday: DayRoster,
}

/// Fetch today's and yesterday's rosters.
///
/// Fails with [`SyncError::Roster`] when the provider errors or hands back no
/// day entries at all. An entry that exists but is empty is a real roster.
pub async fn fetch_rosters(
    roster: &dyn RosterProvider,
    window: &RunWindow,
) -> SyncResult<WindowRosters> {
    let table = roster.get_roster(&window.days()).await?;
    if table.is_empty() {
        return Err(SyncError::Roster("roster source returned no days".into()));
    }

    let rosters = WindowRosters {
        today: table.roster_for(window.today.key),
        yesterday: table.roster_for(window.yesterday.key),
    };

    tracing::info!(
        today = %window.today.key,
        today_users = rosters.today.len(),
        yesterday = %window.yesterday.key,
        yesterday_users = rosters.yesterday.len(),
        "rosters resolved"
    );
    Ok(rosters)
}

/// Rosters plus reconciliation, without touching the license pool.
pub async fn plan(
    roster: &dyn RosterProvider,
    reconciler: &Reconciler,
    window: &RunWindow,
) -> SyncResult<WorkPlan> {
    let rosters = fetch_rosters(roster, window).await?;
    let plan = reconciler.reconcile(&rosters.today, &rosters.yesterday);

    for user in &plan.exempted {
        tracing::info!(user = %user, "exempt from revocation");
    }
    tracing::info!(
        revoke = plan.revoke.len(),
        grant = plan.grant.len(),
        exempted = plan.exempted.len(),
        "plan ready"
    );
    Ok(plan)
}

/// Execute a full run for `window`.
pub async fn run_once(ctx: &RunContext<'_>, window: &RunWindow) -> SyncResult<RunReport> {
    let started_at = Local::now().fixed_offset();
    tracing::info!(today = %window.today.date, yesterday = %window.yesterday.date, "starting run");

    let plan = match plan(ctx.roster, ctx.reconciler, window).await {
        Ok(plan) => plan,
        Err(e) => {
            tracing::error!(error = %e, "cannot reconcile without a roster; no changes made");
            return Err(e);
        }
    };

    let outcomes = Executor::new(ctx.actuator).execute(&plan).await;
    let report = RunReport::build(
        started_at,
        *window,
        ctx.reconciler.exempt(),
        &plan,
        outcomes,
    );

    tracing::info!(
        revoke_succeeded = report.revoke_succeeded,
        revoke_attempted = report.revoke_attempted,
        grant_succeeded = report.grant_succeeded,
        grant_attempted = report.grant_attempted,
        failures = report.failure_count(),
        "run complete"
    );

    if let Some(notifier) = ctx.notifier {
        if let Err(e) = notifier.notify(&report).await {
            tracing::warn!(error = %e, "report delivery failed; license changes stand");
        }
    }

    Ok(report)
}
