//! Where run reports go once a run completes.
//!
//! - [`telegram::TelegramNotifier`]: chat summary via the Bot API
//! - [`json_stream::JsonStreamSink`]: NDJSON audit rows to any `Write` impl
//!
//! Two audit row schemas:
//! - [`RunSummaryRow`]: one per run
//! - [`OutcomeRow`]: one per attempted grant/revoke, in attempt order

pub mod json_stream;
pub mod telegram;

use async_trait::async_trait;
use seatsync_core::error::SyncResult;
use seatsync_core::RunReport;
use serde::Serialize;

/// Delivers a finished report. Failures here never undo a run.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, report: &RunReport) -> SyncResult<()>;
}

// ---------------------------------------------------------------------------
// Serializable row types
// ---------------------------------------------------------------------------

/// One row per run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummaryRow {
    pub started_at: String,
    pub today: String,
    pub yesterday: String,
    pub revoke_attempted: u32,
    pub revoke_succeeded: u32,
    pub grant_attempted: u32,
    pub grant_succeeded: u32,
    pub exempt_users: Vec<String>,
    pub exempted_this_run: Vec<String>,
}

/// One row per attempted work item.
#[derive(Debug, Clone, Serialize)]
pub struct OutcomeRow {
    pub started_at: String,
    pub seq: u32,
    pub user: String,
    pub action: String,
    pub status: String,
    pub detail: String,
}

// ---------------------------------------------------------------------------
// Builder: RunReport → Rows
// ---------------------------------------------------------------------------

/// Flatten a report into sink-ready rows.
pub fn to_rows(report: &RunReport) -> (RunSummaryRow, Vec<OutcomeRow>) {
    let started_at = report.started_at.to_rfc3339();

    let summary = RunSummaryRow {
        started_at: started_at.clone(),
        today: report.window.today.date.to_string(),
        yesterday: report.window.yesterday.date.to_string(),
        revoke_attempted: report.revoke_attempted as u32,
        revoke_succeeded: report.revoke_succeeded as u32,
        grant_attempted: report.grant_attempted as u32,
        grant_succeeded: report.grant_succeeded as u32,
        exempt_users: report.exempt_users.iter().map(|u| u.to_string()).collect(),
        exempted_this_run: report
            .exempted_this_run
            .iter()
            .map(|u| u.to_string())
            .collect(),
    };

    let outcomes = report
        .outcomes
        .iter()
        .enumerate()
        .map(|(i, o)| OutcomeRow {
            started_at: started_at.clone(),
            seq: i as u32 + 1,
            user: o.user.to_string(),
            action: o.action.to_string(),
            status: o.status.to_string(),
            detail: o.detail.clone(),
        })
        .collect();

    (summary, outcomes)
}
