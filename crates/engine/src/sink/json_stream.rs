//! NDJSON (newline-delimited JSON) audit sink.
//!
//! ```ignore
//! let mut sink = JsonStreamSink::stdout();
//! sink.write_report(&report)?;
//! sink.finish()?;
//! ```

use super::{to_rows, OutcomeRow, RunSummaryRow};
use seatsync_core::RunReport;
use serde::Serialize;
use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::str::FromStr;

/// Where audit rows go: `ndjson` (stdout) or `ndjson:<path>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditTarget {
    Stdout,
    File(PathBuf),
}

impl AuditTarget {
    /// Write `report` to the target and return the row count.
    pub fn write(&self, report: &RunReport) -> io::Result<usize> {
        match self {
            AuditTarget::Stdout => {
                let mut sink = JsonStreamSink::stdout();
                sink.write_report(report)?;
                sink.finish()
            }
            AuditTarget::File(path) => {
                let mut sink = JsonStreamSink::new(File::create(path)?);
                sink.write_report(report)?;
                sink.finish()
            }
        }
    }
}

impl FromStr for AuditTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            None if s == "ndjson" => Ok(AuditTarget::Stdout),
            Some(("ndjson", path)) if !path.is_empty() => Ok(AuditTarget::File(path.into())),
            _ => Err(format!("Unknown sink: {s}. Use 'ndjson' or 'ndjson:/path'")),
        }
    }
}

impl fmt::Display for AuditTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditTarget::Stdout => f.write_str("ndjson"),
            AuditTarget::File(path) => write!(f, "ndjson:{}", path.display()),
        }
    }
}

/// Buffered NDJSON writer. Each row goes straight to the writer via
/// `serde_json::to_writer`.
pub struct JsonStreamSink<W: Write> {
    writer: BufWriter<W>,
    rows_written: usize,
}

impl JsonStreamSink<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> JsonStreamSink<W> {
    /// Wrap any writer (file, Vec<u8>, etc.).
    pub fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::with_capacity(64 * 1024, writer),
            rows_written: 0,
        }
    }

    /// Summary row followed by one row per outcome.
    pub fn write_report(&mut self, report: &RunReport) -> io::Result<()> {
        let (summary, outcomes) = to_rows(report);
        self.write_summary(&summary)?;
        self.write_outcomes(&outcomes)
    }

    pub fn write_summary(&mut self, row: &RunSummaryRow) -> io::Result<()> {
        self.write_row(row)
    }

    pub fn write_outcomes(&mut self, rows: &[OutcomeRow]) -> io::Result<()> {
        for row in rows {
            self.write_row(row)?;
        }
        Ok(())
    }

    fn write_row<T: Serialize>(&mut self, row: &T) -> io::Result<()> {
        serde_json::to_writer(&mut self.writer, row).map_err(io::Error::other)?;
        self.writer.write_all(b"\n")?;
        self.rows_written += 1;
        Ok(())
    }

    /// Flush and return how many rows were written.
    pub fn finish(mut self) -> io::Result<usize> {
        self.writer.flush()?;
        Ok(self.rows_written)
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, NaiveDate};
    use seatsync_core::{
        Action, CalendarDay, ExemptSet, Outcome, OutcomeStatus, RunWindow, WorkPlan,
    };

    #[test]
    fn audit_target_parses_known_forms_only() {
        assert_eq!("ndjson".parse::<AuditTarget>(), Ok(AuditTarget::Stdout));
        assert_eq!(
            "ndjson:/var/log/seatsync.ndjson".parse::<AuditTarget>(),
            Ok(AuditTarget::File("/var/log/seatsync.ndjson".into()))
        );
        assert!("csv".parse::<AuditTarget>().is_err());
        assert!("ndjson:".parse::<AuditTarget>().is_err());
        assert!("csv:/tmp/out".parse::<AuditTarget>().is_err());
    }

    fn empty_report() -> RunReport {
        RunReport::build(
            Local::now().fixed_offset(),
            RunWindow {
                today: CalendarDay::new(NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()),
                yesterday: CalendarDay::new(NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()),
            },
            &ExemptSet::default(),
            &WorkPlan::default(),
            Vec::new(),
        )
    }

    #[test]
    fn audit_target_writes_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("audit.ndjson");
        let rows = AuditTarget::File(path.clone()).write(&empty_report()).unwrap();

        assert_eq!(rows, 1);
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written.lines().count(), 1);
    }

    #[test]
    fn audit_target_reports_unwritable_file() {
        let target = AuditTarget::File("/nonexistent-dir/seatsync/audit.ndjson".into());
        assert!(target.write(&empty_report()).is_err());
    }

    #[test]
    fn report_becomes_summary_plus_outcome_rows() {
        let window = RunWindow {
            today: CalendarDay::new(NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()),
            yesterday: CalendarDay::new(NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()),
        };
        let plan = WorkPlan {
            revoke: vec!["x@uni.edu".into()],
            grant: vec!["a@uni.edu".into()],
            exempted: vec![],
        };
        let outcomes = vec![
            Outcome {
                user: "x@uni.edu".into(),
                action: Action::Revoke,
                status: OutcomeStatus::Succeeded,
                detail: "ok".into(),
            },
            Outcome {
                user: "a@uni.edu".into(),
                action: Action::Grant,
                status: OutcomeStatus::Rejected,
                detail: "HTTP 404: not found".into(),
            },
        ];
        let report = RunReport::build(
            Local::now().fixed_offset(),
            window,
            &ExemptSet::default(),
            &plan,
            outcomes,
        );

        let mut buf = Vec::new();
        let mut sink = JsonStreamSink::new(&mut buf);
        sink.write_report(&report).unwrap();
        let n = sink.finish().unwrap();
        assert_eq!(n, 3);

        let output = String::from_utf8(buf).unwrap();
        let lines: Vec<serde_json::Value> = output
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["today"], "2026-10-19");
        assert_eq!(lines[0]["grant_attempted"], 1);
        assert_eq!(lines[1]["seq"], 1);
        assert_eq!(lines[1]["action"], "revoke");
        assert_eq!(lines[2]["status"], "rejected");
        assert_eq!(lines[2]["detail"], "HTTP 404: not found");
    }
}
