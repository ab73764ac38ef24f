//! Schedule-file roster source with exam-period overrides.
//!
//! The file holds a standing weekly roster plus dated exam periods. While an
//! exam period is active, a day's roster is exactly that date's exam sessions,
//! which may be empty; the standing roster for that weekday is ignored.
//!
//! ```json
//! {
//!   "standing": { "Monday": ["a@uni.edu"], "TUE": ["b@uni.edu"] },
//!   "exam_periods": [
//!     { "name": "Finals", "start": "2026-06-01", "end": "2026-06-12",
//!       "sessions": { "2026-06-02": ["c@uni.edu"] } }
//!   ]
//! }
//! ```

use crate::RosterProvider;
use async_trait::async_trait;
use chrono::NaiveDate;
use seatsync_core::error::{SyncError, SyncResult};
use seatsync_core::{CalendarDay, DayKey, DayRoster, RosterTable, UserId};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// On-disk shape of the schedule file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScheduleFile {
    #[serde(default)]
    pub standing: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub exam_periods: Vec<ExamPeriod>,
}

/// A date range whose days take their roster from `sessions` only.
#[derive(Debug, Clone, Deserialize)]
pub struct ExamPeriod {
    #[serde(default)]
    pub name: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    #[serde(default)]
    pub sessions: BTreeMap<NaiveDate, Vec<String>>,
}

impl ExamPeriod {
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    fn roster_on(&self, date: NaiveDate) -> DayRoster {
        self.sessions
            .get(&date)
            .map(|users| users.iter().map(UserId::new).collect())
            .unwrap_or_default()
    }
}

/// Validated schedule with day names normalized to [`DayKey`].
#[derive(Debug, Clone, Default)]
pub struct Schedule {
    standing: BTreeMap<DayKey, DayRoster>,
    exam_periods: Vec<ExamPeriod>,
}

impl Schedule {
    pub fn parse(raw: &str) -> SyncResult<Self> {
        let file: ScheduleFile = serde_json::from_str(raw)
            .map_err(|e| SyncError::Roster(format!("Failed to parse schedule: {e}")))?;
        Self::from_file(file)
    }

    pub fn from_file(file: ScheduleFile) -> SyncResult<Self> {
        let mut standing: BTreeMap<DayKey, DayRoster> = BTreeMap::new();
        for (name, users) in file.standing {
            let key: DayKey = name.parse().map_err(SyncError::Roster)?;
            // "Monday" and "MON" land on the same key.
            standing
                .entry(key)
                .or_default()
                .extend(users.iter().map(UserId::new));
        }

        let mut exam_periods = file.exam_periods;
        for period in &exam_periods {
            if period.start > period.end {
                return Err(SyncError::Roster(format!(
                    "Exam period '{}' ends ({}) before it starts ({})",
                    period.name, period.end, period.start
                )));
            }
            if let Some(date) = period.sessions.keys().find(|d| !period.covers(**d)) {
                return Err(SyncError::Roster(format!(
                    "Exam period '{}' has a session on {date}, outside {}..={}",
                    period.name, period.start, period.end
                )));
            }
        }

        exam_periods.sort_by_key(|p| p.start);
        for pair in exam_periods.windows(2) {
            if pair[1].start <= pair[0].end {
                return Err(SyncError::Roster(format!(
                    "Exam periods '{}' and '{}' overlap",
                    pair[0].name, pair[1].name
                )));
            }
        }

        Ok(Self {
            standing,
            exam_periods,
        })
    }

    pub fn exam_period_on(&self, date: NaiveDate) -> Option<&ExamPeriod> {
        self.exam_periods.iter().find(|p| p.covers(date))
    }

    /// Roster for one concrete day, exam override first.
    pub fn roster_on(&self, day: CalendarDay) -> DayRoster {
        match self.exam_period_on(day.date) {
            Some(period) => period.roster_on(day.date),
            None => self.standing.get(&day.key).cloned().unwrap_or_default(),
        }
    }

    /// Standing rosters for every weekday, with `days` replaced by their
    /// exam roster where an exam period is active.
    pub fn resolve(&self, days: &[CalendarDay]) -> RosterTable {
        let mut table = RosterTable::new();
        for (key, roster) in &self.standing {
            table.set(*key, roster.clone());
        }

        for day in days {
            if let Some(period) = self.exam_period_on(day.date) {
                let roster = period.roster_on(day.date);
                tracing::info!(
                    date = %day.date,
                    day = %day.key,
                    period = %period.name,
                    users = roster.len(),
                    "exam override active"
                );
                table.set(day.key, roster);
            }
        }

        table
    }
}

/// Reads the schedule file on every call so edits apply to the next run.
pub struct ScheduleRosterProvider {
    path: PathBuf,
}

impl ScheduleRosterProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn load(&self) -> SyncResult<Schedule> {
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            SyncError::Roster(format!(
                "Failed to read schedule {}: {e}",
                self.path.display()
            ))
        })?;
        Schedule::parse(&raw)
    }
}

#[async_trait]
impl RosterProvider for ScheduleRosterProvider {
    async fn get_roster(&self, days: &[CalendarDay]) -> SyncResult<RosterTable> {
        tracing::debug!(path = %self.path.display(), "loading schedule");

        let schedule = self.load().await?;
        let table = schedule.resolve(days);

        tracing::info!(days = table.days.len(), "schedule loaded");
        Ok(table)
    }
}
