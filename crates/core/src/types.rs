//! Domain types for the seatsync reconciler.

use chrono::{DateTime, FixedOffset, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// Opaque user key (an email address in practice). Equality and ordering
/// only; never parsed. Surrounding whitespace is trimmed on every way in,
/// deserialization included.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for UserId {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

impl From<UserId> for String {
    fn from(user: UserId) -> Self {
        user.0
    }
}

// ---------------------------------------------------------------------------
// Calendar
// ---------------------------------------------------------------------------

/// Normalized day-of-week key.
///
/// The only place day names are interpreted; accepts full names and
/// three-letter abbreviations in any case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DayKey {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayKey {
    pub const ALL: [DayKey; 7] = [
        DayKey::Monday,
        DayKey::Tuesday,
        DayKey::Wednesday,
        DayKey::Thursday,
        DayKey::Friday,
        DayKey::Saturday,
        DayKey::Sunday,
    ];

    pub fn name(self) -> &'static str {
        match self {
            DayKey::Monday => "Monday",
            DayKey::Tuesday => "Tuesday",
            DayKey::Wednesday => "Wednesday",
            DayKey::Thursday => "Thursday",
            DayKey::Friday => "Friday",
            DayKey::Saturday => "Saturday",
            DayKey::Sunday => "Sunday",
        }
    }

    /// Previous weekday (Monday -> Sunday).
    pub fn pred(self) -> Self {
        Weekday::from(self).pred().into()
    }
}

impl From<Weekday> for DayKey {
    fn from(day: Weekday) -> Self {
        match day {
            Weekday::Mon => DayKey::Monday,
            Weekday::Tue => DayKey::Tuesday,
            Weekday::Wed => DayKey::Wednesday,
            Weekday::Thu => DayKey::Thursday,
            Weekday::Fri => DayKey::Friday,
            Weekday::Sat => DayKey::Saturday,
            Weekday::Sun => DayKey::Sunday,
        }
    }
}

impl From<DayKey> for Weekday {
    fn from(key: DayKey) -> Self {
        match key {
            DayKey::Monday => Weekday::Mon,
            DayKey::Tuesday => Weekday::Tue,
            DayKey::Wednesday => Weekday::Wed,
            DayKey::Thursday => Weekday::Thu,
            DayKey::Friday => Weekday::Fri,
            DayKey::Saturday => Weekday::Sat,
            DayKey::Sunday => Weekday::Sun,
        }
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DayKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        DayKey::ALL
            .into_iter()
            .find(|key| {
                let full = key.name().to_ascii_lowercase();
                lower == full || lower == full[..3]
            })
            .ok_or_else(|| format!("Invalid day name: {s}"))
    }
}

/// A concrete calendar date together with its weekday key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub key: DayKey,
}

impl CalendarDay {
    pub fn new(date: NaiveDate) -> Self {
        use chrono::Datelike;
        Self {
            date,
            key: date.weekday().into(),
        }
    }
}

/// The two days a run compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunWindow {
    pub today: CalendarDay,
    pub yesterday: CalendarDay,
}

impl RunWindow {
    pub fn days(&self) -> [CalendarDay; 2] {
        [self.today, self.yesterday]
    }
}

// ---------------------------------------------------------------------------
// Rosters
// ---------------------------------------------------------------------------

/// Users requiring access on one day. Iterates in `UserId` order; blank
/// entries never make it in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<UserId>", into = "Vec<UserId>")]
pub struct DayRoster(BTreeSet<UserId>);

impl DayRoster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, user: UserId) -> bool {
        self.0.insert(user)
    }

    pub fn contains(&self, user: &UserId) -> bool {
        self.0.contains(user)
    }

    pub fn iter(&self) -> impl Iterator<Item = &UserId> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Users in `self` but not in `other`, in order.
    pub fn difference<'a>(&'a self, other: &'a DayRoster) -> impl Iterator<Item = &'a UserId> {
        self.0.difference(&other.0)
    }
}

impl<U: Into<UserId>> FromIterator<U> for DayRoster {
    fn from_iter<I: IntoIterator<Item = U>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(Into::into)
                .filter(|u: &UserId| !u.is_blank())
                .collect(),
        )
    }
}

impl From<Vec<UserId>> for DayRoster {
    fn from(users: Vec<UserId>) -> Self {
        users.into_iter().collect()
    }
}

impl From<DayRoster> for Vec<UserId> {
    fn from(roster: DayRoster) -> Self {
        roster.0.into_iter().collect()
    }
}

impl Extend<UserId> for DayRoster {
    fn extend<I: IntoIterator<Item = UserId>>(&mut self, iter: I) {
        self.0.extend(iter.into_iter().filter(|u| !u.is_blank()));
    }
}

/// Day-key to roster mapping handed over by a roster provider.
///
/// Exam overrides are already applied; keys are already normalized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterTable {
    pub days: BTreeMap<DayKey, DayRoster>,
}

impl RosterTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: DayKey, roster: DayRoster) {
        self.days.insert(key, roster);
    }

    /// Roster for `key`, or an empty roster when the day has no entry.
    pub fn roster_for(&self, key: DayKey) -> DayRoster {
        self.days.get(&key).cloned().unwrap_or_default()
    }

    /// True when the provider returned no day entries at all.
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

/// Users that are never revoked. Cleaned like roster entries so a padded
/// config value still matches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<UserId>", into = "Vec<UserId>")]
pub struct ExemptSet(BTreeSet<UserId>);

impl ExemptSet {
    pub fn contains(&self, user: &UserId) -> bool {
        self.0.contains(user)
    }

    pub fn iter(&self) -> impl Iterator<Item = &UserId> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<U: Into<UserId>> FromIterator<U> for ExemptSet {
    fn from_iter<I: IntoIterator<Item = U>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(Into::into)
                .filter(|u: &UserId| !u.is_blank())
                .collect(),
        )
    }
}

impl From<Vec<UserId>> for ExemptSet {
    fn from(users: Vec<UserId>) -> Self {
        users.into_iter().collect()
    }
}

impl From<ExemptSet> for Vec<UserId> {
    fn from(exempt: ExemptSet) -> Self {
        exempt.0.into_iter().collect()
    }
}

// ---------------------------------------------------------------------------
// Work and outcomes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Grant,
    Revoke,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Grant => f.write_str("grant"),
            Action::Revoke => f.write_str("revoke"),
        }
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "grant" | "assign" => Ok(Action::Grant),
            "revoke" | "unassign" => Ok(Action::Revoke),
            _ => Err(format!("Invalid action: {s}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    pub user: UserId,
    pub action: Action,
}

/// Output of reconciliation: what to revoke, what to grant, and which
/// revocations the exempt set suppressed.
///
/// `revoke` and `grant` never share a user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkPlan {
    pub revoke: Vec<UserId>,
    pub grant: Vec<UserId>,
    pub exempted: Vec<UserId>,
}

impl WorkPlan {
    /// Revocations first, then grants: the order the executor attempts them.
    pub fn items(&self) -> impl Iterator<Item = WorkItem> + '_ {
        let revokes = self.revoke.iter().map(|u| WorkItem {
            user: u.clone(),
            action: Action::Revoke,
        });
        let grants = self.grant.iter().map(|u| WorkItem {
            user: u.clone(),
            action: Action::Grant,
        });
        revokes.chain(grants)
    }

    pub fn is_empty(&self) -> bool {
        self.revoke.is_empty() && self.grant.is_empty()
    }
}

/// `Rejected`: the license pool answered and said no.
/// `Errored`: the call itself failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Succeeded,
    Rejected,
    Errored,
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutcomeStatus::Succeeded => f.write_str("succeeded"),
            OutcomeStatus::Rejected => f.write_str("rejected"),
            OutcomeStatus::Errored => f.write_str("errored"),
        }
    }
}

/// Result of one attempted work item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub user: UserId,
    pub action: Action,
    pub status: OutcomeStatus,
    pub detail: String,
}

impl Outcome {
    pub fn succeeded(&self) -> bool {
        self.status == OutcomeStatus::Succeeded
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Authoritative record of one run.
///
/// `*_attempted - *_succeeded` always equals the length of the matching
/// failure list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub started_at: DateTime<FixedOffset>,
    pub window: RunWindow,
    pub revoke_attempted: usize,
    pub revoke_succeeded: usize,
    pub grant_attempted: usize,
    pub grant_succeeded: usize,
    pub exempt_users: Vec<UserId>,
    pub exempted_this_run: Vec<UserId>,
    pub failed_revocations: Vec<Outcome>,
    pub failed_grants: Vec<Outcome>,
    pub outcomes: Vec<Outcome>,
}

impl RunReport {
    /// Aggregate attempt outcomes into a report.
    pub fn build(
        started_at: DateTime<FixedOffset>,
        window: RunWindow,
        exempt: &ExemptSet,
        plan: &WorkPlan,
        outcomes: Vec<Outcome>,
    ) -> Self {
        let mut report = RunReport {
            started_at,
            window,
            revoke_attempted: 0,
            revoke_succeeded: 0,
            grant_attempted: 0,
            grant_succeeded: 0,
            exempt_users: exempt.iter().cloned().collect(),
            exempted_this_run: plan.exempted.clone(),
            failed_revocations: Vec::new(),
            failed_grants: Vec::new(),
            outcomes: Vec::new(),
        };

        for outcome in &outcomes {
            let (attempted, succeeded, failed) = match outcome.action {
                Action::Revoke => (
                    &mut report.revoke_attempted,
                    &mut report.revoke_succeeded,
                    &mut report.failed_revocations,
                ),
                Action::Grant => (
                    &mut report.grant_attempted,
                    &mut report.grant_succeeded,
                    &mut report.failed_grants,
                ),
            };
            *attempted += 1;
            if outcome.succeeded() {
                *succeeded += 1;
            } else {
                failed.push(outcome.clone());
            }
        }

        report.outcomes = outcomes;
        report
    }

    pub fn failure_count(&self) -> usize {
        self.failed_revocations.len() + self.failed_grants.len()
    }
}
