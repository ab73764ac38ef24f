//! Two-roster diff with the exemption policy applied.

use seatsync_core::{DayRoster, ExemptSet, UserId, WorkPlan};

/// Turns a (today, yesterday) roster pair into a [`WorkPlan`].
///
/// Only state transitions produce work: a user on both rosters is left
/// alone. The exempt set blocks revocation and never blocks a grant.
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    exempt: ExemptSet,
}

impl Reconciler {
    pub fn new(exempt: ExemptSet) -> Self {
        Self { exempt }
    }

    pub fn exempt(&self) -> &ExemptSet {
        &self.exempt
    }

    /// ```text
    /// revoke   = (yesterday - today) - exempt
    /// exempted = (yesterday - today) & exempt
    /// grant    = today - yesterday
    /// ```
    pub fn reconcile(&self, today: &DayRoster, yesterday: &DayRoster) -> WorkPlan {
        let (exempted, revoke): (Vec<UserId>, Vec<UserId>) = yesterday
            .difference(today)
            .cloned()
            .partition(|u| self.exempt.contains(u));

        let grant: Vec<UserId> = today.difference(yesterday).cloned().collect();

        tracing::debug!(
            revoke = revoke.len(),
            grant = grant.len(),
            exempted = exempted.len(),
            "reconciled rosters"
        );

        WorkPlan {
            revoke,
            grant,
            exempted,
        }
    }
}
