//! Drives a [`WorkPlan`] through a license actuator.
//!
//! All revocations go first so seats are freed before new ones are taken.
//! A failing user is recorded and skipped; it never stops the rest of the
//! plan. Nothing is retried.

use seatsync_core::{Action, Outcome, OutcomeStatus, WorkItem, WorkPlan};
use seatsync_provider::{Actuation, LicenseActuator};

const APPLIED_DETAIL: &str = "ok";

pub struct Executor<'a> {
    actuator: &'a dyn LicenseActuator,
}

impl<'a> Executor<'a> {
    pub fn new(actuator: &'a dyn LicenseActuator) -> Self {
        Self { actuator }
    }

    /// Attempt every item once, sequentially. Outcomes are in attempt order.
    pub async fn execute(&self, plan: &WorkPlan) -> Vec<Outcome> {
        let total = plan.revoke.len() + plan.grant.len();
        let mut outcomes = Vec::with_capacity(total);

        tracing::info!(
            revoke = plan.revoke.len(),
            grant = plan.grant.len(),
            "executing plan"
        );

        for (i, item) in plan.items().enumerate() {
            let outcome = self.attempt(item).await;
            tracing::info!(
                n = i + 1,
                total,
                user = %outcome.user,
                action = %outcome.action,
                status = %outcome.status,
                detail = %outcome.detail,
                "attempted"
            );
            outcomes.push(outcome);
        }

        outcomes
    }

    async fn attempt(&self, item: WorkItem) -> Outcome {
        let result = match item.action {
            Action::Revoke => self.actuator.revoke(&item.user).await,
            Action::Grant => self.actuator.grant(&item.user).await,
        };

        let (status, detail) = match result {
            Ok(Actuation::Applied) => (OutcomeStatus::Succeeded, APPLIED_DETAIL.to_string()),
            Ok(Actuation::Rejected { reason }) => (OutcomeStatus::Rejected, reason),
            Err(e) => (OutcomeStatus::Errored, e.to_string()),
        };

        Outcome {
            user: item.user,
            action: item.action,
            status,
            detail,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use seatsync_core::error::{SyncError, SyncResult};
    use seatsync_core::UserId;
    use std::sync::Mutex;

    /// Records calls; errors for `fail_user`, rejects for `reject_user`.
    #[derive(Default)]
    struct ScriptedActuator {
        calls: Mutex<Vec<(Action, String)>>,
        fail_user: Option<&'static str>,
        reject_user: Option<&'static str>,
    }

    impl ScriptedActuator {
        fn answer(&self, action: Action, user: &UserId) -> SyncResult<Actuation> {
            self.calls
                .lock()
                .unwrap()
                .push((action, user.as_str().to_string()));
            if Some(user.as_str()) == self.fail_user {
                return Err(SyncError::Actuator("connection reset".into()));
            }
            if Some(user.as_str()) == self.reject_user {
                return Ok(Actuation::Rejected {
                    reason: "HTTP 429: no seats".into(),
                });
            }
            Ok(Actuation::Applied)
        }
    }

    #[async_trait]
    impl LicenseActuator for ScriptedActuator {
        async fn grant(&self, user: &UserId) -> SyncResult<Actuation> {
            self.answer(Action::Grant, user)
        }

        async fn revoke(&self, user: &UserId) -> SyncResult<Actuation> {
            self.answer(Action::Revoke, user)
        }
    }

    fn plan(revoke: &[&str], grant: &[&str]) -> WorkPlan {
        WorkPlan {
            revoke: revoke.iter().copied().map(UserId::from).collect(),
            grant: grant.iter().copied().map(UserId::from).collect(),
            exempted: Vec::new(),
        }
    }

    #[tokio::test]
    async fn revocations_run_before_grants() {
        let actuator = ScriptedActuator::default();
        let outcomes = Executor::new(&actuator)
            .execute(&plan(&["r1", "r2"], &["g1", "g2"]))
            .await;

        let calls = actuator.calls.lock().unwrap().clone();
        let first_grant = calls.iter().position(|(a, _)| *a == Action::Grant).unwrap();
        assert!(calls[..first_grant].iter().all(|(a, _)| *a == Action::Revoke));
        assert!(calls[first_grant..].iter().all(|(a, _)| *a == Action::Grant));
        assert_eq!(first_grant, 2);
        assert_eq!(outcomes.len(), 4);
        assert!(outcomes.iter().all(Outcome::succeeded));
    }

    #[tokio::test]
    async fn one_error_does_not_stop_the_run() {
        let actuator = ScriptedActuator {
            fail_user: Some("x"),
            ..Default::default()
        };
        let outcomes = Executor::new(&actuator)
            .execute(&plan(&["w", "x", "y"], &["a"]))
            .await;

        assert_eq!(outcomes.len(), 4);
        let x = &outcomes[1];
        assert_eq!(x.user.as_str(), "x");
        assert_eq!(x.status, OutcomeStatus::Errored);
        assert!(x.detail.contains("connection reset"));
        assert!(outcomes[2].succeeded());
        assert!(outcomes[3].succeeded());
    }

    #[tokio::test]
    async fn rejection_keeps_reason_as_detail() {
        let actuator = ScriptedActuator {
            reject_user: Some("a"),
            ..Default::default()
        };
        let outcomes = Executor::new(&actuator).execute(&plan(&[], &["a"])).await;

        assert_eq!(outcomes[0].status, OutcomeStatus::Rejected);
        assert_eq!(outcomes[0].detail, "HTTP 429: no seats");
    }

    #[tokio::test]
    async fn empty_plan_makes_no_calls() {
        let actuator = ScriptedActuator::default();
        let outcomes = Executor::new(&actuator).execute(&WorkPlan::default()).await;
        assert!(outcomes.is_empty());
        assert!(actuator.calls.lock().unwrap().is_empty());
    }
}
