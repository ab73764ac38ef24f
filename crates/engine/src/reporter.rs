//! Human-readable run summaries.
//!
//! `render` is the console box printed at the end of a run; `render_html`
//! is the chat message body (Telegram HTML parse mode).

use seatsync_core::{Outcome, RunReport, UserId, WorkPlan};

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S %:z";

/// Telegram rejects messages longer than this many characters.
pub const MESSAGE_LIMIT: usize = 4096;
/// Characters each of the four user lists may take in the chat message.
/// Four lists plus the fixed header stay under [`MESSAGE_LIMIT`].
const LIST_BUDGET: usize = 800;
/// Longest failure detail shown in chat; the audit sink keeps the full text.
const DETAIL_MAX: usize = 160;

/// Console rendering of a completed run.
pub fn render(report: &RunReport) -> String {
    let mut out = String::new();

    out.push('\n');
    out.push_str("╔══════════════════════════════════════════════════════════════╗\n");
    out.push_str("║                   LICENSE SYNC RUN REPORT                    ║\n");
    out.push_str("╠══════════════════════════════════════════════════════════════╣\n");
    out.push_str(&format!(
        "║  Started:            {:>39} ║\n",
        report.started_at.format("%Y-%m-%d %H:%M:%S %:z").to_string()
    ));
    out.push_str(&format!(
        "║  Today:              {:>39} ║\n",
        format!("{} ({})", report.window.today.key, report.window.today.date)
    ));
    out.push_str(&format!(
        "║  Yesterday:          {:>39} ║\n",
        format!("{} ({})", report.window.yesterday.key, report.window.yesterday.date)
    ));
    out.push_str(&format!(
        "║  Revoked:            {:>39} ║\n",
        format!("{}/{}", report.revoke_succeeded, report.revoke_attempted)
    ));
    out.push_str(&format!(
        "║  Granted:            {:>39} ║\n",
        format!("{}/{}", report.grant_succeeded, report.grant_attempted)
    ));
    out.push_str(&format!(
        "║  Exempt users:       {:>39} ║\n",
        report.exempt_users.len()
    ));
    out.push_str(&format!(
        "║  Exempted this run:  {:>39} ║\n",
        report.exempted_this_run.len()
    ));
    out.push_str("╠══════════════════════════════════════════════════════════════╣\n");

    if report.failure_count() == 0 {
        out.push_str("║  No failures.                                                ║\n");
    } else {
        out.push_str("║  FAILURES                                                    ║\n");
        out.push_str("╠══════════════════════════════════════════════════════════════╣\n");
        for (i, o) in report
            .failed_revocations
            .iter()
            .chain(report.failed_grants.iter())
            .enumerate()
        {
            out.push_str(&format!(
                "║  {}. [{}] {} ({})\n",
                i + 1,
                o.action,
                o.user,
                o.status
            ));
            out.push_str(&format!("║     {}\n", o.detail));
        }
    }

    out.push_str("╚══════════════════════════════════════════════════════════════╝\n");
    out
}

/// Console rendering of a plan that was not executed (`--dry-run`).
pub fn render_plan(plan: &WorkPlan) -> String {
    let mut out = String::new();
    out.push_str(&format!("Revoke ({}):\n", plan.revoke.len()));
    out.push_str(&bullets_plain(&plan.revoke));
    out.push_str(&format!("Grant ({}):\n", plan.grant.len()));
    out.push_str(&bullets_plain(&plan.grant));
    out.push_str(&format!("Exempted from revocation ({}):\n", plan.exempted.len()));
    out.push_str(&bullets_plain(&plan.exempted));
    out
}

/// Chat message body. All user-supplied text is HTML-escaped.
pub fn render_html(report: &RunReport) -> String {
    let exempt = bullets_html(&report.exempt_users);
    let exempted = bullets_html(&report.exempted_this_run);
    let failed_revocations = failures_html(&report.failed_revocations);
    let failed_grants = failures_html(&report.failed_grants);

    format!(
        "<b>📊 License Sync Summary</b>\n\
         ==========================\n\
         📅 <b>Date:</b> {date}\n\
         ⏰ <b>Time:</b> {time}\n\
         \n\
         <b>🔴 Revoked:</b> {rs}/{ra}\n\
         <b>🟢 Granted:</b> {gs}/{ga}\n\
         \n\
         <b>🛡️ Exempt Users (Never Revoked):</b>\n{exempt}\n\
         \n\
         <b>🛡️ Exempted in This Run:</b>\n{exempted}\n\
         \n\
         <b>❌ Failed Revocations:</b>\n{failed_revocations}\n\
         \n\
         <b>❌ Failed Grants:</b>\n{failed_grants}\n",
        date = report.started_at.format(DATE_FORMAT),
        time = report.started_at.format(TIME_FORMAT),
        rs = report.revoke_succeeded,
        ra = report.revoke_attempted,
        gs = report.grant_succeeded,
        ga = report.grant_attempted,
    )
}

fn bullets_plain(users: &[UserId]) -> String {
    if users.is_empty() {
        return "  • None\n".to_string();
    }
    users.iter().map(|u| format!("  • {u}\n")).collect()
}

fn bullets_html(users: &[UserId]) -> String {
    let lines = users
        .iter()
        .map(|u| format!("• {}", escape_html(u.as_str())))
        .collect();
    bounded_list(lines, "• None")
}

fn failures_html(failures: &[Outcome]) -> String {
    let lines = failures
        .iter()
        .map(|o| {
            format!(
                "• {}: {}",
                escape_html(o.user.as_str()),
                escape_html(&clip(&o.detail, DETAIL_MAX))
            )
        })
        .collect();
    bounded_list(lines, "• No failures")
}

/// Joins lines until [`LIST_BUDGET`] is spent, then counts the rest.
fn bounded_list(lines: Vec<String>, empty: &str) -> String {
    if lines.is_empty() {
        return empty.to_string();
    }

    let mut shown = Vec::new();
    let mut used = 0;
    for line in &lines {
        let len = line.chars().count() + 1;
        if used + len > LIST_BUDGET {
            break;
        }
        used += len;
        shown.push(line.as_str());
    }

    let hidden = lines.len() - shown.len();
    let mut out = shown.join("\n");
    if hidden > 0 {
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(&format!("…and {hidden} more"));
    }
    out
}

fn clip(raw: &str, max: usize) -> String {
    if raw.chars().count() <= max {
        return raw.to_string();
    }
    let mut out: String = raw.chars().take(max).collect();
    out.push('…');
    out
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use seatsync_core::{Action, CalendarDay, ExemptSet, OutcomeStatus, RunWindow};

    fn sample_report() -> RunReport {
        let window = RunWindow {
            today: CalendarDay::new(NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()),
            yesterday: CalendarDay::new(NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()),
        };
        let plan = WorkPlan {
            revoke: vec!["x@uni.edu".into()],
            grant: vec!["a@uni.edu".into()],
            exempted: vec!["dean@uni.edu".into()],
        };
        let outcomes = vec![
            Outcome {
                user: "x@uni.edu".into(),
                action: Action::Revoke,
                status: OutcomeStatus::Errored,
                detail: "Actuator error: <timeout>".into(),
            },
            Outcome {
                user: "a@uni.edu".into(),
                action: Action::Grant,
                status: OutcomeStatus::Succeeded,
                detail: "ok".into(),
            },
        ];
        let exempt: ExemptSet = ["dean@uni.edu"].into_iter().collect();
        let started = Utc
            .with_ymd_and_hms(2026, 10, 19, 6, 30, 0)
            .unwrap()
            .fixed_offset();
        RunReport::build(started, window, &exempt, &plan, outcomes)
    }

    #[test]
    fn html_summary_has_every_section() {
        let html = render_html(&sample_report());

        assert!(html.contains("<b>Date:</b> 2026-10-19"));
        assert!(html.contains("<b>Time:</b> 06:30:00 +00:00"));
        assert!(html.contains("<b>🔴 Revoked:</b> 0/1"));
        assert!(html.contains("<b>🟢 Granted:</b> 1/1"));
        assert!(html.contains("Exempt Users (Never Revoked):</b>\n• dean@uni.edu"));
        assert!(html.contains("Exempted in This Run:</b>\n• dean@uni.edu"));
        assert!(html.contains("• x@uni.edu: Actuator error: &lt;timeout&gt;"));
        assert!(html.contains("Failed Grants:</b>\n• No failures"));
    }

    #[test]
    fn html_summary_fits_telegram_limit_when_everything_fails() {
        let window = sample_report().window;
        let revoke: Vec<UserId> = (0..400)
            .map(|i| UserId::new(format!("leaver{i:03}@uni.edu")))
            .collect();
        let grant: Vec<UserId> = (0..400)
            .map(|i| UserId::new(format!("joiner{i:03}@uni.edu")))
            .collect();
        let outcomes = revoke
            .iter()
            .map(|u| (u, Action::Revoke))
            .chain(grant.iter().map(|u| (u, Action::Grant)))
            .map(|(u, action)| Outcome {
                user: u.clone(),
                action,
                status: OutcomeStatus::Errored,
                detail: format!("Actuator error: token request failed: {}", "x".repeat(300)),
            })
            .collect();
        let exempt: ExemptSet = (0..300).map(|i| format!("staff{i:03}@uni.edu")).collect();
        let plan = WorkPlan {
            revoke,
            grant,
            exempted: exempt.iter().cloned().collect(),
        };
        let report = RunReport::build(
            sample_report().started_at,
            window,
            &exempt,
            &plan,
            outcomes,
        );

        let html = render_html(&report);

        assert!(html.chars().count() <= MESSAGE_LIMIT);
        assert!(html.contains("<b>🔴 Revoked:</b> 0/400"));
        assert!(html.contains("• leaver000@uni.edu: Actuator error"));
        assert!(html.contains("• joiner000@uni.edu: Actuator error"));
        assert!(html.contains("more"));
        assert_eq!(report.failed_grants.len(), 400);
    }

    #[test]
    fn short_lists_are_not_truncated() {
        let html = render_html(&sample_report());
        assert!(!html.contains("more"));
    }

    #[test]
    fn console_report_lists_failures() {
        let text = render(&sample_report());
        assert!(text.contains("LICENSE SYNC RUN REPORT"));
        assert!(text.contains("[revoke] x@uni.edu (errored)"));
        assert!(text.contains("0/1"));
    }

    #[test]
    fn plan_rendering_marks_empty_lists() {
        let text = render_plan(&WorkPlan::default());
        assert!(text.contains("Revoke (0):\n  • None"));
        assert!(text.contains("Grant (0):\n  • None"));
    }
}
