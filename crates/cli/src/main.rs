//! CLI for the seatsync license reconciler.
//!
//! Pipeline: resolve days -> load rosters -> reconcile -> grant/revoke -> report.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use seatsync_core::{Action, RunWindow, SyncConfig, UserId};
use seatsync_engine::run::{self, RunContext};
use seatsync_engine::sink::json_stream::AuditTarget;
use seatsync_engine::sink::telegram::TelegramNotifier;
use seatsync_engine::sink::Notifier;
use seatsync_engine::{reporter, Reconciler};
use seatsync_provider::{calendar, Actuation, LicenseActuator, ScheduleRosterProvider, ZoomActuator};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(name = "seatsync", version, about = "Daily roster to license pool reconciler")]
struct Cli {
    /// JSON config file.
    #[arg(short, long, global = true, env = "SEATSYNC_CONFIG", default_value = "seatsync.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Reconcile today's roster against yesterday's and apply the changes.
    Run {
        /// Treat this date as today instead of the local date.
        #[arg(long)]
        date: Option<NaiveDate>,

        #[arg(long, env = "SEATSYNC_CLIENT_SECRET", hide_env_values = true)]
        client_secret: Option<String>,

        #[arg(long, env = "SEATSYNC_TELEGRAM_TOKEN", hide_env_values = true)]
        telegram_token: Option<String>,

        /// Print the plan; make no license calls and send nothing.
        #[arg(long, default_value_t = false)]
        dry_run: bool,

        /// Skip the chat notification.
        #[arg(long, default_value_t = false)]
        no_notify: bool,

        /// Print the report as JSON instead of the summary box.
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Audit output: "ndjson" writes NDJSON to stdout,
        /// "ndjson:/path/to/file" writes to file.
        #[arg(long)]
        sink: Option<AuditTarget>,
    },

    /// Print today's and yesterday's resolved rosters.
    Show {
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Grant or revoke one user's license by hand.
    License {
        /// "grant" or "revoke".
        action: Action,

        user: String,

        #[arg(long, env = "SEATSYNC_CLIENT_SECRET", hide_env_values = true)]
        client_secret: String,
    },
}

fn window_for(date: Option<NaiveDate>) -> RunWindow {
    match date {
        Some(d) => calendar::resolve_on(d),
        None => calendar::resolve(),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = SyncConfig::load(&cli.config)?;
    tracing::info!(
        config = %cli.config.display(),
        schedule = %config.schedule_path.display(),
        exempt_users = config.exempt_users.len(),
        "config loaded"
    );

    match cli.command {
        Commands::Run {
            date,
            client_secret,
            telegram_token,
            dry_run,
            no_notify,
            json,
            sink,
        } => {
            let t0 = Instant::now();
            let window = window_for(date);
            let roster = ScheduleRosterProvider::new(config.schedule_path.clone());
            let reconciler = Reconciler::new(config.exempt_users.clone());

            if dry_run {
                tracing::info!("dry_run mode: no license calls will be made");
                let plan = run::plan(&roster, &reconciler, &window).await?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&plan)?);
                } else {
                    print!("{}", reporter::render_plan(&plan));
                }
                return Ok(());
            }

            let client_secret = client_secret
                .ok_or("missing client secret: pass --client-secret or set SEATSYNC_CLIENT_SECRET")?;
            let actuator = ZoomActuator::new(&config.license, client_secret);

            let notifier = match (&config.telegram, telegram_token, no_notify) {
                (_, _, true) => None,
                (Some(telegram), Some(token), false) => Some(TelegramNotifier::new(telegram, token)),
                (Some(_), None, false) => {
                    tracing::warn!("telegram configured but no bot token given; not notifying");
                    None
                }
                (None, _, false) => None,
            };

            let ctx = RunContext {
                roster: &roster,
                actuator: &actuator,
                reconciler: &reconciler,
                notifier: notifier.as_ref().map(|n| n as &dyn Notifier),
            };

            let report = run::run_once(&ctx, &window).await?;
            tracing::info!(elapsed_ms = t0.elapsed().as_millis(), "license sync completed");

            if let Some(target) = sink {
                match target.write(&report) {
                    Ok(rows) => tracing::info!(rows, sink = %target, "audit rows written"),
                    Err(e) => tracing::warn!(
                        error = %e,
                        sink = %target,
                        "audit write failed; license changes stand"
                    ),
                }

                // Still print report to stderr so it's visible.
                eprint!("{}", reporter::render(&report));
            } else if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", reporter::render(&report));
            }
        }

        Commands::Show { date } => {
            let window = window_for(date);
            let roster = ScheduleRosterProvider::new(config.schedule_path.clone());
            let rosters = run::fetch_rosters(&roster, &window).await?;

            for (label, day, users) in [
                ("Today", window.today, &rosters.today),
                ("Yesterday", window.yesterday, &rosters.yesterday),
            ] {
                println!("\n{label}: {} ({})", day.key, day.date);
                println!("{}", "-".repeat(30));
                if users.is_empty() {
                    println!("  No scheduled users.");
                }
                for user in users.iter() {
                    println!("  • {user}");
                }
            }
        }

        Commands::License {
            action,
            user,
            client_secret,
        } => {
            let actuator = ZoomActuator::new(&config.license, client_secret);
            let user = UserId::new(user);
            let result = match action {
                Action::Grant => actuator.grant(&user).await?,
                Action::Revoke => actuator.revoke(&user).await?,
            };
            match result {
                Actuation::Applied => println!("{action} applied for {user}"),
                Actuation::Rejected { reason } => {
                    return Err(format!("{action} rejected for {user}: {reason}").into());
                }
            }
        }
    }

    Ok(())
}
