mod config;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use support_desk_core::filter::ListRequest;
use support_desk_core::models::NotificationOutcome;
use support_desk_core::notify::{DisabledNotifier, Notifier, SmtpNotifier};
use support_desk_core::workflow::{
    list_tickets_from_request, submit_bulk_form, submit_reply_form, ticket_detail,
    ticket_overview, BulkSubmission, ReplySubmission,
};
use support_desk_core::{diagnostics, open_support_db, seed, SupportDb};
use tracing_subscriber::EnvFilter;

use crate::config::DeskConfig;

#[derive(Parser)]
#[command(name = "support-desk")]
#[command(about = "Support ticket desk for FreeReminders.net staff")]
#[command(version)]
struct Cli {
    /// Path to config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Database file, overrides the configured path
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Print JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database and apply migrations
    Init,

    /// Insert demo tickets
    Seed {
        #[arg(long, default_value_t = 30)]
        count: i64,
    },

    /// List tickets, most urgent first
    #[command(visible_alias = "ls")]
    List {
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        priority: Option<String>,
        #[arg(long)]
        category: Option<String>,
        /// Substring of subject, name or email, or an exact ticket id
        #[arg(short, long)]
        search: Option<String>,
        #[arg(short, long)]
        page: Option<String>,
    },

    /// Show a ticket with its full thread
    Show { id: i64 },

    /// Reply to a ticket as the configured admin
    Reply {
        id: i64,
        #[arg(short, long)]
        message: String,
        /// Staff-only note; the customer is not emailed
        #[arg(long)]
        internal: bool,
        /// New status; omit to apply the default transition
        #[arg(long)]
        status: Option<String>,
    },

    /// Apply close, reopen or mark_resolved to several tickets
    Bulk {
        action: String,
        #[arg(required = true)]
        ids: Vec<i64>,
    },

    /// Ticket counts by status
    Stats,
}

fn init_tracing(config: &DeskConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_notifier(config: &DeskConfig) -> Box<dyn Notifier> {
    match config.smtp_settings() {
        Some(settings) => match SmtpNotifier::new(&settings) {
            Ok(notifier) => Box::new(notifier),
            Err(err) => {
                tracing::warn!(error = %err, "smtp settings unusable, notifications disabled");
                Box::new(DisabledNotifier)
            }
        },
        None => Box::new(DisabledNotifier),
    }
}

fn open_db(cli: &Cli, config: &DeskConfig) -> Result<SupportDb> {
    let path = cli.db.clone().unwrap_or_else(|| config.database_path());
    open_support_db(&path).with_context(|| format!("failed to open {}", path.display()))
}

fn run(cli: &Cli, config: &DeskConfig) -> Result<()> {
    let mut db = open_db(cli, config)?;
    let ctx = config.admin_context();

    match &cli.command {
        Commands::Init => {
            println!("Database ready at {}", db.path.display());
        }
        Commands::Seed { count } => {
            seed::seed_demo(&db.conn, *count)?;
            println!("Inserted {} demo tickets.", count);
        }
        Commands::List {
            status,
            priority,
            category,
            search,
            page,
        } => {
            let request = ListRequest {
                status: status.clone(),
                priority: priority.clone(),
                category: category.clone(),
                search: search.clone(),
                page: page.clone(),
            };
            let page = list_tickets_from_request(&db.conn, &ctx, &request)?;
            if cli.json {
                output::print_json(&page)?;
            } else {
                output::print_page(&page);
            }
        }
        Commands::Show { id } => {
            let detail = ticket_detail(&db.conn, &ctx, *id)?;
            if cli.json {
                output::print_json(&detail)?;
            } else {
                output::print_detail(&detail);
            }
        }
        Commands::Reply {
            id,
            message,
            internal,
            status,
        } => {
            let notifier = build_notifier(config);
            let submission = ReplySubmission {
                ticket_id: *id,
                reply_message: message.clone(),
                is_internal: *internal,
                status: status.clone(),
            };
            let outcome = submit_reply_form(&mut db.conn, &ctx, &submission, notifier.as_ref())?;
            if let NotificationOutcome::Failed(reason) = &outcome.notification {
                let _ = diagnostics::log_event(
                    &config.log_dir(),
                    "notification_failed",
                    &format!("ticket {}: {}", outcome.ticket_id, reason),
                );
            }
            if cli.json {
                output::print_json(&outcome)?;
            } else {
                output::print_reply(&outcome);
            }
        }
        Commands::Bulk { action, ids } => {
            let submission = BulkSubmission {
                ticket_ids: ids.clone(),
                action: action.clone(),
            };
            let affected = submit_bulk_form(&mut db.conn, &ctx, &submission)?;
            if cli.json {
                output::print_json(&serde_json::json!({ "affected": affected }))?;
            } else {
                println!("{} ticket(s) updated.", affected);
            }
        }
        Commands::Stats => {
            let stats = ticket_overview(&db.conn, &ctx)?;
            if cli.json {
                output::print_json(&stats)?;
            } else {
                output::print_stats(&stats);
            }
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = match DeskConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            return ExitCode::FAILURE;
        }
    };
    init_tracing(&config);

    match run(&cli, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let _ = diagnostics::log_event(&config.log_dir(), "command_error", &format!("{:#}", err));
            eprintln!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
