//! pomostat - productivity statistics for a pomodoro timer and task tracker
//!
//! Prints period summaries, category donuts and a yearly heatmap for one
//! subject, and records the raw events those reports are built from.
//!
//! Uses XDG Base Directory specification for file locations:
//! - Database: $XDG_DATA_HOME/pomostat/data.db (~/.local/share/pomostat/data.db)
//! - Config: $XDG_CONFIG_HOME/pomostat/config.toml (~/.config/pomostat/config.toml)

mod render;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use pomostat_core::analytics::{generate_donut, generate_heatmap, generate_summary, today_utc};
use pomostat_core::{
    Category, CompletionEvent, Config, Database, FocusSessionEvent, StoredInstant, SubjectId,
    TaskId, TimerMode,
};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "pomostat")]
#[command(about = "Productivity statistics - summaries, donuts and heatmaps")]
#[command(version)]
struct Args {
    /// Database file (default: from config, else the XDG data dir)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Week, month and year summaries with streaks and previous-period totals
    Summary(ReportArgs),

    /// Completed tasks and focus hours by category
    Donut(ReportArgs),

    /// Daily activity for the last 365 days
    Heatmap(ReportArgs),

    /// Record raw events
    Record {
        #[command(subcommand)]
        command: RecordCommand,
    },
}

#[derive(ClapArgs, Debug)]
struct ReportArgs {
    /// Subject (user) to report on
    #[arg(long, default_value_t = 1)]
    subject: i64,

    /// Reference date, YYYY-MM-DD (default: today in UTC)
    #[arg(long)]
    today: Option<NaiveDate>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Indent JSON output
    #[arg(long)]
    pretty: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    Json,
    Text,
}

#[derive(Subcommand, Debug)]
enum RecordCommand {
    /// Create or update a category (project)
    Category {
        #[arg(long, default_value_t = 1)]
        subject: i64,
        #[arg(long)]
        id: String,
        #[arg(long)]
        name: String,
        /// Display color, e.g. "#22c55e"
        #[arg(long)]
        color: Option<String>,
    },

    /// Add an open task to a category
    Task {
        #[arg(long, default_value_t = 1)]
        subject: i64,
        #[arg(long)]
        category: String,
        #[arg(long)]
        name: String,
    },

    /// Mark a task done
    Done {
        #[arg(long, default_value_t = 1)]
        subject: i64,
        #[arg(long)]
        task: TaskId,
        /// Completion time (default: now)
        #[arg(long)]
        at: Option<StoredInstant>,
    },

    /// Log a finished timer session
    Session {
        #[arg(long, default_value_t = 1)]
        subject: i64,
        /// Length in seconds
        #[arg(long)]
        duration: i64,
        /// focus, short_break or long_break
        #[arg(long, default_value_t = TimerMode::Focus)]
        mode: TimerMode,
        /// Task the session was spent on
        #[arg(long)]
        task: Option<TaskId>,
        /// Completion time (default: now)
        #[arg(long)]
        at: Option<StoredInstant>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    Config::ensure_xdg_env();

    let config = Config::load().context("failed to load configuration")?;
    let _log_guard = pomostat_core::logging::init(&config.logging).ok();

    let db_path = args
        .db
        .clone()
        .unwrap_or_else(|| config.resolved_database_path());
    let db = Database::open(&db_path)
        .with_context(|| format!("failed to open database at {}", db_path.display()))?;
    db.migrate().context("failed to run migrations")?;
    tracing::debug!(db = %db_path.display(), "database ready");

    match args.command {
        Command::Summary(report) => cmd_summary(&db, &report),
        Command::Donut(report) => cmd_donut(&db, &config, &report),
        Command::Heatmap(report) => cmd_heatmap(&db, &report),
        Command::Record { command } => cmd_record(&db, command),
    }
}

impl ReportArgs {
    fn subject(&self) -> SubjectId {
        SubjectId(self.subject)
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(today_utc)
    }
}

fn cmd_summary(db: &Database, args: &ReportArgs) -> Result<()> {
    let summary = generate_summary(db, args.subject(), args.today())?;
    match args.format {
        OutputFormat::Json => print_json(&summary, args.pretty),
        OutputFormat::Text => {
            render::print_summary(&summary, args.subject(), args.today());
            Ok(())
        }
    }
}

fn cmd_donut(db: &Database, config: &Config, args: &ReportArgs) -> Result<()> {
    let donut = generate_donut(db, args.subject(), args.today(), &config.stats)?;
    match args.format {
        OutputFormat::Json => print_json(&donut, args.pretty),
        OutputFormat::Text => {
            render::print_donut(&donut, args.subject(), args.today());
            Ok(())
        }
    }
}

fn cmd_heatmap(db: &Database, args: &ReportArgs) -> Result<()> {
    let heatmap = generate_heatmap(db, args.subject(), args.today())?;
    match args.format {
        OutputFormat::Json => print_json(&heatmap, args.pretty),
        OutputFormat::Text => {
            render::print_heatmap(&heatmap, args.subject(), args.today());
            Ok(())
        }
    }
}

fn cmd_record(db: &Database, command: RecordCommand) -> Result<()> {
    match command {
        RecordCommand::Category {
            subject,
            id,
            name,
            color,
        } => {
            let category = Category {
                id,
                subject_id: SubjectId(subject),
                display_name: name,
                display_color: color,
            };
            db.upsert_category(&category)
                .context("failed to save category")?;
            println!("Recorded category {} ({})", category.id, category.display_name);
        }
        RecordCommand::Task {
            subject,
            category,
            name,
        } => {
            let owner = db
                .get_category(&category)
                .context("failed to look up category")?;
            match owner {
                Some(owner) if owner.subject_id == SubjectId(subject) => {}
                Some(_) => anyhow::bail!("category {} belongs to another subject", category),
                None => anyhow::bail!("category {} not found", category),
            }
            let task_id = db
                .insert_task(&category, &name)
                .context("failed to save task")?;
            println!("Recorded task {} in {}", task_id, category);
        }
        RecordCommand::Done { subject, task, at } => {
            let at = at.unwrap_or_else(|| StoredInstant::from(Utc::now()));
            let event: CompletionEvent = db
                .complete_task(SubjectId(subject), task, at)
                .with_context(|| format!("failed to complete task {}", task))?;
            println!(
                "Completed task {} ({}) on {}",
                task,
                event.label,
                at.canonical_date()
            );
        }
        RecordCommand::Session {
            subject,
            duration,
            mode,
            task,
            at,
        } => {
            if let Some(task) = task {
                let owner = db
                    .task_owner(task)
                    .context("failed to look up task")?;
                match owner {
                    Some(owner) if owner == SubjectId(subject) => {}
                    Some(_) => anyhow::bail!("task {} belongs to another subject", task),
                    None => anyhow::bail!("task {} not found", task),
                }
            }
            let session = FocusSessionEvent {
                subject_id: SubjectId(subject),
                mode,
                duration_seconds: duration,
                task_id: task,
                completed_at: Some(at.unwrap_or_else(|| StoredInstant::from(Utc::now()))),
            };
            db.record_focus_session(&session)
                .context("failed to save session")?;
            println!("Recorded {} session of {}s", session.mode, session.duration_seconds);
        }
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", json);
    Ok(())
}
