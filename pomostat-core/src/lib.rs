//! # pomostat-core
//!
//! Core library for pomostat - productivity statistics for a pomodoro
//! timer and task tracker.
//!
//! This library provides:
//! - Domain types for categories, tasks, completions and focus sessions
//! - A statistics engine producing summary, donut and heatmap reports
//! - Database storage layer with SQLite
//! - Configuration management
//! - Logging infrastructure
//!
//! ## Data flow
//!
//! Raw events are recorded once and never mutated. Every report is computed
//! on demand from those events relative to a reference date, so repeating a
//! request without new events returns the same result.
//!
//! ## Example
//!
//! ```rust,no_run
//! use pomostat_core::analytics::{generate_summary, today_utc};
//! use pomostat_core::{Config, Database, SubjectId};
//!
//! let config = Config::load().expect("failed to load config");
//!
//! let db = Database::open(&config.resolved_database_path()).expect("failed to open database");
//! db.migrate().expect("failed to run migrations");
//!
//! let summary = generate_summary(&db, SubjectId(1), today_utc()).expect("summary");
//! println!("done this week: {}", summary.week.done);
//! ```

// Re-export commonly used items at the crate root
pub use analytics::EventSource;
pub use config::Config;
pub use db::Database;
pub use error::{Error, Result};
pub use types::*;

// Public modules
pub mod analytics;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod types;
