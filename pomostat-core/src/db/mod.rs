//! Database layer for pomostat
//!
//! This module provides the storage layer using SQLite with:
//! - Schema migrations
//! - Append-only event log writers
//! - The [`EventSource`](crate::analytics::EventSource) read side

pub mod repo;
pub mod schema;

pub use repo::Database;
