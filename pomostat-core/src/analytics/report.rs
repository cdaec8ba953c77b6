//! Report generation boundary.
//!
//! Fetches a subject's raw collections through [`EventSource`], runs the
//! pure builders, and turns any internal fault into a generic
//! [`Error::Aggregation`] for that report alone.

use chrono::{NaiveDate, Utc};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

use super::donut::{build_donut, DonutSet};
use super::heatmap::{build_heatmap, HeatmapReport};
use super::summary::{build_summary, SummaryReport};
use crate::config::StatsConfig;
use crate::error::{Error, Result};
use crate::types::{Category, CategoryId, CompletionEvent, FocusSessionEvent, SubjectId, TaskId};

/// Read-only access to the collaborators that own the raw records.
pub trait EventSource {
    /// Every completion event recorded for `subject`.
    fn list_completions(&self, subject: SubjectId) -> Result<Vec<CompletionEvent>>;

    /// Every focus-mode session recorded for `subject`. Breaks are excluded.
    fn list_focus_sessions(&self, subject: SubjectId) -> Result<Vec<FocusSessionEvent>>;

    /// Every category (project) owned by `subject`.
    fn list_categories(&self, subject: SubjectId) -> Result<Vec<Category>>;

    /// Tasks not yet done across all of `subject`'s categories.
    fn outstanding_task_count(&self, subject: SubjectId) -> Result<i64>;

    /// Category that owns `task_id`, or `None` if the task is gone.
    fn resolve_task_category(&self, task_id: TaskId) -> Result<Option<CategoryId>>;
}

/// The three report shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Summary,
    Donut,
    Heatmap,
}

impl ReportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::Summary => "summary",
            ReportKind::Donut => "donut chart",
            ReportKind::Heatmap => "heatmap",
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Today's canonical UTC date, the default reference date for reports.
pub fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}

/// Log the underlying cause and replace it with a detail-free error.
fn contain<T>(kind: ReportKind, subject: SubjectId, result: Result<T>) -> Result<T> {
    result.map_err(|err| {
        tracing::error!(%subject, report = %kind, error = %err, "report generation failed");
        Error::Aggregation {
            report: kind.as_str(),
        }
    })
}

/// Generate week, month and year summaries for `subject`.
pub fn generate_summary<S: EventSource + ?Sized>(
    source: &S,
    subject: SubjectId,
    today: NaiveDate,
) -> Result<SummaryReport> {
    let _span = tracing::debug_span!("summary", %subject, %today).entered();

    contain(ReportKind::Summary, subject, (|| {
        let completions = source.list_completions(subject)?;
        let sessions = source.list_focus_sessions(subject)?;
        let outstanding = source.outstanding_task_count(subject)?;
        tracing::debug!(
            completions = completions.len(),
            sessions = sessions.len(),
            outstanding,
            "building summary"
        );
        build_summary(&completions, &sessions, outstanding, today)
    })())
}

/// Generate week, month and year category breakdowns for `subject`.
pub fn generate_donut<S: EventSource + ?Sized>(
    source: &S,
    subject: SubjectId,
    today: NaiveDate,
    config: &StatsConfig,
) -> Result<DonutSet> {
    let _span = tracing::debug_span!("donut", %subject, %today).entered();

    contain(ReportKind::Donut, subject, (|| {
        let categories = source.list_categories(subject)?;
        let completions = source.list_completions(subject)?;
        let sessions = source.list_focus_sessions(subject)?;

        // Resolve each linked task once
        let linked: BTreeSet<TaskId> = sessions.iter().filter_map(|s| s.task_id).collect();
        let mut task_categories: HashMap<TaskId, CategoryId> = HashMap::new();
        for task_id in linked {
            if let Some(category_id) = source.resolve_task_category(task_id)? {
                task_categories.insert(task_id, category_id);
            }
        }
        tracing::debug!(
            categories = categories.len(),
            completions = completions.len(),
            sessions = sessions.len(),
            linked_tasks = task_categories.len(),
            "building donut chart"
        );

        build_donut(
            &completions,
            &sessions,
            &task_categories,
            &categories,
            today,
            config,
        )
    })())
}

/// Generate the 365-day heatmap ending at `today` for `subject`.
pub fn generate_heatmap<S: EventSource + ?Sized>(
    source: &S,
    subject: SubjectId,
    today: NaiveDate,
) -> Result<HeatmapReport> {
    let _span = tracing::debug_span!("heatmap", %subject, %today).entered();

    contain(ReportKind::Heatmap, subject, (|| {
        let completions = source.list_completions(subject)?;
        let sessions = source.list_focus_sessions(subject)?;
        build_heatmap(&completions, &sessions, today)
    })())
}
