//! Rolling daily activity heatmap.
//!
//! Always covers the 365 days ending at the reference date, with every date
//! present so the chart never has to guess at gaps.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

use super::bucket::{bucket_daily, count};
use super::period::PeriodWindow;
use super::{completion_date, focus_date, round_to};
use crate::error::Result;
use crate::types::{CompletionEvent, FocusSessionEvent};

/// Days covered by the heatmap, today included.
pub const HEATMAP_DAYS: u32 = 365;

const FOCUS_DECIMALS: u32 = 1;

/// Per-day values keyed by ISO date (`YYYY-MM-DD`).
///
/// Keys sort lexicographically in date order, so both maps serialize in
/// ascending date order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapReport {
    pub tasks: BTreeMap<String, i64>,
    /// Focus hours, rounded to 1 decimal
    pub focus: BTreeMap<String, f64>,
}

impl HeatmapReport {
    /// Number of days with at least one completion.
    pub fn active_days(&self) -> usize {
        self.tasks.values().filter(|count| **count > 0).count()
    }

    /// Largest single-day completion count.
    pub fn peak_tasks(&self) -> i64 {
        self.tasks.values().copied().max().unwrap_or(0)
    }
}

fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Build the heatmap for the 365 days ending at `today`.
pub fn build_heatmap(
    completions: &[CompletionEvent],
    sessions: &[FocusSessionEvent],
    today: NaiveDate,
) -> Result<HeatmapReport> {
    let window = PeriodWindow::trailing(today, HEATMAP_DAYS)?;

    let tasks = bucket_daily(completions, &window, completion_date, count);
    let focus = bucket_daily(sessions, &window, focus_date, FocusSessionEvent::hours);

    Ok(HeatmapReport {
        tasks: tasks
            .dense(&window)
            .into_iter()
            .map(|(date, value)| (date_key(date), value))
            .collect(),
        focus: focus
            .dense(&window)
            .into_iter()
            .map(|(date, hours)| (date_key(date), round_to(hours, FOCUS_DECIMALS)))
            .collect(),
    })
}
