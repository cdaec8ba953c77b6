//! Statistics aggregation for pomostat
//!
//! Turns raw completion and focus-session events into chart-ready series:
//! - Period resolution (week, month, year and their predecessors)
//! - Timestamp normalization to canonical UTC dates
//! - Daily bucketing and streaks
//! - Summary, donut and heatmap builders
//!
//! The builders are pure functions over slices. [`report`] wires them to an
//! [`EventSource`] and contains failures per report.

pub mod bucket;
pub mod donut;
pub mod heatmap;
pub mod normalize;
pub mod period;
pub mod report;
pub mod streak;
pub mod summary;

use chrono::NaiveDate;

use crate::types::{CompletionEvent, FocusSessionEvent, TimerMode};

pub use bucket::{bucket_daily, BucketValue, DailyBuckets};
pub use donut::{build_donut, build_donut_report, DonutEntry, DonutReport, DonutSet, OTHER_LABEL};
pub use heatmap::{build_heatmap, HeatmapReport, HEATMAP_DAYS};
pub use normalize::{event_date, parse_stored_instant, StoredInstant};
pub use period::{Granularity, PeriodPair, PeriodWindow};
pub use report::{
    generate_donut, generate_heatmap, generate_summary, today_utc, EventSource, ReportKind,
};
pub use streak::{compute_streak, StreakResult};
pub use summary::{
    build_period_report, build_summary, delta_pct, format_delta, PeriodReport, SummaryReport,
};

/// Round half away from zero to `decimals` places.
pub(crate) fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Canonical date of a completion, if its timestamp is known.
pub(crate) fn completion_date(event: &CompletionEvent) -> Option<NaiveDate> {
    event_date(event.completed_at.as_ref())
}

/// Canonical date of a focus-mode session. Breaks never have one.
pub(crate) fn focus_date(session: &FocusSessionEvent) -> Option<NaiveDate> {
    if session.mode != TimerMode::Focus {
        return None;
    }
    event_date(session.completed_at.as_ref())
}
