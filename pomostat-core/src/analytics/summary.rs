//! Period summaries: per-day (or per-month) task, focus and pomodoro series
//! with totals, streaks and previous-period comparators.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use super::bucket::{bucket_daily, count, DailyBuckets};
use super::period::{Granularity, PeriodPair, PeriodWindow};
use super::streak::compute_streak;
use super::{completion_date, focus_date, round_to};
use crate::error::Result;
use crate::types::{CompletionEvent, FocusSessionEvent};

/// Decimal places kept for focus hours in summaries.
const FOCUS_DECIMALS: u32 = 2;

/// Summary payload for one granularity.
///
/// `tasks`, `focus` and `pomo` hold one entry per day of the window, or one
/// per month (12 entries) for the year view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodReport {
    pub tasks: Vec<i64>,
    /// Focus hours, rounded to 2 decimals
    pub focus: Vec<f64>,
    pub pomo: Vec<i64>,
    /// `done` plus every task currently outstanding across the subject's
    /// projects. This is a coarse approximation, not a count of tasks
    /// created inside the window; treat it as non-authoritative.
    pub created: i64,
    /// Completions inside the window
    pub done: i64,
    /// Trailing streak ending at the window's last day
    pub streak: i64,
    pub best_streak: i64,
    pub prev_tasks: i64,
    /// Previous-period focus hours, rounded to 2 decimals
    pub prev_focus: f64,
    pub prev_pomo: i64,
}

impl PeriodReport {
    /// Total focus hours of the current window (sum of the rounded series).
    pub fn focus_total(&self) -> f64 {
        round_to(self.focus.iter().sum(), FOCUS_DECIMALS)
    }

    /// Focus session count of the current window.
    pub fn pomo_total(&self) -> i64 {
        self.pomo.iter().sum()
    }
}

/// Summaries for the week, month and year containing the reference date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryReport {
    pub week: PeriodReport,
    pub month: PeriodReport,
    pub year: PeriodReport,
}

impl SummaryReport {
    pub fn get(&self, granularity: Granularity) -> &PeriodReport {
        match granularity {
            Granularity::Week => &self.week,
            Granularity::Month => &self.month,
            Granularity::Year => &self.year,
        }
    }
}

struct WindowBuckets {
    tasks: DailyBuckets<i64>,
    focus: DailyBuckets<f64>,
    pomo: DailyBuckets<i64>,
}

impl WindowBuckets {
    fn scan(
        completions: &[CompletionEvent],
        sessions: &[FocusSessionEvent],
        window: &PeriodWindow,
    ) -> Self {
        Self {
            tasks: bucket_daily(completions, window, completion_date, count),
            focus: bucket_daily(sessions, window, focus_date, FocusSessionEvent::hours),
            pomo: bucket_daily(sessions, window, focus_date, count),
        }
    }
}

/// Build the summary for one current/previous window pair.
///
/// `outstanding_tasks` only feeds the approximate `created` field.
pub fn build_period_report(
    completions: &[CompletionEvent],
    sessions: &[FocusSessionEvent],
    outstanding_tasks: i64,
    pair: &PeriodPair,
) -> PeriodReport {
    let current = WindowBuckets::scan(completions, sessions, &pair.current);
    let previous = WindowBuckets::scan(completions, sessions, &pair.previous);

    let (tasks, focus, pomo) = match pair.granularity {
        Granularity::Year => {
            let year = pair.current.start().year();
            (
                current.tasks.monthly_totals(year).to_vec(),
                current
                    .focus
                    .monthly_totals(year)
                    .iter()
                    .map(|hours| round_to(*hours, FOCUS_DECIMALS))
                    .collect(),
                current.pomo.monthly_totals(year).to_vec(),
            )
        }
        Granularity::Week | Granularity::Month => (
            daily_series(&current.tasks, &pair.current),
            daily_series(&current.focus, &pair.current)
                .into_iter()
                .map(|hours| round_to(hours, FOCUS_DECIMALS))
                .collect(),
            daily_series(&current.pomo, &pair.current),
        ),
    };

    let done = current.tasks.total();
    let streaks = compute_streak(&current.tasks.active_dates(), &pair.current);

    PeriodReport {
        tasks,
        focus,
        pomo,
        created: done + outstanding_tasks,
        done,
        streak: streaks.current_streak,
        best_streak: streaks.best_streak,
        prev_tasks: previous.tasks.total(),
        prev_focus: round_to(previous.focus.total(), FOCUS_DECIMALS),
        prev_pomo: previous.pomo.total(),
    }
}

fn daily_series<V: super::bucket::BucketValue>(
    buckets: &DailyBuckets<V>,
    window: &PeriodWindow,
) -> Vec<V> {
    buckets.dense(window).into_iter().map(|(_, value)| value).collect()
}

/// Build week, month and year summaries relative to `today`.
pub fn build_summary(
    completions: &[CompletionEvent],
    sessions: &[FocusSessionEvent],
    outstanding_tasks: i64,
    today: NaiveDate,
) -> Result<SummaryReport> {
    let report = |granularity| -> Result<PeriodReport> {
        let pair = PeriodPair::resolve(today, granularity)?;
        Ok(build_period_report(completions, sessions, outstanding_tasks, &pair))
    };

    Ok(SummaryReport {
        week: report(Granularity::Week)?,
        month: report(Granularity::Month)?,
        year: report(Granularity::Year)?,
    })
}

/// Percentage change from `previous` to `current`.
///
/// Growth from zero is reported as 100%.
pub fn delta_pct(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        if current == 0.0 {
            0.0
        } else {
            100.0
        }
    } else {
        ((current - previous) / previous) * 100.0
    }
}

/// Format a delta for display (e.g., "+23%" or "-15%").
pub fn format_delta(delta: f64) -> String {
    if delta >= 0.0 {
        format!("+{:.0}%", delta)
    } else {
        format!("{:.0}%", delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::normalize::parse_stored_instant;
    use crate::types::{SubjectId, TimerMode};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn completion(at: &str) -> CompletionEvent {
        CompletionEvent {
            subject_id: SubjectId(1),
            category_id: "p1".to_string(),
            label: "task".to_string(),
            completed_at: parse_stored_instant(at).ok(),
        }
    }

    fn session(at: &str, seconds: i64, mode: TimerMode) -> FocusSessionEvent {
        FocusSessionEvent {
            subject_id: SubjectId(1),
            mode,
            duration_seconds: seconds,
            task_id: None,
            completed_at: parse_stored_instant(at).ok(),
        }
    }

    fn today() -> NaiveDate {
        date(2024, 3, 14)
    }

    #[test]
    fn test_week_boundaries_and_previous_week() {
        let completions = vec![
            completion("2024-03-13T23:00:00+00:00"),
            completion("2024-03-10T23:59:00+00:00"),
        ];
        let summary = build_summary(&completions, &[], 0, today()).unwrap();

        assert_eq!(summary.week.tasks, vec![0, 0, 1, 0, 0, 0, 0]);
        assert_eq!(summary.week.done, 1);
        assert_eq!(summary.week.prev_tasks, 1);
    }

    #[test]
    fn test_week_streaks() {
        let completions = vec![
            completion("2024-03-11T09:00:00Z"),
            completion("2024-03-12T09:00:00Z"),
            completion("2024-03-14T09:00:00Z"),
        ];
        let summary = build_summary(&completions, &[], 0, today()).unwrap();
        assert_eq!(summary.week.streak, 0);
        assert_eq!(summary.week.best_streak, 2);
    }

    #[test]
    fn test_focus_hours_and_pomo_counts() {
        let sessions = vec![
            session("2024-03-12T10:00:00Z", 5400, TimerMode::Focus),
            session("2024-03-12T11:00:00Z", 1500, TimerMode::Focus),
            session("2024-03-12T11:30:00Z", 300, TimerMode::ShortBreak),
            session("2024-03-05T10:00:00Z", 3600, TimerMode::Focus),
        ];
        let summary = build_summary(&[], &sessions, 0, today()).unwrap();

        // 5400 + 1500 seconds = 1.9166.. hours
        assert_eq!(summary.week.focus[1], 1.92);
        assert_eq!(summary.week.pomo, vec![0, 2, 0, 0, 0, 0, 0]);
        assert_eq!(summary.week.prev_focus, 1.0);
        assert_eq!(summary.week.prev_pomo, 1);
    }

    #[test]
    fn test_year_view_is_monthly() {
        let completions = vec![
            completion("2024-01-31T12:00:00Z"),
            completion("2024-03-01 08:00:00"),
            completion("2024-03-14T08:00:00Z"),
            completion("2023-12-31T23:59:59Z"),
        ];
        let summary = build_summary(&completions, &[], 0, today()).unwrap();

        assert_eq!(summary.year.tasks.len(), 12);
        assert_eq!(summary.year.tasks[0], 1);
        assert_eq!(summary.year.tasks[2], 2);
        assert_eq!(summary.year.tasks.iter().sum::<i64>(), summary.year.done);
        assert_eq!(summary.year.prev_tasks, 1);
        assert_eq!(summary.year.focus.len(), 12);
        assert_eq!(summary.year.pomo.len(), 12);
    }

    #[test]
    fn test_year_months_add_up_daily_values() {
        // 100s a day through January: 31 * 0.0278h is 0.86h, while rounding
        // each day first would give 0.93h
        let mut sessions: Vec<_> = (1..=31)
            .map(|d| session(&format!("2024-01-{d:02}T07:00:00Z"), 100, TimerMode::Focus))
            .collect();
        sessions.extend([
            session("2024-02-29T23:59:59Z", 1500, TimerMode::Focus),
            session("2024-02-29T23:00:00Z", 300, TimerMode::ShortBreak),
            session("2024-03-01 00:00:00", 1000, TimerMode::Focus),
            session("2024-03-14T12:00:00Z", 1000, TimerMode::Focus),
            session("2023-12-31T23:59:59Z", 3600, TimerMode::Focus),
        ]);
        let summary = build_summary(&[], &sessions, 0, today()).unwrap();
        let year = &summary.year;

        let window = PeriodWindow::current(today(), Granularity::Year).unwrap();
        let daily_pomo = bucket_daily(&sessions, &window, focus_date, count);
        let daily_focus = bucket_daily(&sessions, &window, focus_date, FocusSessionEvent::hours);

        assert_eq!(year.pomo, vec![31, 1, 2, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(year.pomo.iter().sum::<i64>(), daily_pomo.total());

        assert_eq!(year.focus[0], 0.86);
        assert_eq!(year.focus[1], 0.42);
        assert_eq!(year.focus[2], 0.56);
        for (month, hours) in year.focus.iter().enumerate() {
            let raw: f64 = daily_focus
                .iter()
                .filter(|(date, _)| date.month0() as usize == month)
                .map(|(_, value)| value)
                .sum();
            assert_eq!(*hours, round_to(raw, FOCUS_DECIMALS), "month {month}");
        }
        let summed: f64 = year.focus.iter().sum();
        assert!((summed - daily_focus.total()).abs() < 0.005 * 12.0);
        assert_eq!(year.prev_pomo, 1);
    }

    #[test]
    fn test_month_series_length_and_done() {
        let completions = vec![
            completion("2024-03-01T00:00:00Z"),
            completion("2024-03-31T23:59:59Z"),
            completion("2024-02-29T12:00:00Z"),
        ];
        let summary = build_summary(&completions, &[], 0, today()).unwrap();
        assert_eq!(summary.month.tasks.len(), 31);
        assert_eq!(summary.month.tasks.iter().sum::<i64>(), summary.month.done);
        assert_eq!(summary.month.done, 2);
        assert_eq!(summary.month.prev_tasks, 1);
        // The trailing streak counts back from March 31st
        assert_eq!(summary.month.streak, 1);
    }

    #[test]
    fn test_created_adds_outstanding_tasks() {
        let completions = vec![completion("2024-03-12T09:00:00Z")];
        let summary = build_summary(&completions, &[], 4, today()).unwrap();
        assert_eq!(summary.week.done, 1);
        assert_eq!(summary.week.created, 5);
    }

    #[test]
    fn test_malformed_events_are_skipped() {
        let completions = vec![completion("not a date"), completion("2024-03-12T09:00:00Z")];
        let summary = build_summary(&completions, &[], 0, today()).unwrap();
        assert_eq!(summary.week.done, 1);
    }

    #[test]
    fn test_empty_inputs() {
        let summary = build_summary(&[], &[], 0, today()).unwrap();
        for granularity in Granularity::ALL {
            let report = summary.get(granularity);
            assert_eq!(report.done, 0);
            assert_eq!(report.streak, 0);
            assert_eq!(report.best_streak, 0);
            assert!(report.tasks.iter().all(|v| *v == 0));
        }
    }

    #[test]
    fn test_json_shape_uses_camel_case() {
        let summary = build_summary(&[], &[], 0, today()).unwrap();
        let json = serde_json::to_value(&summary).unwrap();
        let week = &json["week"];
        for key in [
            "tasks", "focus", "pomo", "created", "done", "streak", "bestStreak", "prevTasks",
            "prevFocus", "prevPomo",
        ] {
            assert!(week.get(key).is_some(), "missing key {key}");
        }
    }

    #[test]
    fn test_deltas() {
        assert_eq!(delta_pct(123.0, 100.0), 23.0);
        assert_eq!(delta_pct(80.0, 100.0), -20.0);
        assert_eq!(delta_pct(5.0, 0.0), 100.0);
        assert_eq!(delta_pct(0.0, 0.0), 0.0);
        assert_eq!(format_delta(23.0), "+23%");
        assert_eq!(format_delta(-15.4), "-15%");
    }
}
