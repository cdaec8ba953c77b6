//! Activity streaks within a single period.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeSet;

use super::period::PeriodWindow;

/// Streak statistics for one window.
///
/// `best_streak >= current_streak` always holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StreakResult {
    /// Consecutive active days ending at the window's last date
    pub current_streak: i64,
    /// Longest run of consecutive active days inside the window
    pub best_streak: i64,
}

/// Calculate streaks over the dates of `window`.
///
/// A period's streak is self-contained: activity before `window.start()`
/// never extends a streak, and the trailing streak is counted back from
/// `window.end()` even when that date is in the future.
pub fn compute_streak(active: &BTreeSet<NaiveDate>, window: &PeriodWindow) -> StreakResult {
    let mut best_streak = 0i64;
    let mut running = 0i64;

    for date in window.days() {
        if active.contains(&date) {
            running += 1;
            best_streak = best_streak.max(running);
        } else {
            running = 0;
        }
    }

    let current_streak = window
        .days()
        .rev()
        .take_while(|date| active.contains(date))
        .count() as i64;

    StreakResult {
        current_streak,
        best_streak,
    }
}
