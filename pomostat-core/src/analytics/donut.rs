//! Categorical breakdowns (donut charts).
//!
//! Completions and focus hours are grouped by owning category, ranked by
//! magnitude, and the long tail past the top N is folded into one "Other"
//! slice.

use chrono::NaiveDate;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use super::bucket::BucketValue;
use super::period::{Granularity, PeriodWindow};
use super::{completion_date, focus_date, round_to};
use crate::config::StatsConfig;
use crate::error::Result;
use crate::types::{Category, CategoryId, CompletionEvent, FocusSessionEvent, TaskId};

/// Label of the slice that collects categories past the top N.
pub const OTHER_LABEL: &str = "Other";

/// Decimal places kept for focus hours in breakdowns.
const FOCUS_DECIMALS: u32 = 1;

/// One slice of a donut chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DonutEntry<V> {
    pub name: String,
    pub value: V,
    pub color: String,
}

/// Breakdown of one window by category.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DonutReport {
    /// Completed tasks per category
    pub tasks: Vec<DonutEntry<i64>>,
    /// Focus hours per category, rounded to 1 decimal
    pub focus: Vec<DonutEntry<f64>>,
}

/// Breakdowns for the week, month and year containing the reference date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DonutSet {
    pub week: DonutReport,
    pub month: DonutReport,
    pub year: DonutReport,
}

impl DonutSet {
    pub fn get(&self, granularity: Granularity) -> &DonutReport {
        match granularity {
            Granularity::Week => &self.week,
            Granularity::Month => &self.month,
            Granularity::Year => &self.year,
        }
    }
}

/// Deterministic color for a category that never had one: `#` followed by
/// the first three bytes of the SHA-256 of its id.
pub fn fallback_color(category_id: &str) -> String {
    let digest = Sha256::digest(category_id.as_bytes());
    format!("#{}", hex::encode(&digest[..3]))
}

/// Name and color lookup for a subject's categories.
struct CategoryDirectory<'a> {
    by_id: HashMap<&'a str, &'a Category>,
    config: &'a StatsConfig,
}

impl<'a> CategoryDirectory<'a> {
    fn new(categories: &'a [Category], config: &'a StatsConfig) -> Self {
        Self {
            by_id: categories.iter().map(|c| (c.id.as_str(), c)).collect(),
            config,
        }
    }

    fn label(&self, category_id: &str) -> (String, String) {
        match self.by_id.get(category_id) {
            Some(category) => {
                let color = category
                    .display_color
                    .as_deref()
                    .filter(|color| !color.trim().is_empty())
                    .map(str::to_string)
                    .unwrap_or_else(|| fallback_color(&category.id));
                (category.display_name.clone(), color)
            }
            None => {
                tracing::debug!(category_id, "category not found, using placeholder");
                (
                    self.config.placeholder_name.clone(),
                    self.config.placeholder_color.clone(),
                )
            }
        }
    }
}

/// Rank per-category totals and collapse the tail.
///
/// Totals `<= 0` are dropped before ranking. Ties keep category id order.
/// `present` rounds a value for display; the "Other" slice is the presented
/// sum of presented values.
fn rank_and_collapse<V, P>(
    totals: BTreeMap<&str, V>,
    directory: &CategoryDirectory<'_>,
    present: P,
) -> Vec<DonutEntry<V>>
where
    V: BucketValue,
    P: Fn(V) -> V,
{
    let mut entries: Vec<DonutEntry<V>> = totals
        .into_iter()
        .filter(|(_, value)| *value > V::default())
        .map(|(category_id, value)| {
            let (name, color) = directory.label(category_id);
            DonutEntry {
                name,
                value: present(value),
                color,
            }
        })
        .collect();

    entries.sort_by(|a, b| b.value.partial_cmp(&a.value).unwrap_or(Ordering::Equal));

    let keep = directory.config.top_categories;
    if entries.len() > keep {
        let tail = entries.split_off(keep);
        let mut other = V::default();
        for entry in &tail {
            other += entry.value;
        }
        entries.push(DonutEntry {
            name: OTHER_LABEL.to_string(),
            value: present(other),
            color: directory.config.other_color.clone(),
        });
    }

    entries
}

/// Build the breakdown of one window.
///
/// `task_categories` maps linked task ids to their owning category. Focus
/// sessions without a linked task, or whose task no longer resolves, are
/// left out of the focus breakdown (they still count in summaries).
pub fn build_donut_report(
    completions: &[CompletionEvent],
    sessions: &[FocusSessionEvent],
    task_categories: &HashMap<TaskId, CategoryId>,
    categories: &[Category],
    window: &PeriodWindow,
    config: &StatsConfig,
) -> DonutReport {
    let directory = CategoryDirectory::new(categories, config);

    let mut task_totals: BTreeMap<&str, i64> = BTreeMap::new();
    for event in completions {
        if completion_date(event).is_some_and(|date| window.contains(date)) {
            *task_totals.entry(event.category_id.as_str()).or_default() += 1;
        }
    }

    let mut focus_totals: BTreeMap<&str, f64> = BTreeMap::new();
    for session in sessions {
        if !focus_date(session).is_some_and(|date| window.contains(date)) {
            continue;
        }
        let Some(task_id) = session.task_id else {
            continue;
        };
        match task_categories.get(&task_id) {
            Some(category_id) => {
                *focus_totals.entry(category_id.as_str()).or_default() += session.hours();
            }
            None => tracing::debug!(task_id, "linked task has no category, skipping session"),
        }
    }

    DonutReport {
        tasks: rank_and_collapse(task_totals, &directory, |count| count),
        focus: rank_and_collapse(focus_totals, &directory, |hours| {
            round_to(hours, FOCUS_DECIMALS)
        }),
    }
}

/// Build week, month and year breakdowns relative to `today`.
pub fn build_donut(
    completions: &[CompletionEvent],
    sessions: &[FocusSessionEvent],
    task_categories: &HashMap<TaskId, CategoryId>,
    categories: &[Category],
    today: NaiveDate,
    config: &StatsConfig,
) -> Result<DonutSet> {
    let report = |granularity| -> Result<DonutReport> {
        let window = PeriodWindow::current(today, granularity)?;
        Ok(build_donut_report(
            completions,
            sessions,
            task_categories,
            categories,
            &window,
            config,
        ))
    };

    Ok(DonutSet {
        week: report(Granularity::Week)?,
        month: report(Granularity::Month)?,
        year: report(Granularity::Year)?,
    })
}
