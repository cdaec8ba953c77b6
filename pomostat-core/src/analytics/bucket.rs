//! Per-day bucketing of event collections.

use chrono::{Datelike, NaiveDate};
use std::collections::{BTreeMap, BTreeSet};
use std::ops::AddAssign;

use super::period::PeriodWindow;

/// A value that can be accumulated in a bucket: counts (`i64`) or hours
/// (`f64`).
pub trait BucketValue: Copy + Default + AddAssign + PartialOrd {}

impl BucketValue for i64 {}
impl BucketValue for f64 {}

/// Canonical date → accumulated value. Only dates with activity are stored.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyBuckets<V> {
    values: BTreeMap<NaiveDate, V>,
}

impl<V: BucketValue> Default for DailyBuckets<V> {
    fn default() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }
}

impl<V: BucketValue> DailyBuckets<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, date: NaiveDate, value: V) {
        *self.values.entry(date).or_default() += value;
    }

    /// Value for `date`, zero when nothing happened that day.
    pub fn get(&self, date: NaiveDate) -> V {
        self.values.get(&date).copied().unwrap_or_default()
    }

    /// Sum over every stored day.
    pub fn total(&self) -> V {
        let mut total = V::default();
        for value in self.values.values() {
            total += *value;
        }
        total
    }

    /// Number of dates with a stored value.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Stored dates in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, V)> + '_ {
        self.values.iter().map(|(date, value)| (*date, *value))
    }

    /// One value per date of `window`, zero-filled, ascending.
    pub fn dense(&self, window: &PeriodWindow) -> Vec<(NaiveDate, V)> {
        window.days().map(|date| (date, self.get(date))).collect()
    }

    /// Dates whose accumulated value is strictly positive.
    pub fn active_dates(&self) -> BTreeSet<NaiveDate> {
        self.values
            .iter()
            .filter(|(_, value)| **value > V::default())
            .map(|(date, _)| *date)
            .collect()
    }

    /// Re-aggregate into twelve monthly totals for `year` (index 0 = January).
    ///
    /// Days outside `year` are ignored.
    pub fn monthly_totals(&self, year: i32) -> [V; 12] {
        let mut months = [V::default(); 12];
        for (date, value) in self.iter().filter(|(date, _)| date.year() == year) {
            months[date.month0() as usize] += value;
        }
        months
    }
}

/// Group `events` by canonical date within `window`.
///
/// Events whose date is unknown or falls outside the window are ignored.
pub fn bucket_daily<E, V, D, F>(
    events: &[E],
    window: &PeriodWindow,
    date_of: D,
    value_of: F,
) -> DailyBuckets<V>
where
    V: BucketValue,
    D: Fn(&E) -> Option<NaiveDate>,
    F: Fn(&E) -> V,
{
    let mut buckets = DailyBuckets::new();
    for event in events {
        match date_of(event) {
            Some(date) if window.contains(date) => buckets.add(date, value_of(event)),
            _ => {}
        }
    }
    buckets
}

/// Value rule counting one per event.
pub fn count<E>(_: &E) -> i64 {
    1
}
