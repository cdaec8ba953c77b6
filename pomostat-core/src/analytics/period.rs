//! Calendar period resolution.
//!
//! Every report is computed over inclusive date windows derived from a
//! reference date: the current week (Monday to Sunday), month, or year, and
//! the immediately preceding period of the same granularity.

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Resolution at which summary and donut reports are computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Week,
    Month,
    Year,
}

impl Granularity {
    /// All granularities in report order.
    pub const ALL: [Granularity; 3] = [Granularity::Week, Granularity::Month, Granularity::Year];

    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Week => "week",
            Granularity::Month => "month",
            Granularity::Year => "year",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "week" => Ok(Granularity::Week),
            "month" => Ok(Granularity::Month),
            "year" => Ok(Granularity::Year),
            other => Err(Error::Config(format!("unknown period granularity: {other}"))),
        }
    }
}

fn out_of_range(what: impl fmt::Display) -> Error {
    Error::DateOutOfRange(what.to_string())
}

/// An inclusive `[start, end]` range of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PeriodWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl PeriodWindow {
    /// Build a window, rejecting `end < start`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end < start {
            return Err(out_of_range(format!("window end {end} precedes start {start}")));
        }
        Ok(Self { start, end })
    }

    /// The period of `granularity` that contains `reference`.
    pub fn current(reference: NaiveDate, granularity: Granularity) -> Result<Self> {
        match granularity {
            Granularity::Week => {
                let offset = u64::from(reference.weekday().num_days_from_monday());
                let start = reference
                    .checked_sub_days(Days::new(offset))
                    .ok_or_else(|| out_of_range(format!("week start of {reference}")))?;
                let end = start
                    .checked_add_days(Days::new(6))
                    .ok_or_else(|| out_of_range(format!("week end of {reference}")))?;
                Self::new(start, end)
            }
            Granularity::Month => {
                let (year, month) = (reference.year(), reference.month());
                let start = NaiveDate::from_ymd_opt(year, month, 1)
                    .ok_or_else(|| out_of_range(format!("month start of {reference}")))?;
                let (next_year, next_month) = if month == 12 {
                    (year + 1, 1)
                } else {
                    (year, month + 1)
                };
                let end = NaiveDate::from_ymd_opt(next_year, next_month, 1)
                    .and_then(|first_of_next| first_of_next.pred_opt())
                    .ok_or_else(|| out_of_range(format!("month end of {reference}")))?;
                Self::new(start, end)
            }
            Granularity::Year => {
                let year = reference.year();
                let start = NaiveDate::from_ymd_opt(year, 1, 1)
                    .ok_or_else(|| out_of_range(format!("start of year {year}")))?;
                let end = NaiveDate::from_ymd_opt(year, 12, 31)
                    .ok_or_else(|| out_of_range(format!("end of year {year}")))?;
                Self::new(start, end)
            }
        }
    }

    /// The period of the same granularity immediately before this one.
    ///
    /// `self` must be a window produced by [`PeriodWindow::current`] for the
    /// same granularity.
    pub fn previous(&self, granularity: Granularity) -> Result<Self> {
        match granularity {
            Granularity::Week => {
                let shift = Days::new(7);
                let start = self
                    .start
                    .checked_sub_days(shift)
                    .ok_or_else(|| out_of_range(format!("week before {}", self.start)))?;
                let end = self
                    .end
                    .checked_sub_days(shift)
                    .ok_or_else(|| out_of_range(format!("week before {}", self.start)))?;
                Self::new(start, end)
            }
            Granularity::Month => {
                let last_of_previous = self
                    .start
                    .pred_opt()
                    .ok_or_else(|| out_of_range(format!("month before {}", self.start)))?;
                Self::current(last_of_previous, Granularity::Month)
            }
            Granularity::Year => {
                let year = self.start.year() - 1;
                let jan_first = NaiveDate::from_ymd_opt(year, 1, 1)
                    .ok_or_else(|| out_of_range(format!("start of year {year}")))?;
                Self::current(jan_first, Granularity::Year)
            }
        }
    }

    /// The `days`-long window ending at `end` inclusive.
    pub fn trailing(end: NaiveDate, days: u32) -> Result<Self> {
        if days == 0 {
            return Err(out_of_range("trailing window of zero days"));
        }
        let start = end
            .checked_sub_days(Days::new(u64::from(days - 1)))
            .ok_or_else(|| out_of_range(format!("{days} days before {end}")))?;
        Self::new(start, end)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Number of dates in the window (always at least 1).
    pub fn len_days(&self) -> usize {
        (self.end - self.start).num_days() as usize + 1
    }

    /// Every date in the window, ascending. Reversible.
    pub fn days(&self) -> impl DoubleEndedIterator<Item = NaiveDate> {
        let start = self.start;
        (0..self.len_days() as u64).map(move |offset| {
            // In range: start + offset <= end, and end is a valid date
            start + Days::new(offset)
        })
    }
}

impl fmt::Display for PeriodWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Current and previous windows for one granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodPair {
    pub granularity: Granularity,
    pub current: PeriodWindow,
    pub previous: PeriodWindow,
}

impl PeriodPair {
    /// Resolve both windows for `reference`.
    pub fn resolve(reference: NaiveDate, granularity: Granularity) -> Result<Self> {
        let current = PeriodWindow::current(reference, granularity)?;
        let previous = current.previous(granularity)?;
        Ok(Self {
            granularity,
            current,
            previous,
        })
    }
}
