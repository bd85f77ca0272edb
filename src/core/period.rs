//! Calendar periods and date windows.
//!
//! A [`Period`] is one calendar month. Its transaction window is half-open: the first day
//! of the month is included and the first day of the following month is not, which for
//! December is 1 January of the next year.

use crate::errors::{Error, Result};
use chrono::{Datelike, Months, NaiveDate};
use serde::Serialize;
use std::fmt;

const MONTH_NAMES: [&str; 12] = [
    "Januari",
    "Februari",
    "Maret",
    "April",
    "Mei",
    "Juni",
    "Juli",
    "Agustus",
    "September",
    "Oktober",
    "November",
    "Desember",
];

const MONTH_SHORT_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "Mei", "Jun", "Jul", "Agu", "Sep", "Okt", "Nov", "Des",
];

/// Indonesian month name for a month number (1-12).
#[must_use]
pub fn month_name(month: u32) -> Option<&'static str> {
    let index = usize::try_from(month.checked_sub(1)?).ok()?;
    MONTH_NAMES.get(index).copied()
}

/// Three-letter Indonesian month abbreviation for a month number (1-12).
#[must_use]
pub fn month_short_name(month: u32) -> Option<&'static str> {
    let index = usize::try_from(month.checked_sub(1)?).ok()?;
    MONTH_SHORT_NAMES.get(index).copied()
}

/// Half-open date interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DateRange {
    /// First day included
    pub start: NaiveDate,
    /// First day excluded
    pub end: NaiveDate,
}

impl DateRange {
    /// Builds a range, rejecting an end that precedes the start.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end < start {
            return Err(Error::Validation {
                field: "date range",
                message: format!("end {end} is before start {start}"),
            });
        }
        Ok(Self { start, end })
    }

    /// 1 January of `year` up to, but excluding, 1 January of the next year.
    pub fn year(year: i32) -> Result<Self> {
        let start = NaiveDate::from_ymd_opt(year, 1, 1);
        let end = year
            .checked_add(1)
            .and_then(|next| NaiveDate::from_ymd_opt(next, 1, 1));
        match (start, end) {
            (Some(start), Some(end)) => Ok(Self { start, end }),
            _ => Err(Error::InvalidPeriod { month: 1, year }),
        }
    }

    /// Whether `date` falls within `[start, end)`.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }
}

/// One calendar month of one year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Period {
    start: NaiveDate,
    end: NaiveDate,
}

impl Period {
    /// Validates `month` (1-12) and `year`.
    pub fn new(month: u32, year: i32) -> Result<Self> {
        let start = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or(Error::InvalidPeriod { month, year })?;
        let end = start
            .checked_add_months(Months::new(1))
            .ok_or(Error::InvalidPeriod { month, year })?;
        Ok(Self { start, end })
    }

    /// The period a date falls in.
    pub fn containing(date: NaiveDate) -> Result<Self> {
        Self::new(date.month(), date.year())
    }

    /// Month number, 1-12.
    #[must_use]
    pub fn month(self) -> u32 {
        self.start.month()
    }

    /// Calendar year.
    #[must_use]
    pub fn year(self) -> i32 {
        self.start.year()
    }

    /// First day of the month.
    #[must_use]
    pub const fn first_day(self) -> NaiveDate {
        self.start
    }

    /// First day of the following month (exclusive end of the window).
    #[must_use]
    pub const fn next_first_day(self) -> NaiveDate {
        self.end
    }

    /// The month as a half-open date window.
    #[must_use]
    pub const fn date_range(self) -> DateRange {
        DateRange {
            start: self.start,
            end: self.end,
        }
    }

    /// Whether `date` falls within the month.
    #[must_use]
    pub fn contains(self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }

    /// Indonesian month name, e.g. `"Januari"`.
    #[must_use]
    pub fn month_name(self) -> &'static str {
        month_name(self.month()).unwrap_or_default()
    }

    /// Month number as stored in the database.
    #[allow(clippy::cast_possible_wrap)] // month is 1-12
    #[must_use]
    pub fn month_column(self) -> i32 {
        self.month() as i32
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.month_name(), self.year())
    }
}
