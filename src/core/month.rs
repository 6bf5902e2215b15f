//! Calendar months used to bucket transactions and price history.
//!
//! A month is rendered as a short label (`jan24`), the key shared by the
//! spending cadence, entry points, historical valuation, and the lite
//! price-history variant.

use chrono::{Datelike, NaiveDate};
use std::fmt::Display;
use std::str::FromStr;

const MONTH_NAMES: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Month {
    year: i32,
    month: u32,
}

impl Month {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if (1..=12).contains(&month) {
            Some(Month { year, month })
        } else {
            None
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// Short label: 3-letter lowercase month plus 2-digit year, e.g. `jan24`.
    pub fn short_label(&self) -> String {
        format!(
            "{}{:02}",
            MONTH_NAMES[(self.month - 1) as usize],
            self.year.rem_euclid(100)
        )
    }

    /// Calendar-correct step: `dec` rolls over into `jan` of the next year.
    pub fn next(&self) -> Month {
        if self.month == 12 {
            Month {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Month {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// Iterates from `self` through `last` inclusive.
    pub fn until(self, last: Month) -> MonthRange {
        MonthRange {
            next: Some(self),
            last,
        }
    }
}

impl From<NaiveDate> for Month {
    fn from(date: NaiveDate) -> Self {
        Month {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl Display for Month {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.short_label())
    }
}

impl FromStr for Month {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 5 {
            return Err(anyhow::anyhow!("Invalid month label: {}", s));
        }
        let (name, year) = s.split_at(3);
        let month = MONTH_NAMES
            .iter()
            .position(|m| *m == name.to_lowercase())
            .ok_or_else(|| anyhow::anyhow!("Invalid month label: {}", s))?;
        let year: i32 = year
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid month label: {}", s))?;
        Ok(Month {
            year: 2000 + year,
            month: month as u32 + 1,
        })
    }
}

pub struct MonthRange {
    next: Option<Month>,
    last: Month,
}

impl Iterator for MonthRange {
    type Item = Month;

    fn next(&mut self) -> Option<Month> {
        let current = self.next?;
        if current > self.last {
            self.next = None;
            return None;
        }
        self.next = Some(current.next());
        Some(current)
    }
}
