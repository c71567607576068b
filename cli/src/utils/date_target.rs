use std::{fmt, str::FromStr};

use chrono::{Datelike, Days, Local, NaiveDate};
use sportcal_core::Filter;

/// A date window named on the command line
#[derive(Debug, Clone, PartialEq)]
pub enum DateTarget {
    All,
    Upcoming,
    Today,
    Tomorrow,
    Weekend,
    NextWeek,
    NextMonth,
    Specific(NaiveDate),
    Range(NaiveDate, NaiveDate),
}

impl DateTarget {
    /// Inclusive bounds relative to `today`. `(None, None)` means no date constraint.
    pub fn to_date_range(&self, today: NaiveDate) -> (Option<NaiveDate>, Option<NaiveDate>) {
        let tomorrow = today.succ_opt().unwrap_or(today);

        match self {
            DateTarget::All => (None, None),
            DateTarget::Upcoming => (Some(today), None),
            DateTarget::Today => (Some(today), Some(today)),
            DateTarget::Tomorrow => (Some(tomorrow), Some(tomorrow)),
            DateTarget::Weekend => {
                // Monday is 0, so Saturday is 5; on Sunday only Sunday is left
                let weekday = today.weekday().num_days_from_monday();
                if weekday == 6 {
                    (Some(today), Some(today))
                } else {
                    let saturday = today
                        .checked_add_days(Days::new(u64::from(5 - weekday)))
                        .unwrap_or(today);
                    (Some(saturday), saturday.succ_opt())
                }
            }
            DateTarget::NextWeek => {
                let end = today.checked_add_days(Days::new(7)).unwrap_or(today);
                (Some(today), Some(end))
            }
            DateTarget::NextMonth => {
                let end = today.checked_add_days(Days::new(30)).unwrap_or(today);
                (Some(today), Some(end))
            }
            DateTarget::Specific(date) => (Some(*date), Some(*date)),
            DateTarget::Range(start, end) => (Some(*start), Some(*end)),
        }
    }

    /// The date filter for this window, `None` for [`DateTarget::All`]
    pub fn to_filter(&self) -> Option<Filter> {
        match self.to_date_range(Local::now().date_naive()) {
            (None, None) => None,
            (start, end) => Some(Filter::DateRange { start, end }),
        }
    }
}

fn parse_day(s: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| anyhow::anyhow!("Invalid date target: {}", e))
}

impl FromStr for DateTarget {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" | "" => Ok(Self::All),
            "upcoming" => Ok(Self::Upcoming),
            "today" => Ok(Self::Today),
            "tomorrow" => Ok(Self::Tomorrow),
            "weekend" => Ok(Self::Weekend),
            "next week" => Ok(Self::NextWeek),
            "next month" => Ok(Self::NextMonth),
            _ => match s.split_once("..") {
                Some((start, end)) => {
                    let (start, end) = (parse_day(start)?, parse_day(end)?);
                    if start > end {
                        anyhow::bail!("Invalid date target: {} is after {}", start, end);
                    }
                    Ok(Self::Range(start, end))
                }
                None => Ok(Self::Specific(parse_day(s)?)),
            },
        }
    }
}

impl fmt::Display for DateTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateTarget::All => f.write_str("all"),
            DateTarget::Upcoming => f.write_str("upcoming"),
            DateTarget::Today => f.write_str("today"),
            DateTarget::Tomorrow => f.write_str("tomorrow"),
            DateTarget::Weekend => f.write_str("weekend"),
            DateTarget::NextWeek => f.write_str("next week"),
            DateTarget::NextMonth => f.write_str("next month"),
            DateTarget::Specific(dt) => write!(f, "{}", dt),
            DateTarget::Range(start, end) => write!(f, "{}..{}", start, end),
        }
    }
}
