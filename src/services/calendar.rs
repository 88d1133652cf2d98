use crate::models::Holiday;
use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};
use std::collections::HashSet;

/// Snapshot of the working calendar: one non-working weekday plus the
/// holiday set, loaded once per evaluation pass.
#[derive(Debug, Clone)]
pub struct WorkingCalendar {
    non_working_weekday: Weekday,
    holidays: HashSet<NaiveDate>,
    /// (month, day) pairs for annually recurring holidays.
    recurring: HashSet<(u32, u32)>,
}

impl WorkingCalendar {
    pub fn new(non_working_weekday: Weekday) -> Self {
        Self {
            non_working_weekday,
            holidays: HashSet::new(),
            recurring: HashSet::new(),
        }
    }

    /// Build a snapshot from persisted holiday rows. Rows with unparseable
    /// dates are skipped with a warning rather than poisoning the pass.
    pub fn from_holidays(non_working_weekday: Weekday, holidays: &[Holiday]) -> Self {
        let mut calendar = Self::new(non_working_weekday);
        for holiday in holidays {
            match NaiveDate::parse_from_str(&holiday.date, "%Y-%m-%d") {
                Ok(date) => {
                    if holiday.recurring {
                        calendar.recurring.insert((date.month(), date.day()));
                    } else {
                        calendar.holidays.insert(date);
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        "Skipping holiday {} with invalid date {}: {}",
                        holiday.name,
                        holiday.date,
                        e
                    );
                }
            }
        }
        calendar
    }

    pub fn add_holiday(&mut self, date: NaiveDate) {
        self.holidays.insert(date);
    }

    /// True when the instant falls on a day that is neither the non-working
    /// weekday nor a holiday.
    pub fn is_working_day(&self, instant: DateTime<Utc>) -> bool {
        let date = instant.date_naive();
        if date.weekday() == self.non_working_weekday {
            return false;
        }
        if self.holidays.contains(&date) {
            return false;
        }
        !self.recurring.contains(&(date.month(), date.day()))
    }
}

impl Default for WorkingCalendar {
    fn default() -> Self {
        Self::new(Weekday::Sun)
    }
}
