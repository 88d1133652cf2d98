use crate::services::calendar::WorkingCalendar;
use chrono::{DateTime, Duration, Utc};

/// Iteration cap for the minute walk: one year of wall-clock minutes.
/// Budgets that cannot be satisfied within the horizon return the
/// best-effort instant reached at the cap instead of looping forever.
const MAX_HORIZON_MINUTES: i64 = 365 * 24 * 60;

/// Business-day-aware due-time arithmetic over a calendar snapshot.
/// O(budget) / O(elapsed) minute walks, acceptable for SLA horizons
/// measured in hours to weeks.
pub struct DueTimeCalculator<'a> {
    calendar: &'a WorkingCalendar,
}

impl<'a> DueTimeCalculator<'a> {
    pub fn new(calendar: &'a WorkingCalendar) -> Self {
        Self { calendar }
    }

    /// Instant at which `budget_minutes` working minutes will have elapsed
    /// from `start`. A budget of zero returns `start` unchanged. The start
    /// itself may fall on a non-working day; each advanced minute is checked
    /// against the calendar.
    pub fn due_after(&self, start: DateTime<Utc>, budget_minutes: i64) -> DateTime<Utc> {
        let mut current = start;
        let mut remaining = budget_minutes;
        let mut walked = 0i64;

        while remaining > 0 {
            if walked >= MAX_HORIZON_MINUTES {
                tracing::warn!(
                    "Due-time walk hit the {}-minute horizon with {} budget minutes left",
                    MAX_HORIZON_MINUTES,
                    remaining
                );
                break;
            }
            current += Duration::minutes(1);
            walked += 1;
            if self.calendar.is_working_day(current) {
                remaining -= 1;
            }
        }

        current
    }

    /// Working minutes between two instants; 0 when `end <= start`.
    pub fn working_minutes_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
        if end <= start {
            return 0;
        }

        let mut current = start;
        let mut minutes = 0i64;
        let mut walked = 0i64;

        while current < end && walked < MAX_HORIZON_MINUTES {
            current += Duration::minutes(1);
            walked += 1;
            if self.calendar.is_working_day(current) {
                minutes += 1;
            }
        }

        minutes
    }
}
