//! Deadline helpers. Deadlines are stored as `YYYY-MM-DD` strings.

use chrono::NaiveDate;

const DEADLINE_FORMAT: &str = "%Y-%m-%d";

pub fn parse_deadline(deadline: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(deadline.trim(), DEADLINE_FORMAT).ok()
}

/// Whether `date` lies strictly after `today`. Empty or malformed dates never do.
pub fn is_future_date(date: &str, today: NaiveDate) -> bool {
    parse_deadline(date).is_some_and(|d| d > today)
}
