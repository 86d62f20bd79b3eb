/// Timestamp formatting for reports, exports and the site list
use chrono::{DateTime, SecondsFormat, Utc};

use crate::domain::DAY_MS;

fn to_datetime(ms: f64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms as i64).unwrap_or_default()
}

/// `2024-10-28T10:30:00.000Z`, the same shape as `Date.prototype.toISOString`
pub fn iso_timestamp(ms: f64) -> String {
    to_datetime(ms).to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// `2024-10-28`
pub fn calendar_date(ms: f64) -> String {
    to_datetime(ms).format("%Y-%m-%d").to_string()
}

/// How long ago a visit happened, in whole days
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisitAge {
    Today,
    Yesterday,
    DaysAgo(u32),
    /// A week or more ago; carries the calendar date
    On(String),
}

pub fn visit_age(timestamp: f64, now: f64) -> VisitAge {
    let diff_days = ((now - timestamp) / DAY_MS).floor();

    if diff_days < 1.0 {
        VisitAge::Today
    } else if diff_days < 2.0 {
        VisitAge::Yesterday
    } else if diff_days < 7.0 {
        VisitAge::DaysAgo(diff_days as u32)
    } else {
        VisitAge::On(calendar_date(timestamp))
    }
}
