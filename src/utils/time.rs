use chrono::{DateTime, Duration, Utc};

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

pub fn iso_date(dt: DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d").to_string()
}

pub fn deadline_after(start: DateTime<Utc>, minutes: u32) -> DateTime<Utc> {
    start + Duration::minutes(i64::from(minutes))
}

/// Whole seconds left before `deadline`, floored at zero.
pub fn remaining_seconds(deadline: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (deadline - now).num_seconds().max(0)
}
