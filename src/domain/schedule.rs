//! Purchase-schedule partition policies.
//!
//! A recurring plan assigns every purchase date to a bucket: the weekday
//! (Monday=0 .. Friday=4) for weekly plans, or a day-of-month label such
//! as "05" for monthly pay-day plans.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// Number of weekday buckets for the weekly plan.
pub const WEEKDAY_BUCKETS: usize = 5;

/// Default monthly contribution days, mid-month pay-day aligned.
pub const DEFAULT_MONTHLY_DAYS: [&str; 5] = ["05", "10", "15", "20", "25"];

/// Weekday bucket for a purchase date: Monday=0 .. Friday=4.
/// Weekend dates carry no bucket; no shipped calendar produces them.
pub fn weekday_bucket(date: NaiveDate) -> Option<usize> {
    match date.weekday() {
        Weekday::Sat | Weekday::Sun => None,
        wd => Some(wd.num_days_from_monday() as usize),
    }
}

/// "YYYY-MM" period key used to enumerate the months a window covers.
pub fn month_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

/// Parse a day-of-month label ("05", "25") into its day number.
pub fn parse_day_label(label: &str) -> Option<u32> {
    let day: u32 = label.parse().ok()?;
    (1..=31).contains(&day).then_some(day)
}

/// Nominal contribution date for a (year-month key, day label) pair.
/// Returns `None` for labels the month does not have (e.g. "31" in April).
pub fn nominal_date(month: &str, label: &str) -> Option<NaiveDate> {
    let (year, mon) = month.split_once('-')?;
    let year: i32 = year.parse().ok()?;
    let mon: u32 = mon.parse().ok()?;
    let day = parse_day_label(label)?;
    NaiveDate::from_ymd_opt(year, mon, day)
}

/// Last calendar day of a "YYYY-MM" period.
pub fn month_last_day(month: &str) -> Option<NaiveDate> {
    let (year, mon) = month.split_once('-')?;
    let year: i32 = year.parse().ok()?;
    let mon: u32 = mon.parse().ok()?;
    let next = if mon == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, mon + 1, 1)?
    };
    Some(next - Duration::days(1))
}

/// Start interval for "begin the plan roughly `before_days` days ago":
/// `[today - before_days, today - before_days + size]`.
pub fn start_interval_ending(
    today: NaiveDate,
    before_days: i64,
    size: i64,
) -> (NaiveDate, NaiveDate) {
    let a = today - Duration::days(before_days);
    (a, a + Duration::days(size))
}
