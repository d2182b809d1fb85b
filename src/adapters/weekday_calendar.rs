//! Monday-Friday trading calendar adapter.
//!
//! Treats every weekday as a trading day. Exchange holidays are not
//! modeled; a holiday date simply has no point in the net-value series
//! and the engine skips or aligns around it.

use crate::ports::calendar_port::CalendarPort;
use chrono::{Datelike, Duration, NaiveDate, Weekday};

#[derive(Debug, Clone, Copy, Default)]
pub struct WeekdayCalendar;

impl CalendarPort for WeekdayCalendar {
    fn is_trading_day(&self, date: NaiveDate) -> bool {
        !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
    }

    fn nearest_trading_day(&self, date: NaiveDate) -> NaiveDate {
        let mut d = date;
        while !self.is_trading_day(d) {
            d -= Duration::days(1);
        }
        d
    }

    fn enumerate_dates(&self, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
        let mut dates = Vec::new();
        let mut d = start;
        while d <= end {
            dates.push(d);
            d += Duration::days(1);
        }
        dates
    }
}
