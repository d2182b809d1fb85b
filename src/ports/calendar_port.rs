//! Trading calendar port trait.

use chrono::NaiveDate;

pub trait CalendarPort {
    fn is_trading_day(&self, date: NaiveDate) -> bool;

    /// Nearest trading day at or before `date`.
    fn nearest_trading_day(&self, date: NaiveDate) -> NaiveDate;

    /// Every calendar date in `[start, end]`, inclusive of both bounds.
    fn enumerate_dates(&self, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate>;
}
