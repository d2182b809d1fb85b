#![allow(dead_code)]

use aipsim::adapters::weekday_calendar::WeekdayCalendar;
use aipsim::domain::error::AipsimError;
use aipsim::domain::series::{PricePoint, PriceSeries};
use aipsim::ports::calendar_port::CalendarPort;
use aipsim::ports::series_port::SeriesPort;
use chrono::{Duration, NaiveDate};
use std::collections::HashMap;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_point(date: NaiveDate, totvalue: f64) -> PricePoint {
    PricePoint { date, totvalue }
}

/// Weekday-only series from `first` to `last` inclusive with a fixed net
/// value on every point.
pub fn flat_weekday_series(code: &str, first: NaiveDate, last: NaiveDate) -> PriceSeries {
    weekday_series_with(code, first, last, |_, _| 1.0)
}

/// Weekday-only series whose net value is derived from (index, date).
pub fn weekday_series_with<F>(
    code: &str,
    first: NaiveDate,
    last: NaiveDate,
    value: F,
) -> PriceSeries
where
    F: Fn(usize, NaiveDate) -> f64,
{
    let calendar = WeekdayCalendar;
    let mut points = Vec::new();
    let mut d = first;
    while d <= last {
        if calendar.is_trading_day(d) {
            points.push(make_point(d, value(points.len(), d)));
        }
        d += Duration::days(1);
    }
    PriceSeries::new(code.to_string(), points)
}

pub struct MockSeriesPort {
    pub series: HashMap<String, PriceSeries>,
    pub errors: HashMap<String, String>,
}

impl MockSeriesPort {
    pub fn new() -> Self {
        Self {
            series: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_series(mut self, series: PriceSeries) -> Self {
        self.series.insert(series.code.clone(), series);
        self
    }

    pub fn with_error(mut self, code: &str, reason: &str) -> Self {
        self.errors.insert(code.to_string(), reason.to_string());
        self
    }
}

impl SeriesPort for MockSeriesPort {
    fn get_series(&self, code: &str) -> Result<PriceSeries, AipsimError> {
        if let Some(reason) = self.errors.get(code) {
            return Err(AipsimError::Database {
                reason: reason.clone(),
            });
        }
        self.series
            .get(code)
            .cloned()
            .ok_or_else(|| AipsimError::Database {
                reason: format!("no series for {code}"),
            })
    }

    fn list_codes(&self) -> Result<Vec<String>, AipsimError> {
        let mut codes: Vec<String> = self.series.keys().cloned().collect();
        codes.sort();
        Ok(codes)
    }

    fn get_data_range(
        &self,
        code: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, AipsimError> {
        match self.series.get(code) {
            Some(s) if !s.is_empty() => Ok(Some((
                s.points.first().unwrap().date,
                s.points.last().unwrap().date,
                s.len(),
            ))),
            _ => Ok(None),
        }
    }
}
