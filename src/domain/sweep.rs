//! Start-date sweep driver.
//!
//! Evaluates the weekly simulation once per candidate start date across an
//! interval, sequentially or on a bounded worker pool, and assembles the
//! per-bucket profit rates into one deterministic table.

use chrono::NaiveDate;
use rayon::prelude::*;
use tracing::{info, warn};

use crate::domain::error::AipsimError;
use crate::domain::schedule;
use crate::domain::series::PriceSeries;
use crate::domain::simulate;
use crate::ports::calendar_port::CalendarPort;

/// One (start date, weekday bucket) outcome of a sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepRow {
    pub start: NaiveDate,
    pub weekday: usize,
    pub profit_rate: f64,
}

/// Sweep output: rows sorted ascending by (start, weekday).
#[derive(Debug, Clone, Default)]
pub struct SweepResult {
    pub rows: Vec<SweepRow>,
}

impl SweepResult {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Run the weekly simulation for every trading day in `start_interval`.
///
/// The end date must be a trading day or the sweep aborts with
/// [`AipsimError::InvalidEndDate`] and computes nothing. An interval that
/// predates the fund's release date is clamped to begin at the release
/// date, preserving its length. Candidates whose start (or the end) is
/// absent from the series contribute no rows; the sweep continues.
///
/// `parallelism <= 1` runs sequentially; larger values evaluate candidates
/// on a worker pool of `min(available parallelism, parallelism)` threads.
/// Either way the returned rows are sorted by (start, weekday), so the two
/// strategies are observably equivalent.
pub fn sweep(
    series: &PriceSeries,
    calendar: &dyn CalendarPort,
    start_interval: (NaiveDate, NaiveDate),
    end: NaiveDate,
    amount: f64,
    parallelism: usize,
) -> Result<SweepResult, AipsimError> {
    if !calendar.is_trading_day(end) {
        return Err(AipsimError::InvalidEndDate { date: end });
    }

    let (mut a, mut b) = start_interval;
    if a < series.release_date {
        let size = b - a;
        a = series.release_date;
        b = a + size;
        warn!(
            code = %series.code,
            original_start = %start_interval.0,
            original_end = %start_interval.1,
            clamped_start = %a,
            clamped_end = %b,
            "start interval predates release date, clamped"
        );
    }

    let candidates: Vec<NaiveDate> = calendar
        .enumerate_dates(a, b)
        .into_iter()
        .filter(|&d| calendar.is_trading_day(d))
        .collect();

    info!(
        code = %series.code,
        candidates = candidates.len(),
        start = %a,
        interval_end = %b,
        %end,
        amount,
        parallelism,
        "weekly sweep started"
    );

    let evaluate = |start: NaiveDate| -> Vec<SweepRow> {
        match simulate::simulate_weekly(series, start, end, amount) {
            Ok(results) => results
                .into_iter()
                .map(|r| SweepRow {
                    start,
                    weekday: r.weekday,
                    profit_rate: r.profit_rate,
                })
                .collect(),
            Err(e) => {
                warn!(code = %series.code, %start, error = %e, "skipping candidate");
                Vec::new()
            }
        }
    };

    let workers = worker_count(parallelism);
    let mut rows: Vec<SweepRow> = if workers <= 1 {
        candidates.iter().flat_map(|&start| evaluate(start)).collect()
    } else {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()
            .map_err(|e| AipsimError::WorkerPool {
                reason: e.to_string(),
            })?;
        pool.install(|| {
            candidates
                .par_iter()
                .flat_map_iter(|&start| evaluate(start))
                .collect()
        })
    };

    // Completion order across workers is unspecified; the sort restores it.
    rows.sort_by_key(|r| (r.start, r.weekday));

    info!(code = %series.code, rows = rows.len(), "weekly sweep completed");
    Ok(SweepResult { rows })
}

/// Sweep with the start interval derived from "begin `before_days` days
/// before `today`, window of `size` days", ending at the nearest trading
/// day at or before `today`.
pub fn sweep_recent(
    series: &PriceSeries,
    calendar: &dyn CalendarPort,
    today: NaiveDate,
    before_days: i64,
    size: i64,
    amount: f64,
    parallelism: usize,
) -> Result<SweepResult, AipsimError> {
    let start_interval = schedule::start_interval_ending(today, before_days, size);
    let end = calendar.nearest_trading_day(today);
    sweep(series, calendar, start_interval, end, amount, parallelism)
}

fn worker_count(requested: usize) -> usize {
    let available = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    requested.max(1).min(available)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::weekday_calendar::WeekdayCalendar;
    use crate::domain::series::PricePoint;
    use chrono::Duration;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Weekday series from `first` to `last` inclusive, net value rising
    /// 0.01 per point from 1.0.
    fn weekday_series(first: NaiveDate, last: NaiveDate) -> PriceSeries {
        let calendar = WeekdayCalendar;
        let mut points = Vec::new();
        let mut d = first;
        let mut v = 1.0;
        while d <= last {
            if calendar.is_trading_day(d) {
                points.push(PricePoint { date: d, totvalue: v });
                v += 0.01;
            }
            d += Duration::days(1);
        }
        PriceSeries::new("005827".into(), points)
    }

    #[test]
    fn non_trading_end_date_aborts() {
        let series = weekday_series(date(2021, 1, 4), date(2021, 2, 26));
        let err = sweep(
            &series,
            &WeekdayCalendar,
            (date(2021, 1, 4), date(2021, 1, 15)),
            date(2021, 2, 27), // Saturday
            100.0,
            1,
        )
        .unwrap_err();
        assert!(matches!(err, AipsimError::InvalidEndDate { date: d } if d == date(2021, 2, 27)));
    }

    #[test]
    fn rows_sorted_by_start_then_weekday() {
        let series = weekday_series(date(2021, 1, 4), date(2021, 2, 26));
        let result = sweep(
            &series,
            &WeekdayCalendar,
            (date(2021, 1, 4), date(2021, 1, 15)),
            date(2021, 2, 26),
            100.0,
            1,
        )
        .unwrap();

        assert!(!result.is_empty());
        let keys: Vec<(NaiveDate, usize)> =
            result.rows.iter().map(|r| (r.start, r.weekday)).collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn parallel_matches_sequential() {
        let series = weekday_series(date(2021, 1, 4), date(2021, 3, 31));
        let interval = (date(2021, 1, 4), date(2021, 2, 5));
        let end = date(2021, 3, 31);

        let sequential = sweep(&series, &WeekdayCalendar, interval, end, 100.0, 1).unwrap();
        let parallel = sweep(&series, &WeekdayCalendar, interval, end, 100.0, 4).unwrap();

        assert_eq!(sequential.rows, parallel.rows);
    }

    #[test]
    fn interval_clamped_to_release_date() {
        let series = weekday_series(date(2021, 1, 11), date(2021, 2, 26));
        let result = sweep(
            &series,
            &WeekdayCalendar,
            (date(2021, 1, 4), date(2021, 1, 8)),
            date(2021, 2, 26),
            100.0,
            1,
        )
        .unwrap();

        assert!(!result.is_empty());
        // No candidate may predate the release date.
        assert!(result.rows.iter().all(|r| r.start >= series.release_date));
        assert_eq!(result.rows[0].start, date(2021, 1, 11));
    }

    #[test]
    fn missing_series_dates_are_skipped_not_fatal() {
        // Calendar says every weekday trades, but the series has a gap
        // week; candidates inside the gap produce no rows.
        let mut series = weekday_series(date(2021, 1, 4), date(2021, 2, 26));
        series
            .points
            .retain(|p| p.date < date(2021, 1, 11) || p.date > date(2021, 1, 15));

        let result = sweep(
            &series,
            &WeekdayCalendar,
            (date(2021, 1, 4), date(2021, 1, 22)),
            date(2021, 2, 26),
            100.0,
            1,
        )
        .unwrap();

        assert!(!result.is_empty());
        assert!(result
            .rows
            .iter()
            .all(|r| r.start < date(2021, 1, 11) || r.start > date(2021, 1, 15)));
    }

    #[test]
    fn zero_parallelism_is_sequential() {
        let series = weekday_series(date(2021, 1, 4), date(2021, 2, 26));
        let interval = (date(2021, 1, 4), date(2021, 1, 8));
        let end = date(2021, 2, 26);

        let zero = sweep(&series, &WeekdayCalendar, interval, end, 100.0, 0).unwrap();
        let one = sweep(&series, &WeekdayCalendar, interval, end, 100.0, 1).unwrap();
        assert_eq!(zero.rows, one.rows);
    }

    #[test]
    fn sweep_recent_resolves_end_to_trading_day() {
        let series = weekday_series(date(2021, 1, 4), date(2021, 3, 31));
        // 2021-03-28 is a Sunday; the end must resolve back to Friday the 26th.
        let result = sweep_recent(
            &series,
            &WeekdayCalendar,
            date(2021, 3, 28),
            60,
            10,
            100.0,
            1,
        )
        .unwrap();
        assert!(!result.is_empty());
    }
}
