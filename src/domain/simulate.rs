//! Periodic-investment simulation engine.
//!
//! Pure functions over a net-value series: reconstruct the shares a
//! recurring plan would have accumulated between two dates, then value
//! them at the end date's published net value.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use tracing::{debug, warn};

use crate::domain::error::AipsimError;
use crate::domain::schedule::{self, WEEKDAY_BUCKETS};
use crate::domain::series::PriceSeries;

/// Outcome for one weekday bucket of a weekly plan.
#[derive(Debug, Clone, PartialEq)]
pub struct WeekdayResult {
    /// Monday=0 .. Friday=4.
    pub weekday: usize,
    pub shares: f64,
    pub cost: f64,
    pub profit_rate: f64,
}

/// Outcome for one day-of-month label of a monthly plan.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyResult {
    pub shares: f64,
    pub cost: f64,
    pub profit_rate: f64,
}

/// Round a rate to 4 decimal places, the precision the depository stores.
pub fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

fn exact_index(series: &PriceSeries, date: NaiveDate) -> Result<usize, AipsimError> {
    series.index_of(date).ok_or_else(|| AipsimError::DateNotFound {
        code: series.code.clone(),
        date,
    })
}

/// Simulate a weekly plan: invest `amount` on every trading day in
/// `[start, end)`, bucketed by weekday, and sell everything at the net
/// value published on `end`.
///
/// `start` and `end` must both be present in the series exactly
/// (`DateNotFound` otherwise — the sweep driver recovers from this, a
/// direct caller gets no rows for the run). Buckets that never received
/// a purchase are omitted from the output.
pub fn simulate_weekly(
    series: &PriceSeries,
    start: NaiveDate,
    end: NaiveDate,
    amount: f64,
) -> Result<Vec<WeekdayResult>, AipsimError> {
    let start_index = exact_index(series, start)?;
    let end_index = exact_index(series, end)?;
    let sell_value = series.points[end_index].totvalue;

    let mut shares = [0.0_f64; WEEKDAY_BUCKETS];
    let mut cost = [0.0_f64; WEEKDAY_BUCKETS];

    // End-exclusive: the end date is the sell date, not a purchase date.
    let window = series.points.get(start_index..end_index).unwrap_or(&[]);
    for point in window {
        let Some(bucket) = schedule::weekday_bucket(point.date) else {
            continue;
        };
        shares[bucket] += amount / point.totvalue;
        cost[bucket] += amount;
    }

    let mut results = Vec::with_capacity(WEEKDAY_BUCKETS);
    for weekday in 0..WEEKDAY_BUCKETS {
        if cost[weekday] == 0.0 {
            continue;
        }
        let proceeds = sell_value * shares[weekday];
        let profit_rate = round4((proceeds - cost[weekday]) / cost[weekday]);
        debug!(
            code = %series.code,
            weekday,
            cost = cost[weekday],
            proceeds,
            profit_rate,
            "weekly bucket settled"
        );
        results.push(WeekdayResult {
            weekday,
            shares: shares[weekday],
            cost: cost[weekday],
            profit_rate,
        });
    }

    Ok(results)
}

/// Simulate a monthly plan: invest `amount` once per (month, day label)
/// over `[start, end)`, buying on the nearest trading date at or before
/// the nominal day, and sell everything at the net value on `end`.
///
/// A missing `start` or `end` is fatal to the invocation. The backward
/// alignment walk is bounded by the window's first date; crossing the
/// bound is an [`AipsimError::AlignmentExhausted`] structural error.
/// Labels the month is too short for (e.g. "31" in April) align from the
/// month's last calendar day.
pub fn simulate_monthly(
    series: &PriceSeries,
    start: NaiveDate,
    end: NaiveDate,
    amount: f64,
    day_labels: &[&str],
) -> Result<BTreeMap<String, MonthlyResult>, AipsimError> {
    let start_index = exact_index(series, start)?;
    let end_index = exact_index(series, end)?;
    let sell_value = series.points[end_index].totvalue;

    let window = series.points.get(start_index..end_index).unwrap_or(&[]);
    let Some(bound) = window.first().map(|p| p.date) else {
        return Ok(BTreeMap::new());
    };

    let by_date: BTreeMap<NaiveDate, f64> =
        window.iter().map(|p| (p.date, p.totvalue)).collect();

    // Distinct year-month periods, in series order.
    let mut months: Vec<String> = Vec::new();
    for point in window {
        let key = schedule::month_key(point.date);
        if months.last() != Some(&key) {
            months.push(key);
        }
    }

    let mut shares: BTreeMap<String, f64> = BTreeMap::new();
    let mut cost: BTreeMap<String, f64> = BTreeMap::new();

    for month in &months {
        for &label in day_labels {
            if schedule::parse_day_label(label).is_none() {
                warn!(code = %series.code, label, "ignoring unparseable day label");
                continue;
            }
            // Short months fall back to their last calendar day.
            let nominal = match schedule::nominal_date(month, label)
                .or_else(|| schedule::month_last_day(month))
            {
                Some(d) => d,
                None => continue,
            };

            let mut buy_date = nominal;
            while !by_date.contains_key(&buy_date) {
                if buy_date <= bound {
                    return Err(AipsimError::AlignmentExhausted {
                        code: series.code.clone(),
                        target: nominal,
                        bound,
                    });
                }
                buy_date -= Duration::days(1);
            }

            let value = by_date[&buy_date];
            *shares.entry(label.to_string()).or_insert(0.0) += amount / value;
            *cost.entry(label.to_string()).or_insert(0.0) += amount;
            debug!(
                code = %series.code,
                label,
                %nominal,
                %buy_date,
                "monthly purchase aligned"
            );
        }
    }

    let mut results = BTreeMap::new();
    for (label, total_cost) in cost {
        let total_shares = shares[&label];
        let proceeds = sell_value * total_shares;
        let profit_rate = round4((proceeds - total_cost) / total_cost);
        debug!(
            code = %series.code,
            label = %label,
            cost = total_cost,
            proceeds,
            profit_rate,
            "monthly bucket settled"
        );
        results.insert(
            label,
            MonthlyResult {
                shares: total_shares,
                cost: total_cost,
                profit_rate,
            },
        );
    }

    Ok(results)
}
