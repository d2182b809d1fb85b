//! Net-value series representation.

use chrono::NaiveDate;

/// One published cumulative net-value observation for a fund.
#[derive(Debug, Clone, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub totvalue: f64,
}

/// Full net-value history for one fund code.
///
/// Points are ordered ascending by date with no duplicate dates;
/// `release_date` is the first date the fund published a value.
#[derive(Debug, Clone)]
pub struct PriceSeries {
    pub code: String,
    pub release_date: NaiveDate,
    pub points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Build a series from ordered points, taking the first date as the
    /// release date. Empty input yields an empty series released "never"
    /// (callers check `is_empty` before simulating).
    pub fn new(code: String, points: Vec<PricePoint>) -> Self {
        let release_date = points
            .first()
            .map(|p| p.date)
            .unwrap_or(NaiveDate::MAX);
        Self {
            code,
            release_date,
            points,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Exact-date index lookup. Points are sorted, so this is a binary search.
    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        self.points.binary_search_by_key(&date, |p| p.date).ok()
    }

    /// Cumulative net value published on `date`, exact match only.
    pub fn totvalue_at(&self, date: NaiveDate) -> Option<f64> {
        self.index_of(date).map(|i| self.points[i].totvalue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_series() -> PriceSeries {
        let points = (0..5)
            .map(|i| PricePoint {
                date: NaiveDate::from_ymd_opt(2021, 1, 4 + i).unwrap(),
                totvalue: 1.0 + i as f64 * 0.1,
            })
            .collect();
        PriceSeries::new("005827".into(), points)
    }

    #[test]
    fn release_date_is_first_point() {
        let series = sample_series();
        assert_eq!(
            series.release_date,
            NaiveDate::from_ymd_opt(2021, 1, 4).unwrap()
        );
    }

    #[test]
    fn index_of_exact_match() {
        let series = sample_series();
        assert_eq!(
            series.index_of(NaiveDate::from_ymd_opt(2021, 1, 6).unwrap()),
            Some(2)
        );
    }

    #[test]
    fn index_of_missing_date() {
        let series = sample_series();
        assert_eq!(
            series.index_of(NaiveDate::from_ymd_opt(2021, 1, 9).unwrap()),
            None
        );
    }

    #[test]
    fn totvalue_at_returns_published_value() {
        let series = sample_series();
        let v = series
            .totvalue_at(NaiveDate::from_ymd_opt(2021, 1, 8).unwrap())
            .unwrap();
        assert!((v - 1.4).abs() < 1e-12);
    }

    #[test]
    fn empty_series() {
        let series = PriceSeries::new("000001".into(), vec![]);
        assert!(series.is_empty());
        assert_eq!(series.index_of(NaiveDate::from_ymd_opt(2021, 1, 4).unwrap()), None);
    }
}
