//! CSV net-value series adapter.
//!
//! Reads one `<code>.csv` file per fund with `date,totvalue` columns,
//! ascending by date.

use crate::domain::error::AipsimError;
use crate::domain::series::{PricePoint, PriceSeries};
use crate::ports::series_port::SeriesPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

pub struct CsvSeriesAdapter {
    base_path: PathBuf,
}

impl CsvSeriesAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, code: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", code))
    }
}

impl SeriesPort for CsvSeriesAdapter {
    fn get_series(&self, code: &str) -> Result<PriceSeries, AipsimError> {
        let path = self.csv_path(code);
        let content = fs::read_to_string(&path).map_err(|e| AipsimError::Database {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut points = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| AipsimError::Database {
                reason: format!("CSV parse error: {}", e),
            })?;

            let date_str = record.get(0).ok_or_else(|| AipsimError::Database {
                reason: "missing date column".into(),
            })?;
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
                AipsimError::Database {
                    reason: format!("invalid date format: {}", e),
                }
            })?;

            let totvalue: f64 = record
                .get(1)
                .ok_or_else(|| AipsimError::Database {
                    reason: "missing totvalue column".into(),
                })?
                .parse()
                .map_err(|e| AipsimError::Database {
                    reason: format!("invalid totvalue: {}", e),
                })?;

            points.push(PricePoint { date, totvalue });
        }

        points.sort_by_key(|p| p.date);
        Ok(PriceSeries::new(code.to_string(), points))
    }

    fn list_codes(&self) -> Result<Vec<String>, AipsimError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| AipsimError::Database {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut codes = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| AipsimError::Database {
                reason: format!("directory entry error: {}", e),
            })?;

            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            if let Some(code) = name_str.strip_suffix(".csv") {
                codes.push(code.to_string());
            }
        }

        codes.sort();
        Ok(codes)
    }

    fn get_data_range(
        &self,
        code: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, AipsimError> {
        let series = match self.get_series(code) {
            Ok(s) => s,
            Err(_) => return Ok(None),
        };
        match (series.points.first(), series.points.last()) {
            (Some(first), Some(last)) => Ok(Some((first.date, last.date, series.len()))),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_test_data() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();

        let csv_content = "date,totvalue\n\
            2021-01-04,1.00\n\
            2021-01-05,1.02\n\
            2021-01-06,1.05\n";

        fs::write(path.join("005827.csv"), csv_content).unwrap();
        fs::write(path.join("110011.csv"), "date,totvalue\n").unwrap();

        (dir, path)
    }

    #[test]
    fn get_series_parses_points() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvSeriesAdapter::new(path);

        let series = adapter.get_series("005827").unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.code, "005827");
        assert_eq!(
            series.release_date,
            NaiveDate::from_ymd_opt(2021, 1, 4).unwrap()
        );
        assert!((series.points[2].totvalue - 1.05).abs() < 1e-12);
    }

    #[test]
    fn get_series_missing_file_is_error() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvSeriesAdapter::new(path);
        assert!(adapter.get_series("999999").is_err());
    }

    #[test]
    fn list_codes_strips_extension() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvSeriesAdapter::new(path);
        assert_eq!(adapter.list_codes().unwrap(), vec!["005827", "110011"]);
    }

    #[test]
    fn get_data_range_reports_bounds() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvSeriesAdapter::new(path);

        let (first, last, count) = adapter.get_data_range("005827").unwrap().unwrap();
        assert_eq!(first, NaiveDate::from_ymd_opt(2021, 1, 4).unwrap());
        assert_eq!(last, NaiveDate::from_ymd_opt(2021, 1, 6).unwrap());
        assert_eq!(count, 3);
    }

    #[test]
    fn get_data_range_none_for_empty_series() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvSeriesAdapter::new(path);
        assert!(adapter.get_data_range("110011").unwrap().is_none());
    }
}
