//! Tabular CSV export for sweep results.

use crate::domain::error::AipsimError;
use crate::domain::sweep::SweepResult;
use std::io::Write;
use std::path::Path;

/// Write a sweep result as `start,bucket,profit_rate` rows.
pub fn write_sweep<W: Write>(writer: W, result: &SweepResult) -> Result<(), AipsimError> {
    let mut wtr = csv::Writer::from_writer(writer);

    wtr.write_record(["start", "bucket", "profit_rate"])
        .map_err(|e| AipsimError::Database {
            reason: format!("CSV write error: {}", e),
        })?;

    for row in &result.rows {
        wtr.write_record([
            row.start.format("%Y-%m-%d").to_string(),
            row.weekday.to_string(),
            format!("{:.4}", row.profit_rate),
        ])
        .map_err(|e| AipsimError::Database {
            reason: format!("CSV write error: {}", e),
        })?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn write_sweep_file<P: AsRef<Path>>(
    path: P,
    result: &SweepResult,
) -> Result<(), AipsimError> {
    let file = std::fs::File::create(path)?;
    write_sweep(file, result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sweep::SweepRow;
    use chrono::NaiveDate;

    fn sample_result() -> SweepResult {
        SweepResult {
            rows: vec![
                SweepRow {
                    start: NaiveDate::from_ymd_opt(2021, 1, 4).unwrap(),
                    weekday: 0,
                    profit_rate: 0.1234,
                },
                SweepRow {
                    start: NaiveDate::from_ymd_opt(2021, 1, 4).unwrap(),
                    weekday: 1,
                    profit_rate: -0.05,
                },
            ],
        }
    }

    #[test]
    fn writes_header_and_rows() {
        let mut buf = Vec::new();
        write_sweep(&mut buf, &sample_result()).unwrap();

        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "start,bucket,profit_rate");
        assert_eq!(lines[1], "2021-01-04,0,0.1234");
        assert_eq!(lines[2], "2021-01-04,1,-0.0500");
    }

    #[test]
    fn empty_result_writes_header_only() {
        let mut buf = Vec::new();
        write_sweep(&mut buf, &SweepResult::default()).unwrap();

        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().count(), 1);
    }

    #[test]
    fn writes_to_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("sweep.csv");
        write_sweep_file(&path, &sample_result()).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("start,bucket,profit_rate"));
        assert_eq!(text.lines().count(), 3);
    }
}
