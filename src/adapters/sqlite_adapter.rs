//! SQLite storage adapter.
//!
//! Backs three concerns: the `nav` net-value history table
//! ([`SeriesPort`]), the `depository` fund registry ([`DepositoryPort`]),
//! and per-fund sweep-result tables (`bt_<code>`).

use crate::domain::depository::{FundRecord, Status};
use crate::domain::error::AipsimError;
use crate::domain::series::{PricePoint, PriceSeries};
use crate::domain::sweep::{SweepResult, SweepRow};
use crate::ports::config_port::ConfigPort;
use crate::ports::depository_port::DepositoryPort;
use crate::ports::series_port::SeriesPort;
use chrono::{Local, NaiveDate, NaiveDateTime};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;

const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S%.f";

type Clock = Box<dyn Fn() -> NaiveDateTime + Send + Sync>;

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
    clock: Clock,
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, AipsimError> {
        let db_path =
            config
                .get_string("sqlite", "path")
                .ok_or_else(|| AipsimError::ConfigMissing {
                    section: "sqlite".into(),
                    key: "path".into(),
                })?;

        let pool_size = config.get_int("sqlite", "pool_size", 4) as u32;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool =
            Pool::builder()
                .max_size(pool_size)
                .build(manager)
                .map_err(|e: r2d2::Error| AipsimError::Database {
                    reason: e.to_string(),
                })?;

        Ok(Self {
            pool,
            clock: Box::new(|| Local::now().naive_local()),
        })
    }

    pub fn in_memory() -> Result<Self, AipsimError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e: r2d2::Error| AipsimError::Database {
                reason: e.to_string(),
            })?;

        Ok(Self {
            pool,
            clock: Box::new(|| Local::now().naive_local()),
        })
    }

    /// Replace the timestamp source. Every insert/update reads the clock
    /// at call time; there is no precomputed default timestamp.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn initialize_schema(&self) -> Result<(), AipsimError> {
        let conn = self
            .pool
            .get()
            .map_err(|e: r2d2::Error| AipsimError::Database {
                reason: e.to_string(),
            })?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS nav (
                code TEXT NOT NULL,
                date TEXT NOT NULL,
                totvalue REAL NOT NULL,
                PRIMARY KEY (code, date)
            );
            CREATE INDEX IF NOT EXISTS idx_nav_code ON nav(code);
            CREATE TABLE IF NOT EXISTS depository (
                code TEXT PRIMARY KEY,
                name TEXT UNIQUE NOT NULL,
                field TEXT NOT NULL,
                buying REAL NOT NULL DEFAULT 0,
                selling REAL NOT NULL DEFAULT 0,
                position REAL NOT NULL DEFAULT 0,
                profit REAL NOT NULL DEFAULT 0,
                profit_rate REAL NOT NULL DEFAULT 0,
                priority INTEGER NOT NULL DEFAULT 0,
                status TEXT NOT NULL,
                buy_rate REAL,
                comment TEXT,
                url TEXT,
                create_time TEXT NOT NULL,
                update_time TEXT NOT NULL
            );",
        )
        .map_err(|e: rusqlite::Error| AipsimError::DatabaseQuery {
            reason: e.to_string(),
        })?;

        Ok(())
    }

    pub fn insert_points(&self, code: &str, points: &[PricePoint]) -> Result<(), AipsimError> {
        let mut conn = self
            .pool
            .get()
            .map_err(|e: r2d2::Error| AipsimError::Database {
                reason: e.to_string(),
            })?;

        let tx = conn
            .transaction()
            .map_err(|e: rusqlite::Error| AipsimError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        for point in points {
            tx.execute(
                "INSERT OR REPLACE INTO nav (code, date, totvalue) VALUES (?1, ?2, ?3)",
                params![
                    code,
                    point.date.format("%Y-%m-%d").to_string(),
                    point.totvalue
                ],
            )
            .map_err(|e: rusqlite::Error| AipsimError::DatabaseQuery {
                reason: e.to_string(),
            })?;
        }

        tx.commit()
            .map_err(|e: rusqlite::Error| AipsimError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        Ok(())
    }

    /// Persist a sweep result as the per-fund table `bt_<code>`,
    /// replacing any previous run for the same fund.
    pub fn save_sweep(&self, code: &str, result: &SweepResult) -> Result<(), AipsimError> {
        let table = sweep_table_name(code)?;
        let mut conn = self
            .pool
            .get()
            .map_err(|e: r2d2::Error| AipsimError::Database {
                reason: e.to_string(),
            })?;

        let tx = conn
            .transaction()
            .map_err(|e: rusqlite::Error| AipsimError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        tx.execute_batch(&format!(
            "DROP TABLE IF EXISTS {table};
             CREATE TABLE {table} (
                start TEXT NOT NULL,
                bucket INTEGER NOT NULL,
                profit_rate REAL NOT NULL,
                PRIMARY KEY (start, bucket)
             );"
        ))
        .map_err(|e: rusqlite::Error| AipsimError::DatabaseQuery {
            reason: e.to_string(),
        })?;

        for row in &result.rows {
            tx.execute(
                &format!(
                    "INSERT INTO {table} (start, bucket, profit_rate) VALUES (?1, ?2, ?3)"
                ),
                params![
                    row.start.format("%Y-%m-%d").to_string(),
                    row.weekday as i64,
                    row.profit_rate
                ],
            )
            .map_err(|e: rusqlite::Error| AipsimError::DatabaseQuery {
                reason: e.to_string(),
            })?;
        }

        tx.commit()
            .map_err(|e: rusqlite::Error| AipsimError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        Ok(())
    }

    pub fn load_sweep(&self, code: &str) -> Result<SweepResult, AipsimError> {
        let table = sweep_table_name(code)?;
        let conn = self
            .pool
            .get()
            .map_err(|e: r2d2::Error| AipsimError::Database {
                reason: e.to_string(),
            })?;

        let query = format!(
            "SELECT start, bucket, profit_rate FROM {table} ORDER BY start ASC, bucket ASC"
        );
        let mut stmt =
            conn.prepare(&query)
                .map_err(|e: rusqlite::Error| AipsimError::DatabaseQuery {
                    reason: e.to_string(),
                })?;

        let rows = stmt
            .query_map([], |row| {
                let start_str: String = row.get(0)?;
                let start = parse_date_column(&start_str)?;
                let bucket: i64 = row.get(1)?;
                Ok(SweepRow {
                    start,
                    weekday: bucket as usize,
                    profit_rate: row.get(2)?,
                })
            })
            .map_err(|e: rusqlite::Error| AipsimError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        let mut result = SweepResult::default();
        for row in rows {
            result
                .rows
                .push(row.map_err(|e: rusqlite::Error| AipsimError::DatabaseQuery {
                    reason: e.to_string(),
                })?);
        }

        Ok(result)
    }
}

/// `bt_<code>` table name. Codes are embedded in SQL, so anything beyond
/// alphanumerics is rejected.
fn sweep_table_name(code: &str) -> Result<String, AipsimError> {
    if code.is_empty() || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(AipsimError::DatabaseQuery {
            reason: format!("invalid fund code for sweep table: {code:?}"),
        });
    }
    Ok(format!("bt_{code}"))
}

fn parse_date_column(s: &str) -> Result<NaiveDate, rusqlite::Error> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            s.len(),
            rusqlite::types::Type::Text,
            Box::new(e),
        )
    })
}

fn parse_datetime_column(s: &str) -> Result<NaiveDateTime, rusqlite::Error> {
    NaiveDateTime::parse_from_str(s, DATETIME_FMT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            s.len(),
            rusqlite::types::Type::Text,
            Box::new(e),
        )
    })
}

fn record_from_row(row: &rusqlite::Row<'_>) -> Result<FundRecord, rusqlite::Error> {
    let status_str: String = row.get(9)?;
    let status = Status::parse(&status_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            9,
            rusqlite::types::Type::Text,
            format!("unknown status: {status_str}").into(),
        )
    })?;
    let create_str: String = row.get(13)?;
    let update_str: String = row.get(14)?;

    Ok(FundRecord {
        code: row.get(0)?,
        name: row.get(1)?,
        field: row.get(2)?,
        buying: row.get(3)?,
        selling: row.get(4)?,
        position: row.get(5)?,
        profit: row.get(6)?,
        profit_rate: row.get(7)?,
        priority: row.get(8)?,
        status,
        buy_rate: row.get(10)?,
        comment: row.get(11)?,
        url: row.get(12)?,
        create_time: parse_datetime_column(&create_str)?,
        update_time: parse_datetime_column(&update_str)?,
    })
}

const RECORD_COLUMNS: &str = "code, name, field, buying, selling, position, profit, \
     profit_rate, priority, status, buy_rate, comment, url, create_time, update_time";

impl SeriesPort for SqliteAdapter {
    fn get_series(&self, code: &str) -> Result<PriceSeries, AipsimError> {
        let conn = self
            .pool
            .get()
            .map_err(|e: r2d2::Error| AipsimError::Database {
                reason: e.to_string(),
            })?;

        let mut stmt = conn
            .prepare("SELECT date, totvalue FROM nav WHERE code = ?1 ORDER BY date ASC")
            .map_err(|e: rusqlite::Error| AipsimError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        let rows = stmt
            .query_map(params![code], |row| {
                let date_str: String = row.get(0)?;
                let date = parse_date_column(&date_str)?;
                Ok(PricePoint {
                    date,
                    totvalue: row.get(1)?,
                })
            })
            .map_err(|e: rusqlite::Error| AipsimError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        let mut points = Vec::new();
        for row in rows {
            points.push(
                row.map_err(|e: rusqlite::Error| AipsimError::DatabaseQuery {
                    reason: e.to_string(),
                })?,
            );
        }

        Ok(PriceSeries::new(code.to_string(), points))
    }

    fn list_codes(&self) -> Result<Vec<String>, AipsimError> {
        let conn = self
            .pool
            .get()
            .map_err(|e: r2d2::Error| AipsimError::Database {
                reason: e.to_string(),
            })?;

        let mut stmt = conn
            .prepare("SELECT DISTINCT code FROM nav ORDER BY code")
            .map_err(|e: rusqlite::Error| AipsimError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        let rows = stmt
            .query_map([], |row| row.get(0))
            .map_err(|e: rusqlite::Error| AipsimError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        let mut codes = Vec::new();
        for row in rows {
            codes.push(
                row.map_err(|e: rusqlite::Error| AipsimError::DatabaseQuery {
                    reason: e.to_string(),
                })?,
            );
        }

        Ok(codes)
    }

    fn get_data_range(
        &self,
        code: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, AipsimError> {
        let conn = self
            .pool
            .get()
            .map_err(|e: r2d2::Error| AipsimError::Database {
                reason: e.to_string(),
            })?;

        let result: (Option<String>, Option<String>, i64) = conn
            .query_row(
                "SELECT MIN(date), MAX(date), COUNT(*) FROM nav WHERE code = ?1",
                params![code],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .map_err(|e: rusqlite::Error| AipsimError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        match result {
            (Some(min_str), Some(max_str), count) if count > 0 => {
                let min = NaiveDate::parse_from_str(&min_str, "%Y-%m-%d").map_err(
                    |e: chrono::ParseError| AipsimError::Database {
                        reason: e.to_string(),
                    },
                )?;
                let max = NaiveDate::parse_from_str(&max_str, "%Y-%m-%d").map_err(
                    |e: chrono::ParseError| AipsimError::Database {
                        reason: e.to_string(),
                    },
                )?;
                Ok(Some((min, max, count as usize)))
            }
            _ => Ok(None),
        }
    }
}

impl DepositoryPort for SqliteAdapter {
    fn get_fund(&self, code: &str) -> Result<FundRecord, AipsimError> {
        let conn = self
            .pool
            .get()
            .map_err(|e: r2d2::Error| AipsimError::Database {
                reason: e.to_string(),
            })?;

        let query = format!("SELECT {RECORD_COLUMNS} FROM depository WHERE code = ?1");
        match conn.query_row(&query, params![code], record_from_row) {
            Ok(record) => Ok(record),
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(AipsimError::FundNotFound {
                code: code.to_string(),
            }),
            Err(e) => Err(AipsimError::DatabaseQuery {
                reason: e.to_string(),
            }),
        }
    }

    fn list_holding(&self) -> Result<Vec<FundRecord>, AipsimError> {
        self.query_records(
            &format!(
                "SELECT {RECORD_COLUMNS} FROM depository WHERE status = 'hold' \
                 ORDER BY priority ASC, code ASC"
            ),
            params![],
        )
    }

    fn list_by_field(&self, field: &str) -> Result<Vec<FundRecord>, AipsimError> {
        self.query_records(
            &format!(
                "SELECT {RECORD_COLUMNS} FROM depository WHERE field = ?1 \
                 ORDER BY priority ASC, code ASC"
            ),
            params![field],
        )
    }

    fn upsert_fund(&self, record: &FundRecord) -> Result<(), AipsimError> {
        let conn = self
            .pool
            .get()
            .map_err(|e: r2d2::Error| AipsimError::Database {
                reason: e.to_string(),
            })?;

        // Clock read happens here, once per call.
        let now = (self.clock)().format(DATETIME_FMT).to_string();

        let updated = conn
            .execute(
                "UPDATE depository SET name = ?2, field = ?3, buying = ?4, selling = ?5, \
                 position = ?6, profit = ?7, profit_rate = ?8, priority = ?9, status = ?10, \
                 buy_rate = ?11, comment = ?12, url = ?13, update_time = ?14 \
                 WHERE code = ?1",
                params![
                    record.code,
                    record.name,
                    record.field,
                    record.buying,
                    record.selling,
                    record.position,
                    record.profit,
                    record.profit_rate,
                    record.priority,
                    record.status.as_str(),
                    record.buy_rate,
                    record.comment,
                    record.url,
                    now
                ],
            )
            .map_err(|e: rusqlite::Error| AipsimError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        if updated == 0 {
            conn.execute(
                &format!(
                    "INSERT INTO depository ({RECORD_COLUMNS}) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)"
                ),
                params![
                    record.code,
                    record.name,
                    record.field,
                    record.buying,
                    record.selling,
                    record.position,
                    record.profit,
                    record.profit_rate,
                    record.priority,
                    record.status.as_str(),
                    record.buy_rate,
                    record.comment,
                    record.url,
                    now,
                    now
                ],
            )
            .map_err(|e: rusqlite::Error| AipsimError::DatabaseQuery {
                reason: e.to_string(),
            })?;
        }

        Ok(())
    }
}

impl SqliteAdapter {
    fn query_records(
        &self,
        query: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<FundRecord>, AipsimError> {
        let conn = self
            .pool
            .get()
            .map_err(|e: r2d2::Error| AipsimError::Database {
                reason: e.to_string(),
            })?;

        let mut stmt =
            conn.prepare(query)
                .map_err(|e: rusqlite::Error| AipsimError::DatabaseQuery {
                    reason: e.to_string(),
                })?;

        let rows = stmt
            .query_map(params, record_from_row)
            .map_err(|e: rusqlite::Error| AipsimError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        let mut records = Vec::new();
        for row in rows {
            records.push(
                row.map_err(|e: rusqlite::Error| AipsimError::DatabaseQuery {
                    reason: e.to_string(),
                })?,
            );
        }

        Ok(records)
    }
}
