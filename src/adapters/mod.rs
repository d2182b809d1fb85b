//! Concrete adapter implementations for ports.

pub mod file_config_adapter;
pub mod weekday_calendar;
pub mod csv_series_adapter;
pub mod csv_export;
#[cfg(feature = "sqlite")]
pub mod sqlite_adapter;
