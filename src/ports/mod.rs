//! Port traits consumed by the domain and the CLI.

pub mod series_port;
pub mod calendar_port;
pub mod depository_port;
pub mod config_port;
