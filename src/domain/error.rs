//! Domain error types.

use chrono::NaiveDate;

/// Top-level error type for aipsim.
#[derive(Debug, thiserror::Error)]
pub enum AipsimError {
    #[error("end date {date} is not a trading day")]
    InvalidEndDate { date: NaiveDate },

    #[error("start date {date} is not a trading day")]
    InvalidStartDate { date: NaiveDate },

    #[error("date {date} not found in net-value series for {code}")]
    DateNotFound { code: String, date: NaiveDate },

    #[error(
        "no trading date at or before {target} within the window starting {bound} for {code}"
    )]
    AlignmentExhausted {
        code: String,
        target: NaiveDate,
        bound: NaiveDate,
    },

    #[error("fund {code} not found in depository")]
    FundNotFound { code: String },

    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("worker pool error: {reason}")]
    WorkerPool { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&AipsimError> for std::process::ExitCode {
    fn from(err: &AipsimError) -> Self {
        let code: u8 = match err {
            AipsimError::Io(_) | AipsimError::WorkerPool { .. } => 1,
            AipsimError::ConfigParse { .. }
            | AipsimError::ConfigMissing { .. }
            | AipsimError::ConfigInvalid { .. } => 2,
            AipsimError::Database { .. } | AipsimError::DatabaseQuery { .. } => 3,
            AipsimError::InvalidEndDate { .. } | AipsimError::InvalidStartDate { .. } => 4,
            AipsimError::DateNotFound { .. } | AipsimError::AlignmentExhausted { .. } => 5,
            AipsimError::FundNotFound { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
