//! Fund depository records.
//!
//! The depository is the registry of funds the portfolio holds or has
//! held: identity, category, position and realized profit, used for
//! display and for resolving a fund's name by code.

use chrono::NaiveDateTime;

/// Holding status of a depository fund.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Currently holding a position.
    Hold,
    /// Position fully exited.
    Clear,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Hold => "hold",
            Status::Clear => "clear",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "hold" => Some(Status::Hold),
            "clear" => Some(Status::Clear),
            _ => None,
        }
    }
}

/// One depository row.
///
/// `create_time` and `update_time` are captured by the storage adapter's
/// clock at the moment of the insert or update call.
#[derive(Debug, Clone, PartialEq)]
pub struct FundRecord {
    pub code: String,
    pub name: String,
    pub field: String,
    pub buying: f64,
    pub selling: f64,
    pub position: f64,
    pub profit: f64,
    pub profit_rate: f64,
    pub priority: i64,
    pub status: Status,
    pub buy_rate: Option<f64>,
    pub comment: Option<String>,
    pub url: Option<String>,
    pub create_time: NaiveDateTime,
    pub update_time: NaiveDateTime,
}

impl FundRecord {
    /// Display rows as an explicit (label, value) list. The field set is
    /// enumerated here on purpose; nothing introspects the struct.
    pub fn display_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("code", self.code.clone()),
            ("name", self.name.clone()),
            ("field", self.field.clone()),
            ("buying", format!("{:.2}", self.buying)),
            ("selling", format!("{:.2}", self.selling)),
            ("position", format!("{:.2}", self.position)),
            ("profit", format!("{:.2}", self.profit)),
            ("profit_rate", format!("{:.4}", self.profit_rate)),
            ("priority", self.priority.to_string()),
            ("status", self.status.as_str().to_string()),
            (
                "buy_rate",
                self.buy_rate.map(|r| format!("{:.4}", r)).unwrap_or_default(),
            ),
            ("comment", self.comment.clone().unwrap_or_default()),
            ("url", self.url.clone().unwrap_or_default()),
            ("create_time", self.create_time.to_string()),
            ("update_time", self.update_time.to_string()),
        ]
    }
}
