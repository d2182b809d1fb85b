//! Fund depository access port trait.

use crate::domain::depository::FundRecord;
use crate::domain::error::AipsimError;

pub trait DepositoryPort {
    fn get_fund(&self, code: &str) -> Result<FundRecord, AipsimError>;

    /// Funds currently held (status = hold), ordered by priority.
    fn list_holding(&self) -> Result<Vec<FundRecord>, AipsimError>;

    /// Held and cleared funds in one category.
    fn list_by_field(&self, field: &str) -> Result<Vec<FundRecord>, AipsimError>;

    /// Insert or update a fund row. The adapter stamps `create_time` (on
    /// first insert) and `update_time` from its own clock at call time;
    /// the timestamps on `record` are ignored.
    fn upsert_fund(&self, record: &FundRecord) -> Result<(), AipsimError>;
}
