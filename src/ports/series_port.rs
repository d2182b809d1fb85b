//! Net-value series access port trait.

use crate::domain::error::AipsimError;
use crate::domain::series::PriceSeries;
use chrono::NaiveDate;

pub trait SeriesPort {
    /// Full published history for a fund code, ordered ascending by date
    /// with no duplicate dates.
    fn get_series(&self, code: &str) -> Result<PriceSeries, AipsimError>;

    fn list_codes(&self) -> Result<Vec<String>, AipsimError>;

    /// (first date, last date, point count) for a code, `None` when the
    /// store has nothing for it.
    fn get_data_range(
        &self,
        code: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, AipsimError>;
}
