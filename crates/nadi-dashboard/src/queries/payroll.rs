use super::fetch_error;
use crate::error::RemoteFetchError;
use nadi_model::{PayrollRecord, Record, UserId};
use nadi_source::{select_records, DataSource, Direction, Select};

/// Payroll of `user`, latest period first, optionally for one year
///
/// # Errors
/// [`RemoteFetchError`] if the remote read fails
pub async fn fetch_payroll(
    source: &dyn DataSource,
    user: Option<UserId>,
    year: Option<i32>,
) -> Result<Vec<PayrollRecord>, RemoteFetchError> {
    let Some(user) = user else {
        return Ok(Vec::new());
    };

    let mut query = Select::from(PayrollRecord::TABLE).eq("user_id", user);
    if let Some(year) = year {
        query = query.eq("year", year);
    }
    select_records(
        source,
        query
            .order_by("year", Direction::Descending)
            .order_by("month", Direction::Descending),
    )
    .await
    .map_err(fetch_error::<PayrollRecord>)
}
