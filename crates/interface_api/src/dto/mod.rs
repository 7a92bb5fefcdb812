//! Request and response bodies

pub mod contracts;
pub mod fleet;
pub mod invoices;
pub mod reports;

use chrono::NaiveDate;

use core_kernel::DateRange;

use crate::error::ApiError;

/// Builds a date filter from optional bounds; a missing bound is open
pub(crate) fn date_window(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Result<Option<DateRange>, ApiError> {
    if from.is_none() && to.is_none() {
        return Ok(None);
    }
    DateRange::new(from.unwrap_or(NaiveDate::MIN), to.unwrap_or(NaiveDate::MAX))
        .map(Some)
        .map_err(|e| ApiError::Validation(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_ended_windows() {
        let day = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
        assert!(date_window(None, None).unwrap().is_none());

        let from = date_window(Some(day), None).unwrap().unwrap();
        assert_eq!(from.start, day);
        assert_eq!(from.end, NaiveDate::MAX);

        assert!(date_window(Some(day), day.pred_opt()).is_err());
    }
}
