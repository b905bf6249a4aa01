//! Calendar arithmetic for installment due dates

use chrono::{Months, NaiveDate};

use crate::types::*;

/// Add whole months to a date, clamping to the last valid day of the target month
///
/// Jan 31 + 1 month is Feb 28 (or Feb 29 in a leap year).
pub fn add_months(date: NaiveDate, months: u32) -> EditResult<NaiveDate> {
    date.checked_add_months(Months::new(months))
        .ok_or(EditError::DueDateOutOfRange { date, months })
}

/// Due dates for `count` monthly installments starting at `first`
///
/// Each date is computed from `first` directly so that clamping in a short
/// month does not carry over to later installments.
pub fn monthly_schedule(first: NaiveDate, count: u32) -> EditResult<Vec<NaiveDate>> {
    (0..count).map(|i| add_months(first, i)).collect()
}
