//! Leave-day counting and the per-year cap for a leave type.

use chrono::NaiveDate;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    model::leave::LeaveType,
    service::validation::validate_date_range,
};

/// Inclusive day count of a leave period.
pub fn leave_days(start: NaiveDate, end: NaiveDate) -> AppResult<i64> {
    validate_date_range(start, end)?;
    Ok((end - start).num_days() + 1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct LeaveBalance {
    pub max_days: i64,
    pub used_days: i64,
    pub remaining_days: i64,
}

/// `used_days` is the sum over the employee's pending and approved
/// applications of this type in the current year, excluding the candidate.
/// Returns the balance after the candidate is accepted.
pub fn check_annual_cap(
    leave_type: &LeaveType,
    used_days: i64,
    requested_days: i64,
) -> AppResult<LeaveBalance> {
    let max_days = i64::from(leave_type.max_days_per_year);
    let total = used_days + requested_days;

    if total > max_days {
        return Err(AppError::LeaveCapExceeded {
            leave_type: leave_type.name.clone(),
            max_days,
            used_days,
            remaining_days: max_days - used_days,
        });
    }

    Ok(LeaveBalance {
        max_days,
        used_days: total,
        remaining_days: max_days - total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn annual(max: i32) -> LeaveType {
        LeaveType {
            id: 1,
            name: "Annual".to_string(),
            max_days_per_year: max,
        }
    }

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, m, d).unwrap()
    }

    #[test]
    fn day_count_is_inclusive() {
        assert_eq!(leave_days(date(1, 5), date(1, 5)).unwrap(), 1);
        assert_eq!(leave_days(date(1, 5), date(1, 7)).unwrap(), 3);
        // across a month boundary and a leap day
        let start = NaiveDate::from_ymd_opt(2028, 2, 27).unwrap();
        let end = NaiveDate::from_ymd_opt(2028, 3, 1).unwrap();
        assert_eq!(leave_days(start, end).unwrap(), 4);
    }

    #[test]
    fn day_count_matches_difference_plus_one_over_a_year() {
        let start = date(1, 1);
        for offset in 0..366 {
            let end = start + chrono::Duration::days(offset);
            assert_eq!(leave_days(start, end).unwrap(), offset + 1);
        }
    }

    #[test]
    fn reversed_range_is_a_validation_error() {
        let err = leave_days(date(1, 7), date(1, 5)).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn reaching_the_cap_exactly_is_accepted() {
        let balance = check_annual_cap(&annual(10), 7, 3).unwrap();
        assert_eq!(
            balance,
            LeaveBalance {
                max_days: 10,
                used_days: 10,
                remaining_days: 0
            }
        );
    }

    #[test]
    fn exceeding_the_cap_reports_the_remaining_days() {
        let err = check_annual_cap(&annual(10), 8, 3).unwrap_err();
        match err {
            AppError::LeaveCapExceeded {
                max_days,
                used_days,
                remaining_days,
                ..
            } => {
                assert_eq!(max_days, 10);
                assert_eq!(used_days, 8);
                assert_eq!(remaining_days, 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn repeated_applications_stop_at_the_yearly_cap() {
        let leave_type = annual(10);
        let mut used = 0;
        let mut accepted = Vec::new();

        // 3-day requests: 3, 6, 9 accepted, the fourth would make 12
        for _ in 0..4 {
            match check_annual_cap(&leave_type, used, 3) {
                Ok(balance) => {
                    used = balance.used_days;
                    accepted.push(balance.remaining_days);
                }
                Err(AppError::LeaveCapExceeded { remaining_days, .. }) => {
                    assert_eq!(remaining_days, 1);
                }
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }

        assert_eq!(accepted, vec![7, 4, 1]);
        assert_eq!(used, 9);
        // a single remaining day still fits
        assert!(check_annual_cap(&leave_type, used, 1).is_ok());
    }
}
