//! Form-level checks shared by the request handlers.

use chrono::NaiveDate;

use crate::error::{AppError, AppResult};

pub fn validate_password_confirmation(password: &str, confirm: &str) -> AppResult<()> {
    if password.is_empty() {
        return Err(AppError::Validation("Password must not be empty".into()));
    }
    if password != confirm {
        return Err(AppError::Validation(
            "Password and Confirm Password do not match".into(),
        ));
    }
    Ok(())
}

/// 150 characters or fewer: letters, digits and `@ . + - _` only.
pub fn validate_username(username: &str) -> AppResult<()> {
    let allowed = |c: char| c.is_alphanumeric() || "@.+-_".contains(c);
    if username.is_empty() || username.chars().count() > 150 || !username.chars().all(allowed) {
        return Err(AppError::Validation(
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters."
                .into(),
        ));
    }
    Ok(())
}

/// Accepts `+999999999` style numbers: optional `+`, optional leading `1`,
/// then 9 to 15 digits.
pub fn validate_phone_number(phone: &str) -> AppResult<()> {
    let digits = phone.strip_prefix('+').unwrap_or(phone);

    let all_digits = !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit());
    // The leading `1` is optional, so either reading may satisfy the length rule.
    let len_ok = (9..=15).contains(&digits.len())
        || (digits.starts_with('1') && (9..=15).contains(&(digits.len() - 1)));

    if all_digits && len_ok {
        Ok(())
    } else {
        Err(AppError::Validation(
            "Phone number must be entered in the format: '+999999999'. Up to 15 digits allowed."
                .into(),
        ))
    }
}

pub fn validate_date_range(start: NaiveDate, end: NaiveDate) -> AppResult<()> {
    if start > end {
        return Err(AppError::Validation(
            "End date must be after start date".into(),
        ));
    }
    Ok(())
}

pub fn validate_month(month: i32) -> AppResult<()> {
    if !(1..=12).contains(&month) {
        return Err(AppError::Validation("month must be between 1 and 12".into()));
    }
    Ok(())
}

pub fn validate_amounts(pairs: &[(&str, f64)]) -> AppResult<()> {
    for (name, value) in pairs {
        if !value.is_finite() || *value < 0.0 {
            return Err(AppError::Validation(format!(
                "{name} must be a non-negative number"
            )));
        }
    }
    Ok(())
}

pub fn validate_gender(gender: &str) -> AppResult<()> {
    match gender {
        "M" | "F" | "O" => Ok(()),
        _ => Err(AppError::Validation("gender must be one of M, F, O".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_mismatch_is_rejected() {
        assert!(validate_password_confirmation("secret1", "secret2").is_err());
        assert!(validate_password_confirmation("", "").is_err());
        assert!(validate_password_confirmation("secret1", "secret1").is_ok());
    }

    #[test]
    fn username_character_set() {
        assert!(validate_username("jane.doe+hr@acme_co-1").is_ok());
        assert!(validate_username("").is_err());
        assert!(validate_username("jane doe").is_err());
        assert!(validate_username("jane\r\nx").is_err());
        assert!(validate_username("a\"b").is_err());
        assert!(validate_username(&"x".repeat(151)).is_err());
    }

    #[test]
    fn phone_accepts_plain_and_prefixed_numbers() {
        assert!(validate_phone_number("+254712345678").is_ok());
        assert!(validate_phone_number("712345678").is_ok());
        assert!(validate_phone_number("1123456789012345").is_ok());
    }

    #[test]
    fn phone_rejects_bad_numbers() {
        assert!(validate_phone_number("").is_err());
        assert!(validate_phone_number("+").is_err());
        assert!(validate_phone_number("12345").is_err());
        assert!(validate_phone_number("0712-345-678").is_err());
        assert!(validate_phone_number("+2547123456789012").is_err());
    }

    #[test]
    fn date_range_must_not_be_reversed() {
        let d = |day| NaiveDate::from_ymd_opt(2026, 3, day).unwrap();
        assert!(validate_date_range(d(2), d(1)).is_err());
        assert!(validate_date_range(d(1), d(1)).is_ok());
    }

    #[test]
    fn month_and_amount_bounds() {
        assert!(validate_month(0).is_err());
        assert!(validate_month(13).is_err());
        assert!(validate_month(12).is_ok());
        assert!(validate_amounts(&[("bonus", -1.0)]).is_err());
        assert!(validate_amounts(&[("bonus", f64::NAN)]).is_err());
        assert!(validate_amounts(&[("bonus", 0.0), ("deductions", 10.0)]).is_ok());
    }
}
