use crate::api::AppError;
use regex::Regex;

#[must_use]
pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|re| re.is_match(email))
}

/// Trims `value` and rejects it when blank.
///
/// # Errors
/// Returns `AppError::Validation` naming `field` when the value is blank.
pub fn required<'a>(field: &str, value: &'a str) -> Result<&'a str, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(AppError::Validation(format!("{field} is required.")))
    } else {
        Ok(trimmed)
    }
}

/// Trims and validates an email address.
///
/// # Errors
/// Returns `AppError::Validation` when the address is blank or malformed.
pub fn email(value: &str) -> Result<&str, AppError> {
    let email = required("Email", value)?;
    if valid_email(email) {
        Ok(email)
    } else {
        Err(AppError::Validation(
            "Enter a valid email address.".to_string(),
        ))
    }
}

/// Rejects blank passwords without trimming the accepted value.
///
/// # Errors
/// Returns `AppError::Validation` when the password is empty or whitespace.
pub fn password<'a>(field: &str, value: &'a str) -> Result<&'a str, AppError> {
    if value.trim().is_empty() {
        Err(AppError::Validation(format!("{field} is required.")))
    } else {
        Ok(value)
    }
}
