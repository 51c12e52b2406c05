use validator::Validate;

use crate::errors::AppError;

pub fn validate_payload<T: Validate>(payload: &T) -> Result<(), AppError> {
    payload.validate().map_err(AppError::from)
}

/// Digits with an optional leading `+`, 7 to 15 digits long.
pub fn validate_phone(phone: &str) -> Result<(), validator::ValidationError> {
    let digits = phone.strip_prefix('+').unwrap_or(phone);
    if !(7..=15).contains(&digits.len()) || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(validator::ValidationError::new("phone"));
    }
    Ok(())
}
