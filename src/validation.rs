//! Small validation helpers used by configuration checks.
use std::ops::RangeInclusive;

/// Largest time-zone offset in use anywhere (UTC+14), in seconds.
pub const MAX_TIMEZONE_OFFSET_SECS: f64 = 14.0 * 3600.0;

/// Validates if a given value is within a specified numeric range.
///
/// # Arguments
///
/// * `value` - The value to validate.
/// * `range` - The inclusive range to validate against.
///
/// # Returns
///
/// * `Ok(())` if the value is within the range.
/// * `Err(&'static str)` if the value is outside the range.
pub fn is_in_range<T: PartialOrd>(value: T, range: RangeInclusive<T>) -> Result<(), &'static str> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err("Value is outside the specified range")
    }
}

/// Validates that a float is finite and strictly positive.
pub fn is_positive_finite(value: f64) -> Result<(), &'static str> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err("Value must be a positive finite number")
    }
}

/// Validates a time-zone offset in seconds.
pub fn is_valid_timezone_offset(offset_secs: f64) -> Result<(), &'static str> {
    if !offset_secs.is_finite() {
        return Err("Time-zone offset must be finite");
    }
    is_in_range(
        offset_secs,
        -MAX_TIMEZONE_OFFSET_SECS..=MAX_TIMEZONE_OFFSET_SECS,
    )
    .map_err(|_| "Time-zone offset must be within +/-14 hours")
}

/// Validates if a given string is a valid file path.
///
/// # Arguments
///
/// * `path` - The string to validate.
///
/// # Returns
///
/// * `Ok(())` if the file path is valid.
/// * `Err(&'static str)` if the file path is invalid.
pub fn is_valid_path(path: &str) -> Result<(), &'static str> {
    if path.is_empty() {
        return Err("File path cannot be empty");
    }
    if path.contains('\0') {
        return Err("File path cannot contain null bytes");
    }
    Ok(())
}
