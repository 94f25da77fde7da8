//! Input validation for task fields.
//!
//! All functions are pure. On success they hand back the accepted text
//! (borrowed from the input) so callers can store exactly what was checked.

use chrono::{Datelike, NaiveDate};

use crate::errors::ValidationError;

/// Maximum title length, in characters.
pub const TITLE_MAX_CHARS: usize = 100;

/// Maximum description length, in characters.
pub const DESCRIPTION_MAX_CHARS: usize = 500;

/// `chrono` format string for due dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Check that `text` is a `YYYY-MM-DD` date naming a real calendar day.
///
/// The shape is checked strictly (four-digit year, two-digit month and day,
/// `-` separators) before the calendar check, so inputs such as `2024-1-5`
/// or `+2024-01-05` are rejected even though a lenient parser would take them.
pub fn validate_due_date(text: &str) -> Result<&str, ValidationError> {
    if !has_date_shape(text) {
        return Err(ValidationError::invalid_date(text));
    }
    match NaiveDate::parse_from_str(text, DATE_FORMAT) {
        Ok(date) if date.year() >= 1 => Ok(text),
        _ => Err(ValidationError::invalid_date(text)),
    }
}

/// Check a task title: non-blank, at most [`TITLE_MAX_CHARS`] characters.
///
/// Returns the title with surrounding whitespace removed.
pub fn validate_title(title: &str) -> Result<&str, ValidationError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::FieldEmpty { field: "title" });
    }
    check_length("title", trimmed, TITLE_MAX_CHARS)?;
    Ok(trimmed)
}

/// Check an optional description: at most [`DESCRIPTION_MAX_CHARS`] characters.
pub fn validate_description(description: Option<&str>) -> Result<Option<&str>, ValidationError> {
    if let Some(text) = description {
        check_length("description", text, DESCRIPTION_MAX_CHARS)?;
    }
    Ok(description)
}

fn check_length(field: &'static str, text: &str, max: usize) -> Result<(), ValidationError> {
    let actual = text.chars().count();
    if actual > max {
        return Err(ValidationError::FieldTooLong { field, max, actual });
    }
    Ok(())
}

fn has_date_shape(text: &str) -> bool {
    let bytes = text.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}
