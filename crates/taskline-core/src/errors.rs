//! Validation error types.
//!
//! Validation failures are always the caller's fault. They are surfaced as
//! client errors and never reported as system faults.

use thiserror::Error;

/// A field failed one of the task input rules.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Date text is not `YYYY-MM-DD` or names a day that does not exist.
    #[error("invalid date format: '{value}' (expected a real date as YYYY-MM-DD)")]
    InvalidDateFormat {
        /// The rejected input.
        value: String,
    },

    /// A required text field was empty or only whitespace.
    #[error("{field} cannot be empty")]
    FieldEmpty {
        /// Field name as it appears on the wire.
        field: &'static str,
    },

    /// A text field exceeded its character limit.
    #[error("{field} is too long ({actual} characters, max {max})")]
    FieldTooLong {
        /// Field name as it appears on the wire.
        field: &'static str,
        /// Maximum allowed characters.
        max: usize,
        /// Characters supplied.
        actual: usize,
    },
}

impl ValidationError {
    /// Create an invalid-date error for the given input.
    pub fn invalid_date(value: impl Into<String>) -> Self {
        Self::InvalidDateFormat {
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_date_display() {
        let err = ValidationError::invalid_date("2021-02-30");
        assert_eq!(
            err.to_string(),
            "invalid date format: '2021-02-30' (expected a real date as YYYY-MM-DD)"
        );
    }

    #[test]
    fn field_empty_display() {
        let err = ValidationError::FieldEmpty { field: "title" };
        assert_eq!(err.to_string(), "title cannot be empty");
    }

    #[test]
    fn field_too_long_display() {
        let err = ValidationError::FieldTooLong {
            field: "description",
            max: 500,
            actual: 501,
        };
        assert_eq!(
            err.to_string(),
            "description is too long (501 characters, max 500)"
        );
    }
}
