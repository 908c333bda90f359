//! Fail-safe record: the original input travels with every intermediate form.

use std::error::Error as StdError;

use crate::error::format_error_chain;

/// Failure captured next to a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorDetail {
    /// Top-level error message.
    pub message: String,
    /// Full rendering of the error and its `source()` chain.
    pub trace: String,
}

impl ErrorDetail {
    pub fn new(message: impl Into<String>, trace: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            trace: trace.into(),
        }
    }

    /// Capture an error together with its source chain.
    pub fn from_error(err: &(dyn StdError + 'static)) -> Self {
        Self {
            message: err.to_string(),
            trace: format_error_chain(err),
        }
    }
}

/// A record moving through conversion stages.
///
/// `O` is the payload the record entered the pipeline with and is never
/// replaced. `T` is the current payload. An error can be attached once.
#[derive(Debug, Clone, PartialEq)]
pub struct FailsafeRecord<O, T> {
    original: O,
    payload: T,
    error: Option<ErrorDetail>,
}

impl<O: Clone> FailsafeRecord<O, O> {
    /// Start a record whose current payload is the original itself.
    pub fn of(original: O) -> Self {
        Self {
            payload: original.clone(),
            original,
            error: None,
        }
    }
}

impl<O, T> FailsafeRecord<O, T> {
    pub fn new(original: O, payload: T) -> Self {
        Self {
            original,
            payload,
            error: None,
        }
    }

    pub fn original(&self) -> &O {
        &self.original
    }

    pub fn payload(&self) -> &T {
        &self.payload
    }

    pub fn error(&self) -> Option<&ErrorDetail> {
        self.error.as_ref()
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }

    /// Replace the current payload, keeping the original.
    pub fn with_payload<U>(self, payload: U) -> FailsafeRecord<O, U> {
        FailsafeRecord {
            original: self.original,
            payload,
            error: self.error,
        }
    }

    /// Attach an error. The first error wins; later ones are ignored.
    #[must_use]
    pub fn with_error(mut self, error: ErrorDetail) -> Self {
        if self.error.is_none() {
            self.error = Some(error);
        }
        self
    }

    pub fn into_parts(self) -> (O, T, Option<ErrorDetail>) {
        (self.original, self.payload, self.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RowError;

    #[test]
    fn test_of_starts_with_original_as_payload() {
        let rec = FailsafeRecord::of("raw".to_string());
        assert_eq!(rec.original(), "raw");
        assert_eq!(rec.payload(), "raw");
        assert!(!rec.is_failed());
    }

    #[test]
    fn test_with_payload_keeps_original() {
        let rec = FailsafeRecord::of("42".to_string()).with_payload(42i64);
        assert_eq!(rec.original(), "42");
        assert_eq!(*rec.payload(), 42);
    }

    #[test]
    fn test_first_error_wins() {
        let rec = FailsafeRecord::of(1)
            .with_error(ErrorDetail::new("first", "trace-1"))
            .with_error(ErrorDetail::new("second", "trace-2"));
        assert_eq!(rec.error().unwrap().message, "first");
    }

    #[test]
    fn test_detail_from_error_includes_chain() {
        let inner = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = RowError::from(inner);
        let detail = ErrorDetail::from_error(&err);
        assert!(detail.message.starts_with("JSON error"));
        assert!(detail.trace.starts_with("Error: JSON error"));
    }
}
