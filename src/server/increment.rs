//! `GET /changenumber?number=N` endpoint.
//!
//! Parses `number`, adds one and returns the result as plain text. This
//! value is independent of the hub's shared counter: the endpoint keeps no
//! state at all.

// ============================================================================
// Imports
// ============================================================================

use std::num::ParseIntError;

use axum::extract::Query;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{debug, info};

// ============================================================================
// Constants
// ============================================================================

/// Name of the query parameter carrying the number.
pub const NUMBER_PARAM: &str = "number";

// ============================================================================
// IncrementError
// ============================================================================

/// Ways the increment request can fail.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IncrementError {
    /// The `number` parameter is absent.
    #[error("No number provided")]
    Missing,

    /// The `number` parameter is not a decimal integer.
    #[error("{0}")]
    Parse(#[from] ParseIntError),

    /// `number + 1` does not fit in an `i64`.
    #[error("number out of range")]
    Overflow,
}

impl IncrementError {
    /// HTTP status reported for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Missing => StatusCode::BAD_REQUEST,
            Self::Parse(_) | Self::Overflow => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for IncrementError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}

// ============================================================================
// Handler
// ============================================================================

/// Axum handler for the increment endpoint.
///
/// Only the first `number` parameter is used when it is repeated.
pub async fn change_number(
    Query(params): Query<Vec<(String, String)>>,
) -> Result<String, IncrementError> {
    let raw = params
        .iter()
        .find(|(key, _)| key == NUMBER_PARAM)
        .map(|(_, value)| value.as_str());

    match increment_number(raw) {
        Ok(number) => {
            info!(number, "Number incremented");
            Ok(number.to_string())
        }
        Err(e) => {
            debug!(error = %e, "Increment request rejected");
            Err(e)
        }
    }
}

/// Parses `raw` and returns it plus one.
///
/// # Errors
///
/// - [`IncrementError::Missing`] if `raw` is `None`
/// - [`IncrementError::Parse`] if `raw` is not an integer
/// - [`IncrementError::Overflow`] if the result overflows
pub fn increment_number(raw: Option<&str>) -> Result<i64, IncrementError> {
    let number: i64 = raw.ok_or(IncrementError::Missing)?.parse()?;
    number.checked_add(1).ok_or(IncrementError::Overflow)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_increment_number() {
        assert_eq!(increment_number(Some("5")), Ok(6));
        assert_eq!(increment_number(Some("-1")), Ok(0));
        assert_eq!(increment_number(Some("+41")), Ok(42));
    }

    #[test]
    fn test_missing_number() {
        let err = increment_number(None).expect_err("must fail");
        assert_eq!(err, IncrementError::Missing);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "No number provided");
    }

    #[test]
    fn test_non_integer() {
        let err = increment_number(Some("abc")).expect_err("must fail");
        assert!(matches!(err, IncrementError::Parse(_)));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "invalid digit found in string");
    }

    #[test]
    fn test_empty_value() {
        let err = increment_number(Some("")).expect_err("must fail");
        assert_eq!(err.to_string(), "cannot parse integer from empty string");
    }

    #[test]
    fn test_overflow() {
        let max = i64::MAX.to_string();
        let err = increment_number(Some(&max)).expect_err("must fail");
        assert_eq!(err, IncrementError::Overflow);
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_handler_uses_first_value() {
        let params = vec![
            ("other".to_owned(), "x".to_owned()),
            ("number".to_owned(), "1".to_owned()),
            ("number".to_owned(), "9".to_owned()),
        ];

        let body = change_number(Query(params)).await.expect("success");
        assert_eq!(body, "2");
    }
}
