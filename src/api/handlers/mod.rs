//! API handlers and shared helpers.
//!
//! Handlers validate input, call the store or the mail sender, and map the
//! outcome to a status code with a JSON body. Every error body has the shape
//! `{"error": "<message>"}`.

pub mod auth;
pub mod health;
pub mod messages;
pub mod submissions;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct OkBody {
    pub ok: bool,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct CreatedBody {
    pub id: String,
}

/// Build a JSON error response.
pub(crate) fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorBody {
            error: message.to_string(),
        }),
    )
        .into_response()
}

pub(crate) fn ok_response() -> Response {
    (StatusCode::OK, Json(OkBody { ok: true })).into_response()
}

/// Lightweight email sanity check used before persisting or sending.
pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|re| re.is_match(email))
}

/// Trim an optional field, mapping blank values to `None`.
pub(crate) fn optional_field(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_email_accepts_basic_format() {
        assert!(valid_email("a@example.com"));
        assert!(valid_email("name.surname@example.co"));
    }

    #[test]
    fn valid_email_rejects_missing_parts() {
        assert!(!valid_email("not-an-email"));
        assert!(!valid_email("missing-at.example.com"));
        assert!(!valid_email("missing-domain@"));
        assert!(!valid_email("spaces in@example.com"));
    }

    #[test]
    fn optional_field_drops_blank() {
        assert_eq!(optional_field(None), None);
        assert_eq!(optional_field(Some("   ".to_string())), None);
        assert_eq!(
            optional_field(Some(" 555-0100 ".to_string())),
            Some("555-0100".to_string())
        );
    }

    #[test]
    fn error_response_sets_status() {
        let response = error_response(StatusCode::BAD_REQUEST, "nope");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
