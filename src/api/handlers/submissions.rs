//! Public submission intake and the admin submission list.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{CreatedBody, ErrorBody, OkBody, error_response, ok_response, optional_field, valid_email};
use crate::{
    api::AppState,
    auth::AdminPrincipal,
    store::{NewSubmission, Submission},
};

const MAX_NAME_LEN: usize = 200;
const MAX_EMAIL_LEN: usize = 254;
const MAX_SHORT_FIELD_LEN: usize = 200;
const MAX_MESSAGE_LEN: usize = 5000;

#[derive(ToSchema, Serialize, Deserialize, Debug, Default)]
pub struct SubmissionRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub message: String,
}

impl SubmissionRequest {
    /// Trim and check every field.
    ///
    /// # Errors
    /// Returns the message shown to the submitter.
    pub fn validate(self) -> Result<NewSubmission, &'static str> {
        let name = self.name.trim().to_string();
        let email = self.email.trim().to_string();
        let message = self.message.trim().to_string();
        let phone = optional_field(self.phone);
        let subject = optional_field(self.subject);

        if name.is_empty() {
            return Err("Name is required");
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err("Name is too long");
        }
        if email.len() > MAX_EMAIL_LEN || !valid_email(&email) {
            return Err("A valid email is required");
        }
        if message.is_empty() {
            return Err("Message is required");
        }
        if message.chars().count() > MAX_MESSAGE_LEN {
            return Err("Message is too long");
        }
        let too_long = |field: &Option<String>| {
            field
                .as_ref()
                .is_some_and(|v| v.chars().count() > MAX_SHORT_FIELD_LEN)
        };
        if too_long(&phone) || too_long(&subject) {
            return Err("Phone or subject is too long");
        }

        Ok(NewSubmission {
            name,
            email,
            phone,
            subject,
            message,
        })
    }
}

#[utoipa::path(
    post,
    path = "/api/submissions",
    request_body = SubmissionRequest,
    responses(
        (status = 201, description = "Submission stored", body = CreatedBody),
        (status = 400, description = "Invalid submission", body = ErrorBody),
        (status = 500, description = "Submission could not be stored", body = ErrorBody)
    ),
    tag = "submissions"
)]
#[instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    payload: Option<Json<SubmissionRequest>>,
) -> Response {
    let Some(Json(request)) = payload else {
        return error_response(StatusCode::BAD_REQUEST, "Missing payload");
    };

    let submission = match request.validate() {
        Ok(submission) => submission,
        Err(message) => return error_response(StatusCode::BAD_REQUEST, message),
    };

    match state.store().add_submission(submission).await {
        Ok(stored) => {
            info!(submission_id = %stored.id, "submission stored");
            (
                StatusCode::CREATED,
                Json(CreatedBody {
                    id: stored.id.to_string(),
                }),
            )
                .into_response()
        }
        Err(err) => {
            error!("Failed to store submission: {err}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to save submission")
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/admin/submissions",
    responses(
        (status = 200, description = "Submissions, newest first", body = [Submission]),
        (status = 401, description = "Missing or invalid session", body = ErrorBody),
        (status = 403, description = "Session is not an admin session", body = ErrorBody)
    ),
    tag = "admin"
)]
#[instrument(skip_all, fields(admin = %principal.username()))]
pub async fn list(State(state): State<AppState>, principal: AdminPrincipal) -> Response {
    match state.store().list_submissions().await {
        Ok(submissions) => Json(submissions).into_response(),
        Err(err) => {
            error!("Failed to list submissions: {err}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load submissions")
        }
    }
}

#[utoipa::path(
    delete,
    path = "/api/admin/submissions/{id}",
    params(("id" = String, Path, description = "Submission id")),
    responses(
        (status = 200, description = "Submission deleted", body = OkBody),
        (status = 400, description = "Malformed id", body = ErrorBody),
        (status = 404, description = "No submission with that id", body = ErrorBody),
        (status = 401, description = "Missing or invalid session", body = ErrorBody),
        (status = 403, description = "Session is not an admin session", body = ErrorBody)
    ),
    tag = "admin"
)]
#[instrument(skip_all, fields(admin = %principal.username(), submission_id = %id))]
pub async fn remove(
    State(state): State<AppState>,
    principal: AdminPrincipal,
    Path(id): Path<String>,
) -> Response {
    let Ok(id) = Uuid::parse_str(&id) else {
        return error_response(StatusCode::BAD_REQUEST, "Invalid submission id");
    };

    match state.store().delete_submission(id).await {
        Ok(true) => {
            info!("submission deleted");
            ok_response()
        }
        Ok(false) => error_response(StatusCode::NOT_FOUND, "Submission not found"),
        Err(err) => {
            error!("Failed to delete submission: {err}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to delete submission")
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn request() -> SubmissionRequest {
        SubmissionRequest {
            name: " Jane Doe ".to_string(),
            email: " jane@example.com ".to_string(),
            phone: Some("   ".to_string()),
            subject: Some(" Quote ".to_string()),
            message: " Please call me. ".to_string(),
        }
    }

    #[test]
    fn validate_trims_fields() {
        let submission = request().validate().unwrap();
        assert_eq!(submission.name, "Jane Doe");
        assert_eq!(submission.email, "jane@example.com");
        assert_eq!(submission.phone, None);
        assert_eq!(submission.subject.as_deref(), Some("Quote"));
        assert_eq!(submission.message, "Please call me.");
    }

    #[test]
    fn validate_rejects_blank_required_fields() {
        let mut blank_name = request();
        blank_name.name = "  ".to_string();
        assert_eq!(blank_name.validate(), Err("Name is required"));

        let mut blank_message = request();
        blank_message.message = String::new();
        assert_eq!(blank_message.validate(), Err("Message is required"));
    }

    #[test]
    fn validate_rejects_bad_email() {
        let mut bad = request();
        bad.email = "jane-at-example".to_string();
        assert_eq!(bad.validate(), Err("A valid email is required"));
    }

    #[test]
    fn validate_rejects_oversized_fields() {
        let mut long_message = request();
        long_message.message = "x".repeat(MAX_MESSAGE_LEN + 1);
        assert_eq!(long_message.validate(), Err("Message is too long"));

        let mut long_name = request();
        long_name.name = "x".repeat(MAX_NAME_LEN + 1);
        assert_eq!(long_name.validate(), Err("Name is too long"));

        let mut long_subject = request();
        long_subject.subject = Some("x".repeat(MAX_SHORT_FIELD_LEN + 1));
        assert_eq!(long_subject.validate(), Err("Phone or subject is too long"));
    }

    #[test]
    fn request_fields_default_when_missing() {
        let request: SubmissionRequest = serde_json::from_str(r#"{"name":"Jane"}"#).unwrap();
        assert_eq!(request.email, "");
        assert_eq!(request.validate(), Err("A valid email is required"));
    }
}
