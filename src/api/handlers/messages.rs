//! Admin-sent email notifications and their log.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};
use utoipa::ToSchema;

use super::{CreatedBody, ErrorBody, error_response, optional_field, valid_email};
use crate::{
    api::AppState,
    auth::AdminPrincipal,
    email::OutgoingMail,
    store::{NewSentMessage, SentMessage},
};

const MAX_SUBJECT_LEN: usize = 200;

#[derive(ToSchema, Serialize, Deserialize, Debug, Default)]
pub struct SendMessageRequest {
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub html: Option<String>,
}

impl SendMessageRequest {
    /// # Errors
    /// Returns the message shown to the admin.
    pub fn validate(self) -> Result<OutgoingMail, &'static str> {
        let to = self.to.trim().to_string();
        let subject = self.subject.trim().to_string();
        let html = optional_field(self.html);

        if !valid_email(&to) {
            return Err("A valid recipient email is required");
        }
        if subject.is_empty() {
            return Err("Subject is required");
        }
        if subject.chars().count() > MAX_SUBJECT_LEN {
            return Err("Subject is too long");
        }
        if self.text.trim().is_empty() {
            return Err("Message text is required");
        }

        Ok(OutgoingMail {
            to,
            subject,
            text: self.text,
            html,
        })
    }
}

#[utoipa::path(
    post,
    path = "/api/admin/messages",
    request_body = SendMessageRequest,
    responses(
        (status = 201, description = "Email sent and logged", body = CreatedBody),
        (status = 400, description = "Invalid message", body = ErrorBody),
        (status = 401, description = "Missing or invalid session", body = ErrorBody),
        (status = 403, description = "Session is not an admin session", body = ErrorBody),
        (status = 500, description = "Email sent but the log entry failed", body = ErrorBody),
        (status = 502, description = "Mail relay refused or failed", body = ErrorBody)
    ),
    tag = "admin"
)]
#[instrument(skip_all, fields(admin = %principal.username()))]
pub async fn send(
    State(state): State<AppState>,
    principal: AdminPrincipal,
    payload: Option<Json<SendMessageRequest>>,
) -> Response {
    let Some(Json(request)) = payload else {
        return error_response(StatusCode::BAD_REQUEST, "Missing payload");
    };

    let mail = match request.validate() {
        Ok(mail) => mail,
        Err(message) => return error_response(StatusCode::BAD_REQUEST, message),
    };

    if let Err(err) = state.mailer().send(&mail).await {
        error!(to = %mail.to, "Failed to send email: {err}");
        return error_response(StatusCode::BAD_GATEWAY, "Failed to send email");
    }

    let entry = NewSentMessage {
        to_email: mail.to,
        subject: mail.subject,
        text: mail.text,
        html: mail.html,
        sent_by: principal.username().to_string(),
    };

    match state.store().add_sent_message(entry).await {
        Ok(logged) => {
            info!(message_id = %logged.id, "email sent");
            (
                StatusCode::CREATED,
                Json(CreatedBody {
                    id: logged.id.to_string(),
                }),
            )
                .into_response()
        }
        Err(err) => {
            error!("Failed to log sent email: {err}");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Email sent but could not be logged",
            )
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/admin/messages",
    responses(
        (status = 200, description = "Sent emails, newest first", body = [SentMessage]),
        (status = 401, description = "Missing or invalid session", body = ErrorBody),
        (status = 403, description = "Session is not an admin session", body = ErrorBody)
    ),
    tag = "admin"
)]
#[instrument(skip_all, fields(admin = %principal.username()))]
pub async fn list(State(state): State<AppState>, principal: AdminPrincipal) -> Response {
    match state.store().list_sent_messages().await {
        Ok(messages) => Json(messages).into_response(),
        Err(err) => {
            error!("Failed to list sent emails: {err}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load messages")
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn request() -> SendMessageRequest {
        SendMessageRequest {
            to: " jane@example.com ".to_string(),
            subject: " Re: your request ".to_string(),
            text: "Thanks, we will call you.".to_string(),
            html: Some(String::new()),
        }
    }

    #[test]
    fn validate_builds_mail() {
        let mail = request().validate().unwrap();
        assert_eq!(mail.to, "jane@example.com");
        assert_eq!(mail.subject, "Re: your request");
        assert_eq!(mail.html, None);
    }

    #[test]
    fn validate_rejects_bad_input() {
        let mut bad_to = request();
        bad_to.to = "nobody".to_string();
        assert_eq!(bad_to.validate(), Err("A valid recipient email is required"));

        let mut no_subject = request();
        no_subject.subject = " ".to_string();
        assert_eq!(no_subject.validate(), Err("Subject is required"));

        let mut no_text = request();
        no_text.text = "\n".to_string();
        assert_eq!(no_text.validate(), Err("Message text is required"));
    }
}
