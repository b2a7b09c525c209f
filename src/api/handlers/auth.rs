//! Admin login, logout and session endpoints.

use axum::{
    Json,
    extract::State,
    http::{
        HeaderMap, HeaderValue, StatusCode,
        header::{InvalidHeaderValue, SET_COOKIE},
    },
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;

use super::{ErrorBody, OkBody, error_response};
use crate::{
    api::{AppState, AuthConfig},
    auth::{ADMIN_ROLE, AUTH_COOKIE_NAME, AdminPrincipal, token},
};

#[derive(ToSchema, Serialize, Deserialize, Default)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SessionResponse {
    pub username: String,
    pub role: String,
    pub issued_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[utoipa::path(
    post,
    path = "/api/admin/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in; session cookie set", body = LoginResponse),
        (status = 400, description = "Missing username or password", body = ErrorBody),
        (status = 401, description = "Invalid credentials", body = ErrorBody)
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn login(State(state): State<AppState>, payload: Option<Json<LoginRequest>>) -> Response {
    let Some(Json(request)) = payload else {
        return error_response(StatusCode::BAD_REQUEST, "Missing payload");
    };
    if request.username.trim().is_empty() || request.password.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Username and password are required");
    }

    if !state
        .auth()
        .credentials_match(&request.username, &request.password)
    {
        warn!(username = %request.username, "admin login failed");
        return error_response(StatusCode::UNAUTHORIZED, "Invalid credentials");
    }

    let issued = match token::issue(&request.username, ADMIN_ROLE, state.keys(), Utc::now()) {
        Ok(issued) => issued,
        Err(err) => {
            error!("Failed to issue session token: {err}");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Login failed");
        }
    };

    let max_age = state.keys().ttl().num_seconds();
    let mut headers = HeaderMap::new();
    match session_cookie(state.auth(), &issued.token, max_age) {
        Ok(cookie) => {
            headers.insert(SET_COOKIE, cookie);
        }
        Err(err) => {
            error!("Failed to build session cookie: {err}");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Login failed");
        }
    }

    info!(username = %request.username, "admin logged in");

    (
        StatusCode::OK,
        headers,
        Json(LoginResponse {
            token: issued.token,
            expires_at: issued.expires_at,
        }),
    )
        .into_response()
}

#[utoipa::path(
    post,
    path = "/api/admin/logout",
    responses(
        (status = 200, description = "Session cookie cleared", body = OkBody)
    ),
    tag = "auth"
)]
pub async fn logout(State(state): State<AppState>) -> Response {
    // Tokens are not tracked server-side; only the cookie is cleared.
    let mut headers = HeaderMap::new();
    if let Ok(cookie) = clear_session_cookie(state.auth()) {
        headers.insert(SET_COOKIE, cookie);
    }
    (StatusCode::OK, headers, Json(OkBody { ok: true })).into_response()
}

#[utoipa::path(
    get,
    path = "/api/admin/session",
    responses(
        (status = 200, description = "Session is active", body = SessionResponse),
        (status = 401, description = "Missing or invalid session", body = ErrorBody),
        (status = 403, description = "Session is not an admin session", body = ErrorBody)
    ),
    tag = "auth"
)]
pub async fn session(principal: AdminPrincipal) -> Json<SessionResponse> {
    let claims = principal.claims();
    Json(SessionResponse {
        username: claims.username.clone(),
        role: claims.role.clone(),
        issued_at: claims.issued_at(),
        expires_at: claims.expires_at(),
    })
}

/// Build an `HttpOnly` cookie carrying the session token.
pub(crate) fn session_cookie(
    config: &AuthConfig,
    token: &str,
    max_age_seconds: i64,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!(
        "{AUTH_COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=Strict; Max-Age={max_age_seconds}"
    );
    if config.cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

fn clear_session_cookie(config: &AuthConfig) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!("{AUTH_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Strict; Max-Age=0");
    if config.cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn config(secure: bool) -> AuthConfig {
        AuthConfig::new("root".to_string(), SecretString::from("hunter2"))
            .unwrap()
            .with_cookie_secure(secure)
    }

    #[test]
    fn session_cookie_is_http_only() {
        let cookie = session_cookie(&config(false), "abc", 7200).unwrap();
        assert_eq!(
            cookie.to_str().unwrap(),
            "admin_token=abc; Path=/; HttpOnly; SameSite=Strict; Max-Age=7200"
        );
    }

    #[test]
    fn session_cookie_secure_flag() {
        let cookie = session_cookie(&config(true), "abc", 60).unwrap();
        assert!(cookie.to_str().unwrap().ends_with("; Secure"));
    }

    #[test]
    fn clear_cookie_expires_immediately() {
        let cookie = clear_session_cookie(&config(false)).unwrap();
        let value = cookie.to_str().unwrap();
        assert!(value.starts_with("admin_token=;"));
        assert!(value.contains("Max-Age=0"));
    }

    #[test]
    fn login_request_debug_hides_password() {
        let request = LoginRequest {
            username: "root".to_string(),
            password: "hunter2".to_string(),
        };
        assert!(!format!("{request:?}").contains("hunter2"));
    }
}
