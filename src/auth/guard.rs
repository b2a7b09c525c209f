//! Access decisions for admin routes.
//!
//! Both guards share one verification path and differ only in how a failure
//! is presented: API callers get a machine-readable status, browser page loads
//! get a redirect to the login page.

use axum::{
    Json,
    extract::{Request, State},
    http::{StatusCode, header::LOCATION},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

use super::{
    context::RequestContext,
    token::{self, Claims, SessionKeys},
};

/// Page the browser is sent to when a guarded page is refused.
pub const LOGIN_PAGE: &str = "/admin-login.html";

/// Outcome of [`guard_api`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ApiDecision {
    Allow(Claims),
    /// `401 Unauthorized` or `403 Forbidden`.
    Deny(StatusCode),
}

/// Outcome of [`guard_page`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PageDecision {
    Allow(Claims),
    RedirectToLogin,
}

enum Denial {
    MissingToken,
    InvalidToken,
    NotAdmin,
}

fn authorize(ctx: &RequestContext, keys: &SessionKeys, now: DateTime<Utc>) -> Result<Claims, Denial> {
    let candidate = ctx.token().ok_or(Denial::MissingToken)?;
    let claims = token::verify(&candidate, keys, now).map_err(|_| Denial::InvalidToken)?;
    if !claims.is_admin() {
        debug!(username = %claims.username, role = %claims.role, "non-admin token refused");
        return Err(Denial::NotAdmin);
    }
    Ok(claims)
}

/// Decide access for a JSON API request.
#[must_use]
pub fn guard_api(ctx: &RequestContext, keys: &SessionKeys, now: DateTime<Utc>) -> ApiDecision {
    match authorize(ctx, keys, now) {
        Ok(claims) => ApiDecision::Allow(claims),
        Err(Denial::MissingToken | Denial::InvalidToken) => {
            ApiDecision::Deny(StatusCode::UNAUTHORIZED)
        }
        Err(Denial::NotAdmin) => ApiDecision::Deny(StatusCode::FORBIDDEN),
    }
}

/// Decide access for a browser page load.
#[must_use]
pub fn guard_page(ctx: &RequestContext, keys: &SessionKeys, now: DateTime<Utc>) -> PageDecision {
    match authorize(ctx, keys, now) {
        Ok(claims) => PageDecision::Allow(claims),
        Err(_) => PageDecision::RedirectToLogin,
    }
}

/// JSON body for a denied API request.
#[must_use]
pub fn deny_response(status: StatusCode) -> Response {
    let message = if status == StatusCode::FORBIDDEN {
        "Forbidden"
    } else {
        "Unauthorized"
    };
    (status, Json(json!({ "error": message }))).into_response()
}

/// `302 Found` to [`LOGIN_PAGE`].
#[must_use]
pub fn login_redirect() -> Response {
    (StatusCode::FOUND, [(LOCATION, LOGIN_PAGE)]).into_response()
}

/// Middleware for admin API routes.
pub async fn require_admin_api(
    State(keys): State<Arc<SessionKeys>>,
    mut request: Request,
    next: Next,
) -> Response {
    let mut ctx = RequestContext::from_headers(request.headers());
    match guard_api(&ctx, &keys, Utc::now()) {
        ApiDecision::Allow(claims) => {
            ctx.attach(claims);
            request.extensions_mut().insert(ctx);
            next.run(request).await
        }
        ApiDecision::Deny(status) => deny_response(status),
    }
}

/// Middleware for admin pages.
pub async fn require_admin_page(
    State(keys): State<Arc<SessionKeys>>,
    mut request: Request,
    next: Next,
) -> Response {
    let mut ctx = RequestContext::from_headers(request.headers());
    match guard_page(&ctx, &keys, Utc::now()) {
        PageDecision::Allow(claims) => {
            ctx.attach(claims);
            request.extensions_mut().insert(ctx);
            next.run(request).await
        }
        PageDecision::RedirectToLogin => login_redirect(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::auth::{ADMIN_ROLE, AUTH_COOKIE_NAME};
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{
            HeaderMap, HeaderValue,
            header::{AUTHORIZATION, CONTENT_TYPE, COOKIE},
        },
        middleware,
        routing::get,
    };
    use chrono::{Duration, TimeZone};
    use secrecy::SecretString;
    use tower::ServiceExt;

    fn keys() -> SessionKeys {
        SessionKeys::new(&SecretString::from("s1"), Duration::hours(2)).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn bearer_ctx(token: &str) -> RequestContext {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        RequestContext::from_headers(&headers)
    }

    fn cookie_ctx(token: &str) -> RequestContext {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!("{AUTH_COOKIE_NAME}={token}")).unwrap(),
        );
        RequestContext::from_headers(&headers)
    }

    fn token_for(role: &str) -> String {
        token::issue("root", role, &keys(), now()).unwrap().token
    }

    #[test]
    fn guard_api_denies_missing_credentials() {
        let ctx = RequestContext::from_headers(&HeaderMap::new());
        assert_eq!(
            guard_api(&ctx, &keys(), now()),
            ApiDecision::Deny(StatusCode::UNAUTHORIZED)
        );
    }

    #[test]
    fn guard_api_denies_invalid_token() {
        assert_eq!(
            guard_api(&bearer_ctx("forged"), &keys(), now()),
            ApiDecision::Deny(StatusCode::UNAUTHORIZED)
        );
        let expired = token_for(ADMIN_ROLE);
        assert_eq!(
            guard_api(&bearer_ctx(&expired), &keys(), now() + Duration::hours(3)),
            ApiDecision::Deny(StatusCode::UNAUTHORIZED)
        );
    }

    #[test]
    fn guard_api_forbids_non_admin_role() {
        assert_eq!(
            guard_api(&bearer_ctx(&token_for("user")), &keys(), now()),
            ApiDecision::Deny(StatusCode::FORBIDDEN)
        );
    }

    #[test]
    fn guard_api_allows_admin_via_header_or_cookie() {
        let token = token_for(ADMIN_ROLE);
        for ctx in [bearer_ctx(&token), cookie_ctx(&token)] {
            match guard_api(&ctx, &keys(), now() + Duration::hours(1)) {
                ApiDecision::Allow(claims) => assert_eq!(claims.username, "root"),
                ApiDecision::Deny(status) => panic!("unexpected deny: {status}"),
            }
        }
    }

    #[test]
    fn guard_api_uses_header_even_if_cookie_is_valid() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer forged"));
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!("{AUTH_COOKIE_NAME}={}", token_for(ADMIN_ROLE)))
                .unwrap(),
        );
        let ctx = RequestContext::from_headers(&headers);
        assert_eq!(
            guard_api(&ctx, &keys(), now()),
            ApiDecision::Deny(StatusCode::UNAUTHORIZED)
        );
    }

    #[test]
    fn guard_page_redirects_on_every_failure() {
        let empty = RequestContext::from_headers(&HeaderMap::new());
        let forged = bearer_ctx("forged");
        let user = cookie_ctx(&token_for("user"));
        for ctx in [empty, forged, user] {
            assert_eq!(guard_page(&ctx, &keys(), now()), PageDecision::RedirectToLogin);
        }
    }

    #[test]
    fn guard_page_allows_admin() {
        let ctx = cookie_ctx(&token_for(ADMIN_ROLE));
        assert!(matches!(
            guard_page(&ctx, &keys(), now()),
            PageDecision::Allow(_)
        ));
    }

    #[tokio::test]
    async fn deny_response_bodies() {
        let unauthorized = deny_response(StatusCode::UNAUTHORIZED);
        assert_eq!(unauthorized.status(), StatusCode::UNAUTHORIZED);
        let body = to_bytes(unauthorized.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], br#"{"error":"Unauthorized"}"#);

        let forbidden = deny_response(StatusCode::FORBIDDEN);
        let body = to_bytes(forbidden.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], br#"{"error":"Forbidden"}"#);
    }

    #[tokio::test]
    async fn login_redirect_has_no_json_body() {
        let response = login_redirect();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers().get(LOCATION).and_then(|v| v.to_str().ok()),
            Some(LOGIN_PAGE)
        );
        assert!(response.headers().get(CONTENT_TYPE).is_none());
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(body.is_empty());
    }

    fn guarded_app() -> Router {
        let keys = Arc::new(keys());
        let api = Router::new()
            .route(
                "/api",
                get(|principal: crate::auth::AdminPrincipal| async move {
                    principal.username().to_string()
                }),
            )
            .route_layer(middleware::from_fn_with_state(keys.clone(), require_admin_api));
        let page = Router::new()
            .route("/page", get(|| async { "page" }))
            .route_layer(middleware::from_fn_with_state(keys, require_admin_page));
        api.merge(page)
    }

    #[tokio::test]
    async fn middleware_attaches_principal() {
        let token = token::issue("root", ADMIN_ROLE, &keys(), Utc::now()).unwrap().token;
        let request = Request::builder()
            .uri("/api")
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();
        let response = guarded_app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"root");
    }

    #[tokio::test]
    async fn middleware_page_redirects_anonymous() {
        let request = Request::builder().uri("/page").body(Body::empty()).unwrap();
        let response = guarded_app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers().get(LOCATION).and_then(|v| v.to_str().ok()),
            Some(LOGIN_PAGE)
        );
    }
}
