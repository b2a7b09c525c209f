//! Typed per-request auth context.

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, StatusCode, request::Parts},
};
use std::collections::HashMap;

use super::{extract, parse_cookies, token::Claims};

/// Headers and cookies of one request, plus the principal once a guard has
/// allowed it.
#[derive(Clone, Debug, Default)]
pub struct RequestContext {
    headers: HeaderMap,
    cookies: HashMap<String, String>,
    principal: Option<AdminPrincipal>,
}

impl RequestContext {
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            cookies: parse_cookies(headers),
            headers: headers.clone(),
            principal: None,
        }
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    #[must_use]
    pub fn cookies(&self) -> &HashMap<String, String> {
        &self.cookies
    }

    /// Candidate session token, if the request carries one.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        extract(self.headers(), self.cookies())
    }

    #[must_use]
    pub fn principal(&self) -> Option<&AdminPrincipal> {
        self.principal.as_ref()
    }

    pub(crate) fn attach(&mut self, claims: Claims) {
        self.principal = Some(AdminPrincipal(claims));
    }
}

/// Verified admin claims attached by the guard middleware.
///
/// Extracting it from a request that did not pass a guard yields `401`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdminPrincipal(pub Claims);

impl AdminPrincipal {
    #[must_use]
    pub fn claims(&self) -> &Claims {
        &self.0
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.0.username
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AdminPrincipal
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestContext>()
            .and_then(RequestContext::principal)
            .cloned()
            .ok_or(StatusCode::UNAUTHORIZED)
    }
}
