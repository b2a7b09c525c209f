//! Token extraction from request headers and cookies.

use axum::http::{
    HeaderMap,
    header::{AUTHORIZATION, COOKIE},
};
use std::collections::HashMap;

/// Cookie carrying the admin session token.
pub const AUTH_COOKIE_NAME: &str = "admin_token";

const BEARER_PREFIX: &str = "Bearer ";

/// Parse every `Cookie` header into a name/value map.
///
/// Pairs without `=` or with an empty name are skipped; the first occurrence
/// of a name wins.
#[must_use]
pub fn parse_cookies(headers: &HeaderMap) -> HashMap<String, String> {
    let mut cookies = HashMap::new();
    for header in headers.get_all(COOKIE) {
        let Ok(value) = header.to_str() else {
            continue;
        };
        for pair in value.split(';') {
            let Some((name, val)) = pair.split_once('=') else {
                continue;
            };
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            cookies
                .entry(name.to_string())
                .or_insert_with(|| val.trim().to_string());
        }
    }
    cookies
}

/// Pick the candidate session token: `Authorization: Bearer <token>` first,
/// then the [`AUTH_COOKIE_NAME`] cookie. Nothing is validated here.
#[must_use]
pub fn extract(headers: &HeaderMap, cookies: &HashMap<String, String>) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix(BEARER_PREFIX));
    if let Some(token) = bearer {
        return Some(token.to_string());
    }
    cookies.get(AUTH_COOKIE_NAME).cloned()
}
