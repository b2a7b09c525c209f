use crate::api::handlers::{
    CreatedBody, ErrorBody, OkBody, auth, health, messages, submissions,
};
use crate::store::{SentMessage, Submission};
use utoipa::{
    OpenApi,
    openapi::{Contact, License, Tag},
};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        submissions::create,
        submissions::list,
        submissions::remove,
        auth::login,
        auth::logout,
        auth::session,
        messages::send,
        messages::list,
    ),
    components(schemas(
        ErrorBody,
        OkBody,
        CreatedBody,
        Submission,
        SentMessage,
        health::Health,
        submissions::SubmissionRequest,
        auth::LoginRequest,
        auth::LoginResponse,
        auth::SessionResponse,
        messages::SendMessageRequest,
    ))
)]
struct ApiDoc;

/// `OpenAPI` document for every JSON route.
#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();

    // Use Cargo.toml metadata instead of the utoipa crate info defaults.
    doc.info.title = env!("CARGO_PKG_NAME").to_string();
    doc.info.version = env!("CARGO_PKG_VERSION").to_string();
    doc.info.description = optional_str(env!("CARGO_PKG_DESCRIPTION")).map(str::to_string);
    doc.info.contact = cargo_contact();
    doc.info.license = cargo_license();

    doc.tags = Some(vec![
        tag("health", "Liveness and store status"),
        tag("submissions", "Public form intake"),
        tag("auth", "Admin login and session"),
        tag("admin", "Admin console operations"),
    ]);

    doc
}

fn tag(name: &str, description: &str) -> Tag {
    let mut tag = Tag::new(name);
    tag.description = Some(description.to_string());
    tag
}

fn cargo_contact() -> Option<Contact> {
    // Cargo authors are `;` separated and may include "Name <email>".
    let authors = env!("CARGO_PKG_AUTHORS");
    let primary = authors.split(';').next().map(str::trim)?;
    if primary.is_empty() {
        return None;
    }

    let (name, email) = parse_author(primary);
    if name.is_none() && email.is_none() {
        return None;
    }

    let mut contact = Contact::new();
    contact.name = name.map(str::to_string);
    contact.email = email.map(str::to_string);
    Some(contact)
}

fn cargo_license() -> Option<License> {
    let identifier = optional_str(env!("CARGO_PKG_LICENSE"))?;
    let mut license = License::new(identifier);
    license.identifier = Some(identifier.to_string());
    Some(license)
}

fn optional_str(value: &'static str) -> Option<&'static str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

fn parse_author(author: &str) -> (Option<&str>, Option<&str>) {
    if let Some(start) = author.find('<') {
        let name = author[..start].trim();
        let email = author[start + 1..].trim_end_matches('>').trim();
        let name = if name.is_empty() { None } else { Some(name) };
        let email = if email.is_empty() { None } else { Some(email) };
        (name, email)
    } else {
        let name = author.trim();
        (if name.is_empty() { None } else { Some(name) }, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_admin_routes() {
        let doc = openapi();
        for path in [
            "/health",
            "/api/submissions",
            "/api/admin/login",
            "/api/admin/logout",
            "/api/admin/session",
            "/api/admin/submissions",
            "/api/admin/submissions/{id}",
            "/api/admin/messages",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
        assert_eq!(doc.info.title, env!("CARGO_PKG_NAME"));
    }

    #[test]
    fn parse_author_splits_name_and_email() {
        assert_eq!(
            parse_author("Team Formdesk <team@formdesk.dev>"),
            (Some("Team Formdesk"), Some("team@formdesk.dev"))
        );
        assert_eq!(parse_author("Solo"), (Some("Solo"), None));
    }
}
