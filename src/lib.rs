//! # Formdesk (contact form intake and admin console)
//!
//! `formdesk` accepts public form submissions, stores them, and exposes an
//! admin console that can list and delete submissions and send email
//! notifications which are logged alongside the submissions.
//!
//! ## Admin sessions
//!
//! Administrators log in with the configured username and password and receive
//! an HS256-signed session token. The token travels either as an
//! `Authorization: Bearer` header or as the `admin_token` cookie; the header
//! wins when both are present.
//!
//! Guarded JSON endpoints answer `401` when the token is missing, malformed,
//! forged or expired (these causes are never distinguished), and `403` when a
//! valid token does not carry the `admin` role. Guarded pages redirect to
//! `/admin-login.html` instead.
//!
//! Tokens are not revocable: logout clears the cookie, but a captured token
//! stays valid until it expires (`2h` by default).
//!
//! ## Collaborators
//!
//! Storage and mail delivery are reached through the [`store::SubmissionStore`]
//! and [`email::MailSender`] traits. Both are constructed once at startup and
//! injected into the router through [`api::AppState`].

pub mod api;
pub mod auth;
pub mod cli;
pub mod email;
pub mod store;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
