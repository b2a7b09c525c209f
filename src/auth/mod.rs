//! Admin session authentication and authorization.
//!
//! Flow Overview:
//! 1) [`extract`] pulls a candidate token from the request: the bearer header
//!    first, then the `admin_token` cookie.
//! 2) [`token::verify`] checks the signature and expiry against the caller's
//!    clock.
//! 3) [`guard`] turns the outcome into a decision. API routes answer with a
//!    JSON `401`/`403`; page routes redirect to the login page.
//!
//! Security boundaries: signature, structure and expiry failures collapse into
//! a single [`VerifyError::Invalid`] so responses never reveal why a token was
//! rejected. The signing secret is read once at startup; a missing secret is a
//! [`ConfigError`], never a per-request failure.

mod context;
mod error;
pub mod extract;
pub mod guard;
pub mod token;

pub use context::{AdminPrincipal, RequestContext};
pub use error::{ConfigError, IssueError, VerifyError};
pub use extract::{AUTH_COOKIE_NAME, extract, parse_cookies};
pub use guard::{
    ApiDecision, LOGIN_PAGE, PageDecision, guard_api, guard_page, require_admin_api,
    require_admin_page,
};
pub use token::{ADMIN_ROLE, Claims, DEFAULT_TOKEN_TTL, IssuedToken, SessionKeys, parse_ttl};
