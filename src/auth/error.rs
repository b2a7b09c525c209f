use thiserror::Error;

/// Startup configuration problems. These abort the process before the
/// listener is bound.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("signing secret is not configured")]
    MissingSecret,
    #[error("invalid token lifetime: {0:?}")]
    InvalidTtl(String),
    #[error("admin username is not configured")]
    MissingAdminUsername,
    #[error("admin password is not configured")]
    MissingAdminPassword,
}

/// Token verification failure.
///
/// Forged, malformed and expired tokens all map to the same variant.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VerifyError {
    #[error("invalid token")]
    Invalid,
}

#[derive(Debug, Error)]
pub enum IssueError {
    #[error("failed to sign token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
    #[error("token expiry is out of range")]
    ExpiryOverflow,
}
