//! HS256 session tokens.
//!
//! Tokens carry `username`, `role`, `iat` and `exp` (Unix seconds). Keys are
//! derived once from the configured secret. Expiry is checked against the
//! instant passed by the caller, never against the library clock, so the same
//! token can be judged at any point in time.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use super::error::{ConfigError, IssueError, VerifyError};

/// The only role allowed through the guard.
pub const ADMIN_ROLE: &str = "admin";

/// Token lifetime used when none is configured.
pub const DEFAULT_TOKEN_TTL: &str = "2h";

/// Decoded session token payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub username: String,
    pub role: String,
    /// Issued-at, Unix seconds.
    pub iat: i64,
    /// Expiry, Unix seconds.
    pub exp: i64,
}

impl Claims {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == ADMIN_ROLE
    }

    #[must_use]
    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.iat, 0)
    }

    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

/// A freshly signed token and the claims it encodes.
#[derive(Clone, Debug)]
pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
    pub expires_at: DateTime<Utc>,
}

/// Signing material and token lifetime, built once at startup.
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl SessionKeys {
    /// Build keys from the signing secret.
    ///
    /// # Errors
    /// Returns [`ConfigError::MissingSecret`] for an empty secret and
    /// [`ConfigError::InvalidTtl`] for a non-positive lifetime.
    pub fn new(secret: &SecretString, ttl: Duration) -> Result<Self, ConfigError> {
        let secret = secret.expose_secret();
        if secret.trim().is_empty() {
            return Err(ConfigError::MissingSecret);
        }
        if ttl <= Duration::zero() {
            return Err(ConfigError::InvalidTtl(format!("{}s", ttl.num_seconds())));
        }
        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        })
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl fmt::Debug for SessionKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionKeys")
            .field("secret", &"***")
            .field("ttl_seconds", &self.ttl.num_seconds())
            .finish()
    }
}

/// Parse a token lifetime such as `"2h"`, `"30m"`, `"1d"`, `"45s"` or a bare
/// number of seconds.
///
/// # Errors
/// Returns [`ConfigError::InvalidTtl`] for empty, non-positive, overflowing
/// or unit-less-but-non-numeric input, and for units other than `s`, `m`,
/// `h`, `d`.
pub fn parse_ttl(value: &str) -> Result<Duration, ConfigError> {
    let invalid = || ConfigError::InvalidTtl(value.to_string());
    let trimmed = value.trim();

    let (amount, unit) = match trimmed.chars().last() {
        Some(unit) if unit.is_ascii_alphabetic() => (&trimmed[..trimmed.len() - 1], Some(unit)),
        Some(_) => (trimmed, None),
        None => return Err(invalid()),
    };

    let amount: i64 = amount.parse().map_err(|_| invalid())?;
    if amount <= 0 {
        return Err(invalid());
    }

    let seconds = match unit {
        None | Some('s') => Some(amount),
        Some('m') => amount.checked_mul(60),
        Some('h') => amount.checked_mul(60 * 60),
        Some('d') => amount.checked_mul(24 * 60 * 60),
        Some(_) => None,
    }
    .ok_or_else(invalid)?;

    Duration::try_seconds(seconds).ok_or_else(invalid)
}

/// Sign a session token for `username` with `role`, valid from `now` for the
/// configured lifetime.
///
/// # Errors
/// Returns an error if the expiry overflows or signing fails.
pub fn issue(
    username: &str,
    role: &str,
    keys: &SessionKeys,
    now: DateTime<Utc>,
) -> Result<IssuedToken, IssueError> {
    let expires_at = now
        .checked_add_signed(keys.ttl)
        .ok_or(IssueError::ExpiryOverflow)?;
    let claims = Claims {
        username: username.to_string(),
        role: role.to_string(),
        iat: now.timestamp(),
        exp: expires_at.timestamp(),
    };
    let token = encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding)?;
    Ok(IssuedToken {
        token,
        claims,
        expires_at,
    })
}

/// Verify a session token and return its claims.
///
/// Succeeds only if the signature matches and `now < exp`. The role is not
/// checked here; that is the guard's job.
///
/// # Errors
/// Returns [`VerifyError::Invalid`] for every kind of rejection.
pub fn verify(token: &str, keys: &SessionKeys, now: DateTime<Utc>) -> Result<Claims, VerifyError> {
    if token.is_empty() {
        return Err(VerifyError::Invalid);
    }

    let mut validation = Validation::new(Algorithm::HS256);
    // Expiry is judged below against the caller's clock.
    validation.validate_exp = false;

    let claims = decode::<Claims>(token, &keys.decoding, &validation)
        .map_err(|err| {
            debug!("session token rejected: {err}");
            VerifyError::Invalid
        })?
        .claims;

    if now.timestamp() >= claims.exp {
        debug!(username = %claims.username, "session token expired");
        return Err(VerifyError::Invalid);
    }

    Ok(claims)
}
