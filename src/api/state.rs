//! Shared application state and login configuration.

use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use subtle::ConstantTimeEq;

use crate::{
    auth::{ConfigError, SessionKeys},
    email::MailSender,
    store::SubmissionStore,
};

/// Admin login settings.
#[derive(Clone, Debug)]
pub struct AuthConfig {
    admin_username: String,
    admin_password: SecretString,
    cookie_secure: bool,
}

impl AuthConfig {
    /// # Errors
    /// Returns an error when the username or password is blank.
    pub fn new(admin_username: String, admin_password: SecretString) -> Result<Self, ConfigError> {
        if admin_username.trim().is_empty() {
            return Err(ConfigError::MissingAdminUsername);
        }
        if admin_password.expose_secret().is_empty() {
            return Err(ConfigError::MissingAdminPassword);
        }
        Ok(Self {
            admin_username,
            admin_password,
            cookie_secure: false,
        })
    }

    #[must_use]
    pub fn with_cookie_secure(mut self, secure: bool) -> Self {
        self.cookie_secure = secure;
        self
    }

    #[must_use]
    pub fn cookie_secure(&self) -> bool {
        self.cookie_secure
    }

    /// Compare submitted credentials in constant time.
    #[must_use]
    pub fn credentials_match(&self, username: &str, password: &str) -> bool {
        let user_ok = self.admin_username.as_bytes().ct_eq(username.as_bytes());
        let pass_ok = self
            .admin_password
            .expose_secret()
            .as_bytes()
            .ct_eq(password.as_bytes());
        (user_ok & pass_ok).into()
    }
}

/// Everything a handler may need, built once at startup.
#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn SubmissionStore>,
    mailer: Arc<dyn MailSender>,
    keys: Arc<SessionKeys>,
    auth: Arc<AuthConfig>,
}

impl AppState {
    #[must_use]
    pub fn new(
        store: Arc<dyn SubmissionStore>,
        mailer: Arc<dyn MailSender>,
        keys: SessionKeys,
        auth: AuthConfig,
    ) -> Self {
        Self {
            store,
            mailer,
            keys: Arc::new(keys),
            auth: Arc::new(auth),
        }
    }

    #[must_use]
    pub fn store(&self) -> &dyn SubmissionStore {
        self.store.as_ref()
    }

    #[must_use]
    pub fn mailer(&self) -> &dyn MailSender {
        self.mailer.as_ref()
    }

    #[must_use]
    pub fn keys(&self) -> &Arc<SessionKeys> {
        &self.keys
    }

    #[must_use]
    pub fn auth(&self) -> &AuthConfig {
        &self.auth
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("store", &self.store.backend())
            .field("keys", &self.keys)
            .field("auth", &self.auth)
            .finish_non_exhaustive()
    }
}
