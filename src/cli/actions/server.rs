use crate::{
    api::{self, AppState, AuthConfig},
    auth::SessionKeys,
    email::{LogMailSender, MailSender, RelayMailSender},
    store::{MemoryStore, PgStore, SubmissionStore},
};
use anyhow::{Context, Result};
use secrecy::SecretString;
use std::{path::PathBuf, sync::Arc};
use tracing::{debug, info, warn};
use url::Url;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: Option<String>,
    pub static_dir: PathBuf,
    pub admin_dir: PathBuf,
    pub allowed_origin: Option<String>,
    pub jwt_secret: SecretString,
    pub session_ttl: chrono::Duration,
    pub admin_username: String,
    pub admin_password: SecretString,
    pub cookie_secure: bool,
    pub mail_relay_url: Option<Url>,
    pub mail_relay_token: Option<SecretString>,
    pub mail_from: String,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the configuration is invalid, the database is
/// unreachable, or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    // Signing configuration is checked before anything listens.
    let keys = SessionKeys::new(&args.jwt_secret, args.session_ttl)
        .context("Invalid session configuration")?;
    let auth = AuthConfig::new(args.admin_username, args.admin_password)
        .context("Invalid admin configuration")?
        .with_cookie_secure(args.cookie_secure);

    let store: Arc<dyn SubmissionStore> = match &args.dsn {
        Some(dsn) => Arc::new(
            PgStore::connect(dsn)
                .await
                .context("Failed to connect to database")?,
        ),
        None => {
            warn!("No --dsn configured; submissions are kept in memory only");
            Arc::new(MemoryStore::new())
        }
    };

    let mailer: Arc<dyn MailSender> = match args.mail_relay_url {
        Some(endpoint) => {
            let relay = RelayMailSender::new(endpoint, args.mail_relay_token, args.mail_from)
                .context("Failed to build mail relay client")?;
            debug!(endpoint = %relay.endpoint(), "using HTTP mail relay");
            Arc::new(relay)
        }
        None => {
            warn!("No --mail-relay-url configured; outgoing emails are only logged");
            Arc::new(LogMailSender)
        }
    };

    info!(
        store = store.backend(),
        static_dir = %args.static_dir.display(),
        admin_dir = %args.admin_dir.display(),
        "starting formdesk"
    );

    let state = AppState::new(store, mailer, keys, auth);

    api::new(
        args.port,
        state,
        &args.static_dir,
        &args.admin_dir,
        args.allowed_origin.as_deref(),
    )
    .await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn args() -> Args {
        Args {
            port: 0,
            dsn: None,
            static_dir: PathBuf::from("public"),
            admin_dir: PathBuf::from("admin"),
            allowed_origin: None,
            jwt_secret: SecretString::from(""),
            session_ttl: chrono::Duration::hours(2),
            admin_username: "root".to_string(),
            admin_password: SecretString::from("hunter2"),
            cookie_secure: false,
            mail_relay_url: None,
            mail_relay_token: None,
            mail_from: "no-reply@formdesk.local".to_string(),
        }
    }

    #[tokio::test]
    async fn execute_refuses_empty_secret() {
        let err = execute(args()).await.unwrap_err();
        assert!(err.to_string().contains("Invalid session configuration"));
    }

    #[tokio::test]
    async fn execute_refuses_blank_admin_password() {
        let mut args = args();
        args.jwt_secret = SecretString::from("s1");
        args.admin_password = SecretString::from("");
        let err = execute(args).await.unwrap_err();
        assert!(err.to_string().contains("Invalid admin configuration"));
    }

    #[test]
    fn args_debug_hides_secrets() {
        let mut args = args();
        args.jwt_secret = SecretString::from("top-secret-value");
        assert!(!format!("{args:?}").contains("top-secret-value"));
        assert!(!format!("{args:?}").contains("hunter2"));
    }
}
