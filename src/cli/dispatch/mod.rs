use crate::{
    auth::parse_ttl,
    cli::{
        actions::{Action, server::Args},
        commands::{
            ARG_ADMIN_DIR, ARG_ALLOWED_ORIGIN, ARG_DSN, ARG_PORT, ARG_STATIC_DIR,
            auth::{
                ARG_ADMIN_PASSWORD, ARG_ADMIN_USERNAME, ARG_COOKIE_SECURE, ARG_JWT_EXPIRES_IN,
                ARG_JWT_SECRET,
            },
            mail::{ARG_MAIL_FROM, ARG_MAIL_RELAY_TOKEN, ARG_MAIL_RELAY_URL},
        },
    },
};
use anyhow::{Context, Result};
use secrecy::SecretString;
use std::path::PathBuf;
use url::Url;

/// # Errors
/// Returns an error if required arguments are missing or malformed.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>(ARG_DSN)
        .filter(|dsn| !dsn.trim().is_empty())
        .cloned();
    let static_dir = matches
        .get_one::<String>(ARG_STATIC_DIR)
        .map_or_else(|| PathBuf::from("public"), PathBuf::from);
    let admin_dir = matches
        .get_one::<String>(ARG_ADMIN_DIR)
        .map_or_else(|| PathBuf::from("admin"), PathBuf::from);
    let allowed_origin = matches
        .get_one::<String>(ARG_ALLOWED_ORIGIN)
        .filter(|origin| !origin.trim().is_empty())
        .cloned();

    let jwt_secret = matches
        .get_one::<String>(ARG_JWT_SECRET)
        .cloned()
        .map(SecretString::from)
        .context("missing required argument: --jwt-secret")?;
    let jwt_expires_in = matches
        .get_one::<String>(ARG_JWT_EXPIRES_IN)
        .map_or("2h", String::as_str);
    let session_ttl = parse_ttl(jwt_expires_in).context("invalid --jwt-expires-in")?;

    let admin_username = matches
        .get_one::<String>(ARG_ADMIN_USERNAME)
        .cloned()
        .context("missing required argument: --admin-username")?;
    let admin_password = matches
        .get_one::<String>(ARG_ADMIN_PASSWORD)
        .cloned()
        .map(SecretString::from)
        .context("missing required argument: --admin-password")?;
    let cookie_secure = matches.get_flag(ARG_COOKIE_SECURE);

    let mail_relay_url = matches
        .get_one::<String>(ARG_MAIL_RELAY_URL)
        .filter(|url| !url.trim().is_empty())
        .map(|url| Url::parse(url).with_context(|| format!("invalid --mail-relay-url: {url}")))
        .transpose()?;
    let mail_relay_token = matches
        .get_one::<String>(ARG_MAIL_RELAY_TOKEN)
        .cloned()
        .map(SecretString::from);
    let mail_from = matches
        .get_one::<String>(ARG_MAIL_FROM)
        .cloned()
        .unwrap_or_else(|| "no-reply@formdesk.local".to_string());

    Ok(Action::Server(Args {
        port,
        dsn,
        static_dir,
        admin_dir,
        allowed_origin,
        jwt_secret,
        session_ttl,
        admin_username,
        admin_password,
        cookie_secure,
        mail_relay_url,
        mail_relay_token,
        mail_from,
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cli::commands;

    fn matches(extra: &[&str]) -> clap::ArgMatches {
        let mut args = vec![
            "formdesk",
            "--jwt-secret",
            "s1",
            "--admin-username",
            "root",
            "--admin-password",
            "hunter2",
        ];
        args.extend_from_slice(extra);
        commands::new().get_matches_from(args)
    }

    fn clean_env<F: FnOnce()>(f: F) {
        temp_env::with_vars(
            [
                ("FORMDESK_DSN", None::<&str>),
                ("FORMDESK_STATIC_DIR", None),
                ("FORMDESK_ADMIN_DIR", None),
                ("FORMDESK_JWT_EXPIRES_IN", None),
                ("FORMDESK_MAIL_RELAY_URL", None),
                ("FORMDESK_MAIL_RELAY_TOKEN", None),
                ("FORMDESK_ALLOWED_ORIGIN", None),
                ("FORMDESK_COOKIE_SECURE", None),
            ],
            f,
        );
    }

    #[test]
    fn handler_builds_server_args() {
        clean_env(|| {
            let Action::Server(args) = handler(&matches(&["--jwt-expires-in", "30m"])).unwrap();
            assert_eq!(args.port, 8080);
            assert_eq!(args.dsn, None);
            assert_eq!(args.static_dir, PathBuf::from("public"));
            assert_eq!(args.admin_dir, PathBuf::from("admin"));
            assert_eq!(args.session_ttl, chrono::Duration::minutes(30));
            assert_eq!(args.admin_username, "root");
            assert!(!args.cookie_secure);
            assert!(args.mail_relay_url.is_none());
        });
    }

    #[test]
    fn handler_rejects_bad_ttl() {
        clean_env(|| {
            let err = handler(&matches(&["--jwt-expires-in", "soon"])).unwrap_err();
            assert!(err.to_string().contains("--jwt-expires-in"));
        });
    }

    #[test]
    fn handler_parses_relay_url() {
        clean_env(|| {
            let Action::Server(args) = handler(&matches(&[
                "--mail-relay-url",
                "https://relay.example.com/send",
                "--mail-relay-token",
                "tok",
            ]))
            .unwrap();
            assert_eq!(
                args.mail_relay_url.map(|u| u.to_string()),
                Some("https://relay.example.com/send".to_string())
            );
            assert!(args.mail_relay_token.is_some());

            assert!(handler(&matches(&["--mail-relay-url", "not a url"])).is_err());
        });
    }

    #[test]
    fn handler_treats_blank_dsn_as_unset() {
        clean_env(|| {
            let Action::Server(args) = handler(&matches(&["--dsn", " "])).unwrap();
            assert_eq!(args.dsn, None);
        });
    }
}
