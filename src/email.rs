//! Outbound email delivery.
//!
//! Admin notifications are handed to a `MailSender`. The production sender
//! posts the message as JSON to an HTTP mail relay; the default sender for
//! local runs logs the message and reports success.
//!
//! Delivery is single-shot: the caller gets `Ok` or `Err` for one attempt and
//! decides what to answer. There is no queue and no retry.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{Instrument, debug, info, info_span};
use url::Url;

use crate::APP_USER_AGENT;

/// One message to deliver.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: Option<String>,
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail relay request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("mail relay rejected the message with status {0}")]
    Rejected(StatusCode),
}

/// Email delivery abstraction used by the message handlers.
#[async_trait]
pub trait MailSender: Send + Sync {
    /// Deliver a message or return an error describing why it was not sent.
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError>;
}

/// Local dev sender that logs the message instead of sending real email.
#[derive(Clone, Debug)]
pub struct LogMailSender;

#[async_trait]
impl MailSender for LogMailSender {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        info!(
            to = %mail.to,
            subject = %mail.subject,
            has_html = mail.html.is_some(),
            "mail send stub"
        );
        Ok(())
    }
}

#[derive(Serialize)]
struct RelayPayload<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    html: Option<&'a str>,
}

/// Sender that posts messages to an HTTP mail relay.
///
/// Any `2xx` answer counts as delivered.
pub struct RelayMailSender {
    client: Client,
    endpoint: Url,
    token: Option<SecretString>,
    from: String,
}

impl RelayMailSender {
    /// Build a relay sender.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(endpoint: Url, token: Option<SecretString>, from: String) -> Result<Self, MailError> {
        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            endpoint,
            token,
            from,
        })
    }

    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl std::fmt::Debug for RelayMailSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayMailSender")
            .field("endpoint", &self.endpoint.as_str())
            .field("token", &self.token.as_ref().map(|_| "***"))
            .field("from", &self.from)
            .finish()
    }
}

#[async_trait]
impl MailSender for RelayMailSender {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        let payload = RelayPayload {
            from: &self.from,
            to: &mail.to,
            subject: &mail.subject,
            text: &mail.text,
            html: mail.html.as_deref(),
        };

        let mut request = self.client.post(self.endpoint.clone()).json(&payload);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token.expose_secret());
        }

        let span = info_span!(
            "mail.relay",
            http.method = "POST",
            http.url = %self.endpoint
        );
        let response = request.send().instrument(span).await?;
        let status = response.status();
        if status.is_success() {
            debug!(to = %mail.to, %status, "mail relay accepted message");
            Ok(())
        } else {
            Err(MailError::Rejected(status))
        }
    }
}
