//! Submission and sent-message persistence.
//!
//! Handlers only see the [`SubmissionStore`] trait. [`PgStore`] keeps rows in
//! PostgreSQL; [`MemoryStore`] keeps them in process and is used when no DSN
//! is configured and in tests.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

/// A stored public form submission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Submission {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub subject: Option<String>,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Validated input for a new submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewSubmission {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub subject: Option<String>,
    pub message: String,
}

/// Log entry for an email sent from the admin console.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SentMessage {
    pub id: Uuid,
    pub to_email: String,
    pub subject: String,
    pub text: String,
    pub html: Option<String>,
    pub sent_by: String,
    pub sent_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewSentMessage {
    pub to_email: String,
    pub subject: String,
    pub text: String,
    pub html: Option<String>,
    pub sent_by: String,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait SubmissionStore: Send + Sync {
    /// Cheap liveness probe for `/health`.
    async fn ping(&self) -> Result<(), StoreError>;

    async fn add_submission(&self, submission: NewSubmission) -> Result<Submission, StoreError>;

    /// All submissions, newest first.
    async fn list_submissions(&self) -> Result<Vec<Submission>, StoreError>;

    /// Returns `false` when no submission has that id.
    async fn delete_submission(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn add_sent_message(&self, message: NewSentMessage) -> Result<SentMessage, StoreError>;

    /// All sent messages, newest first.
    async fn list_sent_messages(&self) -> Result<Vec<SentMessage>, StoreError>;

    /// Short backend name reported by `/health`.
    fn backend(&self) -> &'static str;
}
