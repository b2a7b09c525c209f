use async_trait::async_trait;
use sqlx::{
    Connection, PgPool, Row,
    postgres::{PgPoolOptions, PgRow},
};
use std::time::Duration;
use tracing::{Instrument, info_span};
use uuid::Uuid;

use super::{NewSentMessage, NewSubmission, SentMessage, StoreError, Submission, SubmissionStore};

/// PostgreSQL-backed store. Schema lives in `sql/schema.sql`.
#[derive(Clone, Debug)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect a small pool to `dsn`.
    ///
    /// # Errors
    /// Returns an error if the first connection cannot be established.
    pub async fn connect(dsn: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .min_connections(1)
            .max_connections(5)
            .max_lifetime(Duration::from_secs(60 * 2))
            .test_before_acquire(true)
            .connect(dsn)
            .await?;
        Ok(Self::from_pool(pool))
    }

    #[must_use]
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn submission_from_row(row: &PgRow) -> Result<Submission, sqlx::Error> {
    Ok(Submission {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
        subject: row.try_get("subject")?,
        message: row.try_get("message")?,
        created_at: row.try_get("created_at")?,
    })
}

fn sent_message_from_row(row: &PgRow) -> Result<SentMessage, sqlx::Error> {
    Ok(SentMessage {
        id: row.try_get("id")?,
        to_email: row.try_get("to_email")?,
        subject: row.try_get("subject")?,
        text: row.try_get("body_text")?,
        html: row.try_get("body_html")?,
        sent_by: row.try_get("sent_by")?,
        sent_at: row.try_get("sent_at")?,
    })
}

#[async_trait]
impl SubmissionStore for PgStore {
    async fn ping(&self) -> Result<(), StoreError> {
        let acquire_span = info_span!(
            "db.acquire",
            db.system = "postgresql",
            db.operation = "ACQUIRE"
        );
        let mut conn = self.pool.acquire().instrument(acquire_span).await?;
        let ping_span = info_span!("db.ping", db.system = "postgresql", db.operation = "PING");
        conn.ping().instrument(ping_span).await?;
        Ok(())
    }

    async fn add_submission(&self, submission: NewSubmission) -> Result<Submission, StoreError> {
        let query = r"
            INSERT INTO submissions (id, name, email, phone, subject, message)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, email, phone, subject, message, created_at
        ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(Uuid::new_v4())
            .bind(&submission.name)
            .bind(&submission.email)
            .bind(&submission.phone)
            .bind(&submission.subject)
            .bind(&submission.message)
            .fetch_one(&self.pool)
            .instrument(span)
            .await?;
        Ok(submission_from_row(&row)?)
    }

    async fn list_submissions(&self) -> Result<Vec<Submission>, StoreError> {
        let query = r"
            SELECT id, name, email, phone, subject, message, created_at
            FROM submissions
            ORDER BY created_at DESC
        ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let rows = sqlx::query(query)
            .fetch_all(&self.pool)
            .instrument(span)
            .await?;
        Ok(rows
            .iter()
            .map(submission_from_row)
            .collect::<Result<Vec<_>, sqlx::Error>>()?)
    }

    async fn delete_submission(&self, id: Uuid) -> Result<bool, StoreError> {
        let query = "DELETE FROM submissions WHERE id = $1";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "DELETE",
            db.statement = query
        );
        let result = sqlx::query(query)
            .bind(id)
            .execute(&self.pool)
            .instrument(span)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn add_sent_message(&self, message: NewSentMessage) -> Result<SentMessage, StoreError> {
        let query = r"
            INSERT INTO sent_messages (id, to_email, subject, body_text, body_html, sent_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, to_email, subject, body_text, body_html, sent_by, sent_at
        ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(Uuid::new_v4())
            .bind(&message.to_email)
            .bind(&message.subject)
            .bind(&message.text)
            .bind(&message.html)
            .bind(&message.sent_by)
            .fetch_one(&self.pool)
            .instrument(span)
            .await?;
        Ok(sent_message_from_row(&row)?)
    }

    async fn list_sent_messages(&self) -> Result<Vec<SentMessage>, StoreError> {
        let query = r"
            SELECT id, to_email, subject, body_text, body_html, sent_by, sent_at
            FROM sent_messages
            ORDER BY sent_at DESC
        ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let rows = sqlx::query(query)
            .fetch_all(&self.pool)
            .instrument(span)
            .await?;
        Ok(rows
            .iter()
            .map(sent_message_from_row)
            .collect::<Result<Vec<_>, sqlx::Error>>()?)
    }

    fn backend(&self) -> &'static str {
        "postgresql"
    }
}
