use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{NewSentMessage, NewSubmission, SentMessage, StoreError, Submission, SubmissionStore};

/// In-process store. Rows are kept in insertion order and lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    submissions: RwLock<Vec<Submission>>,
    sent_messages: RwLock<Vec<SentMessage>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SubmissionStore for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn add_submission(&self, submission: NewSubmission) -> Result<Submission, StoreError> {
        let record = Submission {
            id: Uuid::new_v4(),
            name: submission.name,
            email: submission.email,
            phone: submission.phone,
            subject: submission.subject,
            message: submission.message,
            created_at: Utc::now(),
        };
        self.submissions.write().await.push(record.clone());
        Ok(record)
    }

    async fn list_submissions(&self) -> Result<Vec<Submission>, StoreError> {
        Ok(self.submissions.read().await.iter().rev().cloned().collect())
    }

    async fn delete_submission(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut submissions = self.submissions.write().await;
        let before = submissions.len();
        submissions.retain(|submission| submission.id != id);
        Ok(submissions.len() != before)
    }

    async fn add_sent_message(&self, message: NewSentMessage) -> Result<SentMessage, StoreError> {
        let record = SentMessage {
            id: Uuid::new_v4(),
            to_email: message.to_email,
            subject: message.subject,
            text: message.text,
            html: message.html,
            sent_by: message.sent_by,
            sent_at: Utc::now(),
        };
        self.sent_messages.write().await.push(record.clone());
        Ok(record)
    }

    async fn list_sent_messages(&self) -> Result<Vec<SentMessage>, StoreError> {
        Ok(self.sent_messages.read().await.iter().rev().cloned().collect())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
