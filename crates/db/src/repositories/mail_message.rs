//! Sent-notification log repository.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dac_common::{AppError, AppResult, IdGenerator};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set,
};

use crate::entities::{
    MailMessage,
    mail_message::{self, EmailType},
};

/// Storage contract for the sent-notification log.
#[async_trait]
pub trait MailLogStore: Send + Sync {
    /// Whether a notification of this type was recorded for any of the elections.
    async fn exists(&self, election_ids: &[String], email_type: EmailType) -> AppResult<bool>;

    /// Record a sent notification.
    async fn record(
        &self,
        election_id: &str,
        reference_id: &str,
        email_type: EmailType,
    ) -> AppResult<mail_message::Model>;
}

/// Shared sent-log handle.
pub type SharedMailLogStore = Arc<dyn MailLogStore>;

/// Mail message repository for database operations.
#[derive(Clone)]
pub struct MailMessageRepository {
    db: Arc<DatabaseConnection>,
    id_gen: IdGenerator,
}

impl MailMessageRepository {
    /// Create a new mail message repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            db,
            id_gen: IdGenerator::new(),
        }
    }
}

#[async_trait]
impl MailLogStore for MailMessageRepository {
    async fn exists(&self, election_ids: &[String], email_type: EmailType) -> AppResult<bool> {
        if election_ids.is_empty() {
            return Ok(false);
        }

        let count = MailMessage::find()
            .filter(mail_message::Column::ElectionId.is_in(election_ids.to_vec()))
            .filter(mail_message::Column::EmailType.eq(email_type))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(count > 0)
    }

    async fn record(
        &self,
        election_id: &str,
        reference_id: &str,
        email_type: EmailType,
    ) -> AppResult<mail_message::Model> {
        let model = mail_message::ActiveModel {
            id: Set(self.id_gen.generate()),
            election_id: Set(election_id.to_string()),
            reference_id: Set(reference_id.to_string()),
            email_type: Set(email_type),
            create_date: Set(Utc::now().into()),
        };

        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
