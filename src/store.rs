//! Row store capability used by the conversation and feedback services.

mod memory;
mod sqlite;

use crate::models::{Feedback, FeedbackKey, Message, Rating, Role};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("No rows returned")]
    NoRows,
    #[error("Foreign key violation: {0}")]
    ForeignKey(String),
    #[error("Database error: {0}")]
    Database(String),
    #[error("Store task failed: {0}")]
    Task(String),
}

impl StoreError {
    pub fn is_no_rows(&self) -> bool {
        matches!(self, StoreError::NoRows)
    }
}

/// Row shape for inserting into `conversations`. The store assigns `id` and
/// `created_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub user_id: String,
    pub baby_id: Option<String>,
    pub content: String,
    pub role: Role,
}

/// Selection over `conversations`, always newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageQuery {
    pub baby_id: Option<String>,
    pub limit: u64,
}

/// Row shape for upserting into `feedback`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackRow {
    pub conversation_message_id: String,
    pub user_id: String,
    pub rating: Rating,
    pub comment: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[async_trait]
pub trait Store: Send + Sync {
    /// Inserts one message and returns the stored row.
    async fn insert_message(&self, row: NewMessage) -> Result<Message, StoreError>;

    async fn select_messages(&self, query: MessageQuery) -> Result<Vec<Message>, StoreError>;

    /// Inserts or overwrites the feedback for `(conversation_message_id, user_id)`.
    async fn upsert_feedback(&self, row: FeedbackRow) -> Result<Feedback, StoreError>;

    /// Returns [`StoreError::NoRows`] when the key has no feedback.
    async fn select_feedback(&self, key: &FeedbackKey) -> Result<Feedback, StoreError>;

    async fn delete_feedback(&self, key: &FeedbackKey) -> Result<(), StoreError>;
}

#[cfg(test)]
pub(crate) mod contract {
    //! Behaviour every [`Store`] implementation must share.

    use super::*;

    pub fn new_message(user: &str, baby: Option<&str>, content: &str, role: Role) -> NewMessage {
        NewMessage {
            user_id: user.to_string(),
            baby_id: baby.map(String::from),
            content: content.to_string(),
            role,
        }
    }

    fn feedback_row(message_id: &str, user: &str, rating: Rating, comment: Option<&str>) -> FeedbackRow {
        FeedbackRow {
            conversation_message_id: message_id.to_string(),
            user_id: user.to_string(),
            rating,
            comment: comment.map(String::from),
            updated_at: Utc::now(),
        }
    }

    pub async fn messages_round_trip(store: &dyn Store) {
        let first = store
            .insert_message(new_message("u1", Some("b1"), "hello", Role::User))
            .await
            .unwrap();
        assert_eq!(first.content, "hello");
        assert_eq!(first.role, Role::User);
        assert_eq!(first.baby_id.as_deref(), Some("b1"));
        assert!(!first.id.is_empty());

        store
            .insert_message(new_message("u1", Some("b1"), "hi there", Role::Assistant))
            .await
            .unwrap();
        store
            .insert_message(new_message("u1", Some("b2"), "other baby", Role::User))
            .await
            .unwrap();

        let all = store
            .select_messages(MessageQuery { baby_id: None, limit: 50 })
            .await
            .unwrap();
        let contents: Vec<&str> = all.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["other baby", "hi there", "hello"]);

        let limited = store
            .select_messages(MessageQuery { baby_id: None, limit: 2 })
            .await
            .unwrap();
        assert_eq!(limited.len(), 2);
        assert_eq!(limited[0].content, "other baby");

        let by_baby = store
            .select_messages(MessageQuery {
                baby_id: Some("b1".into()),
                limit: 50,
            })
            .await
            .unwrap();
        let contents: Vec<&str> = by_baby.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["hi there", "hello"]);
    }

    pub async fn feedback_lifecycle(store: &dyn Store) {
        let message = store
            .insert_message(new_message("u1", None, "answer", Role::Assistant))
            .await
            .unwrap();
        let key = FeedbackKey::new(&message.id, "u1");

        assert!(store.select_feedback(&key).await.unwrap_err().is_no_rows());

        let saved = store
            .upsert_feedback(feedback_row(&message.id, "u1", Rating::Useful, None))
            .await
            .unwrap();
        assert_eq!(saved.rating, Rating::Useful);

        let overwritten = store
            .upsert_feedback(feedback_row(&message.id, "u1", Rating::NotUseful, Some("too vague")))
            .await
            .unwrap();
        assert_eq!(overwritten.rating, Rating::NotUseful);
        assert_eq!(overwritten.comment.as_deref(), Some("too vague"));

        let fetched = store.select_feedback(&key).await.unwrap();
        assert_eq!(fetched, overwritten);

        store
            .upsert_feedback(feedback_row(&message.id, "u2", Rating::Useful, None))
            .await
            .unwrap();
        store.delete_feedback(&key).await.unwrap();
        assert!(store.select_feedback(&key).await.unwrap_err().is_no_rows());
        assert!(
            store
                .select_feedback(&FeedbackKey::new(&message.id, "u2"))
                .await
                .is_ok()
        );
    }

    pub async fn feedback_requires_message(store: &dyn Store) {
        let err = store
            .upsert_feedback(feedback_row("missing", "u1", Rating::Useful, None))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ForeignKey(_)));
    }
}
