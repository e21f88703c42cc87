use super::{FeedbackRow, MessageQuery, NewMessage, Store, StoreError};
use crate::models::{Feedback, FeedbackKey, Message};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// Store kept entirely in process memory. Messages are appended in insertion
/// order, which breaks ties between equal timestamps.
#[derive(Default)]
pub struct MemoryStore {
    messages: RwLock<Vec<Message>>,
    feedback: RwLock<HashMap<FeedbackKey, Feedback>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_message(&self, row: NewMessage) -> Result<Message, StoreError> {
        let message = Message {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: row.user_id,
            baby_id: row.baby_id,
            content: row.content,
            role: row.role,
            created_at: Utc::now(),
        };

        self.messages.write().await.push(message.clone());
        debug!("Stored message {} in memory", message.id);
        Ok(message)
    }

    async fn select_messages(&self, query: MessageQuery) -> Result<Vec<Message>, StoreError> {
        let messages = self.messages.read().await;

        let mut selected: Vec<(usize, &Message)> = messages
            .iter()
            .enumerate()
            .filter(|(_, m)| match &query.baby_id {
                Some(baby_id) => m.baby_id.as_ref() == Some(baby_id),
                None => true,
            })
            .collect();

        selected.sort_by(|(ia, a), (ib, b)| b.created_at.cmp(&a.created_at).then(ib.cmp(ia)));

        Ok(selected
            .into_iter()
            .take(query.limit as usize)
            .map(|(_, m)| m.clone())
            .collect())
    }

    async fn upsert_feedback(&self, row: FeedbackRow) -> Result<Feedback, StoreError> {
        let exists = self
            .messages
            .read()
            .await
            .iter()
            .any(|m| m.id == row.conversation_message_id);
        if !exists {
            return Err(StoreError::ForeignKey(format!(
                "conversation message {} does not exist",
                row.conversation_message_id
            )));
        }

        let feedback = Feedback {
            conversation_message_id: row.conversation_message_id,
            user_id: row.user_id,
            rating: row.rating,
            comment: row.comment,
            updated_at: row.updated_at,
        };

        self.feedback
            .write()
            .await
            .insert(feedback.key(), feedback.clone());
        Ok(feedback)
    }

    async fn select_feedback(&self, key: &FeedbackKey) -> Result<Feedback, StoreError> {
        self.feedback
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or(StoreError::NoRows)
    }

    async fn delete_feedback(&self, key: &FeedbackKey) -> Result<(), StoreError> {
        self.feedback.write().await.remove(key);
        Ok(())
    }
}
