use crate::models::{Message, Role};
use crate::store::{MessageQuery, NewMessage, Store, StoreError};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error};

pub const DEFAULT_HISTORY_LIMIT: u64 = 50;

#[derive(Debug, Error)]
pub enum ConversationError {
    #[error("Failed to create message: {0}")]
    Create(#[source] StoreError),
    #[error("Failed to load conversation history: {0}")]
    History(#[source] StoreError),
}

/// Creates and reads chat messages. Every call goes to the store; nothing is
/// cached.
#[derive(Clone)]
pub struct ConversationService {
    store: Arc<dyn Store>,
}

impl ConversationService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn create_message(
        &self,
        user_id: &str,
        baby_id: Option<&str>,
        content: &str,
        role: Role,
    ) -> Result<Message, ConversationError> {
        let row = NewMessage {
            user_id: user_id.to_string(),
            baby_id: baby_id.map(String::from),
            content: content.to_string(),
            role,
        };

        match self.store.insert_message(row).await {
            Ok(message) => {
                debug!("Created {} message {}", role, message.id);
                Ok(message)
            }
            Err(e) => {
                error!("Error creating {} message for user {}: {}", role, user_id, e);
                Err(ConversationError::Create(e))
            }
        }
    }

    /// Most recent messages across all conversations, newest first.
    pub async fn get_conversation_history(
        &self,
        limit: u64,
    ) -> Result<Vec<Message>, ConversationError> {
        self.select(None, limit).await
    }

    /// Most recent messages about one baby, newest first.
    pub async fn get_conversations_by_baby(
        &self,
        baby_id: &str,
        limit: u64,
    ) -> Result<Vec<Message>, ConversationError> {
        self.select(Some(baby_id), limit).await
    }

    async fn select(
        &self,
        baby_id: Option<&str>,
        limit: u64,
    ) -> Result<Vec<Message>, ConversationError> {
        let query = MessageQuery {
            baby_id: baby_id.map(String::from),
            limit,
        };

        self.store.select_messages(query).await.map_err(|e| {
            match baby_id {
                Some(baby_id) => error!("Error fetching conversations for baby {}: {}", baby_id, e),
                None => error!("Error fetching conversation history: {}", e),
            }
            ConversationError::History(e)
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::{Feedback, FeedbackKey};
    use crate::store::{FeedbackRow, MemoryStore};
    use async_trait::async_trait;

    /// Store whose every call fails, for error propagation tests.
    pub(crate) struct FailingStore;

    #[async_trait]
    impl Store for FailingStore {
        async fn insert_message(&self, _row: NewMessage) -> Result<Message, StoreError> {
            Err(StoreError::Database("insert rejected".into()))
        }

        async fn select_messages(&self, _query: MessageQuery) -> Result<Vec<Message>, StoreError> {
            Err(StoreError::Database("select rejected".into()))
        }

        async fn upsert_feedback(&self, _row: FeedbackRow) -> Result<Feedback, StoreError> {
            Err(StoreError::Database("upsert rejected".into()))
        }

        async fn select_feedback(&self, _key: &FeedbackKey) -> Result<Feedback, StoreError> {
            Err(StoreError::Database("select rejected".into()))
        }

        async fn delete_feedback(&self, _key: &FeedbackKey) -> Result<(), StoreError> {
            Err(StoreError::Database("delete rejected".into()))
        }
    }

    /// Inserts succeed but the inserted row cannot be read back.
    struct NoEchoStore;

    #[async_trait]
    impl Store for NoEchoStore {
        async fn insert_message(&self, _row: NewMessage) -> Result<Message, StoreError> {
            Err(StoreError::NoRows)
        }

        async fn select_messages(&self, _query: MessageQuery) -> Result<Vec<Message>, StoreError> {
            Ok(Vec::new())
        }

        async fn upsert_feedback(&self, _row: FeedbackRow) -> Result<Feedback, StoreError> {
            Err(StoreError::NoRows)
        }

        async fn select_feedback(&self, _key: &FeedbackKey) -> Result<Feedback, StoreError> {
            Err(StoreError::NoRows)
        }

        async fn delete_feedback(&self, _key: &FeedbackKey) -> Result<(), StoreError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn create_message_returns_stored_row() {
        let service = ConversationService::new(Arc::new(MemoryStore::new()));
        let message = service
            .create_message("u1", Some("b1"), "How long should naps be?", Role::User)
            .await
            .unwrap();

        assert_eq!(message.user_id, "u1");
        assert_eq!(message.baby_id.as_deref(), Some("b1"));
        assert_eq!(message.role, Role::User);
        assert_eq!(message.content, "How long should naps be?");
    }

    #[tokio::test]
    async fn create_message_propagates_store_error() {
        let service = ConversationService::new(Arc::new(FailingStore));
        let err = service
            .create_message("u1", None, "hi", Role::User)
            .await
            .unwrap_err();

        assert!(matches!(err, ConversationError::Create(StoreError::Database(ref msg)) if msg == "insert rejected"));
    }

    #[tokio::test]
    async fn create_message_fails_when_echo_select_fails() {
        let service = ConversationService::new(Arc::new(NoEchoStore));
        let err = service
            .create_message("u1", None, "hi", Role::User)
            .await
            .unwrap_err();

        assert!(matches!(err, ConversationError::Create(StoreError::NoRows)));
    }

    #[tokio::test]
    async fn history_is_newest_first_and_limited() {
        let service = ConversationService::new(Arc::new(MemoryStore::new()));
        for i in 0..5 {
            let baby = if i % 2 == 0 { "even" } else { "odd" };
            service
                .create_message("u1", Some(baby), &format!("m{}", i), Role::User)
                .await
                .unwrap();
        }

        let history = service.get_conversation_history(3).await.unwrap();
        let contents: Vec<&str> = history.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["m4", "m3", "m2"]);

        let odd = service
            .get_conversations_by_baby("odd", DEFAULT_HISTORY_LIMIT)
            .await
            .unwrap();
        let contents: Vec<&str> = odd.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["m3", "m1"]);
    }

    #[tokio::test]
    async fn history_propagates_store_error() {
        let service = ConversationService::new(Arc::new(FailingStore));
        assert!(matches!(
            service.get_conversation_history(10).await,
            Err(ConversationError::History(_))
        ));
        assert!(matches!(
            service.get_conversations_by_baby("b1", 10).await,
            Err(ConversationError::History(_))
        ));
    }
}
