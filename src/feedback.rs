use crate::auth::AuthUser;
use crate::models::{Feedback, FeedbackKey, Rating};
use crate::store::{FeedbackRow, Store, StoreError};
use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum FeedbackError {
    /// Nobody is signed in. The store was not contacted.
    #[error("User not authenticated")]
    NotAuthenticated,
    #[error("Feedback store error: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackInput {
    pub conversation_message_id: String,
    pub rating: Rating,
    pub comment: Option<String>,
}

#[derive(Clone)]
pub struct FeedbackService {
    store: Arc<dyn Store>,
}

impl FeedbackService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Saves `user`'s rating for a message, replacing any earlier one.
    ///
    /// A comment that is absent or only whitespace is stored as `None`, so a
    /// blank comment box never overwrites the rating with an empty string.
    pub async fn upsert_feedback(
        &self,
        user: Option<&AuthUser>,
        input: FeedbackInput,
    ) -> Result<Feedback, FeedbackError> {
        let Some(user) = user else {
            error!(
                "Feedback for message {} rejected: no authenticated user",
                input.conversation_message_id
            );
            return Err(FeedbackError::NotAuthenticated);
        };

        let row = FeedbackRow {
            conversation_message_id: input.conversation_message_id,
            user_id: user.id.clone(),
            rating: input.rating,
            comment: input.comment.filter(|c| !c.trim().is_empty()),
            updated_at: Utc::now(),
        };
        let message_id = row.conversation_message_id.clone();

        match self.store.upsert_feedback(row).await {
            Ok(feedback) => {
                info!("Saved {} feedback for message {}", feedback.rating, message_id);
                Ok(feedback)
            }
            Err(e) => {
                error!("Error saving feedback for message {}: {}", message_id, e);
                Err(e.into())
            }
        }
    }

    /// Returns `None` when the user has not rated the message.
    pub async fn get_feedback(
        &self,
        conversation_message_id: &str,
        user_id: &str,
    ) -> Result<Option<Feedback>, FeedbackError> {
        let key = FeedbackKey::new(conversation_message_id, user_id);
        match self.store.select_feedback(&key).await {
            Ok(feedback) => Ok(Some(feedback)),
            Err(e) if e.is_no_rows() => Ok(None),
            Err(e) => {
                error!("Error fetching feedback for message {}: {}", conversation_message_id, e);
                Err(e.into())
            }
        }
    }

    pub async fn delete_feedback(
        &self,
        conversation_message_id: &str,
        user_id: &str,
    ) -> Result<(), FeedbackError> {
        let key = FeedbackKey::new(conversation_message_id, user_id);
        self.store.delete_feedback(&key).await.map_err(|e| {
            error!("Error deleting feedback for message {}: {}", conversation_message_id, e);
            FeedbackError::from(e)
        })
    }
}
