//! Chat screen controller: keeps the visible transcript and the user's
//! ratings in sync with the conversation and feedback services.

use crate::assistant::{Assistant, AssistantError, BabyProfile};
use crate::auth::{Auth, AuthUser};
use crate::conversation::{ConversationError, ConversationService};
use crate::feedback::{FeedbackError, FeedbackInput, FeedbackService};
use crate::models::{Feedback, Message, Rating, Role};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

const SIGN_IN_NOTICE: &str = "Please sign in to chat with Lumi.";
const CANCELLED_NOTICE: &str = "Request cancelled.";
const FAILURE_NOTICE: &str = "Sorry, I couldn't get an answer right now. Please try again.";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Message is empty")]
    EmptyInput,
    #[error("Not signed in")]
    NotSignedIn,
    #[error("Request cancelled")]
    Cancelled,
    #[error(transparent)]
    Conversation(#[from] ConversationError),
    #[error(transparent)]
    Assistant(#[from] AssistantError),
    #[error(transparent)]
    Feedback(#[from] FeedbackError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptEntry {
    Message(Message),
    /// Shown in the assistant's style but never persisted.
    Notice(String),
}

impl TranscriptEntry {
    pub fn role(&self) -> Role {
        match self {
            TranscriptEntry::Message(m) => m.role,
            TranscriptEntry::Notice(_) => Role::Assistant,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            TranscriptEntry::Message(m) => &m.content,
            TranscriptEntry::Notice(text) => text,
        }
    }
}

pub struct ChatSession {
    conversations: ConversationService,
    feedback: FeedbackService,
    assistant: Arc<dyn Assistant>,
    auth: Arc<dyn Auth>,
    profile: BabyProfile,
    history_limit: u64,
    transcript: Vec<TranscriptEntry>,
    ratings: HashMap<String, Rating>,
}

impl ChatSession {
    pub fn new(
        conversations: ConversationService,
        feedback: FeedbackService,
        assistant: Arc<dyn Assistant>,
        auth: Arc<dyn Auth>,
        profile: BabyProfile,
        history_limit: u64,
    ) -> Self {
        Self {
            conversations,
            feedback,
            assistant,
            auth,
            profile,
            history_limit,
            transcript: Vec::new(),
            ratings: HashMap::new(),
        }
    }

    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    pub fn rating_for(&self, message_id: &str) -> Option<Rating> {
        self.ratings.get(message_id).copied()
    }

    pub fn last_assistant_message(&self) -> Option<&Message> {
        self.transcript.iter().rev().find_map(|entry| match entry {
            TranscriptEntry::Message(m) if m.role == Role::Assistant => Some(m),
            _ => None,
        })
    }

    /// Replaces the transcript with stored history in chronological order and
    /// loads the current user's ratings for the assistant replies.
    pub async fn load_history(&mut self) -> Result<usize, SessionError> {
        let mut messages = match self.profile.id.as_deref() {
            Some(baby_id) => {
                self.conversations
                    .get_conversations_by_baby(baby_id, self.history_limit)
                    .await?
            }
            None => {
                self.conversations
                    .get_conversation_history(self.history_limit)
                    .await?
            }
        };
        messages.reverse();

        self.ratings.clear();
        if let Some(user) = self.auth.current_user().await {
            for message in messages.iter().filter(|m| m.role == Role::Assistant) {
                if let Some(feedback) = self.feedback.get_feedback(&message.id, &user.id).await? {
                    self.ratings.insert(message.id.clone(), feedback.rating);
                }
            }
        }

        let count = messages.len();
        self.transcript = messages.into_iter().map(TranscriptEntry::Message).collect();
        info!("Loaded {} messages of history", count);
        Ok(count)
    }

    /// Sends `input` to the assistant and appends both sides to the
    /// transcript. On failure an inline notice is appended before the error
    /// is returned, and a user message already stored stays visible.
    pub async fn send(
        &mut self,
        input: &str,
        cancel: &CancellationToken,
    ) -> Result<Message, SessionError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(SessionError::EmptyInput);
        }

        let result = self.exchange(input, cancel).await;
        if let Err(e) = &result {
            warn!("Send failed: {}", e);
            let notice = match e {
                SessionError::NotSignedIn => SIGN_IN_NOTICE,
                SessionError::Cancelled => CANCELLED_NOTICE,
                _ => FAILURE_NOTICE,
            };
            self.transcript
                .push(TranscriptEntry::Notice(notice.to_string()));
        }
        result
    }

    async fn exchange(
        &mut self,
        input: &str,
        cancel: &CancellationToken,
    ) -> Result<Message, SessionError> {
        let user = self
            .auth
            .current_user()
            .await
            .ok_or(SessionError::NotSignedIn)?;
        let baby_id = self.profile.id.clone();

        let question = self
            .conversations
            .create_message(&user.id, baby_id.as_deref(), input, Role::User)
            .await?;
        self.transcript.push(TranscriptEntry::Message(question));

        let answer = tokio::select! {
            _ = cancel.cancelled() => return Err(SessionError::Cancelled),
            answer = self.assistant.ask(input, &self.profile, &user.access_token) => answer?,
        };

        let reply = self
            .conversations
            .create_message(&user.id, baby_id.as_deref(), &answer, Role::Assistant)
            .await?;
        self.transcript.push(TranscriptEntry::Message(reply.clone()));
        Ok(reply)
    }

    pub async fn rate(
        &mut self,
        message_id: &str,
        rating: Rating,
        comment: Option<String>,
    ) -> Result<Feedback, SessionError> {
        let user = self.auth.current_user().await;
        let feedback = self
            .feedback
            .upsert_feedback(
                user.as_ref(),
                FeedbackInput {
                    conversation_message_id: message_id.to_string(),
                    rating,
                    comment,
                },
            )
            .await?;

        self.ratings.insert(message_id.to_string(), feedback.rating);
        Ok(feedback)
    }

    pub async fn clear_rating(&mut self, message_id: &str) -> Result<(), SessionError> {
        let user: AuthUser = self
            .auth
            .current_user()
            .await
            .ok_or(SessionError::NotSignedIn)?;
        self.feedback.delete_feedback(message_id, &user.id).await?;
        self.ratings.remove(message_id);
        Ok(())
    }
}
