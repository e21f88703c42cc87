use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rating {
    Useful,
    NotUseful,
}

impl Rating {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rating::Useful => "useful",
            Rating::NotUseful => "not_useful",
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Rating {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "useful" => Ok(Rating::Useful),
            "not_useful" => Ok(Rating::NotUseful),
            other => Err(format!("unknown rating: {}", other)),
        }
    }
}

/// A persisted chat message. Never modified after insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub user_id: String,
    pub baby_id: Option<String>,
    pub content: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Feedback left by one user on one message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    pub conversation_message_id: String,
    pub user_id: String,
    pub rating: Rating,
    pub comment: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl Feedback {
    pub fn key(&self) -> FeedbackKey {
        FeedbackKey {
            conversation_message_id: self.conversation_message_id.clone(),
            user_id: self.user_id.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FeedbackKey {
    pub conversation_message_id: String,
    pub user_id: String,
}

impl FeedbackKey {
    pub fn new(conversation_message_id: &str, user_id: &str) -> Self {
        Self {
            conversation_message_id: conversation_message_id.to_string(),
            user_id: user_id.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names() {
        assert_eq!(serde_json::to_string(&Role::Assistant).unwrap(), "\"assistant\"");
        assert_eq!(serde_json::to_string(&Rating::NotUseful).unwrap(), "\"not_useful\"");
        assert_eq!("not_useful".parse::<Rating>(), Ok(Rating::NotUseful));
        assert_eq!("user".parse::<Role>(), Ok(Role::User));
        assert!("system".parse::<Role>().is_err());
    }
}
