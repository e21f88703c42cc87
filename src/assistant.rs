use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error};

#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("Chat request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Chat API error: {status} {body}")]
    Status { status: u16, body: String },
    #[error("Chat API returned an empty answer")]
    EmptyAnswer,
}

/// Context about the child sent along with each question.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BabyProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[async_trait]
pub trait Assistant: Send + Sync {
    async fn ask(
        &self,
        message: &str,
        profile: &BabyProfile,
        access_token: &str,
    ) -> Result<String, AssistantError>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
    profile: &'a BabyProfile,
}

#[derive(Deserialize)]
struct ChatResponse {
    answer: String,
}

/// Client for the hosted chat endpoint.
pub struct HttpAssistant {
    client: reqwest::Client,
    url: String,
}

impl HttpAssistant {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, AssistantError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl Assistant for HttpAssistant {
    async fn ask(
        &self,
        message: &str,
        profile: &BabyProfile,
        access_token: &str,
    ) -> Result<String, AssistantError> {
        let resp = self
            .client
            .post(&self.url)
            .bearer_auth(access_token)
            .json(&ChatRequest { message, profile })
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            error!("Chat API returned {}: {}", status, body);
            return Err(AssistantError::Status { status, body });
        }

        let data: ChatResponse = resp.json().await?;
        if data.answer.trim().is_empty() {
            return Err(AssistantError::EmptyAnswer);
        }

        debug!("Received answer ({} chars)", data.answer.chars().count());
        Ok(data.answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_shape() {
        let profile = BabyProfile {
            id: Some("b1".into()),
            name: Some("Mia".into()),
            ..Default::default()
        };
        let body = serde_json::to_value(ChatRequest {
            message: "Is 38.2°C a fever?",
            profile: &profile,
        })
        .unwrap();

        assert_eq!(
            body,
            serde_json::json!({
                "message": "Is 38.2°C a fever?",
                "profile": { "id": "b1", "name": "Mia" }
            })
        );
    }

    #[test]
    fn response_body_shape() {
        let resp: ChatResponse =
            serde_json::from_str(r#"{"answer":"Yes, **call** your pediatrician.","extra":1}"#).unwrap();
        assert_eq!(resp.answer, "Yes, **call** your pediatrician.");
    }
}
