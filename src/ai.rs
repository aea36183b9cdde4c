use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::NarrativeError;
use crate::settings::Settings;

/// The one operation the game core consumes from the narrative service.
///
/// Failures come back typed; the quest layer decides what to show the player.
/// It never has to: a failed generation still advances the quest clock.
#[async_trait]
pub trait NarrativeGenerator: Send + Sync {
    async fn generate_step(
        &self,
        system_role: &str,
        player_message: &str,
    ) -> Result<String, NarrativeError>;
}

#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl AccessToken {
    fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

// Wire types for the token and chat-completions endpoints.

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_at: i64, // Epoch milliseconds, declared by the server.
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

/// HTTP client for the narrative service. Keeps one bearer token cached and
/// refreshes it when the server-declared expiry passes.
pub struct NarrativeClient {
    http: reqwest::Client,
    authorization_key: String,
    client_id: String,
    token_url: String,
    chat_url: String,
    model: String,
    token: Mutex<Option<AccessToken>>,
}

impl NarrativeClient {
    pub fn new(settings: &Settings, authorization_key: String) -> Self {
        NarrativeClient {
            http: reqwest::Client::new(),
            authorization_key,
            client_id: settings.client_id.clone(),
            token_url: settings.token_url.clone(),
            chat_url: settings.chat_url.clone(),
            model: settings.model.clone(),
            token: Mutex::new(None),
        }
    }

    // Returns the cached token, refreshing it first if missing or expired.
    async fn access_token(&self) -> Result<String, NarrativeError> {
        let mut guard = self.token.lock().await;
        if let Some(token) = guard.as_ref() {
            if !token.is_expired() {
                return Ok(token.value.clone());
            }
        }

        let token = self.request_access_token().await?;
        let value = token.value.clone();
        *guard = Some(token);
        Ok(value)
    }

    async fn request_access_token(&self) -> Result<AccessToken, NarrativeError> {
        let response = self
            .http
            .post(&self.token_url)
            .header("Accept", "application/json")
            .header(
                "Authorization",
                format!("Basic {}", self.authorization_key),
            )
            .header("RqUID", Uuid::new_v4().to_string())
            .form(&[("scope", "GIGACHAT_API_PERS")])
            .send()
            .await?
            .error_for_status()?;

        let token_info: TokenResponse = response.json().await?;
        let expires_at = Utc
            .timestamp_millis_opt(token_info.expires_at)
            .single()
            .ok_or_else(|| {
                NarrativeError::Auth(format!(
                    "token endpoint declared an invalid expiry: {}",
                    token_info.expires_at
                ))
            })?;

        info!("Narrative service access token refreshed");
        Ok(AccessToken {
            value: token_info.access_token,
            expires_at,
        })
    }
}

#[async_trait]
impl NarrativeGenerator for NarrativeClient {
    async fn generate_step(
        &self,
        system_role: &str,
        player_message: &str,
    ) -> Result<String, NarrativeError> {
        let token = self.access_token().await?;

        let payload = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_role,
                },
                ChatMessage {
                    role: "user",
                    content: player_message,
                },
            ],
            max_tokens: 500,
            temperature: 0.7,
        };

        debug!("Requesting narration: {} chars of context", player_message.len());

        let response = self
            .http
            .post(&self.chat_url)
            .header("Accept", "application/json")
            .header("Authorization", format!("Bearer {token}"))
            .header("X-Client-ID", &self.client_id)
            .header("X-Request-ID", Uuid::new_v4().to_string())
            .header("X-Session-ID", Uuid::new_v4().to_string())
            .json(&payload)
            .send()
            .await?
            .error_for_status()?;

        let data: ChatResponse = response.json().await?;
        let Some(choice) = data.choices.into_iter().next() else {
            warn!("Narrative service returned no choices");
            return Err(NarrativeError::MalformedResponse(
                "completion contained no choices".to_string(),
            ));
        };

        Ok(choice.message.content.trim().to_string())
    }
}
