//! Telegram channel — Bot API `sendMessage` for outbound posts.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::channels::ChatSink;
use crate::error::{ChannelError, SendError};

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Telegram Bot API client.
pub struct TelegramChannel {
    bot_token: SecretString,
    api_base: String,
    client: reqwest::Client,
}

/// Envelope every Bot API method responds with.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    parameters: Option<ResponseParameters>,
}

#[derive(Debug, Deserialize)]
struct ResponseParameters {
    #[serde(default)]
    retry_after: Option<u64>,
}

impl TelegramChannel {
    pub fn new(bot_token: SecretString) -> Self {
        Self::with_api_base(bot_token, TELEGRAM_API_BASE)
    }

    /// Point the client at a different API host (used by tests).
    pub fn with_api_base(bot_token: SecretString, api_base: &str) -> Self {
        Self {
            bot_token,
            api_base: api_base.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn api_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{method}",
            self.api_base,
            self.bot_token.expose_secret()
        )
    }

    /// Verify the token with `getMe`.
    pub async fn health_check(&self) -> Result<(), ChannelError> {
        let resp = self
            .client
            .get(self.api_url("getMe"))
            .send()
            .await
            .map_err(|e| ChannelError::StartupFailed {
                name: "telegram".into(),
                reason: strip_token(&e.to_string(), self.bot_token.expose_secret()),
            })?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(ChannelError::StartupFailed {
                name: "telegram".into(),
                reason: format!("getMe returned {}", resp.status()),
            })
        }
    }
}

#[async_trait]
impl ChatSink for TelegramChannel {
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), SendError> {
        let body = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
        });

        let resp = self
            .client
            .post(self.api_url("sendMessage"))
            .json(&body)
            .send()
            .await
            .map_err(|e| SendError::Request {
                reason: strip_token(&e.to_string(), self.bot_token.expose_secret()),
            })?;

        let status = resp.status();
        let parsed: Option<ApiResponse> = resp.json().await.ok();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = parsed
                .as_ref()
                .and_then(|r| r.parameters.as_ref())
                .and_then(|p| p.retry_after)
                .map(Duration::from_secs);
            return Err(SendError::RateLimited { retry_after });
        }

        match parsed {
            Some(api) if status.is_success() && api.ok => Ok(()),
            Some(api) => Err(SendError::Rejected {
                status: status.as_u16(),
                description: api.description.unwrap_or_else(|| "unknown error".into()),
            }),
            None => Err(SendError::Rejected {
                status: status.as_u16(),
                description: "unparsable response body".into(),
            }),
        }
    }
}

/// reqwest errors embed the request URL, which carries the bot token.
fn strip_token(message: &str, token: &str) -> String {
    if token.is_empty() {
        return message.to_string();
    }
    message.replace(token, "<redacted>")
}
