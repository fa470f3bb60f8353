//! Telegram Bot API notification

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::OutputSink;
use super::text::update_lines;
use crate::config::TelegramConfig;
use crate::version::checker::UpdateStatus;
use crate::version::registries::build_client;

/// Default base URL for the Telegram Bot API
pub const DEFAULT_BASE_URL: &str = "https://api.telegram.org";

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
}

#[derive(Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Sends the upgradable containers to a Telegram chat as one message
pub struct TelegramSink {
    client: reqwest::Client,
    base_url: String,
    bot_token: String,
    chat_id: i64,
}

impl TelegramSink {
    pub fn new(config: &TelegramConfig) -> anyhow::Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL, config)
    }

    /// Creates a TelegramSink talking to a custom Bot API endpoint
    pub fn with_base_url(base_url: &str, config: &TelegramConfig) -> anyhow::Result<Self> {
        Ok(Self {
            client: build_client().context("Failed to create Telegram client")?,
            base_url: base_url.trim_end_matches('/').to_string(),
            bot_token: config.bot_token.clone(),
            chat_id: config.chat_id,
        })
    }
}

#[async_trait::async_trait]
impl OutputSink for TelegramSink {
    async fn submit(&mut self, report: &[UpdateStatus]) -> anyhow::Result<()> {
        let lines: Vec<String> = update_lines(report).collect();
        if lines.is_empty() {
            debug!("No updates, skipping Telegram notification");
            return Ok(());
        }
        let text = lines.join("\n");

        let url = format!("{}/bot{}/sendMessage", self.base_url, self.bot_token);
        let response = self
            .client
            .post(&url)
            .json(&SendMessage {
                chat_id: self.chat_id,
                text: &text,
            })
            .send()
            .await
            .context("Failed to send Telegram message")?;

        let status = response.status();
        // The Bot API answers errors with a JSON body too
        let body: Option<ApiResponse> = response.json().await.ok();
        match body {
            Some(ApiResponse { ok: true, .. }) if status.is_success() => {
                info!("Sent {} updates to Telegram chat {}", lines.len(), self.chat_id);
                Ok(())
            }
            Some(ApiResponse {
                description: Some(description),
                ..
            }) => bail!("Telegram rejected the message ({}): {}", status, description),
            _ => bail!("Telegram rejected the message ({})", status),
        }
    }
}
