//! Telegram Bot API notifier.
//!
//! ```ignore
//! let notifier = TelegramNotifier::new(&config.telegram, bot_token);
//! notifier.notify(&report).await?;
//! ```

use super::Notifier;
use crate::reporter;
use async_trait::async_trait;
use reqwest::Client;
use seatsync_core::config::TelegramConfig;
use seatsync_core::error::{SyncError, SyncResult};
use seatsync_core::RunReport;
use url::Url;

pub struct TelegramNotifier {
    api_base_url: Url,
    bot_token: String,
    chat_id: String,
    client: Client,
}

impl TelegramNotifier {
    pub fn new(config: &TelegramConfig, bot_token: impl Into<String>) -> Self {
        Self {
            api_base_url: config.api_base_url.clone(),
            bot_token: bot_token.into(),
            chat_id: config.chat_id.clone(),
            client: Client::new(),
        }
    }

    fn send_message_url(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.api_base_url.as_str().trim_end_matches('/'),
            self.bot_token
        )
    }

    /// Send one HTML-formatted message to the configured chat.
    pub async fn send_html(&self, text: &str) -> SyncResult<()> {
        let payload = serde_json::json!({
            "chat_id": self.chat_id,
            "text": text,
            "parse_mode": "HTML",
        });

        let resp = self
            .client
            .post(self.send_message_url())
            .json(&payload)
            .send()
            .await
            // The URL embeds the bot token; keep it out of the message.
            .map_err(|e| SyncError::Notify(format!("sendMessage failed: {}", e.without_url())))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SyncError::Notify(format!(
                "sendMessage rejected: HTTP {} {}",
                status.as_u16(),
                body.trim()
            )));
        }

        tracing::info!(chat_id = %self.chat_id, bytes = text.len(), "notification sent");
        Ok(())
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, report: &RunReport) -> SyncResult<()> {
        self.send_html(&reporter::render_html(report)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(server: &MockServer) -> TelegramConfig {
        TelegramConfig {
            chat_id: "-1001".into(),
            api_base_url: server.uri().parse().unwrap(),
        }
    }

    #[tokio::test]
    async fn posts_html_message_to_chat() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/botT0KEN/sendMessage"))
            .and(body_partial_json(json!({
                "chat_id": "-1001",
                "parse_mode": "HTML",
                "text": "<b>hi</b>"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = TelegramNotifier::new(&config(&server), "T0KEN");
        notifier.send_html("<b>hi</b>").await.unwrap();
    }

    #[tokio::test]
    async fn non_success_is_a_notify_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "ok": false,
                "description": "Bad Request: chat not found"
            })))
            .mount(&server)
            .await;

        let notifier = TelegramNotifier::new(&config(&server), "T0KEN");
        let err = notifier.send_html("hello").await.unwrap_err();
        assert!(matches!(err, SyncError::Notify(_)));
        assert!(err.to_string().contains("chat not found"));
    }
}
