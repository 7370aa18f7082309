use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::debug;

use intake_core::config::NotifierConfig;
use intake_core::domain::lifecycle::NotificationStatus;
use intake_core::domain::order::Order;

use crate::message::{render_order_summary, PARSE_MODE};
use crate::sink::{NotifyError, OrderNotifier};

const MAX_ERROR_BODY_CHARS: usize = 512;

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
}

/// Telegram Bot API sink. The bot token is part of the request path, so it
/// is kept secret and never appears in errors or logs.
pub struct TelegramNotifier {
    client: Client,
    api_base_url: String,
    bot_token: SecretString,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(
        api_base_url: impl Into<String>,
        bot_token: SecretString,
        chat_id: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| NotifyError::Client(error.without_url().to_string()))?;

        Ok(Self {
            client,
            api_base_url: api_base_url.into().trim_end_matches('/').to_string(),
            bot_token,
            chat_id: chat_id.into(),
        })
    }

    /// `None` when the target is not configured.
    pub fn from_config(config: &NotifierConfig) -> Result<Option<Self>, NotifyError> {
        if !config.is_configured() {
            return Ok(None);
        }
        let (Some(bot_token), Some(chat_id)) =
            (config.telegram_bot_token.clone(), config.telegram_chat_id.clone())
        else {
            return Ok(None);
        };

        Self::new(
            config.api_base_url.clone(),
            bot_token,
            chat_id,
            Duration::from_secs(config.timeout_secs),
        )
        .map(Some)
    }

    fn endpoint(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base_url, self.bot_token.expose_secret())
    }
}

#[async_trait]
impl OrderNotifier for TelegramNotifier {
    async fn notify(&self, order: &Order) -> Result<NotificationStatus, NotifyError> {
        let text = render_order_summary(order);
        let request =
            SendMessageRequest { chat_id: &self.chat_id, text: &text, parse_mode: PARSE_MODE };

        let response =
            self.client.post(self.endpoint()).json(&request).send().await.map_err(|error| {
                if error.is_timeout() {
                    NotifyError::Transport("request timed out".to_string())
                } else {
                    NotifyError::Transport(error.without_url().to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        debug!(
            event_name = "notify.telegram.delivered",
            order_id = %order.id,
            status = status.as_u16(),
            "telegram accepted order notification"
        );
        Ok(NotificationStatus::Delivered)
    }

    fn sink_name(&self) -> &'static str {
        "telegram"
    }
}
