use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::ChatId;
use tracing::warn;

use common::NotificationSink;

/// Pushes engine alerts to every configured chat. Delivery failures are
/// logged and dropped; the engine never sees them.
pub struct TelegramNotifier {
    bot: Bot,
    chat_ids: Vec<ChatId>,
}

impl TelegramNotifier {
    pub fn new(token: &str, user_ids: &[i64]) -> Self {
        Self {
            bot: Bot::new(token),
            chat_ids: user_ids.iter().map(|&id| ChatId(id)).collect(),
        }
    }
}

#[async_trait]
impl NotificationSink for TelegramNotifier {
    async fn notify(&self, text: &str) {
        for &chat_id in &self.chat_ids {
            if let Err(e) = self.bot.send_message(chat_id, text).await {
                warn!(chat_id = ?chat_id, error = %e, "Failed to send Telegram alert");
            }
        }
    }
}
