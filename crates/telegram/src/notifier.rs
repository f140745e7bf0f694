use async_trait::async_trait;
use teloxide::prelude::*;
use tracing::warn;

use common::{Error, Notifier, Result};

/// Pushes signal alerts to a fixed set of Telegram chats.
pub struct TelegramNotifier {
    bot: Bot,
    chat_ids: Vec<ChatId>,
}

impl TelegramNotifier {
    pub fn new(token: impl Into<String>, chat_ids: &[i64]) -> Result<Self> {
        if chat_ids.is_empty() {
            return Err(Error::Config(
                "TELEGRAM_CHAT_IDS must list at least one chat when TELEGRAM_TOKEN is set".into(),
            ));
        }
        Ok(Self {
            bot: Bot::new(token),
            chat_ids: chat_ids.iter().map(|&id| ChatId(id)).collect(),
        })
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn notify(&self, message: &str) -> Result<()> {
        let delivered = send_alert(&self.bot, &self.chat_ids, message).await;
        if delivered == 0 {
            return Err(Error::Notify(format!(
                "no Telegram chat accepted the alert ({} configured)",
                self.chat_ids.len()
            )));
        }
        Ok(())
    }
}

/// Send an alert to every chat id. Returns how many chats accepted it.
pub async fn send_alert(bot: &Bot, chat_ids: &[ChatId], message: &str) -> usize {
    let mut delivered = 0;
    for &chat_id in chat_ids {
        match bot.send_message(chat_id, message).await {
            Ok(_) => delivered += 1,
            Err(e) => warn!(chat_id = ?chat_id, error = %e, "Failed to send Telegram alert"),
        }
    }
    delivered
}
