use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::ChatId;
use tracing::warn;

use common::{Error, Result, SignalEvent};

use crate::SignalConsumer;

/// Pushes one alert message per detected signal to the configured chats.
pub struct TelegramNotifier {
    bot: Bot,
    chat_ids: Vec<ChatId>,
}

impl TelegramNotifier {
    pub fn new(token: impl Into<String>, chat_ids: Vec<i64>) -> Self {
        Self {
            bot: Bot::new(token.into()),
            chat_ids: chat_ids.into_iter().map(ChatId).collect(),
        }
    }

    fn format_alert(event: &SignalEvent) -> String {
        format!(
            "{} signal detected!\nTime: {}\nPrice: {:.4}\nSignal: {}",
            event.instrument_id, event.bar_timestamp, event.price, event.kind
        )
    }
}

#[async_trait]
impl SignalConsumer for TelegramNotifier {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn deliver(&self, event: &SignalEvent) -> Result<()> {
        let text = Self::format_alert(event);
        let mut failed = 0usize;

        for &chat_id in &self.chat_ids {
            if let Err(e) = self.bot.send_message(chat_id, text.as_str()).await {
                warn!(chat_id = ?chat_id, error = %e, "Failed to send Telegram alert");
                failed += 1;
            }
        }

        if failed > 0 {
            return Err(Error::Dispatch(format!(
                "telegram alert failed for {failed} of {} chats",
                self.chat_ids.len()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use common::SignalKind;

    #[test]
    fn alert_text_names_instrument_price_and_kind() {
        let event = SignalEvent {
            instrument_id: "NQ=F".into(),
            bar_timestamp: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            price: 15_250.25,
            kind: SignalKind::FairValueGap,
            detected_at: Utc::now(),
            result: None,
        };
        let text = TelegramNotifier::format_alert(&event);
        assert!(text.starts_with("NQ=F signal detected!"));
        assert!(text.contains("15250.2500"));
        assert!(text.contains("FairValueGap"));
    }
}
