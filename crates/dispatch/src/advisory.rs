use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;

use common::{Error, Result, SignalEvent};

use crate::SignalConsumer;

const CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Requests a free-text trade commentary for each signal from an
/// OpenAI-compatible chat endpoint. The commentary is logged; the core
/// never consumes it.
pub struct AdvisoryClient {
    http: Client,
    api_key: String,
    model: String,
}

impl AdvisoryClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http: Client::builder()
                .use_rustls_tls()
                .build()
                .expect("Failed to build HTTP client"),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    fn prompt(event: &SignalEvent) -> String {
        format!(
            "Analyze this trade setup for {}:\nTime: {}\nPrice: {}\nSignal: {}",
            event.instrument_id, event.bar_timestamp, event.price, event.kind
        )
    }
}

#[async_trait]
impl SignalConsumer for AdvisoryClient {
    fn name(&self) -> &str {
        "advisory"
    }

    async fn deliver(&self, event: &SignalEvent) -> Result<()> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: Self::prompt(event),
            }],
        };

        let resp = self
            .http
            .post(CHAT_COMPLETIONS_URL)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| Error::Http(e.to_string()))?;
        if !status.is_success() {
            return Err(Error::Dispatch(format!(
                "advisory request failed: HTTP {status}: {body}"
            )));
        }

        let parsed: ChatResponse = serde_json::from_str(&body)?;
        let advice = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default();

        info!(
            instrument = %event.instrument_id,
            time = %event.bar_timestamp,
            advice = %advice,
            "AI advice"
        );
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use common::SignalKind;

    #[test]
    fn prompt_includes_all_dispatch_payload_fields() {
        let event = SignalEvent {
            instrument_id: "ES=F".into(),
            bar_timestamp: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            price: 4500.5,
            kind: SignalKind::BreakOfStructure,
            detected_at: Utc::now(),
            result: None,
        };
        let prompt = AdvisoryClient::prompt(&event);
        assert!(prompt.contains("ES=F"));
        assert!(prompt.contains("4500.5"));
        assert!(prompt.contains("BreakOfStructure"));
        assert!(prompt.contains("2023-11-14"));
    }

    #[test]
    fn chat_response_parses_first_choice() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"Looks extended."}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.choices[0].message.content, "Looks extended.");
    }
}
