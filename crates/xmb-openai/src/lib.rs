//! OpenAI adapter for augmented replies.
//!
//! Implements the `xmb-core` ReplyModel port over the chat completions
//! endpoint. Failures map into `Error::External`; the core reply generator
//! already degrades those to a fallback string.

use async_trait::async_trait;

use xmb_core::{errors::Error, ports::ReplyModel, Result};

const COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";

#[derive(Clone, Debug)]
pub struct OpenAiReplyModel {
    api_key: String,
    model: String,
    http: reqwest::Client,
}

impl OpenAiReplyModel {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .expect("reqwest client build");
        Self {
            api_key: api_key.into(),
            model: model.into(),
            http,
        }
    }
}

#[async_trait]
impl ReplyModel for OpenAiReplyModel {
    async fn generate(&self, system_prompt: &str, user_text: &str) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": user_text }
            ],
            "max_tokens": 150
        });

        let resp = self
            .http
            .post(COMPLETIONS_URL)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::External(format!("openai request error: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::External(format!(
                "openai completion failed: {status} {}",
                body.chars().take(200).collect::<String>()
            )));
        }

        let v: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| Error::External(format!("openai json error: {e}")))?;

        let text = extract_reply(&v).unwrap_or_default();
        if text.trim().is_empty() {
            return Err(Error::External(
                "openai completion returned empty text".to_string(),
            ));
        }

        Ok(text)
    }
}

fn extract_reply(v: &serde_json::Value) -> Option<String> {
    v.get("choices")?
        .as_array()?
        .first()?
        .get("message")?
        .get("content")?
        .as_str()
        .map(|s| s.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_first_choice_content() {
        let v = serde_json::json!({
            "choices": [
                { "message": { "role": "assistant", "content": "  hello!  " } },
                { "message": { "role": "assistant", "content": "second" } }
            ]
        });
        assert_eq!(extract_reply(&v).as_deref(), Some("hello!"));
    }

    #[test]
    fn missing_choices_yield_none() {
        let v = serde_json::json!({ "error": { "message": "bad request" } });
        assert_eq!(extract_reply(&v), None);

        let v = serde_json::json!({ "choices": [] });
        assert_eq!(extract_reply(&v), None);
    }
}
