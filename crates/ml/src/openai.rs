use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use crate::{CompletionRequest, LanguageModel, ModelError};

#[derive(Debug, Clone)]
pub struct OpenAiChatModel {
    client: Client,
    api_key: String,
    model: String,
    vision_model: String,
    base_url: String,
}

impl OpenAiChatModel {
    pub fn new(client: Client, api_key: String, model: String, base_url: String) -> Self {
        Self {
            client,
            api_key,
            vision_model: model.clone(),
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn with_vision_model(mut self, vision_model: String) -> Self {
        self.vision_model = vision_model;
        self
    }

    fn model_for(&self, request: &CompletionRequest) -> &str {
        if request.has_image() {
            &self.vision_model
        } else {
            &self.model
        }
    }

    fn payload(&self, request: &CompletionRequest) -> Value {
        json!({
            "model": self.model_for(request),
            "messages": request.messages,
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
        })
    }
}

impl LanguageModel for OpenAiChatModel {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: CompletionRequest) -> Result<String, ModelError> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!(
            model = self.model_for(&request),
            messages = request.messages.len(),
            "chat completion request"
        );

        let response = self
            .client
            .post(url)
            .bearer_auth(self.api_key.as_str())
            .json(&self.payload(&request))
            .send()
            .await
            .map_err(|error| ModelError::Http(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|error| ModelError::Decode(error.to_string()))?;

        extract_completion_text(&body)
            .filter(|text| !text.trim().is_empty())
            .ok_or(ModelError::EmptyCompletion)
    }
}

/// Reads `choices[0].message.content`, falling back to a top-level
/// `output_text` for responses-style payloads.
pub fn extract_completion_text(payload: &Value) -> Option<String> {
    if let Some(content) = payload
        .get("choices")
        .and_then(|choices| choices.as_array())
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(|content| content.as_str())
    {
        return Some(content.to_string());
    }

    payload
        .get("output_text")
        .and_then(|value| value.as_str())
        .map(ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ChatMessage;

    #[test]
    fn extracts_first_choice() {
        let payload = json!({
            "choices": [
                { "message": { "role": "assistant", "content": "إيجابي" } },
                { "message": { "role": "assistant", "content": "ignored" } }
            ]
        });
        assert_eq!(extract_completion_text(&payload).as_deref(), Some("إيجابي"));
    }

    #[test]
    fn falls_back_to_output_text() {
        let payload = json!({ "output_text": "hello" });
        assert_eq!(extract_completion_text(&payload).as_deref(), Some("hello"));
        assert_eq!(extract_completion_text(&json!({ "choices": [] })), None);
    }

    #[test]
    fn payload_carries_sampling_settings() {
        let model = OpenAiChatModel::new(
            Client::new(),
            "key".to_string(),
            "gpt-3.5-turbo".to_string(),
            "https://api.openai.com/v1/".to_string(),
        );
        let payload = model.payload(&CompletionRequest::new(
            vec![ChatMessage::system("s"), ChatMessage::user("u")],
            100,
            0.3,
        ));
        assert_eq!(payload["model"], "gpt-3.5-turbo");
        assert_eq!(payload["max_tokens"], 100);
        assert_eq!(payload["messages"][0]["role"], "system");
        assert_eq!(model.base_url, "https://api.openai.com/v1");
    }

    #[test]
    fn image_requests_use_the_vision_model() {
        let model = OpenAiChatModel::new(
            Client::new(),
            "key".to_string(),
            "gpt-3.5-turbo".to_string(),
            "https://api.openai.com/v1".to_string(),
        )
        .with_vision_model("gpt-4o-mini".to_string());

        let payload = model.payload(&CompletionRequest::new(
            vec![ChatMessage::user_with_image("describe", "https://cdn.volo.dz/a.jpg")],
            200,
            0.6,
        ));
        assert_eq!(payload["model"], "gpt-4o-mini");
        assert_eq!(payload["messages"][0]["content"][1]["type"], "image_url");
    }
}
