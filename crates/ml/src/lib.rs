mod error;
mod offline;
mod openai;

use std::env;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub use error::ModelError;
pub use offline::OfflineModel;
pub use openai::{extract_completion_text, OpenAiChatModel};

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_OPENAI_VISION_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    /// Unknown roles coming from a client-side history are treated as user text.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "system" => Self::System,
            "assistant" | "bot" => Self::Assistant,
            _ => Self::User,
        }
    }
}

/// Message body: plain text, or typed parts for multimodal prompts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl MessageContent {
    /// The text of a plain message; `None` for multimodal parts.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Parts(_) => None,
        }
    }

    pub fn has_image(&self) -> bool {
        match self {
            Self::Text(_) => false,
            Self::Parts(parts) => parts
                .iter()
                .any(|part| matches!(part, ContentPart::ImageUrl { .. })),
        }
    }
}

impl From<String> for MessageContent {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for MessageContent {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: MessageContent,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<MessageContent>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content.into())
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content.into())
    }

    /// User turn carrying an instruction plus one image to look at.
    pub fn user_with_image(text: impl Into<String>, image_url: impl Into<String>) -> Self {
        Self::new(
            Role::User,
            MessageContent::Parts(vec![
                ContentPart::Text { text: text.into() },
                ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: image_url.into(),
                    },
                },
            ]),
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl CompletionRequest {
    pub fn new(messages: Vec<ChatMessage>, max_tokens: u32, temperature: f32) -> Self {
        Self {
            messages,
            max_tokens,
            temperature,
        }
    }

    pub fn has_image(&self) -> bool {
        self.messages.iter().any(|message| message.content.has_image())
    }
}

pub trait LanguageModel: Send + Sync {
    fn model_name(&self) -> &str;
    async fn complete(&self, request: CompletionRequest) -> Result<String, ModelError>;
}

#[derive(Clone)]
pub enum ModelBackend {
    OpenAi(OpenAiChatModel),
    Offline(OfflineModel),
}

/// Connection settings for the hosted chat-completions backend.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub model: String,
    /// Used instead of `model` for requests that carry an image.
    pub vision_model: String,
    pub base_url: String,
}

impl OpenAiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_OPENAI_MODEL.to_string(),
            vision_model: DEFAULT_OPENAI_VISION_MODEL.to_string(),
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
        }
    }

    /// `None` unless `VOLO_OPENAI_API_KEY` is set to something non-blank.
    pub fn from_env() -> Option<Self> {
        let api_key = env::var("VOLO_OPENAI_API_KEY")
            .ok()
            .filter(|value| !value.trim().is_empty())?;

        let mut config = Self::new(api_key);
        if let Ok(model) = env::var("VOLO_OPENAI_MODEL") {
            config.model = model;
        }
        if let Ok(vision_model) = env::var("VOLO_OPENAI_VISION_MODEL") {
            config.vision_model = vision_model;
        }
        if let Ok(base_url) = env::var("VOLO_OPENAI_BASE_URL") {
            config.base_url = base_url;
        }
        Some(config)
    }
}

impl ModelBackend {
    pub fn offline() -> Self {
        Self::Offline(OfflineModel)
    }

    pub fn openai(config: OpenAiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(6))
            .timeout(Duration::from_secs(20))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self::OpenAi(
            OpenAiChatModel::new(client, config.api_key, config.model, config.base_url)
                .with_vision_model(config.vision_model),
        ))
    }

    /// Hosted backend when `VOLO_OPENAI_API_KEY` is set, offline otherwise.
    pub fn from_env() -> Result<Self> {
        match OpenAiConfig::from_env() {
            Some(config) => Self::openai(config),
            None => Ok(Self::offline()),
        }
    }

    pub fn is_online(&self) -> bool {
        matches!(self, Self::OpenAi(_))
    }
}

impl LanguageModel for ModelBackend {
    fn model_name(&self) -> &str {
        match self {
            ModelBackend::OpenAi(model) => model.model_name(),
            ModelBackend::Offline(model) => model.model_name(),
        }
    }

    async fn complete(&self, request: CompletionRequest) -> Result<String, ModelError> {
        match self {
            ModelBackend::OpenAi(model) => model.complete(request).await,
            ModelBackend::Offline(model) => model.complete(request).await,
        }
    }
}
