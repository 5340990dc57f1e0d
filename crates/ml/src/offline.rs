use crate::{CompletionRequest, LanguageModel, ModelError};

/// Backend used when no hosted model is configured; every call fails so the
/// caller takes its static fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineModel;

impl LanguageModel for OfflineModel {
    fn model_name(&self) -> &str {
        "offline"
    }

    async fn complete(&self, _request: CompletionRequest) -> Result<String, ModelError> {
        Err(ModelError::Unavailable)
    }
}
