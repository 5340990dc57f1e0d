use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ModelError {
    #[error("no language model is configured")]
    Unavailable,

    #[error("model request failed: {0}")]
    Http(String),

    #[error("model returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("model response could not be decoded: {0}")]
    Decode(String),

    #[error("model returned an empty completion")]
    EmptyCompletion,

    #[error("model call timed out after {0}ms")]
    Timeout(u64),
}
