use thiserror::Error;

#[derive(Debug, Error)]
pub enum AiError {
    #[error("model invocation failed: {0}")]
    Invocation(String),

    #[error("response parsing failed: {0}")]
    ResponseParse(String),

    #[error("response did not conform to expected schema: {0}")]
    SchemaViolation(String),

    #[error("nothing to summarise: {0}")]
    EmptyInput(&'static str),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
