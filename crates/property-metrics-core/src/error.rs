use thiserror::Error;

#[derive(Debug, Error)]
pub enum PropertyMetricsError {
    #[error("Invalid input: {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for PropertyMetricsError {
    fn from(e: serde_json::Error) -> Self {
        PropertyMetricsError::SerializationError(e.to_string())
    }
}
