use thiserror::Error;

#[derive(Debug, Error)]
pub enum WikiError {
    #[error("Duplicated record id: {id}")]
    DuplicateRecord { id: String },

    #[error("Record {record} has no field `{field}`")]
    MissingField { record: String, field: String },

    #[error("Record {record}: field `{field}` has unexpected value {value} (expected {expected})")]
    MalformedValue {
        record: String,
        field: String,
        value: String,
        expected: &'static str,
    },

    #[error("Response for {what} needs continuation, which is not handled")]
    UnhandledContinuation { what: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, WikiError>;

impl WikiError {
    pub fn missing(record: &str, field: &str) -> Self {
        WikiError::MissingField {
            record: record.to_string(),
            field: field.to_string(),
        }
    }

    pub fn malformed(
        record: &str,
        field: &str,
        value: &serde_json::Value,
        expected: &'static str,
    ) -> Self {
        WikiError::MalformedValue {
            record: record.to_string(),
            field: field.to_string(),
            value: value.to_string(),
            expected,
        }
    }

    /// Check if this error is a "file not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, WikiError::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }
}
