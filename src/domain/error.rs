use crate::domain::model::FieldError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReviewError {
    #[error("Invalid argument `{name}`: {message}")]
    InvalidArgument { name: &'static str, message: String },

    #[error("A resource for ID: {0} does not exist.")]
    NotFound(i64),

    #[error("Validation failed: {}", format_field_errors(.0))]
    ValidationFailed(Vec<FieldError>),

    #[error("Database error: {0}")]
    Database(#[from] tokio_rusqlite::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ReviewError {
    pub fn invalid_argument(name: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            name,
            message: message.into(),
        }
    }

    /// Rejects ids below 1 before any lookup happens.
    pub fn check_id(name: &'static str, id: i64) -> Result<(), Self> {
        if id < 1 {
            return Err(Self::invalid_argument(name, "IDs cannot be less than 1."));
        }
        Ok(())
    }
}

fn format_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}
