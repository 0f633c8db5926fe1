//! Error types for Spor.

use thiserror::Error;

/// Library-level error type for Spor operations.
#[derive(Error, Debug)]
pub enum SporError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing credentials: {0}")]
    Credentials(String),

    #[error("Transcript error: {0}")]
    Transcript(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Index error: {0}")]
    Index(String),

    #[error("Answer generation failed: {0}")]
    Answer(String),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl SporError {
    /// Map an error to a short message suitable for showing to the user.
    ///
    /// Each failure class gets its own wording so a crash trace is never the
    /// user-facing surface.
    pub fn user_message(&self) -> String {
        match self {
            SporError::Credentials(_) => {
                "No API key configured. Set OPENAI_API_KEY and try again.".to_string()
            }
            SporError::Config(msg) | SporError::InvalidInput(msg) => {
                format!("Configuration problem: {}", msg)
            }
            SporError::Transcript(msg) => format!("Could not load the transcript: {}", msg),
            SporError::Embedding(msg) => format!("Embedding the text failed: {}", msg),
            SporError::Index(msg) => {
                format!("The transcript index could not be read or written: {}", msg)
            }
            SporError::Database(e) => {
                format!("The transcript index could not be read or written: {}", e)
            }
            SporError::Answer(msg) | SporError::OpenAI(msg) => {
                format!("The language model request failed: {}", msg)
            }
            SporError::Http(e) => format!("A network request failed: {}", e),
            other => other.to_string(),
        }
    }
}

/// Result type alias for Spor operations.
pub type Result<T> = std::result::Result<T, SporError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages_are_distinct_per_class() {
        let messages = [
            SporError::Credentials("OPENAI_API_KEY not set".to_string()).user_message(),
            SporError::Embedding("timeout".to_string()).user_message(),
            SporError::Index("corrupt manifest".to_string()).user_message(),
            SporError::OpenAI("rate limited".to_string()).user_message(),
        ];
        for (i, a) in messages.iter().enumerate() {
            for b in messages.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_credentials_message_names_the_env_var() {
        let err = SporError::Credentials("missing".to_string());
        assert!(err.user_message().contains("OPENAI_API_KEY"));
    }
}
