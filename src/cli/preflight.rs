//! Pre-flight checks before expensive operations.
//!
//! Validates that required configuration is in place before starting
//! operations that would otherwise fail midway.

use crate::config::Settings;
use crate::error::{Result, SporError};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Building the index requires an API key for embeddings.
    Index,
    /// Asking questions requires an API key for both steps.
    Ask,
    /// Search needs embeddings for the query.
    Search,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Index | Operation::Ask | Operation::Search => {
            check_api_key(settings)?;
        }
    }
    Ok(())
}

/// Check that an OpenAI API key was picked up at startup.
fn check_api_key(settings: &Settings) -> Result<()> {
    if settings.credentials.has_openai_key() {
        Ok(())
    } else {
        Err(SporError::Credentials(
            "OPENAI_API_KEY not set. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        ))
    }
}
