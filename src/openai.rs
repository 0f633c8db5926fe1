//! OpenAI client configuration with sensible defaults.

use crate::config::Credentials;
use crate::error::Result;
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Default timeout for OpenAI API requests (5 minutes).
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Create an OpenAI client from explicit credentials.
///
/// Fails before any request is sent when no API key is configured, so a
/// missing key never turns into a confusing network error later.
pub fn create_client(credentials: &Credentials) -> Result<Client<OpenAIConfig>> {
    create_client_with_timeout(credentials, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
}

/// Create an OpenAI client with a custom timeout.
pub fn create_client_with_timeout(
    credentials: &Credentials,
    timeout: Duration,
) -> Result<Client<OpenAIConfig>> {
    let api_key = credentials.openai_api_key()?;

    let http_client = reqwest::Client::builder().timeout(timeout).build()?;

    Ok(Client::with_config(OpenAIConfig::new().with_api_key(api_key))
        .with_http_client(http_client))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SporError;

    #[test]
    fn test_missing_key_fails_before_any_request() {
        let result = create_client(&Credentials::default());
        assert!(matches!(result, Err(SporError::Credentials(_))));
    }

    #[test]
    fn test_client_builds_with_key() {
        let credentials = Credentials::with_openai_key("sk-test");
        assert!(create_client(&credentials).is_ok());
    }
}
