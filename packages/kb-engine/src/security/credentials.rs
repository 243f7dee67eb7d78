//! Credential handling with secure memory.
//!
//! Keys are held in `secrecy::SecretString` so they never end up in logs,
//! debug output or error messages.

use secrecy::SecretString;
use std::fmt;

use crate::error::{EngineError, Result};

/// Connection settings for an OpenAI-compatible backend.
#[derive(Clone)]
pub struct LlmCredentials {
    pub api_key: SecretString,

    /// Chat model identifier
    pub model: String,

    /// API base URL, e.g. `https://openrouter.ai/api/v1`
    pub base_url: String,
}

impl LlmCredentials {
    /// Build credentials, rejecting a blank key.
    ///
    /// A missing credential is a configuration error, fatal at startup.
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(EngineError::Config("API key is empty".into()));
        }

        Ok(Self {
            api_key: SecretString::from(api_key),
            model: model.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

impl fmt::Debug for LlmCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmCredentials")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_secret_not_in_debug() {
        let secret = SecretString::from("sk-or-super-secret");
        assert!(!format!("{:?}", secret).contains("sk-or"));
        assert_eq!(secret.expose_secret(), "sk-or-super-secret");
    }

    #[test]
    fn test_credentials_debug_hides_key() {
        let creds =
            LlmCredentials::new("sk-or-secret", "arcee-ai/trinity-mini:free", "https://openrouter.ai/api/v1/")
                .unwrap();
        let debug = format!("{:?}", creds);
        assert!(!debug.contains("sk-or-secret"));
        assert!(debug.contains("trinity-mini"));
        assert_eq!(creds.base_url, "https://openrouter.ai/api/v1");
    }

    #[test]
    fn test_blank_key_is_config_error() {
        let err = LlmCredentials::new("  ", "model", "https://example.com").unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }
}
