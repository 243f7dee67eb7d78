use anyhow::{bail, Context, Result};
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use kb_engine::ai::{DEFAULT_CHAT_MODEL, DEFAULT_EMBEDDING_MODEL, DEFAULT_MIN_INTERVAL, OPENROUTER_BASE_URL};
use kb_engine::security::SecretString;

/// CLI configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Run against the offline LLM and hash embedder
    pub use_mock_llm: bool,
    pub api_key: Option<SecretString>,
    pub api_base: String,
    pub llm_model: String,
    pub embedding_model: String,
    pub data_dir: PathBuf,
    pub stackexchange_key: Option<String>,
    pub stackexchange_tag: Option<String>,
    pub llm_min_interval: Duration,
    pub chunk_size: Option<usize>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let use_mock_llm = lookup("USE_MOCK_LLM")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let api_key = lookup("OPENROUTER_API_KEY").filter(|k| !k.trim().is_empty());
        if api_key.is_none() && !use_mock_llm {
            bail!("OPENROUTER_API_KEY must be set (or set USE_MOCK_LLM=true)");
        }

        let llm_min_interval = match lookup("LLM_MIN_INTERVAL_MS") {
            Some(ms) => Duration::from_millis(
                ms.trim()
                    .parse()
                    .context("LLM_MIN_INTERVAL_MS must be a valid number")?,
            ),
            None => DEFAULT_MIN_INTERVAL,
        };

        let chunk_size = match lookup("CHUNK_SIZE") {
            Some(size) => Some(size.trim().parse().context("CHUNK_SIZE must be a valid number")?),
            None => None,
        };

        Ok(Self {
            use_mock_llm,
            api_key: api_key.map(SecretString::from),
            api_base: lookup("OPENROUTER_API_BASE").unwrap_or_else(|| OPENROUTER_BASE_URL.to_string()),
            llm_model: lookup("LLM_MODEL").unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
            embedding_model: lookup("EMBEDDING_MODEL")
                .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
            data_dir: lookup("KB_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data")),
            stackexchange_key: lookup("STACKEXCHANGE_KEY"),
            stackexchange_tag: lookup("STACKEXCHANGE_TAG"),
            llm_min_interval,
            chunk_size,
        })
    }
}
