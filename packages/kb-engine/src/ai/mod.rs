//! LLM and embedding backends.
//!
//! - [`OpenAiCompat`] - remote OpenAI-compatible API (OpenRouter by default)
//! - [`OfflineLlm`] / [`HashEmbedder`] - deterministic offline stand-ins
//! - [`Throttled`] - per-client pacing wrapper for any LLM

mod offline;
mod openai;
mod throttle;

pub use offline::{HashEmbedder, OfflineLlm};
pub use openai::{
    OpenAiCompat, DEFAULT_CHAT_MODEL, DEFAULT_EMBEDDING_MODEL, OPENROUTER_BASE_URL, REQUEST_TIMEOUT,
};
pub use throttle::{LlmExt, Throttled, DEFAULT_MIN_INTERVAL};
