//! Credential handling.

mod credentials;

pub use credentials::LlmCredentials;
pub use secrecy::{ExposeSecret, SecretString};
