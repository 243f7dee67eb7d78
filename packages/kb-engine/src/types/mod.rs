//! Data types shared across the engine.

pub mod chunk;
pub mod config;
pub mod context;
pub mod faq;
pub mod summary;
