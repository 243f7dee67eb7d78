//! Client-side pacing for LLM calls.
//!
//! Wraps any [`Llm`] so that calls are strictly serialized and each one starts
//! no sooner than `min_interval` after the previous one finished. The
//! timestamp belongs to the wrapper, so independently throttled clients never
//! share state.

use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::error::Result;
use crate::traits::llm::{Llm, Prompt};

/// Default floor between the end of one call and the start of the next.
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_secs(1);

/// An LLM wrapper enforcing a minimum inter-call delay.
pub struct Throttled<L: Llm> {
    inner: L,
    min_interval: Duration,
    /// When the previous call finished; the lock also keeps one call in flight
    last_finished: Mutex<Option<Instant>>,
}

impl<L: Llm> Throttled<L> {
    /// Wrap with the default one-second floor.
    pub fn new(inner: L) -> Self {
        Self::with_interval(inner, DEFAULT_MIN_INTERVAL)
    }

    pub fn with_interval(inner: L, min_interval: Duration) -> Self {
        Self {
            inner,
            min_interval,
            last_finished: Mutex::new(None),
        }
    }

    pub fn inner(&self) -> &L {
        &self.inner
    }
}

#[async_trait]
impl<L: Llm> Llm for Throttled<L> {
    async fn generate(&self, prompt: &Prompt) -> Result<String> {
        let mut last_finished = self.last_finished.lock().await;

        if let Some(finished) = *last_finished {
            let elapsed = finished.elapsed();
            if elapsed < self.min_interval {
                let wait = self.min_interval - elapsed;
                debug!(wait_ms = wait.as_millis() as u64, "Throttling LLM call");
                tokio::time::sleep(wait).await;
            }
        }

        let result = self.inner.generate(prompt).await;
        // Failed calls count too
        *last_finished = Some(Instant::now());
        result
    }
}

/// Extension trait for easy throttling.
pub trait LlmExt: Llm + Sized {
    /// Wrap this client with the default pacing.
    fn throttled(self) -> Throttled<Self> {
        Throttled::new(self)
    }

    /// Wrap this client with a custom floor.
    fn throttled_by(self, min_interval: Duration) -> Throttled<Self> {
        Throttled::with_interval(self, min_interval)
    }
}

impl<L: Llm + Sized> LlmExt for L {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockLlm;
    use crate::traits::llm::PromptKind;
    use std::sync::Arc;

    fn prompt() -> Prompt {
        Prompt::new(PromptKind::Answer, "q")
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_call_is_immediate() {
        let llm = MockLlm::new().throttled();
        let start = Instant::now();
        llm.generate(&prompt()).await.unwrap();
        assert!(start.elapsed() < Duration::from_millis(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_back_to_back_calls_wait_for_floor() {
        let llm = MockLlm::new().throttled();
        let start = Instant::now();

        llm.generate(&prompt()).await.unwrap();
        llm.generate(&prompt()).await.unwrap();
        llm.generate(&prompt()).await.unwrap();

        assert!(start.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_elapsed_gap_counts_toward_floor() {
        let llm = MockLlm::new().throttled_by(Duration::from_millis(500));

        llm.generate(&prompt()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(400)).await;

        let before = Instant::now();
        llm.generate(&prompt()).await.unwrap();
        let waited = before.elapsed();

        assert!(waited >= Duration::from_millis(100));
        assert!(waited < Duration::from_millis(200));
    }

    #[tokio::test(start_paused = true)]
    async fn test_independent_clients_do_not_share_state() {
        let a = MockLlm::new().throttled();
        let b = MockLlm::new().throttled();
        let start = Instant::now();

        a.generate(&prompt()).await.unwrap();
        b.generate(&prompt()).await.unwrap();

        assert!(start.elapsed() < Duration::from_millis(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_call_still_paces_next() {
        let llm = MockLlm::new().failing(PromptKind::Answer).throttled();
        let start = Instant::now();

        assert!(llm.generate(&prompt()).await.is_err());
        assert!(llm.generate(&prompt()).await.is_err());

        assert!(start.elapsed() >= Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_are_serialized() {
        let llm = Arc::new(MockLlm::new().throttled());
        let start = Instant::now();

        let (first, second) = (prompt(), prompt());
        let (a, b) = tokio::join!(llm.generate(&first), llm.generate(&second));
        a.unwrap();
        b.unwrap();

        assert!(start.elapsed() >= Duration::from_secs(1));
        assert_eq!(llm.inner().calls().len(), 2);
    }
}
