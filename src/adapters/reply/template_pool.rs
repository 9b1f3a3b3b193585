//! Canned stalling replies.
//!
//! The pool doubles as the standalone reply strategy and as the fallback
//! when a remote delegate fails. Selection is uniform over a fixed set of
//! lines; the RNG is injected so tests can pin the sequence.

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

use crate::ports::{InboundMessage, ReplyError, ReplyStrategy};

/// Stalling utterances played back to an engaged scammer.
pub const DEFAULT_STALL_LINES: &[&str] = &[
    "I am trying to pay but it says server error. Do you have another option?",
    "My internet is very slow. Can you send the details again?",
    "I clicked the link but it did not open. Please resend.",
    "I am not good with phones. Can you explain step by step?",
    "Wait, I will ask my son to help me.",
];

/// Uniformly samples one line from a fixed pool.
pub struct TemplatePool {
    lines: Vec<String>,
    rng: Mutex<StdRng>,
}

impl TemplatePool {
    /// Creates a pool with the default lines and an entropy-seeded RNG.
    pub fn new() -> Self {
        Self {
            lines: DEFAULT_STALL_LINES.iter().map(|l| l.to_string()).collect(),
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Creates a pool with a fixed seed, for deterministic tests.
    pub fn seeded(seed: u64) -> Self {
        Self {
            lines: DEFAULT_STALL_LINES.iter().map(|l| l.to_string()).collect(),
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Replaces the line pool. An empty pool is ignored.
    pub fn with_lines(mut self, lines: Vec<String>) -> Self {
        if !lines.is_empty() {
            self.lines = lines;
        }
        self
    }

    /// Picks one line. Infallible by construction: the pool is never empty.
    pub fn pick(&self) -> String {
        let index = {
            let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            rng.gen_range(0..self.lines.len())
        };
        self.lines[index].clone()
    }
}

impl Default for TemplatePool {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TemplatePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplatePool")
            .field("lines", &self.lines.len())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ReplyStrategy for TemplatePool {
    async fn compose(
        &self,
        _current: &InboundMessage,
        _history: &[InboundMessage],
    ) -> Result<String, ReplyError> {
        Ok(self.pick())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message() -> InboundMessage {
        InboundMessage::new("scammer", "pay now", 0)
    }

    #[test]
    fn pick_returns_a_pool_line() {
        let pool = TemplatePool::new();
        let line = pool.pick();
        assert!(DEFAULT_STALL_LINES.contains(&line.as_str()));
    }

    #[test]
    fn seeded_pools_are_deterministic() {
        let a = TemplatePool::seeded(7);
        let b = TemplatePool::seeded(7);
        for _ in 0..20 {
            assert_eq!(a.pick(), b.pick());
        }
    }

    #[test]
    fn custom_lines_replace_the_defaults() {
        let pool = TemplatePool::seeded(1).with_lines(vec!["one moment".to_string()]);
        assert_eq!(pool.pick(), "one moment");
    }

    #[test]
    fn empty_custom_pool_is_ignored() {
        let pool = TemplatePool::seeded(1).with_lines(Vec::new());
        assert!(DEFAULT_STALL_LINES.contains(&pool.pick().as_str()));
    }

    #[test]
    fn all_lines_are_eventually_selected() {
        let pool = TemplatePool::seeded(42);
        let mut seen = std::collections::BTreeSet::new();
        for _ in 0..200 {
            seen.insert(pool.pick());
        }
        assert_eq!(seen.len(), DEFAULT_STALL_LINES.len());
    }

    #[tokio::test]
    async fn compose_never_fails() {
        let pool = TemplatePool::seeded(3);
        let reply = pool.compose(&message(), &[]).await.unwrap();
        assert!(!reply.is_empty());
    }
}
