/*!
 * Mock text generator for testing.
 *
 * This module provides a scripted generator that replays queued replies:
 * - `MockGenerator::scripted(..)` - Returns the queued replies in order
 * - `MockGenerator::failing()` - Always fails with a connection error
 * - `with_fallback(..)` - Computes a reply once the script is exhausted
 *
 * Every call is recorded so tests can assert on the prompts that were sent.
 */

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;

use crate::errors::ProviderError;
use crate::providers::TextGenerator;

/// A queued reply
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Return this text
    Text(String),
    /// Fail with this error
    Error(ProviderError),
    /// Wait, then return the text
    Delayed { delay_ms: u64, text: String },
}

impl MockReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Whole-segment reply in the expected JSON shape
    pub fn translation(target: &str) -> Self {
        Self::Text(json!({ "translation": target }).to_string())
    }

    /// Chunk reply in the expected JSON shape
    pub fn chunks(chunks: &[&str]) -> Self {
        Self::Text(json!({ "chunks": chunks }).to_string())
    }
}

/// A recorded request
#[derive(Debug, Clone, PartialEq)]
pub struct MockCall {
    /// System directive
    pub system: String,
    /// User message
    pub user: String,
}

/// Scripted generator for testing translation behavior
#[derive(Debug, Default)]
pub struct MockGenerator {
    /// Replies returned in order
    replies: Mutex<VecDeque<MockReply>>,
    /// Requests received so far
    calls: Mutex<Vec<MockCall>>,
    /// Request counter
    request_count: AtomicUsize,
    /// Reply generator used once the script is exhausted
    fallback: Option<fn(&MockCall) -> String>,
    /// Error returned for every request
    always_fail: Option<ProviderError>,
}

impl MockGenerator {
    /// Create a generator replaying `replies` in order
    pub fn scripted(replies: Vec<MockReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            ..Self::default()
        }
    }

    /// Create a generator that always fails
    pub fn failing() -> Self {
        Self {
            always_fail: Some(ProviderError::ConnectionError("mock service unavailable".to_string())),
            ..Self::default()
        }
    }

    /// Set a reply generator used when the script runs out
    pub fn with_fallback(mut self, fallback: fn(&MockCall) -> String) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Number of requests received
    pub fn call_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Copies of all recorded requests
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().clone()
    }

    /// Replies not consumed yet
    pub fn remaining(&self) -> usize {
        self.replies.lock().len()
    }
}

#[async_trait]
impl TextGenerator for MockGenerator {
    async fn generate(&self, system: &str, user: &str) -> Result<String, ProviderError> {
        self.request_count.fetch_add(1, Ordering::SeqCst);
        let call = MockCall {
            system: system.to_string(),
            user: user.to_string(),
        };
        self.calls.lock().push(call.clone());

        if let Some(error) = &self.always_fail {
            return Err(error.clone());
        }

        let next = self.replies.lock().pop_front();
        match next {
            Some(MockReply::Text(text)) => Ok(text),
            Some(MockReply::Error(error)) => Err(error),
            Some(MockReply::Delayed { delay_ms, text }) => {
                tokio::time::sleep(std::time::Duration::from_millis(delay_ms)).await;
                Ok(text)
            }
            None => match self.fallback {
                Some(fallback) => Ok(fallback(&call)),
                None => Err(ProviderError::RequestFailed("mock script exhausted".to_string())),
            },
        }
    }
}
