/*!
 * Mock provider implementations for testing.
 *
 * This module provides a mock provider that simulates different behaviors:
 * - `MockProvider::working()` - Always succeeds with translated text
 * - `MockProvider::partial()` - Drops the last requested cue from every reply
 * - `MockProvider::failing()` - Always fails with an error
 *
 * The provider expects the user content to be the JSON batch produced by
 * `ProviderTranslator` and answers with a JSON array of `{id, text}`.
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::seq::SliceRandom;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::errors::ProviderError;
use crate::providers::{CompletionRequest, Provider};
use crate::translation::TranslationItem;

/// Mock response for testing
#[derive(Debug, Clone)]
pub struct MockResponse {
    /// The raw reply text
    pub text: String,
}

/// Behavior mode for the mock provider
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Translates every cue, in request order
    Working,
    /// Translates every cue, in reverse order
    Reversed,
    /// Translates every cue, in random order
    Shuffled,
    /// Omits the last cue of every batch
    Partial,
    /// Wraps the reply in a Markdown code fence
    Fenced,
    /// Returns text that is not JSON
    Malformed,
    /// Fails intermittently (every Nth request)
    Intermittent { fail_every: usize },
    /// Always fails with an error
    Failing,
    /// Simulates slow response
    Slow { delay_ms: u64 },
}

/// Mock provider for testing translation behavior
#[derive(Debug, Clone)]
pub struct MockProvider {
    /// Behavior mode
    behavior: MockBehavior,
    /// Request counter for intermittent failures
    request_count: Arc<AtomicUsize>,
    /// Every request received, shared between clones
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl MockProvider {
    /// Create a new mock provider with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    pub fn reversed() -> Self {
        Self::new(MockBehavior::Reversed)
    }

    pub fn shuffled() -> Self {
        Self::new(MockBehavior::Shuffled)
    }

    pub fn partial() -> Self {
        Self::new(MockBehavior::Partial)
    }

    pub fn fenced() -> Self {
        Self::new(MockBehavior::Fenced)
    }

    pub fn malformed() -> Self {
        Self::new(MockBehavior::Malformed)
    }

    /// Create an intermittently failing mock provider
    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every })
    }

    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    pub fn slow(delay_ms: u64) -> Self {
        Self::new(MockBehavior::Slow { delay_ms })
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().clone()
    }

    /// Number of requests received so far
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    fn translate_items(request: &CompletionRequest) -> Result<Vec<TranslationItem>, ProviderError> {
        let items: Vec<TranslationItem> = serde_json::from_str(&request.user)
            .map_err(|e| ProviderError::RequestFailed(format!("Mock expects a JSON batch: {}", e)))?;
        Ok(items
            .into_iter()
            .map(|item| TranslationItem::new(item.id, format!("[TRANSLATED] {}", item.text)))
            .collect())
    }

    fn encode(items: &[TranslationItem]) -> Result<String, ProviderError> {
        serde_json::to_string(items).map_err(|e| ProviderError::ParseError(e.to_string()))
    }
}

#[async_trait]
impl Provider for MockProvider {
    type Response = MockResponse;

    async fn complete(&self, request: CompletionRequest) -> Result<Self::Response, ProviderError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(request.clone());

        let text = match self.behavior {
            MockBehavior::Working => Self::encode(&Self::translate_items(&request)?)?,

            MockBehavior::Reversed => {
                let mut items = Self::translate_items(&request)?;
                items.reverse();
                Self::encode(&items)?
            }

            MockBehavior::Shuffled => {
                let mut items = Self::translate_items(&request)?;
                items.shuffle(&mut rand::rng());
                Self::encode(&items)?
            }

            MockBehavior::Partial => {
                let mut items = Self::translate_items(&request)?;
                items.pop();
                Self::encode(&items)?
            }

            MockBehavior::Fenced => format!("```json\n{}\n```", Self::encode(&Self::translate_items(&request)?)?),

            MockBehavior::Malformed => "Sorry, I cannot translate that.".to_string(),

            MockBehavior::Intermittent { fail_every } => {
                if fail_every > 0 && count % fail_every == fail_every - 1 {
                    return Err(ProviderError::ApiError {
                        message: format!("Simulated intermittent failure (request #{})", count + 1),
                        status_code: 503,
                    });
                }
                Self::encode(&Self::translate_items(&request)?)?
            }

            MockBehavior::Failing => {
                return Err(ProviderError::ApiError {
                    message: "Simulated provider failure".to_string(),
                    status_code: 500,
                });
            }

            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(tokio::time::Duration::from_millis(delay_ms)).await;
                Self::encode(&Self::translate_items(&request)?)?
            }
        };

        Ok(MockResponse { text })
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        match self.behavior {
            MockBehavior::Failing => Err(ProviderError::ConnectionError("Simulated connection failure".to_string())),
            _ => Ok(()),
        }
    }

    fn extract_text(response: &Self::Response) -> String {
        response.text.clone()
    }
}
