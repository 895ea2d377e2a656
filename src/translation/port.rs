/*!
 * The translation boundary.
 *
 * The pipeline only ever sees [`TranslationPort`]: one batch of `{id, text}`
 * pairs in, translated pairs out, in any order. [`ProviderTranslator`] adapts
 * an LLM [`Provider`] to that contract by sending the batch as a JSON array
 * and reading a JSON array back.
 */

use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, error};
use serde::{Deserialize, Serialize};

use crate::errors::ProviderError;
use crate::providers::{CompletionRequest, Provider};

/// One cue as seen by the translation boundary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationItem {
    pub id: u32,
    pub text: String,
}

impl TranslationItem {
    pub fn new(id: u32, text: impl Into<String>) -> Self {
        Self { id, text: text.into() }
    }
}

/// Translates one batch of cues
///
/// Implementations may take arbitrarily long and may fail. The caller matches
/// results back by `id`; order and completeness of the response are not assumed.
#[async_trait]
pub trait TranslationPort: Send + Sync {
    async fn translate(&self, items: &[TranslationItem]) -> Result<Vec<TranslationItem>, ProviderError>;

    /// Check that the backend is reachable before a run starts
    async fn test_connection(&self) -> Result<(), ProviderError> {
        Ok(())
    }
}

#[async_trait]
impl<T: TranslationPort + ?Sized> TranslationPort for Box<T> {
    async fn translate(&self, items: &[TranslationItem]) -> Result<Vec<TranslationItem>, ProviderError> {
        (**self).translate(items).await
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        (**self).test_connection().await
    }
}

#[async_trait]
impl<T: TranslationPort + ?Sized> TranslationPort for Arc<T> {
    async fn translate(&self, items: &[TranslationItem]) -> Result<Vec<TranslationItem>, ProviderError> {
        (**self).translate(items).await
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        (**self).test_connection().await
    }
}

/// Translation port backed by an LLM provider
#[derive(Debug)]
pub struct ProviderTranslator<P: Provider> {
    provider: P,
    system_prompt: String,
    temperature: f32,
}

impl<P: Provider> ProviderTranslator<P> {
    /// Create a translator from a prompt template
    ///
    /// `{source_language}` and `{target_language}` in the template are replaced.
    pub fn new(provider: P, template: &str, source_language: &str, target_language: &str) -> Self {
        Self {
            provider,
            system_prompt: render_prompt(template, source_language, target_language),
            temperature: 0.3,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }
}

#[async_trait]
impl<P: Provider> TranslationPort for ProviderTranslator<P> {
    async fn translate(&self, items: &[TranslationItem]) -> Result<Vec<TranslationItem>, ProviderError> {
        let payload = serde_json::to_string(items)
            .map_err(|e| ProviderError::RequestFailed(format!("Failed to encode batch: {}", e)))?;

        let request = CompletionRequest::new(self.system_prompt.clone(), payload).temperature(self.temperature);
        let response = self.provider.complete(request).await.inspect_err(|e| {
            error!("Translation request for {} cue(s) failed: {}", items.len(), e);
        })?;

        let translated = parse_translation_response(&P::extract_text(&response))?;
        debug!("Provider returned {} of {} requested cue(s)", translated.len(), items.len());
        Ok(translated)
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        self.provider.test_connection().await
    }
}

/// Fill the language placeholders of a prompt template
pub fn render_prompt(template: &str, source_language: &str, target_language: &str) -> String {
    template
        .replace("{source_language}", source_language)
        .replace("{target_language}", target_language)
}

/// Parse a provider reply into translated items
///
/// Accepts a bare JSON array, optionally wrapped in a Markdown code fence.
pub fn parse_translation_response(text: &str) -> Result<Vec<TranslationItem>, ProviderError> {
    let body = strip_code_fence(text.trim());
    if body.is_empty() {
        return Err(ProviderError::ParseError("Empty response from provider".to_string()));
    }

    serde_json::from_str::<Vec<TranslationItem>>(body).map_err(|e| {
        let preview: String = body.chars().take(200).collect();
        ProviderError::ParseError(format!("{} (response starts with: {:?})", e, preview))
    })
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop an optional language tag on the opening fence
    let rest = rest.split_once('\n').map_or("", |(_, body)| body);
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}
