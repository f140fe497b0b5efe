//! Prompt token estimation
//!
//! Uses tiktoken-rs with the `cl100k_base` encoding. The backend routes to
//! many providers with different tokenizers, so counts are estimates used for
//! cost previews only.

use std::sync::Arc;

use anyhow::Result;
use tiktoken_rs::{cl100k_base, CoreBPE};

/// <|start|>{role}\n{content}<|end|>\n
const TOKENS_PER_MESSAGE: usize = 3;
/// Every reply is primed with <|start|>assistant<|message|>
const REPLY_PRIMING_TOKENS: usize = 3;

/// Cheap-to-clone token estimator sharing one encoder
#[derive(Clone)]
pub struct TokenEstimator {
    encoder: Arc<CoreBPE>,
}

impl TokenEstimator {
    pub fn new() -> Result<Self> {
        Ok(Self {
            encoder: Arc::new(cl100k_base()?),
        })
    }

    /// Count tokens in a text string
    pub fn count(&self, text: &str) -> usize {
        self.encoder.encode_with_special_tokens(text).len()
    }

    /// Estimate prompt tokens for a user prompt and any system prompts.
    ///
    /// Each text is counted as one chat message with its per-message
    /// overhead, plus the reply priming.
    pub fn estimate_prompt<'a>(
        &self,
        prompt: &str,
        system_prompts: impl IntoIterator<Item = &'a str>,
    ) -> u64 {
        let system: usize = system_prompts
            .into_iter()
            .map(|text| TOKENS_PER_MESSAGE + self.count(text))
            .sum();
        let user = TOKENS_PER_MESSAGE + self.count(prompt);

        (system + user + REPLY_PRIMING_TOKENS) as u64
    }
}
