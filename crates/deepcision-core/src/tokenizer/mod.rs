//! Tokenizer abstraction and the name-keyed tokenizer registry.
//!
//! Back-ends wrapping encoding libraries live in deepcision-infra; this
//! module only defines the contract and the lazily-populated registry.

pub mod service;

use std::path::PathBuf;

use deepcision_types::error::TokenizerError;
use deepcision_types::llm::Message;

pub use service::{TokenizerFactory, TokenizerService};

/// Maps text to and from a vendor-specific token sequence.
///
/// `decode(encode(x))` need not equal `x`, but must be deterministic for a
/// given instance and input.
pub trait Tokenizer: Send + Sync {
    fn encode(&self, text: &str) -> Result<Vec<u32>, TokenizerError>;

    fn decode(&self, ids: &[u32]) -> Result<String, TokenizerError>;

    fn count_tokens(&self, text: &str) -> Result<usize, TokenizerError> {
        Ok(self.encode(text)?.len())
    }

    fn vocab_size(&self) -> usize;

    fn max_sequence_length(&self) -> usize;
}

/// Construction options passed to tokenizer factories.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenizerOptions {
    /// Directory holding model-specific tokenizer files.
    pub model_dir: Option<PathBuf>,
}

impl TokenizerOptions {
    pub fn with_model_dir(model_dir: impl Into<PathBuf>) -> Self {
        Self {
            model_dir: Some(model_dir.into()),
        }
    }
}

/// Per-message framing overhead in chat-formatted requests.
pub const TOKENS_PER_MESSAGE: usize = 4;
/// Tokens priming the assistant reply.
pub const REPLY_PRIMING_TOKENS: usize = 2;

/// Estimate the prompt tokens a chat request will consume.
pub fn estimate_message_tokens(
    tokenizer: &dyn Tokenizer,
    messages: &[Message],
) -> Result<usize, TokenizerError> {
    let mut total = REPLY_PRIMING_TOKENS;
    for message in messages {
        total += TOKENS_PER_MESSAGE;
        total += tokenizer.count_tokens(&message.content)?;
    }
    Ok(total)
}

/// Whether `messages` plus `max_tokens` of output fit the tokenizer's context.
pub fn fits_context(
    tokenizer: &dyn Tokenizer,
    messages: &[Message],
    max_tokens: u32,
) -> Result<bool, TokenizerError> {
    let prompt = estimate_message_tokens(tokenizer, messages)?;
    Ok(prompt + max_tokens as usize <= tokenizer.max_sequence_length())
}
