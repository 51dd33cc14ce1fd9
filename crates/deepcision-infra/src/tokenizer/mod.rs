//! Tokenizer back-ends and the default registry.
//!
//! | name       | back-end                                        |
//! |------------|-------------------------------------------------|
//! | `o200k`    | tiktoken `o200k_base`                           |
//! | `cl100k`   | tiktoken `cl100k_base`                          |
//! | `deepseek` | HuggingFace `tokenizer.json` from `model_dir`   |

pub mod huggingface;
pub mod tiktoken;

use std::sync::Arc;

use deepcision_core::tokenizer::{Tokenizer, TokenizerOptions, TokenizerService};
use deepcision_types::error::TokenizerError;

pub use huggingface::HfTokenizer;
pub use tiktoken::{Encoding, TiktokenTokenizer};

/// Build the registry with every bundled back-end registered.
pub fn default_service() -> TokenizerService {
    let mut service = TokenizerService::new();
    service.register_tokenizer("o200k", |_: &TokenizerOptions| {
        Ok(Arc::new(TiktokenTokenizer::new(Encoding::O200k)?) as Arc<dyn Tokenizer>)
    });
    service.register_tokenizer("cl100k", |_: &TokenizerOptions| {
        Ok(Arc::new(TiktokenTokenizer::new(Encoding::Cl100k)?) as Arc<dyn Tokenizer>)
    });
    service.register_tokenizer("deepseek", |options: &TokenizerOptions| {
        let dir = options.model_dir.as_deref().ok_or_else(|| {
            TokenizerError::InvalidArgument("the deepseek tokenizer requires a model_dir".into())
        })?;
        Ok(Arc::new(HfTokenizer::from_dir(dir)?) as Arc<dyn Tokenizer>)
    });
    service
}

/// Tokenizer name to use for a provider model id.
pub fn tokenizer_for_model(model: &str) -> &'static str {
    let bare = model.rsplit('/').next().unwrap_or(model);
    if bare.starts_with("deepseek") {
        "deepseek"
    } else if bare.starts_with("gpt-4o") || bare.starts_with("o1") || bare.starts_with("o3") {
        "o200k"
    } else {
        "cl100k"
    }
}
