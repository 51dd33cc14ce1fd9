//! HuggingFace `tokenizer.json` back-end, used for DeepSeek models.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use deepcision_core::tokenizer::Tokenizer;
use deepcision_types::error::TokenizerError;

pub const TOKENIZER_FILE: &str = "tokenizer.json";
pub const TOKENIZER_CONFIG_FILE: &str = "tokenizer_config.json";

/// Context length used when the model files do not declare one.
pub const DEFAULT_MAX_LENGTH: usize = 131_072;

#[derive(Debug, Default, Deserialize)]
struct TokenizerConfigFile {
    model_max_length: Option<f64>,
}

/// [`Tokenizer`] loaded from a model directory.
///
/// `model_max_length` is read from `tokenizer_config.json` when present,
/// then from the tokenizer's truncation settings.
pub struct HfTokenizer {
    inner: tokenizers::Tokenizer,
    max_length: usize,
    model_dir: PathBuf,
}

impl HfTokenizer {
    pub fn from_dir(model_dir: impl AsRef<Path>) -> Result<Self, TokenizerError> {
        let model_dir = model_dir.as_ref();
        let file = model_dir.join(TOKENIZER_FILE);
        if !file.is_file() {
            return Err(TokenizerError::InvalidArgument(format!(
                "{} not found in {}",
                TOKENIZER_FILE,
                model_dir.display()
            )));
        }

        let inner = tokenizers::Tokenizer::from_file(&file)
            .map_err(|e| TokenizerError::Backend(format!("failed to load {}: {e}", file.display())))?;

        let max_length = read_model_max_length(model_dir)?
            .or_else(|| inner.get_truncation().map(|t| t.max_length))
            .unwrap_or(DEFAULT_MAX_LENGTH);

        tracing::debug!(dir = %model_dir.display(), max_length, "loaded HuggingFace tokenizer");
        Ok(Self {
            inner,
            max_length,
            model_dir: model_dir.to_path_buf(),
        })
    }

    pub fn model_dir(&self) -> &Path {
        &self.model_dir
    }
}

fn read_model_max_length(model_dir: &Path) -> Result<Option<usize>, TokenizerError> {
    let path = model_dir.join(TOKENIZER_CONFIG_FILE);
    let Ok(content) = std::fs::read_to_string(&path) else {
        return Ok(None);
    };
    let config: TokenizerConfigFile = serde_json::from_str(&content)
        .map_err(|e| TokenizerError::Backend(format!("malformed {}: {e}", path.display())))?;
    // Unbounded models report a huge sentinel (1e30); treat it as unset.
    Ok(config
        .model_max_length
        .filter(|n| n.is_finite() && *n >= 1.0 && *n <= u32::MAX as f64)
        .map(|n| n as usize))
}

impl Tokenizer for HfTokenizer {
    fn encode(&self, text: &str) -> Result<Vec<u32>, TokenizerError> {
        let encoding = self
            .inner
            .encode(text, true)
            .map_err(|e| TokenizerError::Backend(format!("encode failed: {e}")))?;
        Ok(encoding.get_ids().to_vec())
    }

    fn decode(&self, ids: &[u32]) -> Result<String, TokenizerError> {
        self.inner
            .decode(ids, true)
            .map_err(|e| TokenizerError::Backend(format!("decode failed: {e}")))
    }

    fn vocab_size(&self) -> usize {
        self.inner.get_vocab_size(true)
    }

    fn max_sequence_length(&self) -> usize {
        self.max_length
    }
}
