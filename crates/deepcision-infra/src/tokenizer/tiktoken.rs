//! OpenAI BPE encodings via `tiktoken-rs`.

use tiktoken_rs::CoreBPE;

use deepcision_core::tokenizer::Tokenizer;
use deepcision_types::error::TokenizerError;

/// Which bundled BPE table to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// GPT-4o family.
    O200k,
    /// GPT-4 / GPT-3.5 family.
    Cl100k,
}

impl Encoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Encoding::O200k => "o200k_base",
            Encoding::Cl100k => "cl100k_base",
        }
    }

    fn vocab_size(&self) -> usize {
        match self {
            Encoding::O200k => 200_019,
            Encoding::Cl100k => 100_277,
        }
    }

    fn max_sequence_length(&self) -> usize {
        match self {
            Encoding::O200k => 128_000,
            Encoding::Cl100k => 8_192,
        }
    }
}

/// [`Tokenizer`] over a tiktoken BPE table. Special tokens are encoded as such.
pub struct TiktokenTokenizer {
    bpe: CoreBPE,
    encoding: Encoding,
}

impl TiktokenTokenizer {
    pub fn new(encoding: Encoding) -> Result<Self, TokenizerError> {
        let bpe = match encoding {
            Encoding::O200k => tiktoken_rs::o200k_base(),
            Encoding::Cl100k => tiktoken_rs::cl100k_base(),
        }
        .map_err(|e| TokenizerError::Backend(format!("failed to load {}: {e}", encoding.as_str())))?;
        Ok(Self { bpe, encoding })
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }
}

impl Tokenizer for TiktokenTokenizer {
    fn encode(&self, text: &str) -> Result<Vec<u32>, TokenizerError> {
        self.bpe
            .encode_with_special_tokens(text)
            .into_iter()
            .map(|id| {
                u32::try_from(id).map_err(|_| TokenizerError::Backend(format!("token id {id} out of range")))
            })
            .collect()
    }

    fn decode(&self, ids: &[u32]) -> Result<String, TokenizerError> {
        let ids: Vec<usize> = ids.iter().map(|&id| id as usize).collect();
        self.bpe
            .decode(ids)
            .map_err(|e| TokenizerError::Backend(format!("decode failed: {e}")))
    }

    fn vocab_size(&self) -> usize {
        self.encoding.vocab_size()
    }

    fn max_sequence_length(&self) -> usize {
        self.encoding.max_sequence_length()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode() {
        let tokenizer = TiktokenTokenizer::new(Encoding::Cl100k).unwrap();
        let ids = tokenizer.encode("Hello, world!").unwrap();
        assert!(!ids.is_empty());
        assert_eq!(tokenizer.decode(&ids).unwrap(), "Hello, world!");
        assert_eq!(tokenizer.count_tokens("Hello, world!").unwrap(), ids.len());
    }

    #[test]
    fn test_empty_text() {
        let tokenizer = TiktokenTokenizer::new(Encoding::O200k).unwrap();
        assert!(tokenizer.encode("").unwrap().is_empty());
        assert_eq!(tokenizer.decode(&[]).unwrap(), "");
    }

    #[test]
    fn test_special_token_is_single_id() {
        let tokenizer = TiktokenTokenizer::new(Encoding::Cl100k).unwrap();
        assert_eq!(tokenizer.encode("<|endoftext|>").unwrap().len(), 1);
    }

    #[test]
    fn test_limits() {
        let o200k = TiktokenTokenizer::new(Encoding::O200k).unwrap();
        assert_eq!(o200k.max_sequence_length(), 128_000);
        assert!(o200k.vocab_size() > 200_000);
        assert_eq!(TiktokenTokenizer::new(Encoding::Cl100k).unwrap().max_sequence_length(), 8_192);
    }
}
