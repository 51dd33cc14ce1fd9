//! `dcsn tokens`: count tokens with a registered tokenizer.

use anyhow::Result;
use console::style;

use crate::state::AppState;

pub fn count_tokens(state: &AppState, tokenizer_name: &str, text: &str, json: bool) -> Result<()> {
    let tokenizer = state
        .tokenizers
        .get_tokenizer(tokenizer_name, &state.tokenizer_options())?;
    let count = tokenizer.count_tokens(text)?;

    if json {
        let out = serde_json::json!({
            "tokenizer": tokenizer_name,
            "tokens": count,
            "max_sequence_length": tokenizer.max_sequence_length(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!(
            "  {} tokens ({}, context {})",
            style(count).bold(),
            tokenizer_name,
            tokenizer.max_sequence_length()
        );
    }
    Ok(())
}
