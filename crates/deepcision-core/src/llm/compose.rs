//! Role-to-prompt composition.

use deepcision_types::llm::{ChatOverrides, ChatRequest, Message};
use deepcision_types::role::RoleConfig;

/// The two-message exchange for `prompt` spoken through `role`.
///
/// System message: `"You are {name} {description}"`. User message: the role's
/// prompt template with `prompt` in the `question` slot.
pub fn compose_role_messages(role: &RoleConfig, prompt: &str) -> Vec<Message> {
    vec![
        Message::system(role.system_prompt()),
        Message::user(role.prompt_template.render(prompt)),
    ]
}

/// Build a chat request for `role`.
///
/// Per-call overrides win over the role's parameters; anything left unset is
/// filled by the provider's defaults.
pub fn compose_role_request(role: &RoleConfig, prompt: &str, overrides: &ChatOverrides) -> ChatRequest {
    ChatRequest {
        messages: compose_role_messages(role, prompt),
        model: overrides.model.clone(),
        temperature: overrides.temperature.or(role.temperature),
        max_tokens: overrides.max_tokens.or(role.max_tokens),
        ..Default::default()
    }
}
