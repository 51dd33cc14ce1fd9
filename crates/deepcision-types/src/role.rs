//! Role definitions: the persona an agent speaks through.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{RoleError, TemplateError};

/// Name of the only placeholder a prompt template may use.
pub const QUESTION_SLOT: &str = "question";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Question,
}

/// A validated prompt template.
///
/// Uses `{question}` as the only slot; `{{` and `}}` produce literal braces.
/// Parsed once on load so rendering cannot fail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PromptTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl PromptTemplate {
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut has_question = false;
        let mut chars = source.char_indices().peekable();

        while let Some((pos, c)) = chars.next() {
            match c {
                '{' if chars.peek().map(|(_, n)| *n) == Some('{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek().map(|(_, n)| *n) == Some('}') => {
                    chars.next();
                    literal.push('}');
                }
                '{' => {
                    let mut name = String::new();
                    let mut closed = false;
                    for (_, n) in chars.by_ref() {
                        if n == '}' {
                            closed = true;
                            break;
                        }
                        name.push(n);
                    }
                    if !closed {
                        return Err(TemplateError::UnbalancedBrace {
                            brace: '{',
                            position: pos,
                        });
                    }
                    if name.trim() != QUESTION_SLOT {
                        return Err(TemplateError::UnknownPlaceholder(name));
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Question);
                    has_question = true;
                }
                '}' => {
                    return Err(TemplateError::UnbalancedBrace {
                        brace: '}',
                        position: pos,
                    });
                }
                other => literal.push(other),
            }
        }

        if !has_question {
            return Err(TemplateError::MissingQuestion);
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    /// Fill every `{question}` slot with `question`.
    pub fn render(&self, question: &str) -> String {
        let mut out = String::with_capacity(self.source.len() + question.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Question => out.push_str(question),
            }
        }
        out
    }

    /// The template as written.
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl TryFrom<String> for PromptTemplate {
    type Error = TemplateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        PromptTemplate::parse(&value)
    }
}

impl From<PromptTemplate> for String {
    fn from(value: PromptTemplate) -> Self {
        value.source
    }
}

impl fmt::Display for PromptTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// A named persona: system prompt material, prompt template and generation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleConfig {
    /// Filled from the template map key when omitted.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Registry name of the provider this role talks through (e.g. "deepseek").
    pub api_type: String,
    pub prompt_template: PromptTemplate,
    /// Whether several callers may speak through one agent at the same time.
    #[serde(default)]
    pub concurrent: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl RoleConfig {
    /// Check the generation parameters are in range.
    pub fn validate(&self) -> Result<(), RoleError> {
        if let Some(t) = self.temperature
            && !(0.0..=2.0).contains(&t)
        {
            return Err(RoleError::InvalidRole {
                name: self.name.clone(),
                reason: format!("temperature {t} outside [0, 2]"),
            });
        }
        if self.max_tokens == Some(0) {
            return Err(RoleError::InvalidRole {
                name: self.name.clone(),
                reason: "max_tokens must be positive".to_string(),
            });
        }
        if self.name.trim().is_empty() {
            return Err(RoleError::InvalidRole {
                name: self.name.clone(),
                reason: "name must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// The system message content for this role.
    pub fn system_prompt(&self) -> String {
        format!("You are {} {}", self.name, self.description)
    }
}
