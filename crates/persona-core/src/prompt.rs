//! Persona template and prompt composition

use crate::config::{ConfigError, PersonaConfig};
use std::path::Path;

/// Placeholder replaced by the user's question
pub const PLACEHOLDER: &str = "{user_question}";

/// Built-in persona text, compiled into the binary
pub const DEFAULT_PERSONA: &str = include_str!("../assets/persona.txt");

/// Fixed instructional text with a single question placeholder.
///
/// The placeholder position is resolved once when the template is built, so
/// composing a prompt is a plain concatenation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonaTemplate {
    text: String,
    slot: usize,
}

impl PersonaTemplate {
    /// Build a template, requiring exactly one placeholder
    pub fn new(text: impl Into<String>) -> Result<Self, ConfigError> {
        let text = text.into();

        let mut matches = text.match_indices(PLACEHOLDER).map(|(i, _)| i);
        let slot = match (matches.next(), matches.next()) {
            (Some(slot), None) => slot,
            (None, _) => {
                return Err(ConfigError::InvalidValue {
                    key: "persona.template".to_string(),
                    value: format!("missing {PLACEHOLDER} placeholder"),
                })
            }
            (Some(_), Some(_)) => {
                return Err(ConfigError::InvalidValue {
                    key: "persona.template".to_string(),
                    value: format!("{PLACEHOLDER} must appear exactly once"),
                })
            }
        };

        Ok(Self { text, slot })
    }

    /// The persona compiled into the binary
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::new(DEFAULT_PERSONA)
    }

    /// Load a template from a text file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::FileReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::new(text)
    }

    /// Resolve the template from configuration, falling back to the built-in persona
    pub fn load(config: &PersonaConfig) -> Result<Self, ConfigError> {
        match &config.template_path {
            Some(path) => Self::from_file(path),
            None => Self::builtin(),
        }
    }

    /// Raw template text, placeholder included
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

/// Substitute the question into the template.
///
/// The question is inserted literally: braces or anything resembling a
/// placeholder inside it are left untouched.
pub fn compose(template: &PersonaTemplate, question: &str) -> String {
    let (head, rest) = template.text.split_at(template.slot);
    let tail = &rest[PLACEHOLDER.len()..];

    let mut prompt = String::with_capacity(head.len() + question.len() + tail.len());
    prompt.push_str(head);
    prompt.push_str(question);
    prompt.push_str(tail);
    prompt
}
