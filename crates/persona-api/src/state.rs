//! Application state management

use persona_core::{AppConfig, LlmClient, PersonaTemplate, Result};
use std::sync::Arc;

/// Application state shared across handlers
///
/// Everything here is read-only after startup.
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,
    /// Persona the question is embedded into
    pub template: PersonaTemplate,
    /// Generation service client
    pub llm: Arc<dyn LlmClient>,
}

impl AppState {
    /// Create state from already-built parts
    pub fn new(config: AppConfig, template: PersonaTemplate, llm: Arc<dyn LlmClient>) -> Self {
        Self {
            config,
            template,
            llm,
        }
    }

    /// Build state from configuration: require the API key, load the
    /// persona and construct the Gemini client.
    pub fn from_config(config: AppConfig) -> Result<Self> {
        config.validate()?;

        let template = PersonaTemplate::load(&config.persona)?;
        let llm: Arc<dyn LlmClient> = Arc::from(persona_llm::create_llm_client(&config.llm)?);

        Ok(Self::new(config, template, llm))
    }
}
