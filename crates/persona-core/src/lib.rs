//! Persona Core - Shared types for the persona chat service
//!
//! This crate defines the pieces every other crate builds on:
//! - Common error types, including the tagged upstream failure kinds
//! - The `LlmClient` trait implemented by generation backends
//! - The persona template and prompt composition
//! - Configuration management

pub mod config;
pub mod prompt;

pub use config::{
    AppConfig, ConfigError, LlmConfig, LoggingConfig, PersonaConfig, ServerConfig,
};
pub use prompt::{compose, PersonaTemplate, PLACEHOLDER};

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for persona chat operations
#[derive(Error, Debug)]
pub enum PersonaError {
    #[error("Upstream error ({kind}): {message}")]
    Upstream { kind: UpstreamKind, message: String },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PersonaError {
    /// Build an upstream error of the given kind
    pub fn upstream(kind: UpstreamKind, message: impl Into<String>) -> Self {
        Self::Upstream {
            kind,
            message: message.into(),
        }
    }

    /// Upstream kind, if this error came from the generation service
    pub fn upstream_kind(&self) -> Option<UpstreamKind> {
        match self {
            Self::Upstream { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, PersonaError>;

/// Classification of generation-service failures.
///
/// Only used for operator-facing logs; callers of the HTTP API always see
/// the same generic message regardless of kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamKind {
    /// Connection, DNS, TLS or timeout failure
    Network,
    /// Rejected credentials (401/403)
    Auth,
    /// Quota or rate limit exhausted (429)
    Quota,
    /// Any other non-success HTTP status
    Status,
    /// Response body did not match the expected shape
    Parse,
    /// Well-formed response carrying no text
    Empty,
}

impl UpstreamKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Auth => "auth",
            Self::Quota => "quota",
            Self::Status => "status",
            Self::Parse => "parse",
            Self::Empty => "empty",
        }
    }
}

impl fmt::Display for UpstreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Generation backend
// ============================================================================

/// Trait for text-generation backends
///
/// Implementations must be safe to share across concurrent requests; the
/// server holds a single instance for the whole process.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generate a complete, non-streamed response for the prompt
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Model identifier sent with every request
    fn model(&self) -> &str;
}

// ============================================================================
// Tests
// ============================================================================
