//! Error types and handling
//!
//! This module provides the error types used throughout the Stride engine.
//! All errors implement the `StrideErrorExt` trait which provides
//! user-friendly hints and indicates whether errors are recoverable.
//!
//! Recoverability has a precise meaning here: a recoverable error is one the
//! conversation itself can absorb — it is rendered as tool-result text and
//! handed back to the model, which can adjust (for example, produce a generic
//! plan when the workout history is unavailable). A non-recoverable error
//! aborts the run and is reported to the caller.

use thiserror::Error;

/// Trait for Stride error extensions
///
/// Provides additional context for errors: a user-facing hint that is safe to
/// display (no secrets, no internal paths) and whether the error can be fed
/// back into the conversation rather than aborting the run.
pub trait StrideErrorExt {
    /// Returns a user-friendly hint for the error
    fn user_hint(&self) -> &str;

    /// Returns whether the conversation can recover from the error
    ///
    /// Recoverable errors are surfaced to the model as tool-result content.
    /// Non-recoverable errors abort the run and surface to the caller.
    fn is_recoverable(&self) -> bool;
}

/// Main engine error type
///
/// Each variant includes context-specific information while ensuring no
/// sensitive data (API keys, internal paths) is exposed in error messages.
///
/// # Error Categories
///
/// - **Configuration**: Invalid or missing configuration
/// - **Database**: SQLite operation failures outside the query tool
/// - **Query tool**: rejected or failed history queries (conversation-recoverable)
/// - **Model**: transport failures that outlived the retry budget
/// - **Orchestration**: the round-trip cap was hit
///
/// # Examples
///
/// ```
/// use sdk::errors::{EngineError, StrideErrorExt};
///
/// let error = EngineError::WriteQueryRejected("DROP TABLE workouts".to_string());
/// assert!(error.is_recoverable());
///
/// let fatal = EngineError::RoundTripsExhausted { limit: 10 };
/// assert!(!fatal.is_recoverable());
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Database errors (migrations, seeding — not the query tool)
    #[error("Database error: {0}")]
    Database(String),

    // Query tool errors
    #[error("Only read queries are allowed, got: {0}")]
    WriteQueryRejected(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    // Model transport errors
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    // Orchestration errors
    #[error("Conversation exceeded {limit} tool round-trips")]
    RoundTripsExhausted { limit: usize },

    #[error("Model produced no final answer text")]
    EmptyAnswer,

    // Tool errors
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    // Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StrideErrorExt for EngineError {
    fn user_hint(&self) -> &str {
        match self {
            Self::Config(_) => "Check your config.toml file for errors",
            Self::Database(_) => "Database operation failed. Check the data directory",
            Self::WriteQueryRejected(_) => "Only SELECT queries are allowed",
            Self::QueryFailed(_) => "The history query could not be executed",
            Self::ModelUnavailable(_) => {
                "Model provider unavailable. Check your API key and network"
            }
            Self::RoundTripsExhausted { .. } => {
                "The model kept requesting data instead of answering. Try again"
            }
            Self::EmptyAnswer => "The model returned no plan text. Try again",
            Self::ToolNotFound(_) => "The requested tool is not available",
            Self::Io(_) => "File system operation failed",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            // Fed back into the conversation as tool-result text
            Self::WriteQueryRejected(_) | Self::QueryFailed(_) | Self::ToolNotFound(_) => true,

            // Everything else aborts the run
            _ => false,
        }
    }
}
