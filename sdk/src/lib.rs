//! Stride SDK
//!
//! Shared library providing the error taxonomy and request contract types
//! used by the engine and by anything that embeds it.

/// Error types and handling
pub mod errors;

/// Plan request contract types
pub mod types;

// Re-export commonly used types
pub use errors::{EngineError, StrideErrorExt};
pub use types::{Goals, PlanRequest, Preferences, Weekday};
