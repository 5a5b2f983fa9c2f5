//! Stride Engine Library
//!
//! This library provides the core functionality of the Stride running coach:
//! a tool-augmented language-model conversation that inspects local workout
//! history and produces a multi-week training plan.
//! It is used by both the main binary and integration tests.

/// Configuration management module
pub mod config;

/// Database persistence module
pub mod db;

/// LLM provider abstraction layer
pub mod llm;

/// Tool registry and the workout history query tool
pub mod tools;

/// Conversation orchestration module
pub mod agent;

/// Request formatting and the plan service
pub mod plan;

/// Telemetry and observability
pub mod telemetry;

/// CLI interface module
pub mod cli;

/// Command handlers module
pub mod handlers;
