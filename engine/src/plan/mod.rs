//! Plan request formatting and the plan service
//!
//! `format_request` merges the caller's free-text message with rendered
//! preferences and goals clauses into one composite instruction string.
//! `PlanService` is the single inbound operation: it builds a fresh coach
//! agent per request and runs one conversation to produce the plan text.
//!
//! The coach system prompt is configuration, not code: the built-in template
//! ships in `prompts/coach.txt` and can be replaced wholesale via
//! `prompt.path` in the config. The template's `{current_date}` placeholder
//! is filled at the start of each run.

use chrono::Local;
use sdk::errors::EngineError;
use sdk::types::{Goals, PlanRequest, Preferences};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

use crate::agent::CoachAgent;
use crate::config::Config;
use crate::llm::{
    anthropic::AnthropicProvider, openai::OpenAIProvider, LLMProvider, ModelInvoker, RetryPolicy,
    Sampling,
};
use crate::tools::{HistoryQueryTool, ToolRegistry};

/// Built-in coach prompt template.
const DEFAULT_PROMPT: &str = include_str!("../../prompts/coach.txt");

/// Marker rendered when no preferences record was supplied.
const NO_PREFERENCES: &str = "No specific preferences provided.";

/// Marker rendered when no goals record was supplied.
const NO_GOALS: &str = "No specific goals provided.";

/// Marker rendered for absent optional sub-fields.
const NOT_PROVIDED: &str = "not provided";

/// Merge a plan request into one composite instruction string.
///
/// Absent sections and sub-fields render as explicit "not provided" phrases
/// instead of being omitted, so the model is never silently missing context.
/// Pure function: no side effects, no failure modes.
pub fn format_request(request: &PlanRequest) -> String {
    let preferences = request
        .preferences
        .as_ref()
        .map_or_else(|| NO_PREFERENCES.to_string(), render_preferences);
    let goals = request
        .goals
        .as_ref()
        .map_or_else(|| NO_GOALS.to_string(), render_goals);

    format!(
        "{} with the following preferences: {} and with the following goals: {}",
        request.message, preferences, goals
    )
}

fn render_preferences(preferences: &Preferences) -> String {
    let long_run_day = preferences
        .preferred_long_run_day
        .map_or(NOT_PROVIDED, |day| day.as_str());

    let available_days = if preferences.available_days.is_empty() {
        NOT_PROVIDED.to_string()
    } else {
        preferences
            .available_days
            .iter()
            .map(|day| day.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    };

    format!(
        "Preferred Long Run Day: {}, Strength Training: {}, Available Days: {}.",
        long_run_day,
        if preferences.strength_training {
            "Yes"
        } else {
            "No"
        },
        available_days
    )
}

fn render_goals(goals: &Goals) -> String {
    let target = goals
        .target_distance_km
        .map_or_else(|| NOT_PROVIDED.to_string(), |km| km.to_string());
    let goal_time = goals.goal_time.as_deref().unwrap_or(NOT_PROVIDED);
    let notes = goals.notes.as_deref().unwrap_or(NOT_PROVIDED);
    let goal_date = goals
        .goal_date
        .map_or_else(|| NOT_PROVIDED.to_string(), |date| date.to_string());

    format!(
        "Target Distance in Km: {}, Goal Time hh:mm:ss: {}, User Notes: {}, Goal Date: {}.",
        target, goal_time, notes, goal_date
    )
}

/// The plan generation service.
///
/// Holds configuration and the prompt template; everything with per-run
/// state (conversation, agent, provider client) is built fresh inside
/// [`PlanService::generate_plan`], so concurrent requests cannot share
/// conversation memory.
#[derive(Debug)]
pub struct PlanService {
    config: Config,
    db_path: PathBuf,
    prompt_template: String,
}

impl PlanService {
    /// Create a service from configuration.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Config` if a configured prompt override cannot
    /// be read.
    pub fn new(config: Config) -> Result<Self, EngineError> {
        let prompt_template = match &config.prompt.path {
            Some(path) => fs::read_to_string(path).map_err(|e| {
                EngineError::Config(format!(
                    "Failed to read prompt template {}: {e}",
                    path.display()
                ))
            })?,
            None => DEFAULT_PROMPT.to_string(),
        };

        let db_path = config.db_path();
        Ok(Self {
            config,
            db_path,
            prompt_template,
        })
    }

    /// Use a specific workout store path instead of the configured one.
    pub fn with_db_path(mut self, db_path: impl Into<PathBuf>) -> Self {
        self.db_path = db_path.into();
        self
    }

    /// Generate a training plan for the given request.
    ///
    /// Runs one full conversation: composite request in, plan text out.
    ///
    /// # Errors
    ///
    /// Propagates `EngineError::ModelUnavailable` and
    /// `EngineError::RoundTripsExhausted` from the run; tool-level failures
    /// never surface here, they are absorbed by the conversation.
    pub async fn generate_plan(&self, request: &PlanRequest) -> Result<String, EngineError> {
        let composite = format_request(request);
        debug!(request = %composite, "formatted plan request");

        let agent = self.build_agent()?;
        let run = agent.run(&composite).await?;

        Ok(run.answer)
    }

    fn build_agent(&self) -> Result<CoachAgent, EngineError> {
        let invoker = ModelInvoker::new(
            self.build_provider()?,
            Duration::from_secs(self.config.llm.request_timeout_secs),
            RetryPolicy::with_retries(self.config.llm.max_retries),
        );
        let tools = ToolRegistry::with_history(HistoryQueryTool::new(&self.db_path));

        Ok(CoachAgent::new(
            invoker,
            tools,
            self.rendered_prompt(),
            self.config.agent.max_round_trips,
        ))
    }

    fn build_provider(&self) -> Result<Box<dyn LLMProvider>, EngineError> {
        let sampling = Sampling {
            max_tokens: self.config.llm.max_tokens,
            temperature: self.config.llm.temperature,
        };

        match self.config.llm.default_provider.as_str() {
            "anthropic" => Ok(Box::new(AnthropicProvider::new(
                self.config.llm.anthropic.clone(),
                sampling,
            ))),
            "openai" => Ok(Box::new(OpenAIProvider::new(
                self.config.llm.openai.clone(),
                sampling,
            ))),
            other => Err(EngineError::Config(format!("Unknown provider '{other}'"))),
        }
    }

    /// The prompt template with today's date substituted in.
    fn rendered_prompt(&self) -> String {
        let today = Local::now().format("%A, %B %d, %Y").to_string();
        self.prompt_template.replace("{current_date}", &today)
    }
}
