//! Coach agent core
//!
//! This module implements the conversation loop that produces a training
//! plan. Each run alternates between two steps:
//!
//! 1. Invoke the model with the full history; append its turn.
//! 2. If the turn requests tools, execute every requested call in order,
//!    append one tool result per call, and go back to 1. Otherwise the turn
//!    is the final answer and the run ends.
//!
//! Tool failures are not fatal: they are appended as tool-result text so the
//! model can adapt (e.g. produce a generic plan when history is
//! unavailable). The loop is bounded by a round-trip cap; the system prompt
//! is expected to keep tool use to a call or two, and the cap is the
//! backstop when it doesn't.

use sdk::errors::EngineError;
use tracing::{debug, info};

use crate::llm::{Message, ModelInvoker};
use crate::tools::ToolRegistry;

use super::Conversation;

/// Result of one completed run.
#[derive(Debug)]
pub struct CompletedRun {
    /// The final plan text
    pub answer: String,

    /// Number of tool round-trips the run took
    pub round_trips: usize,

    /// The full conversation, for inspection and logging
    pub conversation: Conversation,
}

/// The conversation orchestrator.
///
/// One `CoachAgent` can serve many runs, but every run gets its own
/// `Conversation` created inside [`CoachAgent::run`] — concurrent runs never
/// share or interleave message history.
pub struct CoachAgent {
    /// Model access with timeout and retry handling
    invoker: ModelInvoker,

    /// The tools the model may call
    tools: ToolRegistry,

    /// Rendered system prompt for this agent
    system_prompt: String,

    /// Maximum number of ASSISTANT→TOOLS→ASSISTANT cycles per run
    max_round_trips: usize,
}

impl CoachAgent {
    /// Create a new coach agent.
    pub fn new(
        invoker: ModelInvoker,
        tools: ToolRegistry,
        system_prompt: impl Into<String>,
        max_round_trips: usize,
    ) -> Self {
        Self {
            invoker,
            tools,
            system_prompt: system_prompt.into(),
            max_round_trips,
        }
    }

    /// Run one complete conversation for the given composite request.
    ///
    /// # Errors
    ///
    /// - `EngineError::ModelUnavailable` if the model transport exhausted
    ///   its retries.
    /// - `EngineError::RoundTripsExhausted` if the model kept requesting
    ///   tools past the cap.
    /// - `EngineError::EmptyAnswer` if the run ended without any assistant
    ///   text.
    pub async fn run(&self, user_message: &str) -> Result<CompletedRun, EngineError> {
        let mut conversation = Conversation::new(&self.system_prompt);
        conversation.push(Message::user(user_message));

        info!(
            run_id = %conversation.id(),
            provider = self.invoker.provider_name(),
            "starting plan run"
        );

        let definitions = self.tools.definitions();
        let mut round_trips = 0;

        loop {
            let turn = self
                .invoker
                .complete(conversation.messages(), &definitions)
                .await?;
            conversation.push(Message::assistant_turn(&turn));

            if turn.is_final() {
                break;
            }

            round_trips += 1;
            if round_trips > self.max_round_trips {
                return Err(EngineError::RoundTripsExhausted {
                    limit: self.max_round_trips,
                });
            }

            debug!(
                run_id = %conversation.id(),
                round_trip = round_trips,
                calls = turn.tool_calls.len(),
                "executing requested tools"
            );

            // Every requested call gets exactly one result, in request order,
            // before the model is invoked again
            for call in &turn.tool_calls {
                let output = self.tools.dispatch(&call.name, &call.arguments).await;
                conversation.push(Message::tool_result(output, &call.id));
            }
        }

        let answer = conversation
            .final_answer()
            .ok_or(EngineError::EmptyAnswer)?
            .to_string();

        info!(
            run_id = %conversation.id(),
            round_trips,
            answer_len = answer.len(),
            "plan run complete"
        );

        Ok(CompletedRun {
            answer,
            round_trips,
            conversation,
        })
    }
}
