pub mod history;

pub use history::HistoryQueryTool;

use crate::llm::ToolDefinition;
use serde_json::json;
use tracing::{debug, warn};

/// Name the model uses to call the history query tool.
pub const WORKOUT_HISTORY_TOOL: &str = "workout_history";

/// Registry of tools the model may call during a run.
///
/// Holds optional references to each tool; only tools that are `Some` are
/// advertised to the model and available for dispatch. The coach registers
/// exactly one: the read-only workout history query.
pub struct ToolRegistry {
    pub history: Option<HistoryQueryTool>,
}

impl ToolRegistry {
    /// Create an empty registry with no tools enabled.
    pub fn empty() -> Self {
        Self { history: None }
    }

    /// Create a registry with the workout history tool enabled.
    pub fn with_history(history: HistoryQueryTool) -> Self {
        Self {
            history: Some(history),
        }
    }

    /// Dispatch a tool call by name, parsing arguments from JSON.
    ///
    /// Returns the tool output as a string. Errors are returned as
    /// `Ok(error_string)` so the model can see the failure and self-correct
    /// — for example, by producing a generic plan when history is
    /// unavailable.
    pub async fn dispatch(&self, name: &str, arguments_json: &str) -> String {
        debug!("Dispatching tool '{}' with args: {}", name, arguments_json);

        let args: serde_json::Value = match serde_json::from_str(arguments_json) {
            Ok(v) => v,
            Err(e) => {
                return format!("ERROR: Failed to parse arguments JSON: {}", e);
            }
        };

        match name {
            WORKOUT_HISTORY_TOOL => {
                let Some(ref history) = self.history else {
                    return format!("ERROR: {WORKOUT_HISTORY_TOOL} tool is not enabled");
                };
                let query = args
                    .get("query")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default();
                match history.query(query).await {
                    Ok(rows) => {
                        serde_json::to_string(&rows).unwrap_or_else(|e| format!("ERROR: {}", e))
                    }
                    Err(e) => format!("ERROR: {}", e),
                }
            }
            _ => {
                warn!("Unknown tool requested: {}", name);
                format!(
                    "ERROR: Unknown tool '{}'. Available tools: {}",
                    name,
                    self.available_tool_names().join(", ")
                )
            }
        }
    }

    /// Schemas of all enabled tools, sent to the model with each request.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut definitions = Vec::new();

        if self.history.is_some() {
            definitions.push(ToolDefinition {
                name: WORKOUT_HISTORY_TOOL.to_string(),
                description: concat!(
                    "Run a read-only SQL SELECT against the workouts table to inspect the ",
                    "runner's history, e.g. SELECT AVG(average_pace) FROM workouts WHERE ",
                    "type = 'Run' AND start_date >= date('now', '-6 months'). ",
                    "Use SQLite functions. Available columns: ",
                    "activity_id (activity identifier), ",
                    "user_id (runner identifier), ",
                    "name (activity name), ",
                    "distance (kilometers), ",
                    "moving_time (minutes), ",
                    "total_elevation_gain (meters), ",
                    "type (e.g. 'Run'), ",
                    "start_date (ISO date), ",
                    "average_pace (min/km), ",
                    "average_heartrate (bpm), ",
                    "max_heartrate (bpm). ",
                    "Returns rows as JSON arrays; an empty array means no history.",
                )
                .to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "query": {
                            "type": "string",
                            "description": "The SELECT statement to execute"
                        }
                    },
                    "required": ["query"]
                }),
            });
        }

        definitions
    }

    /// Return the names of all currently enabled tools.
    fn available_tool_names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.history.is_some() {
            names.push(WORKOUT_HISTORY_TOOL);
        }
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use tempfile::TempDir;

    async fn registry_with_store() -> (TempDir, ToolRegistry) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let db = Database::new(&db_path).await.unwrap();
        db.close().await.unwrap();

        let registry = ToolRegistry::with_history(HistoryQueryTool::new(&db_path));
        (temp_dir, registry)
    }

    #[tokio::test]
    async fn test_dispatch_runs_select_queries() {
        let (_tmp, registry) = registry_with_store().await;

        let output = registry
            .dispatch(
                WORKOUT_HISTORY_TOOL,
                r#"{"query": "select count(*) from workouts"}"#,
            )
            .await;
        assert_eq!(output, "[[0]]");
    }

    #[tokio::test]
    async fn test_dispatch_surfaces_rejection_as_text() {
        let (_tmp, registry) = registry_with_store().await;

        let output = registry
            .dispatch(
                WORKOUT_HISTORY_TOOL,
                r#"{"query": "DROP TABLE workouts"}"#,
            )
            .await;
        assert!(output.starts_with("ERROR:"));
        assert!(output.contains("read queries"));
    }

    #[tokio::test]
    async fn test_dispatch_unknown_tool() {
        let (_tmp, registry) = registry_with_store().await;

        let output = registry.dispatch("weather", "{}").await;
        assert!(output.contains("Unknown tool"));
        assert!(output.contains(WORKOUT_HISTORY_TOOL));
    }

    #[tokio::test]
    async fn test_dispatch_malformed_arguments() {
        let (_tmp, registry) = registry_with_store().await;

        let output = registry.dispatch(WORKOUT_HISTORY_TOOL, "not json").await;
        assert!(output.starts_with("ERROR:"));
    }

    #[tokio::test]
    async fn test_disabled_tool_reports_as_error_text() {
        let registry = ToolRegistry::empty();

        let output = registry
            .dispatch(WORKOUT_HISTORY_TOOL, r#"{"query": "select 1"}"#)
            .await;
        assert!(output.contains("not enabled"));
        assert!(registry.definitions().is_empty());
    }

    #[test]
    fn test_definitions_describe_the_query_parameter() {
        let registry = ToolRegistry::with_history(HistoryQueryTool::new("unused.db"));
        let definitions = registry.definitions();

        assert_eq!(definitions.len(), 1);
        assert_eq!(definitions[0].name, WORKOUT_HISTORY_TOOL);
        assert!(definitions[0].description.contains("average_pace"));
        assert_eq!(definitions[0].parameters["required"][0], "query");
    }
}
