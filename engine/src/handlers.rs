//! Command handlers
//!
//! One handler per CLI command. Handlers wire configuration, the workout
//! store, and the plan service together; all conversation logic lives in the
//! agent module.

use anyhow::{Context, Result};
use chrono::{Duration, Local};
use sdk::types::{Goals, PlanRequest, Preferences, Weekday};

use crate::config::Config;
use crate::db::{Database, Workout};
use crate::llm::{anthropic::AnthropicProvider, openai::OpenAIProvider, LLMProvider, Sampling};
use crate::plan::PlanService;

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Assemble a `PlanRequest` from CLI arguments.
///
/// Preferences and goals records are only attached when at least one of
/// their fields was supplied, so the formatter's "not provided" fallbacks
/// stay observable from the command line.
#[allow(clippy::too_many_arguments)]
pub fn plan_request_from_args(
    message: String,
    distance_km: Option<f64>,
    goal_time: Option<String>,
    goal_date: Option<String>,
    notes: Option<String>,
    days: Vec<String>,
    long_run_day: Option<String>,
    strength: bool,
) -> Result<PlanRequest> {
    let mut request = PlanRequest::new(message);

    if !days.is_empty() || long_run_day.is_some() || strength {
        let available_days = days
            .iter()
            .map(|day| day.parse::<Weekday>().map_err(anyhow::Error::msg))
            .collect::<Result<Vec<_>>>()?;
        let preferred_long_run_day = long_run_day
            .map(|day| day.parse::<Weekday>().map_err(anyhow::Error::msg))
            .transpose()?;

        request = request.with_preferences(Preferences {
            available_days,
            strength_training: strength,
            preferred_long_run_day,
        });
    }

    if distance_km.is_some() || goal_time.is_some() || goal_date.is_some() || notes.is_some() {
        let goal_date = goal_date
            .map(|raw| {
                chrono::NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
                    .with_context(|| format!("Invalid goal date '{raw}', expected YYYY-MM-DD"))
            })
            .transpose()?;

        request = request.with_goals(Goals {
            target_distance_km: distance_km,
            goal_time,
            goal_date,
            notes,
        });
    }

    Ok(request)
}

/// Generate a training plan and print it.
pub async fn handle_plan(
    request: PlanRequest,
    config: &Config,
    format: OutputFormat,
) -> Result<()> {
    // Ensure the store exists with its schema before the agent queries it
    let database = Database::new(&config.db_path())
        .await
        .context("Failed to open workout store")?;
    database.close().await?;

    let service = PlanService::new(config.clone())?;
    let plan = service.generate_plan(&request).await?;

    match format {
        OutputFormat::Text => println!("{plan}"),
        OutputFormat::Json => println!("{}", serde_json::json!({ "plan": plan })),
    }

    Ok(())
}

/// Seed the workout store with synthetic run history.
///
/// Generates a deterministic mix of easy runs, tempo work, and long runs
/// spread over the last six months, so a freshly installed engine has
/// history for the coach to query.
pub async fn handle_seed(count: usize, config: &Config) -> Result<()> {
    let database = Database::new(&config.db_path())
        .await
        .context("Failed to open workout store")?;
    let repo = database.workouts();

    let today = Local::now().date_naive();
    for i in 0..count {
        let days_ago = (i * 180 / count.max(1)) as i64;
        let start_date = today - Duration::days(days_ago);

        let (name, distance) = match i % 3 {
            0 => ("Easy Run", 5.0 + (i % 4) as f64),
            1 => ("Tempo Run", 7.0 + (i % 5) as f64),
            _ => ("Long Run", 12.0 + ((i / 3) % 6) as f64 * 2.0),
        };
        let average_pace = 6.8 - ((i % 9) as f64) * 0.05;

        repo.insert(&Workout {
            id: None,
            activity_id: format!("seed-{i}"),
            user_id: "local".to_string(),
            name: name.to_string(),
            distance,
            moving_time: distance * average_pace,
            total_elevation_gain: 10.0 + (i % 12) as f64 * 8.0,
            activity_type: "Run".to_string(),
            start_date,
            average_pace,
            average_heartrate: Some(142.0 + (i % 20) as f64),
            max_heartrate: Some(168.0 + (i % 15) as f64),
        })
        .await?;
    }

    let total = repo.count().await?;
    println!(
        "Seeded {count} workouts ({total} total) into {}",
        config.db_path().display()
    );

    database.close().await?;
    Ok(())
}

/// Show stored workouts.
pub async fn handle_history(limit: i64, config: &Config, format: OutputFormat) -> Result<()> {
    let database = Database::new(&config.db_path())
        .await
        .context("Failed to open workout store")?;
    let workouts = database.workouts().list_recent(limit).await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&workouts)?),
        OutputFormat::Text => {
            if workouts.is_empty() {
                println!("No workouts stored. Run 'stride seed' to generate history.");
            }
            for workout in &workouts {
                println!(
                    "{}  {:<12} {:>5.1} km  {:>5.2} min/km  {}",
                    workout.start_date,
                    workout.activity_type,
                    workout.distance,
                    workout.average_pace,
                    workout.name
                );
            }
        }
    }

    database.close().await?;
    Ok(())
}

/// Run system diagnostics.
pub async fn handle_doctor(config: &Config) -> Result<()> {
    println!("Stride doctor");
    println!();

    // Workout store
    let db_path = config.db_path();
    match Database::new(&db_path).await {
        Ok(database) => {
            let count = database.workouts().count().await.unwrap_or(0);
            println!("Store:     ok ({} workouts at {})", count, db_path.display());
            database.close().await.ok();
        }
        Err(e) => println!("Store:     FAILED ({e})"),
    }

    // Model provider
    let sampling = Sampling {
        max_tokens: config.llm.max_tokens,
        temperature: config.llm.temperature,
    };
    let provider: Box<dyn LLMProvider> = match config.llm.default_provider.as_str() {
        "openai" => Box::new(OpenAIProvider::new(config.llm.openai.clone(), sampling)),
        _ => Box::new(AnthropicProvider::new(config.llm.anthropic.clone(), sampling)),
    };
    let healthy = provider.check_health().await;
    println!(
        "Provider:  {} ({})",
        if healthy { "ok" } else { "missing API key" },
        provider.name()
    );

    // Prompt source
    match &config.prompt.path {
        Some(path) if path.exists() => println!("Prompt:    override at {}", path.display()),
        Some(path) => println!("Prompt:    FAILED (override {} not found)", path.display()),
        None => println!("Prompt:    built-in coach template"),
    }

    Ok(())
}
