//! Plan request contract types
//!
//! These are the structured inputs a caller hands to the engine when asking
//! for a training plan: a free-text message plus optional preferences and
//! goals records. Field names mirror the JSON bodies produced by the web
//! client, hence the camelCase serde renames.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Day of the week, as used in scheduling preferences.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    /// Full English name, as rendered into the composite request.
    pub fn as_str(&self) -> &'static str {
        match self {
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
            Weekday::Saturday => "Saturday",
            Weekday::Sunday => "Sunday",
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Weekday {
    type Err = String;

    /// Accepts full names and three-letter abbreviations, case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mon" | "monday" => Ok(Weekday::Monday),
            "tue" | "tuesday" => Ok(Weekday::Tuesday),
            "wed" | "wednesday" => Ok(Weekday::Wednesday),
            "thu" | "thursday" => Ok(Weekday::Thursday),
            "fri" | "friday" => Ok(Weekday::Friday),
            "sat" | "saturday" => Ok(Weekday::Saturday),
            "sun" | "sunday" => Ok(Weekday::Sunday),
            other => Err(format!("Unknown weekday: {other}")),
        }
    }
}

/// Scheduling preferences for the plan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    /// Days of the week the runner is available to train
    #[serde(default)]
    pub available_days: Vec<Weekday>,

    /// Whether strength/cross training sessions should be included
    #[serde(default)]
    pub strength_training: bool,

    /// Preferred day for the weekly long run
    #[serde(default)]
    pub preferred_long_run_day: Option<Weekday>,
}

/// Race goals for the plan.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Goals {
    /// Target race distance in kilometers (e.g. 42.2 for a marathon)
    #[serde(default)]
    pub target_distance_km: Option<f64>,

    /// Goal finishing time, hh:mm:ss
    #[serde(default)]
    pub goal_time: Option<String>,

    /// Date of the goal race
    #[serde(default)]
    pub goal_date: Option<NaiveDate>,

    /// Free-text notes from the runner
    #[serde(default)]
    pub notes: Option<String>,
}

/// One plan request: a free-text message plus optional structured fields.
///
/// Absent `preferences`/`goals` are rendered into the composite request as
/// explicit "not provided" clauses rather than omitted, so the model is
/// never silently missing context.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlanRequest {
    /// The runner's free-text request
    pub message: String,

    /// Scheduling preferences, if any were supplied
    #[serde(default)]
    pub preferences: Option<Preferences>,

    /// Race goals, if any were supplied
    #[serde(default)]
    pub goals: Option<Goals>,
}

impl PlanRequest {
    /// Create a request with only a free-text message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            preferences: None,
            goals: None,
        }
    }

    /// Attach preferences.
    pub fn with_preferences(mut self, preferences: Preferences) -> Self {
        self.preferences = Some(preferences);
        self
    }

    /// Attach goals.
    pub fn with_goals(mut self, goals: Goals) -> Self {
        self.goals = Some(goals);
        self
    }
}
