//! CLI interface for Stride
//!
//! This module provides the command-line interface using clap's derive API.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Stride running coach engine
///
/// Generates personalized multi-week running plans by conversing with a
/// language model that can inspect your workout history.
#[derive(Parser, Debug)]
#[command(name = "stride")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log: Option<String>,

    /// Specify alternate configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate a training plan
    Plan {
        /// The request, e.g. "Help me train for a marathon"
        message: String,

        /// Target race distance in kilometers
        #[arg(long, value_name = "KM")]
        distance_km: Option<f64>,

        /// Goal finishing time, hh:mm:ss
        #[arg(long, value_name = "TIME")]
        goal_time: Option<String>,

        /// Goal race date, YYYY-MM-DD
        #[arg(long, value_name = "DATE")]
        goal_date: Option<String>,

        /// Free-text notes for the coach
        #[arg(long)]
        notes: Option<String>,

        /// Available training days, comma-separated (e.g. tue,thu,sun)
        #[arg(long, value_name = "DAYS", value_delimiter = ',')]
        days: Vec<String>,

        /// Preferred long run day
        #[arg(long, value_name = "DAY")]
        long_run_day: Option<String>,

        /// Include strength training sessions
        #[arg(long)]
        strength: bool,
    },

    /// Seed the workout store with synthetic run history
    Seed {
        /// Number of workouts to generate
        #[arg(short, long, default_value = "30")]
        count: usize,
    },

    /// Show stored workouts
    History {
        /// Number of workouts to show
        #[arg(short, long, default_value = "10")]
        limit: i64,
    },

    /// Run system diagnostics
    Doctor,
}
