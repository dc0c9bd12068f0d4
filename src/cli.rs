//! Command-line interface parsing for the timetable CLI
//!
//! This module handles parsing of CLI arguments using clap. Period arguments
//! are matched once here and passed on as a [`Period`].

use clap::{Parser, Subcommand};
use thiserror::Error;

use crate::query::Period;

/// Error types for CLI argument parsing
#[derive(Debug, Error)]
pub enum CliError {
    /// The specified period is not recognized
    #[error("Invalid period: '{0}'. Valid periods: today, tomorrow, week, nearest")]
    InvalidPeriod(String),
}

/// Timetable CLI - View class schedules for a group or teacher
#[derive(Parser, Debug)]
#[command(name = "timetable")]
#[command(about = "Class schedules for university groups and teachers")]
#[command(version)]
pub struct Cli {
    /// Schedule provider root URL (overrides TIMETABLE_BASE_URL)
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Print the schedule of a group or teacher
    ///
    /// Examples:
    ///   timetable show M-101            # Today's classes
    ///   timetable show M-101 week       # The next seven days
    ///   timetable show "Иванов И.И." nearest
    Show {
        /// Group or teacher name
        name: String,
        /// One of: today, tomorrow, week, nearest
        #[arg(default_value = "today")]
        period: String,
    },

    /// Remember which group or teacher a user wants schedules for
    Select {
        /// User identity
        #[arg(long, allow_negative_numbers = true)]
        user: i64,
        /// Group or teacher name
        name: String,
    },

    /// Answer period requests for a user, in order, through the rate limiter
    Ask {
        /// User identity
        #[arg(long, allow_negative_numbers = true)]
        user: i64,
        /// One or more of: today, tomorrow, week, nearest
        #[arg(required = true)]
        periods: Vec<String>,
    },

    /// List users with a saved selection and their restart notice
    Users {
        /// Also pre-load the schedules of all saved selections
        #[arg(long)]
        warm: bool,
    },

    /// Manage the directory of known groups and teachers
    Directory {
        #[command(subcommand)]
        action: DirectoryAction,
    },
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum DirectoryAction {
    /// Download the group and teacher list from the provider
    Refresh,
    /// Find stored groups and teachers whose name contains QUERY
    Search { query: String },
}

/// Parses a period string argument into a Period.
///
/// # Returns
/// * `Ok(Period)` if the string is one of the four keywords
/// * `Err(CliError::InvalidPeriod)` otherwise
pub fn parse_period_arg(s: &str) -> Result<Period, CliError> {
    s.parse().map_err(|_| CliError::InvalidPeriod(s.to_string()))
}
