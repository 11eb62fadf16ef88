//! Command-line interface for kart_leaderboard.

use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};

/// Kart Leaderboard - player scores and overall standings
#[derive(Parser, Debug)]
#[command(name = "kart_leaderboard")]
#[command(about = "Record game scores and serve the overall leaderboard", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to the database file (created if it doesn't exist)
    #[arg(long, global = true, env = "LEADERBOARD_DB", default_value = "leaderboard.sqlite")]
    pub db_path: String,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the leaderboard over HTTP
    Serve {
        /// Port to bind to
        #[arg(short, long, default_value = "8080")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },

    /// Register a new player
    AddPlayer {
        /// Login-style handle
        name: String,

        /// Name shown on the leaderboard
        display_name: String,
    },

    /// List registered players
    Players,

    /// Record a game with one `name=score` pair per participant
    NewGame {
        /// When the game was played (e.g. 2026-10-19T20:15:00); defaults to now
        #[arg(long)]
        at: Option<NaiveDateTime>,

        /// Participant results as `name=score`
        #[arg(required = true, value_parser = parse_result)]
        results: Vec<(String, u32)>,
    },

    /// Show the scores of one game
    Scores {
        /// Game id
        game_id: i32,
    },

    /// Print the overall leaderboard
    Leaderboard,
}

/// Parses a `name=score` argument.
pub fn parse_result(arg: &str) -> Result<(String, u32), String> {
    let (name, score) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected name=score, got '{}'", arg))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing player name in '{}'", arg));
    }
    let score = score
        .trim()
        .parse::<u32>()
        .map_err(|e| format!("invalid score in '{}': {}", arg, e))?;
    Ok((name.to_string(), score))
}
