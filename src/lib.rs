//! Kart Leaderboard library - players, games and per-game scores
//!
//! Records who played which game and how they scored, and serves the
//! overall standings as plain text over HTTP.
//!
//! # Architecture
//!
//! - **Storage**: SQLite schema managed by embedded Diesel migrations
//! - **Repository**: [`ScoreRepository`], the single owned connection and every query
//! - **Service**: [`LeaderboardService`], multi-step workflows and rendering
//! - **HTTP**: [`router`], one `GET /` endpoint
//!
//! # Example
//!
//! ```no_run
//! use kart_leaderboard::{LeaderboardService, ScoreRepository};
//!
//! # fn example() -> Result<(), kart_leaderboard::DbError> {
//! let mut repository = ScoreRepository::open("leaderboard.sqlite")?;
//! repository.ensure_schema()?;
//!
//! let mut service = LeaderboardService::new(repository);
//! service.register_player("pim", "Pim")?;
//! service.record_game(None, &[("pim".to_string(), 10000)])?;
//! print!("{}", service.render_leaderboard()?);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod db;
mod http;
mod leaderboard_service;

// Crate-level exports - Database
pub use db::{
    DbError, DbErrorKind, Game, GamePlayer, GameScore, MIGRATIONS, NewGame, NewGamePlayer,
    NewPlayer, Player, PlayerTotal, ScoreRepository,
};

// Crate-level exports - Service layer
pub use leaderboard_service::{LeaderboardEntry, LeaderboardService};

// Crate-level exports - HTTP
pub use http::{AppState, router};
