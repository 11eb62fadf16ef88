//! Leaderboard business logic layer.

use std::fmt;

use chrono::NaiveDateTime;
use derive_getters::Getters;
use derive_new::new;
use tracing::{debug, info, instrument, warn};

use crate::{DbError, DbErrorKind, Game, GamePlayer, GameScore, Player, ScoreRepository};

/// One ranked line of the overall leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Getters, new)]
pub struct LeaderboardEntry {
    rank: usize,
    display_name: String,
    name: String,
    total_score: i64,
}

impl fmt::Display for LeaderboardEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {} ({}) - {}",
            self.rank, self.display_name, self.name, self.total_score
        )
    }
}

/// Service layer for recording games and reading standings.
///
/// Wraps [`ScoreRepository`] with the multi-step workflows the HTTP and
/// command-line surfaces need.
#[derive(Debug)]
pub struct LeaderboardService {
    repository: ScoreRepository,
}

impl LeaderboardService {
    /// Creates a new leaderboard service backed by the given repository.
    #[instrument(skip(repository))]
    pub fn new(repository: ScoreRepository) -> Self {
        info!(db_path = %repository.db_path(), "Creating LeaderboardService");
        Self { repository }
    }

    /// Returns the underlying repository.
    pub fn repository(&mut self) -> &mut ScoreRepository {
        &mut self.repository
    }

    /// Consumes the service, handing back the repository.
    pub fn into_repository(self) -> ScoreRepository {
        self.repository
    }

    /// Registers a new player.
    #[instrument(skip(self))]
    pub fn register_player(&mut self, name: &str, display_name: &str) -> Result<Player, DbError> {
        self.repository.create_player(name, display_name)
    }

    /// Creates a game and attaches one score per `(player name, score)` pair.
    ///
    /// Every name is resolved before the game is created, so an unknown
    /// player leaves nothing behind. The inserts themselves are independent:
    /// a failure part way through keeps the game and the scores already added.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] with [`DbErrorKind::NotFound`] for an unknown
    /// player, or the repository error of the first failed write.
    #[instrument(skip(self, results), fields(entries = results.len()))]
    pub fn record_game(
        &mut self,
        timestamp: Option<NaiveDateTime>,
        results: &[(String, u32)],
    ) -> Result<(Game, Vec<GamePlayer>), DbError> {
        debug!(?timestamp, "Recording game");

        let mut resolved = Vec::with_capacity(results.len());
        for (name, score) in results {
            let player = self.repository.get_player_by_name(name)?.ok_or_else(|| {
                DbError::new(DbErrorKind::NotFound, format!("Unknown player '{}'", name))
            })?;
            resolved.push((player, *score));
        }

        let game = self.repository.create_game(timestamp)?;

        let mut entries = Vec::with_capacity(resolved.len());
        for (player, score) in resolved {
            entries.push(self.repository.add_player_to_game(*game.id(), *player.id(), score)?);
        }

        info!(game_id = game.id(), entries = entries.len(), "Game recorded");
        Ok((game, entries))
    }

    /// Returns the scores of one game, highest first.
    #[instrument(skip(self))]
    pub fn game_scores(&mut self, game_id: i32) -> Result<Vec<GameScore>, DbError> {
        self.repository.get_scores_by_game(game_id)
    }

    /// Returns the ranked overall standings.
    ///
    /// Ranks are 1-indexed positions in the returned list; a total whose
    /// player can no longer be loaded is skipped.
    #[instrument(skip(self))]
    pub fn standings(&mut self) -> Result<Vec<LeaderboardEntry>, DbError> {
        let totals = self.repository.get_overall_scores()?;

        let mut entries = Vec::with_capacity(totals.len());
        for total in &totals {
            let rank = entries.len() + 1;
            match self.repository.get_player_by_id(*total.player_id())? {
                Some(player) => entries.push(LeaderboardEntry::new(
                    rank,
                    player.display_name().clone(),
                    player.name().clone(),
                    *total.total_score(),
                )),
                None => warn!(
                    player_id = total.player_id(),
                    "Total references a missing player, skipping"
                ),
            }
        }

        debug!(count = entries.len(), "Standings computed");
        Ok(entries)
    }

    /// Renders the standings as plain text, one newline-terminated line per entry.
    #[instrument(skip(self))]
    pub fn render_leaderboard(&mut self) -> Result<String, DbError> {
        let rendered = self
            .standings()?
            .iter()
            .map(|entry| format!("{}\n", entry))
            .collect::<String>();
        Ok(rendered)
    }
}
