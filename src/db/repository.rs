//! Database repository for players, games and scores.

use chrono::{NaiveDateTime, Utc};
use diesel::connection::SimpleConnection;
use diesel::dsl::sum;
use diesel::prelude::*;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::{debug, info, instrument};

use crate::db::{
    DbError, DbErrorKind, Game, GamePlayer, GameScore, NewGame, NewGamePlayer, NewPlayer, Player,
    PlayerTotal, schema,
};

/// Migrations compiled into the binary.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Database repository owning the single connection used by the process.
///
/// The connection is opened by [`ScoreRepository::open`] and closed when the
/// repository is dropped.
pub struct ScoreRepository {
    db_path: String,
    conn: SqliteConnection,
}

impl std::fmt::Debug for ScoreRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScoreRepository")
            .field("db_path", &self.db_path)
            .finish_non_exhaustive()
    }
}

impl ScoreRepository {
    /// Opens the database at the given path, creating the file if needed.
    ///
    /// Use `":memory:"` for an in-memory database.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] with [`DbErrorKind::StartupFailure`] if the store
    /// cannot be opened or configured.
    #[instrument(skip_all)]
    pub fn open(db_path: impl Into<String>) -> Result<Self, DbError> {
        let db_path = db_path.into();
        info!(path = %db_path, "Opening ScoreRepository");

        let mut conn = SqliteConnection::establish(&db_path).map_err(|e| {
            DbError::new(
                DbErrorKind::StartupFailure,
                format!("Failed to open '{}': {}", db_path, e),
            )
        })?;

        // SQLite leaves foreign keys off unless asked, per connection.
        conn.batch_execute("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;")
            .map_err(|e| {
                DbError::new(
                    DbErrorKind::StartupFailure,
                    format!("Failed to configure connection: {}", e),
                )
            })?;

        Ok(Self { db_path, conn })
    }

    /// Returns the path this repository was opened with.
    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    /// Brings the schema up to date, applying only migrations not yet run.
    ///
    /// Returns the number of migrations applied; zero when the schema is current.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] with [`DbErrorKind::Schema`] if a migration fails.
    #[instrument(skip(self), fields(db_path = %self.db_path))]
    pub fn ensure_schema(&mut self) -> Result<usize, DbError> {
        debug!("Running pending migrations");
        let applied = self
            .conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| DbError::new(DbErrorKind::Schema, format!("Migration failed: {}", e)))?;

        for version in &applied {
            info!(version = %version, "Migration applied");
        }
        info!(applied = applied.len(), "Schema up to date");
        Ok(applied.len())
    }

    /// Registers a new player.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] with [`DbErrorKind::ConstraintViolation`] if the
    /// name or display name is already taken.
    #[instrument(skip(self))]
    pub fn create_player(&mut self, name: &str, display_name: &str) -> Result<Player, DbError> {
        debug!(name = %name, display_name = %display_name, "Creating player");

        let new_player = NewPlayer::new(name.to_string(), display_name.to_string());

        let player = diesel::insert_into(schema::players::table)
            .values(&new_player)
            .returning(Player::as_returning())
            .get_result(&mut self.conn)
            .map_err(DbError::write)?;

        info!(player_id = player.id(), name = %player.name(), "Player created");
        Ok(player)
    }

    /// Gets a player by handle. Returns `None` if not found.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn get_player_by_name(&mut self, name: &str) -> Result<Option<Player>, DbError> {
        debug!(name = %name, "Looking up player by name");

        let player = schema::players::table
            .filter(schema::players::name.eq(name))
            .filter(schema::players::deleted_at.is_null())
            .order(schema::players::id.asc())
            .select(Player::as_select())
            .first(&mut self.conn)
            .optional()?;

        if player.is_none() {
            debug!(name = %name, "Player not found");
        }
        Ok(player)
    }

    /// Gets a player by id. Returns `None` if not found.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn get_player_by_id(&mut self, player_id: i32) -> Result<Option<Player>, DbError> {
        debug!(player_id, "Looking up player by id");

        let player = schema::players::table
            .filter(schema::players::id.eq(player_id))
            .filter(schema::players::deleted_at.is_null())
            .select(Player::as_select())
            .first(&mut self.conn)
            .optional()?;

        if player.is_none() {
            debug!(player_id, "Player not found");
        }
        Ok(player)
    }

    /// Lists all players, ordered by registration.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn list_players(&mut self) -> Result<Vec<Player>, DbError> {
        let players = schema::players::table
            .filter(schema::players::deleted_at.is_null())
            .order((schema::players::created_at.asc(), schema::players::id.asc()))
            .select(Player::as_select())
            .load(&mut self.conn)?;

        debug!(count = players.len(), "Players loaded");
        Ok(players)
    }

    /// Creates a game. Without a timestamp the game is stamped with its
    /// creation time.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] with [`DbErrorKind::Write`] if the insert fails.
    #[instrument(skip(self))]
    pub fn create_game(&mut self, timestamp: Option<NaiveDateTime>) -> Result<Game, DbError> {
        debug!(?timestamp, "Creating game");

        let timestamp = timestamp.unwrap_or_else(|| Utc::now().naive_utc());
        let game = diesel::insert_into(schema::games::table)
            .values(&NewGame::new(timestamp))
            .returning(Game::as_returning())
            .get_result(&mut self.conn)
            .map_err(DbError::write)?;

        info!(game_id = game.id(), timestamp = %game.timestamp(), "Game created");
        Ok(game)
    }

    /// Gets a game by id. Returns `None` if not found.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn get_game_by_id(&mut self, game_id: i32) -> Result<Option<Game>, DbError> {
        let game = schema::games::table
            .filter(schema::games::id.eq(game_id))
            .filter(schema::games::deleted_at.is_null())
            .select(Game::as_select())
            .first(&mut self.conn)
            .optional()?;
        Ok(game)
    }

    /// Records a player's score in a game.
    ///
    /// Duplicate (game, player) pairs are accepted.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] with [`DbErrorKind::Write`] if either reference
    /// does not exist, the score is out of range, or the insert fails.
    #[instrument(skip(self))]
    pub fn add_player_to_game(
        &mut self,
        game_id: i32,
        player_id: i32,
        score: u32,
    ) -> Result<GamePlayer, DbError> {
        debug!(game_id, player_id, score, "Adding player to game");

        let score = i32::try_from(score).map_err(|_| {
            DbError::new(
                DbErrorKind::Write,
                format!("Score {} exceeds storable range", score),
            )
        })?;
        let new_entry = NewGamePlayer::new(game_id, player_id, score);

        let entry = diesel::insert_into(schema::game_players::table)
            .values(&new_entry)
            .returning(GamePlayer::as_returning())
            .get_result(&mut self.conn)
            .map_err(DbError::write)?;

        info!(
            entry_id = entry.id(),
            game_id = entry.game_id(),
            player_id = entry.player_id(),
            score = entry.score(),
            "Score recorded"
        );
        Ok(entry)
    }

    /// Gets every score recorded for a game with its player and game,
    /// highest score first. Soft-deleted games and players yield nothing.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn get_scores_by_game(&mut self, game_id: i32) -> Result<Vec<GameScore>, DbError> {
        debug!(game_id, "Loading game scores");

        let rows = schema::game_players::table
            .inner_join(schema::players::table)
            .inner_join(schema::games::table)
            .filter(schema::game_players::game_id.eq(game_id))
            .filter(schema::game_players::deleted_at.is_null())
            .filter(schema::players::deleted_at.is_null())
            .filter(schema::games::deleted_at.is_null())
            .order((
                schema::game_players::score.desc(),
                schema::game_players::id.asc(),
            ))
            .select((
                GamePlayer::as_select(),
                Player::as_select(),
                Game::as_select(),
            ))
            .load::<(GamePlayer, Player, Game)>(&mut self.conn)?;

        let scores: Vec<GameScore> = rows
            .into_iter()
            .map(|(entry, player, game)| GameScore::new(entry, player, game))
            .collect();

        info!(game_id, count = scores.len(), "Game scores loaded");
        Ok(scores)
    }

    /// Sums every player's scores across all games, highest total first.
    ///
    /// Players with no recorded score are absent, as are soft-deleted
    /// players and scores from soft-deleted games.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn get_overall_scores(&mut self) -> Result<Vec<PlayerTotal>, DbError> {
        debug!("Computing overall scores");

        let rows = schema::game_players::table
            .inner_join(schema::players::table)
            .inner_join(schema::games::table)
            .filter(schema::game_players::deleted_at.is_null())
            .filter(schema::players::deleted_at.is_null())
            .filter(schema::games::deleted_at.is_null())
            .group_by(schema::game_players::player_id)
            .select((
                schema::game_players::player_id,
                sum(schema::game_players::score),
            ))
            .order((
                sum(schema::game_players::score).desc(),
                schema::game_players::player_id.asc(),
            ))
            .load::<(i32, Option<i64>)>(&mut self.conn)?;

        let totals: Vec<PlayerTotal> = rows
            .into_iter()
            .map(|(player_id, total)| PlayerTotal::new(player_id, total.unwrap_or(0)))
            .collect();

        info!(players = totals.len(), "Overall scores computed");
        Ok(totals)
    }
}
