//! Database models and domain types.

use chrono::NaiveDateTime;
use derive_getters::Getters;
use derive_new::new;
use diesel::prelude::*;

use crate::db::schema;

/// Registered player.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Identifiable, Selectable, Getters)]
#[diesel(table_name = schema::players)]
pub struct Player {
    id: i32,
    /// Login-style handle, unique among live players.
    name: String,
    /// Human-facing label, unique among live players.
    display_name: String,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
    deleted_at: Option<NaiveDateTime>,
}

/// Insertable player model.
#[derive(Debug, Clone, Insertable, new)]
#[diesel(table_name = schema::players)]
pub struct NewPlayer {
    name: String,
    display_name: String,
}

/// A single scoring event.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Identifiable, Selectable, Getters)]
#[diesel(table_name = schema::games)]
pub struct Game {
    id: i32,
    timestamp: NaiveDateTime,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
    deleted_at: Option<NaiveDateTime>,
}

/// Insertable game model.
#[derive(Debug, Clone, Insertable, new)]
#[diesel(table_name = schema::games)]
pub struct NewGame {
    timestamp: NaiveDateTime,
}

/// One player's result within one game.
#[derive(
    Debug, Clone, PartialEq, Eq, Queryable, Identifiable, Associations, Selectable, Getters,
)]
#[diesel(table_name = schema::game_players)]
#[diesel(belongs_to(Game))]
#[diesel(belongs_to(Player))]
pub struct GamePlayer {
    id: i32,
    game_id: i32,
    player_id: i32,
    score: i32,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
    deleted_at: Option<NaiveDateTime>,
}

/// Insertable score row.
#[derive(Debug, Clone, Insertable, new)]
#[diesel(table_name = schema::game_players)]
pub struct NewGamePlayer {
    game_id: i32,
    player_id: i32,
    score: i32,
}

/// A score row loaded together with the player and game it references.
#[derive(Debug, Clone, PartialEq, Eq, Getters, new)]
pub struct GameScore {
    entry: GamePlayer,
    player: Player,
    game: Game,
}

impl GameScore {
    /// Score recorded for this player in this game.
    pub fn score(&self) -> i32 {
        *self.entry.score()
    }
}

/// Summed score of one player across every game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Getters, new)]
pub struct PlayerTotal {
    player_id: i32,
    total_score: i64,
}
