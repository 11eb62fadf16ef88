//! Database persistence layer for players, games and scores.

mod error;
mod models;
mod repository;
mod schema; // Diesel generated schema - internal use only

pub use error::{DbError, DbErrorKind};
pub use models::{
    Game, GamePlayer, GameScore, NewGame, NewGamePlayer, NewPlayer, Player, PlayerTotal,
};
pub use repository::{MIGRATIONS, ScoreRepository};
