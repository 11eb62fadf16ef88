//! Tests for the leaderboard service workflows.

use diesel::{Connection, RunQueryDsl, SqliteConnection};
use tempfile::NamedTempFile;

use kart_leaderboard::{DbErrorKind, LeaderboardEntry, LeaderboardService, ScoreRepository};

fn setup_service() -> (NamedTempFile, LeaderboardService) {
    let db_file = NamedTempFile::new().expect("Failed to create temp file");
    let db_path = db_file.path().to_str().expect("Invalid path").to_string();

    let mut repo = ScoreRepository::open(db_path).expect("Failed to open repository");
    repo.ensure_schema().expect("Migrations failed");
    (db_file, LeaderboardService::new(repo))
}

/// Runs a statement through a second connection, outside the service.
fn run_sql(db_file: &NamedTempFile, sql: &str) {
    let db_path = db_file.path().to_str().expect("Invalid path");
    let mut conn = SqliteConnection::establish(db_path).expect("Failed to connect");
    diesel::sql_query(sql).execute(&mut conn).expect("Statement failed");
}

fn results(pairs: &[(&str, u32)]) -> Vec<(String, u32)> {
    pairs
        .iter()
        .map(|(name, score)| (name.to_string(), *score))
        .collect()
}

#[test]
fn test_record_game_attaches_every_score() {
    let (_db, mut service) = setup_service();
    service.register_player("bas", "Bastiaan").expect("Register failed");
    service.register_player("pim", "Pim").expect("Register failed");

    let (game, entries) = service
        .record_game(None, &results(&[("bas", 100), ("pim", 10000)]))
        .expect("Record failed");
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|e| e.game_id() == game.id()));

    let scores = service.game_scores(*game.id()).expect("Query failed");
    let ranked: Vec<(&str, i32)> = scores
        .iter()
        .map(|s| (s.player().display_name().as_str(), s.score()))
        .collect();
    assert_eq!(ranked, [("Pim", 10000), ("Bastiaan", 100)]);
}

#[test]
fn test_record_game_unknown_player_creates_nothing() {
    let (_db, mut service) = setup_service();
    service.register_player("bas", "Bastiaan").expect("Register failed");

    let err = service
        .record_game(None, &results(&[("bas", 100), ("ghost", 5)]))
        .expect_err("Unknown player should fail");
    assert_eq!(err.kind, DbErrorKind::NotFound);

    let game = service.repository().get_game_by_id(1).expect("Query failed");
    assert!(game.is_none());
    assert!(service.standings().expect("Standings failed").is_empty());
}

#[test]
fn test_register_player_duplicate_fails() {
    let (_db, mut service) = setup_service();
    service.register_player("pim", "Pim").expect("Register failed");
    let err = service
        .register_player("pim", "Pimmetje")
        .expect_err("Duplicate should fail");
    assert_eq!(err.kind, DbErrorKind::ConstraintViolation);
}

#[test]
fn test_standings_ranked_by_total() {
    let (_db, mut service) = setup_service();
    service.register_player("bas", "Bastiaan").expect("Register failed");
    service.register_player("pim", "Pim").expect("Register failed");
    service.register_player("serge", "Serge").expect("Register failed");
    service.register_player("idle", "Never Played").expect("Register failed");

    service
        .record_game(None, &results(&[("bas", 40), ("pim", 30), ("serge", 20)]))
        .expect("Record failed");
    service
        .record_game(None, &results(&[("serge", 60), ("pim", 5)]))
        .expect("Record failed");

    let standings = service.standings().expect("Standings failed");
    assert_eq!(
        standings,
        [
            LeaderboardEntry::new(1, "Serge".to_string(), "serge".to_string(), 80),
            LeaderboardEntry::new(2, "Bastiaan".to_string(), "bas".to_string(), 40),
            LeaderboardEntry::new(3, "Pim".to_string(), "pim".to_string(), 35),
        ]
    );
}

#[test]
fn test_render_leaderboard_scenario() {
    let (_db, mut service) = setup_service();
    service.register_player("bas", "Bastiaan").expect("Register failed");
    service.register_player("pim", "Pim").expect("Register failed");
    service
        .record_game(None, &results(&[("bas", 100), ("pim", 10000)]))
        .expect("Record failed");

    let body = service.render_leaderboard().expect("Render failed");
    assert_eq!(body, "1 - Pim (pim) - 10000\n2 - Bastiaan (bas) - 100\n");
}

#[test]
fn test_render_leaderboard_empty() {
    let (_db, mut service) = setup_service();
    let body = service.render_leaderboard().expect("Render failed");
    assert!(body.is_empty());
}

#[test]
fn test_render_leaderboard_renumbers_after_player_soft_delete() {
    let (db, mut service) = setup_service();
    service.register_player("bas", "Bastiaan").expect("Register failed");
    service.register_player("pim", "Pim").expect("Register failed");
    service
        .record_game(None, &results(&[("bas", 100), ("pim", 10000)]))
        .expect("Record failed");

    run_sql(&db, "UPDATE players SET deleted_at = CURRENT_TIMESTAMP WHERE name = 'pim'");

    let body = service.render_leaderboard().expect("Render failed");
    assert_eq!(body, "1 - Bastiaan (bas) - 100\n");
}

#[test]
fn test_render_leaderboard_ignores_soft_deleted_game() {
    let (db, mut service) = setup_service();
    service.register_player("bas", "Bastiaan").expect("Register failed");
    service.register_player("pim", "Pim").expect("Register failed");
    let (game, _) = service
        .record_game(None, &results(&[("bas", 100), ("pim", 10000)]))
        .expect("Record failed");

    run_sql(
        &db,
        &format!("UPDATE games SET deleted_at = CURRENT_TIMESTAMP WHERE id = {}", game.id()),
    );

    assert!(service.game_scores(*game.id()).expect("Query failed").is_empty());
    assert!(service.render_leaderboard().expect("Render failed").is_empty());
}
