//! Kart Leaderboard - CLI and HTTP server

#![warn(missing_docs)]

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use kart_leaderboard::{AppState, LeaderboardService, ScoreRepository, router};
use tracing::{error, info, instrument};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,kart_leaderboard=debug")),
        )
        .init();

    let service = match open_service(&cli.db_path) {
        Ok(service) => service,
        Err(e) => {
            error!(db_path = %cli.db_path, error = %e, "Failed to open database");
            return Err(e);
        }
    };

    match cli.command {
        Command::Serve { port, host } => run_http_server(service, host, port).await,
        Command::AddPlayer { name, display_name } => add_player(service, &name, &display_name),
        Command::Players => list_players(service),
        Command::NewGame { at, results } => new_game(service, at, &results),
        Command::Scores { game_id } => show_scores(service, game_id),
        Command::Leaderboard => print_leaderboard(service),
    }
}

/// Opens the store and brings its schema up to date.
#[instrument]
fn open_service(db_path: &str) -> Result<LeaderboardService> {
    let mut repository = ScoreRepository::open(db_path)?;
    repository.ensure_schema()?;
    info!("Database opened");
    Ok(LeaderboardService::new(repository))
}

/// Serve the leaderboard until Ctrl+C
#[instrument(skip(service))]
async fn run_http_server(service: LeaderboardService, host: String, port: u16) -> Result<()> {
    let state = AppState::new(service);
    let app = router(state.clone());

    let listener = tokio::net::TcpListener::bind((host.as_str(), port)).await?;
    info!("Server ready at http://{}:{}/", host, port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    match state.into_service() {
        Some(service) => {
            drop(service.into_repository());
            info!("Database handle released");
        }
        None => info!("Database handle released with last request"),
    }
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown requested"),
        Err(e) => error!(error = %e, "Failed to listen for Ctrl+C"),
    }
}

#[instrument(skip(service))]
fn add_player(mut service: LeaderboardService, name: &str, display_name: &str) -> Result<()> {
    let player = service.register_player(name, display_name)?;
    println!(
        "Registered player {}: {} ({})",
        player.id(),
        player.display_name(),
        player.name()
    );
    Ok(())
}

#[instrument(skip(service))]
fn list_players(mut service: LeaderboardService) -> Result<()> {
    for player in service.repository().list_players()? {
        println!("{}\t{}\t{}", player.id(), player.name(), player.display_name());
    }
    Ok(())
}

#[instrument(skip(service, results))]
fn new_game(
    mut service: LeaderboardService,
    at: Option<chrono::NaiveDateTime>,
    results: &[(String, u32)],
) -> Result<()> {
    let (game, entries) = service.record_game(at, results)?;
    println!(
        "Recorded game {} at {} with {} scores",
        game.id(),
        game.timestamp(),
        entries.len()
    );
    Ok(())
}

#[instrument(skip(service))]
fn show_scores(mut service: LeaderboardService, game_id: i32) -> Result<()> {
    for score in service.game_scores(game_id)? {
        println!(
            "{} == {}: {}",
            score.game().timestamp(),
            score.player().display_name(),
            score.score()
        );
    }
    Ok(())
}

#[instrument(skip(service))]
fn print_leaderboard(mut service: LeaderboardService) -> Result<()> {
    print!("{}", service.render_leaderboard()?);
    Ok(())
}
