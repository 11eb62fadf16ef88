//! HTTP surface: the plain-text leaderboard.

use std::sync::{Arc, Mutex};

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{Request, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use tower::ServiceBuilder;
use tracing::{error, info, instrument};

use crate::{DbError, DbErrorKind, LeaderboardService};

/// Shared state handed to every request handler.
#[derive(Debug, Clone)]
pub struct AppState {
    service: Arc<Mutex<LeaderboardService>>,
}

impl AppState {
    /// Wraps the service for sharing across requests.
    pub fn new(service: LeaderboardService) -> Self {
        Self {
            service: Arc::new(Mutex::new(service)),
        }
    }

    /// Recovers the service once every request handle has been dropped.
    ///
    /// Returns `None` while other clones of the state are still alive.
    pub fn into_service(self) -> Option<LeaderboardService> {
        Arc::into_inner(self.service).and_then(|mutex| mutex.into_inner().ok())
    }
}

/// Builds the application router.
#[instrument(skip(state))]
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(leaderboard))
        .layer(ServiceBuilder::new().map_request(|req: Request<Body>| {
            info!(method = %req.method(), uri = %req.uri(), "Incoming HTTP request");
            req
        }))
        .with_state(state)
}

/// `GET /`: ranked totals as plain text.
#[instrument(skip_all)]
async fn leaderboard(State(state): State<AppState>) -> Response {
    let service = Arc::clone(&state.service);
    let rendered = tokio::task::spawn_blocking(move || {
        let mut service = service
            .lock()
            .map_err(|_| DbError::new(DbErrorKind::Read, "Service lock poisoned"))?;
        service.render_leaderboard()
    })
    .await;

    match rendered {
        Ok(Ok(body)) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            body,
        )
            .into_response(),
        Ok(Err(e)) => {
            error!(error = %e, "Failed to render leaderboard");
            internal_error()
        }
        Err(e) => {
            error!(error = %e, "Leaderboard task failed");
            internal_error()
        }
    }
}

fn internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        "internal error\n",
    )
        .into_response()
}
