// Dex Board - Web Server
// JSON API over the same Board the terminal front end drives

use anyhow::{Context, Result};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use dex_board::{
    init_logging, Board, BoardConfig, CategoryFilter, CommitRecord, EntrySource, FileSource, Item,
    ItemId, NetworkFailure, Section, SelectionState, SnapshotError,
};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tower_http::cors::CorsLayer;
use tracing::{error, info};

/// Shared application state.
///
/// The board mutex is the apply context: fetch completions and taps are
/// serialized through it.
#[derive(Clone)]
struct AppState {
    board: Arc<Mutex<Board>>,
    source: Arc<dyn EntrySource>,
}

impl AppState {
    fn board(&self) -> MutexGuard<'_, Board> {
        self.board.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

fn reply<T: Serialize>(status: StatusCode, body: ApiResponse<T>) -> Response {
    (status, Json(body)).into_response()
}

#[derive(Serialize)]
struct SectionResponse<'a> {
    section: Section,
    items: Vec<&'a Item>,
}

#[derive(Serialize)]
struct SnapshotResponse<'a> {
    version: u64,
    selected_category: &'a CategoryFilter,
    highlighted_chip: Option<ItemId>,
    selection: SelectionState,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_error: Option<&'a str>,
    sections: Vec<SectionResponse<'a>>,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/snapshot - Both sections of the committed snapshot
async fn get_snapshot(State(state): State<AppState>) -> Response {
    let board = state.board();
    let snapshot = board.current_snapshot();

    let response = SnapshotResponse {
        version: snapshot.version(),
        selected_category: board.selected_category(),
        highlighted_chip: board.highlighted_chip(),
        selection: board.selection_state(),
        last_error: board.last_error().map(|e| e.reason.as_str()),
        sections: Section::ALL
            .into_iter()
            .map(|section| SectionResponse {
                section,
                items: snapshot.items(section).collect(),
            })
            .collect(),
    };

    reply(StatusCode::OK, ApiResponse::ok(response))
}

/// GET /api/entries/:index - Entry shown at a list row
async fn get_entry(State(state): State<AppState>, Path(index): Path<usize>) -> Response {
    let board = state.board();
    match board.entry_at(index) {
        Some(entry) => reply(StatusCode::OK, ApiResponse::ok(entry)),
        None => reply(
            StatusCode::NOT_FOUND,
            ApiResponse::<()>::err(format!("no entry at row {}", index)),
        ),
    }
}

/// POST /api/chips/:id/tap - Select a category chip
async fn tap_chip(State(state): State<AppState>, Path(id): Path<ItemId>) -> Response {
    let mut board = state.board();
    match board.on_chip_tapped(id) {
        Ok(commit) => reply(StatusCode::OK, ApiResponse::ok(commit)),
        Err(err @ SnapshotError::UnknownItem(_)) => {
            reply(StatusCode::NOT_FOUND, ApiResponse::<()>::err(err.to_string()))
        }
        Err(err) => {
            error!(error = %err, "chip tap failed");
            reply(
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiResponse::<()>::err(err.to_string()),
            )
        }
    }
}

/// POST /api/refresh - Re-run the fetch in the background
async fn refresh(State(state): State<AppState>) -> impl IntoResponse {
    spawn_fetch(state);
    (StatusCode::ACCEPTED, Json(ApiResponse::ok("fetch started")))
}

/// GET /api/history - Recent commits
async fn get_history(State(state): State<AppState>) -> Response {
    let board = state.board();
    let history: Vec<CommitRecord> = board.history().cloned().collect();
    reply(StatusCode::OK, ApiResponse::ok(history))
}

/// Fetch off the request path; the completion takes the board lock like any
/// other apply.
fn spawn_fetch(state: AppState) {
    tokio::spawn(async move {
        let source = Arc::clone(&state.source);
        let outcome = tokio::task::spawn_blocking(move || source.fetch())
            .await
            .unwrap_or_else(|e| Err(NetworkFailure::new(format!("fetch task failed: {}", e))));

        let mut board = state.board();
        match board.on_fetch_complete(outcome) {
            Ok(Some(commit)) => info!(version = commit.version, "fetch committed"),
            Ok(None) => {}
            Err(err) => error!(error = %err, "rebuilding snapshot after fetch failed"),
        }
    });
}

fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/snapshot", get(get_snapshot))
        .route("/entries/:index", get(get_entry))
        .route("/chips/:id/tap", post(tap_chip))
        .route("/refresh", post(refresh))
        .route("/history", get(get_history))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let config = BoardConfig::from_env().context("loading configuration")?;
    init_logging(&config.log).context("initialising logging")?;

    let state = AppState {
        board: Arc::new(Mutex::new(Board::new())),
        source: Arc::new(FileSource::new(config.entries_path.clone())),
    };

    // Requests before this completes see an empty snapshot
    spawn_fetch(state.clone());

    let listener = tokio::net::TcpListener::bind(&config.server_addr)
        .await
        .with_context(|| format!("binding {}", config.server_addr))?;

    info!(addr = %config.server_addr, "dex-server listening");

    axum::serve(listener, router(state))
        .await
        .context("serving")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use dex_board::{CategoryLabel, Entry, FetchOutcome};
    use serde_json::Value;
    use tower::ServiceExt;

    struct FixedSource;

    impl EntrySource for FixedSource {
        fn fetch(&self) -> FetchOutcome {
            Ok(vec![
                Entry::new(1, "A", "", [CategoryLabel::from("fire")]),
                Entry::new(2, "B", "", [CategoryLabel::from("water")]),
            ])
        }
    }

    fn loaded_state() -> AppState {
        let state = AppState {
            board: Arc::new(Mutex::new(Board::new())),
            source: Arc::new(FixedSource),
        };
        let outcome = state.source.fetch();
        state.board().on_fetch_complete(outcome).unwrap();
        state
    }

    async fn call(state: &AppState, method: &str, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let response = router(state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = call(&loaded_state(), "GET", "/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], "OK");
    }

    #[tokio::test]
    async fn test_snapshot_lists_both_sections() {
        let (status, body) = call(&loaded_state(), "GET", "/api/snapshot").await;
        assert_eq!(status, StatusCode::OK);

        let sections = body["data"]["sections"].as_array().unwrap();
        assert_eq!(sections[0]["section"], "TypeSelector");
        assert_eq!(sections[0]["items"].as_array().unwrap().len(), 3);
        assert_eq!(sections[1]["items"][1]["entry"]["name"], "B");
    }

    #[tokio::test]
    async fn test_tap_chip_returns_edit_script() {
        let state = loaded_state();
        let fire = state.board().current_snapshot().item_ids(Section::TypeSelector)[1];

        let (status, body) = call(&state, "POST", &format!("/api/chips/{}/tap", fire)).await;
        assert_eq!(status, StatusCode::OK);
        let ops = body["data"]["scripts"][0]["ops"].as_array().unwrap();
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0]["op"], "remove");
        assert_eq!(ops[0]["at"], 1);
    }

    #[tokio::test]
    async fn test_unknown_chip_is_not_found() {
        let state = loaded_state();
        let stranger = Item::chip(CategoryFilter::All).id();

        let (status, body) = call(&state, "POST", &format!("/api/chips/{}/tap", stranger)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_entry_lookup() {
        let state = loaded_state();
        let (status, body) = call(&state, "GET", "/api/entries/0").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["rank"], 1);

        let (status, _) = call(&state, "GET", "/api/entries/9").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
