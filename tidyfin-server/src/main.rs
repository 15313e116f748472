use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tidyfin_config::Settings;
use tidyfin_core::{
    FileOrganizer, LibraryLayout, MediaFile, MediaScanner, MetadataProvider,
    RouteSummary, TmdbProvider,
};
use tokio::sync::RwLock;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

struct AppState {
    settings: RwLock<Settings>,
    config_path: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tidyfin_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = std::env::var("TIDYFIN_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.json"));
    let settings = Settings::load(&config_path)?;
    info!("Loaded settings from {}", config_path.display());

    let state = Arc::new(AppState {
        settings: RwLock::new(settings),
        config_path,
    });

    let app = create_app(state);

    let port = std::env::var("SERVER_PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(8080);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting tidyfin server on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn create_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ping", get(ping_handler))
        .route("/api/config", get(get_config_handler).post(set_config_handler))
        .route("/api/test-tmdb", post(test_tmdb_handler))
        .route("/api/scan", post(scan_handler))
        .route("/api/preview", post(preview_handler))
        .route("/api/execute", post(execute_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

struct AppError(StatusCode, String);

impl AppError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self(StatusCode::BAD_REQUEST, message.into())
    }

    fn internal(message: impl Into<String>) -> Self {
        Self(StatusCode::INTERNAL_SERVER_ERROR, message.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.0, Json(json!({ "error": self.1 }))).into_response()
    }
}

async fn ping_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn get_config_handler(State(state): State<Arc<AppState>>) -> Json<Settings> {
    Json(state.settings.read().await.clone())
}

async fn set_config_handler(
    State(state): State<Arc<AppState>>,
    Json(new_settings): Json<Settings>,
) -> Result<Json<Settings>, AppError> {
    new_settings
        .save(&state.config_path)
        .map_err(|e| AppError::internal(format!("could not save config: {e}")))?;
    let mut settings = state.settings.write().await;
    *settings = new_settings;
    info!("Settings updated via API");
    Ok(Json(settings.clone()))
}

#[derive(Deserialize)]
struct TestTmdbRequest {
    #[serde(default)]
    api_key: Option<String>,
}

async fn test_tmdb_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TestTmdbRequest>,
) -> Result<Json<Value>, AppError> {
    let key = match request.api_key {
        Some(key) if !key.trim().is_empty() => key,
        _ => state
            .settings
            .read()
            .await
            .effective_api_key()
            .ok_or_else(|| AppError::bad_request("no TMDB API key configured"))?,
    };
    let provider = TmdbProvider::new(key)
        .map_err(|e| AppError::internal(format!("could not build TMDB client: {e}")))?;
    let ok = provider.test_connection().await;
    Ok(Json(json!({ "ok": ok })))
}

#[derive(Deserialize)]
struct ScanRequest {
    #[serde(default)]
    source: Option<PathBuf>,
    #[serde(default)]
    max_depth: Option<usize>,
}

#[derive(Serialize)]
struct ScanResponse {
    count: usize,
    files: Vec<MediaFile>,
}

async fn scan_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ScanRequest>,
) -> Result<Json<ScanResponse>, AppError> {
    let files = scan(&state, request).await?;
    Ok(Json(ScanResponse {
        count: files.len(),
        files,
    }))
}

/// Preview is execute with the mover disabled; both share the same
/// scan-and-route path.
async fn preview_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ScanRequest>,
) -> Result<Json<RouteSummary>, AppError> {
    run_batch(state, request, true).await.map(Json)
}

async fn execute_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ScanRequest>,
) -> Result<Json<RouteSummary>, AppError> {
    run_batch(state, request, false).await.map(Json)
}

async fn scan(
    state: &AppState,
    request: ScanRequest,
) -> Result<Vec<MediaFile>, AppError> {
    let source = match request.source {
        Some(source) => source,
        None => state
            .settings
            .read()
            .await
            .source_dir
            .clone()
            .ok_or_else(|| AppError::bad_request("no source directory configured"))?,
    };

    let mut scanner = MediaScanner::new();
    if let Some(depth) = request.max_depth {
        scanner = scanner.with_max_depth(depth);
    }

    let files = tokio::task::spawn_blocking(move || scanner.scan_directory(&source))
        .await
        .map_err(|e| AppError::internal(format!("scan task failed: {e}")))?
        .map_err(|e| AppError::bad_request(e.to_string()))?;
    Ok(files)
}

async fn run_batch(
    state: Arc<AppState>,
    request: ScanRequest,
    dry_run: bool,
) -> Result<RouteSummary, AppError> {
    let files = scan(&state, request).await?;

    let settings = state.settings.read().await.clone();
    let movies = settings
        .movies_dir
        .clone()
        .ok_or_else(|| AppError::bad_request("no movies directory configured"))?;
    let shows = settings
        .shows_dir
        .clone()
        .ok_or_else(|| AppError::bad_request("no shows directory configured"))?;

    let mut organizer =
        FileOrganizer::new(LibraryLayout::new(movies, shows)).dry_run(dry_run);
    if let Some(review) = settings.review_dir.clone() {
        organizer = organizer.with_review_dir(review);
    }
    if let Some(key) = settings.effective_api_key() {
        match TmdbProvider::new(key) {
            Ok(provider) => {
                let provider: Arc<dyn MetadataProvider> = Arc::new(provider);
                organizer = organizer.with_provider(provider);
            }
            Err(e) => warn!("TMDB client unavailable, continuing without: {e}"),
        }
    }

    Ok(organizer.organize(files).await)
}
