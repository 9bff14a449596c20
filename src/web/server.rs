use axum::{
    extract::{DefaultBodyLimit, Query, State},
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tower::limit::ConcurrencyLimitLayer;
use tower::ServiceBuilder;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::timeout::TimeoutLayer;
use tracing::{info, warn};

use crate::catalog::store::{CatalogStore, SystemSummary};
use crate::cli::{ServeArgs, Workspace};
use crate::core::types::SystemId;
use crate::verify::{FileHasher, VerificationEngine, VerificationReport, VerificationRequest};

/// Maximum number of files accepted by one verify request
pub const MAX_VERIFY_FILES: usize = 1000;

/// Maximum request body size
pub const MAX_BODY_SIZE: usize = 1024 * 1024;

/// Upper bound on one request, hashing included
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Shared application state
///
/// The store sits behind one async mutex so a verification pass never
/// overlaps another pass.
pub struct AppState {
    pub store: Mutex<CatalogStore>,
}

impl AppState {
    pub fn new(store: CatalogStore) -> Self {
        Self {
            store: Mutex::new(store),
        }
    }
}

/// Enhanced error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_type: String,
    pub details: Option<String>,
}

#[derive(Deserialize)]
pub struct GamesQuery {
    pub system: String,
}

#[derive(Serialize)]
pub struct GamesResponse {
    pub system_id: SystemId,
    pub count: usize,
    pub games: Vec<String>,
}

#[derive(Serialize)]
pub struct SystemsResponse {
    pub count: usize,
    pub systems: Vec<SystemSummary>,
}

/// Create an error response carrying only a fixed, client-safe message
pub fn create_safe_error_response(error_type: &str, user_message: &str) -> ErrorResponse {
    ErrorResponse {
        error: user_message.to_string(),
        error_type: error_type.to_string(),
        details: None,
    }
}

fn error_reply(status: StatusCode, error_type: &str, user_message: &str) -> Response {
    (
        status,
        Json(create_safe_error_response(error_type, user_message)),
    )
        .into_response()
}

/// Run the web server
///
/// # Errors
///
/// Returns an error if the tokio runtime cannot be created, the catalogs
/// cannot be prepared, or the server fails to start.
pub fn run(args: ServeArgs, workspace: &Workspace) -> anyhow::Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move { run_server(args, workspace).await })
}

/// Create the application router with all routes and middleware configured.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/systems", get(systems_handler))
        .route("/api/games", get(games_handler))
        .route("/api/verify", post(verify_handler))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(SetResponseHeaderLayer::if_not_present(
                    HeaderName::from_static("x-content-type-options"),
                    HeaderValue::from_static("nosniff"),
                ))
                .layer(SetResponseHeaderLayer::if_not_present(
                    HeaderName::from_static("x-frame-options"),
                    HeaderValue::from_static("DENY"),
                ))
                .layer(SetResponseHeaderLayer::if_not_present(
                    HeaderName::from_static("referrer-policy"),
                    HeaderValue::from_static("no-referrer"),
                ))
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    REQUEST_TIMEOUT,
                ))
                .layer(ConcurrencyLimitLayer::new(16))
                .layer(DefaultBodyLimit::max(MAX_BODY_SIZE)),
        )
}

async fn run_server(args: ServeArgs, workspace: &Workspace) -> anyhow::Result<()> {
    let (store, _) = workspace.load().await?;
    let app = create_router(Arc::new(AppState::new(store)));

    let addr = format!("{}:{}", args.address, args.port);
    println!("Starting dump-verifier API at http://{addr}");

    if args.open {
        let _ = open::that(format!("http://{addr}/api/systems"));
    }

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// List loaded systems for a system selector
pub async fn systems_handler(State(state): State<Arc<AppState>>) -> Json<SystemsResponse> {
    let systems = state.store.lock().await.get_all_systems();
    Json(SystemsResponse {
        count: systems.len(),
        systems,
    })
}

/// List entry names of one system for a game selector
pub async fn games_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<GamesQuery>,
) -> Response {
    let system_id = SystemId::new(query.system);
    let store = state.store.lock().await;

    if store.get(&system_id).is_none() {
        return error_reply(StatusCode::NOT_FOUND, "unknown_system", "Unknown system");
    }

    let games: Vec<String> = store
        .get_entries(&system_id)
        .iter()
        .map(|e| e.name.clone())
        .collect();

    Json(GamesResponse {
        system_id,
        count: games.len(),
        games,
    })
    .into_response()
}

/// Verify server-local files
pub async fn verify_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<VerificationRequest>,
) -> Response {
    if request.file_paths.is_empty() {
        return error_reply(StatusCode::BAD_REQUEST, "invalid_request", "No files given");
    }
    if request.file_paths.len() > MAX_VERIFY_FILES {
        return error_reply(
            StatusCode::PAYLOAD_TOO_LARGE,
            "too_many_files",
            &format!("At most {MAX_VERIFY_FILES} files per request"),
        );
    }

    let store = state.store.lock().await;
    if let Some(system_id) = &request.system_hint {
        if store.get(system_id).is_none() {
            warn!("API verification against unloaded system {system_id}");
        }
    }

    let hasher = FileHasher::new();
    let report: VerificationReport = VerificationEngine::new(&store, &hasher).verify(&request).await;
    info!(
        "API verification: {}/{} files matched",
        report.successful, report.total
    );

    Json(report).into_response()
}
