// src/web.rs

use crate::analysis::analyze;
use crate::cancellation::CancellationToken;
use crate::completion::{generate_code, CompletionClient, GeneratedCode, OpenAiClient};
use crate::config::Config;
use crate::core_types::ProjectSummary;
use crate::css_report::CssReport;
use crate::errors::{io_error_with_path, Error};
use crate::pipeline;
use crate::project::{ProjectStore, UploadedFile};
use anyhow::Context;
use axum::{
    extract::{DefaultBodyLimit, Json, Multipart, Path, State},
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use rust_embed::RustEmbed;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

#[derive(RustEmbed)]
#[folder = "assets/"]
struct Assets;

/// Extra room on top of the upload limit for multipart framing.
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

// --- Shared State ---

/// State shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: ProjectStore,
    pub client: Arc<dyn CompletionClient>,
    /// Cancelled on server shutdown; aborts in-flight completions.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(config: Config, client: Arc<dyn CompletionClient>) -> Self {
        Self {
            store: ProjectStore::new(Arc::new(config)),
            client,
            shutdown: CancellationToken::new(),
        }
    }

    /// State backed by the OpenAI-compatible client described in `config`.
    pub fn from_config(config: Config) -> crate::errors::Result<Self> {
        let client = OpenAiClient::new(&config.completion)?;
        Ok(Self::new(config, Arc::new(client)))
    }

    fn config(&self) -> &Config {
        self.store.config()
    }
}

// --- Request / Response Structs ---

#[derive(Deserialize, Serialize, Debug)]
pub struct GenerateCodeRequest {
    #[serde(default)]
    pub prompt: String,
}

#[derive(Deserialize, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct GenerateCssRequest {
    pub project_id: String,
    #[serde(default, alias = "userInstructions")]
    pub instructions: Option<String>,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct GithubImportRequest {
    pub url: String,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ProjectCreatedResponse {
    pub project_id: String,
    pub summary: ProjectSummary,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct GenerateCssResponse {
    pub css: String,
    pub download_url: String,
    pub summary: ProjectSummary,
    pub report: CssReport,
}

#[derive(Serialize)]
pub struct FeaturesResponse {
    pub github: bool,
}

// --- Errors ---

/// An error rendered as `{"error": "..."}` with a matching status code.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

/// Maps a pipeline error to its HTTP status.
pub fn status_for(error: &Error) -> StatusCode {
    match error {
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        Error::Conflict(_) => StatusCode::CONFLICT,
        Error::Config(_) | Error::InvalidUpload(_) => StatusCode::BAD_REQUEST,
        Error::Generation(_) | Error::Fetch(_) => StatusCode::BAD_GATEWAY,
        Error::Analysis(inner) => status_for(inner),
        Error::Io { .. } | Error::Archive(_) | Error::Interrupted => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let status = status_for(&error);
        if status.is_server_error() {
            log::error!("Request failed: {}", error);
        } else {
            log::debug!("Request rejected: {}", error);
        }
        Self {
            status,
            message: error.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

// --- Server Startup ---

pub fn create_router(state: AppState) -> Router {
    let body_limit = usize::try_from(state.config().max_upload_size)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD);

    let router = Router::new()
        .route("/api/upload", post(upload_handler))
        .route("/api/generate", post(generate_code_handler))
        .route("/api/generate-css", post(generate_css_handler))
        .route("/api/projects/:id", get(project_summary_handler))
        .route("/api/download/:id", get(download_handler))
        .route("/api/features", get(features_handler));

    #[cfg(feature = "github")]
    let router = router.route("/api/github", post(github_import_handler));

    router
        .fallback(static_handler)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start_server(state: AppState, port: u16, open_browser: bool) -> anyhow::Result<()> {
    let shutdown = state.shutdown.clone();
    let app = create_router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let url = format!("http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    println!("✨ AutoCSS Studio running at {}", url);

    if open_browser {
        if let Err(e) = open::that(&url) {
            log::warn!("Could not open a browser: {}", e);
        }
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;
    log::info!("Server stopped");
    Ok(())
}

// --- Handlers ---

async fn static_handler(uri: Uri) -> impl IntoResponse {
    let mut path = uri.path().trim_start_matches('/').to_string();
    if path.is_empty() {
        path = "index.html".to_string();
    }
    match Assets::get(&path) {
        Some(content) => {
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            ([(header::CONTENT_TYPE, mime.as_ref())], content.data).into_response()
        }
        None => (StatusCode::NOT_FOUND, "404 Not Found").into_response(),
    }
}

async fn features_handler() -> Json<FeaturesResponse> {
    Json(FeaturesResponse {
        github: cfg!(feature = "github"),
    })
}

async fn summary_of(state: &AppState, project_id: &str) -> crate::errors::Result<ProjectSummary> {
    let root = state.store.project_root(project_id).await?;
    analyze(&root, state.config()).await
}

/// Accepts a single file or a whole folder. Each file part's file name is
/// taken as its path relative to the project root.
async fn upload_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<ProjectCreatedResponse>> {
    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::InvalidUpload(e.to_string()))?
    {
        let Some(name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let bytes = field
            .bytes()
            .await
            .map_err(|e| Error::InvalidUpload(format!("Failed to read '{}': {}", name, e)))?;
        files.push(UploadedFile::new(name, bytes.to_vec()));
    }

    let project_id = state.store.materialize(files).await?;
    let summary = summary_of(&state, &project_id).await?;
    Ok(Json(ProjectCreatedResponse {
        project_id,
        summary,
    }))
}

#[cfg(feature = "github")]
async fn github_import_handler(
    State(state): State<AppState>,
    Json(req): Json<GithubImportRequest>,
) -> ApiResult<Json<ProjectCreatedResponse>> {
    let project_id = crate::github::import_into_store(req.url.trim(), &state.store).await?;
    let summary = summary_of(&state, &project_id).await?;
    Ok(Json(ProjectCreatedResponse {
        project_id,
        summary,
    }))
}

async fn generate_code_handler(
    State(state): State<AppState>,
    Json(req): Json<GenerateCodeRequest>,
) -> ApiResult<Json<GeneratedCode>> {
    if req.prompt.trim().is_empty() {
        return Err(ApiError::bad_request("Prompt is required"));
    }
    let generated = generate_code(
        &req.prompt,
        state.client.as_ref(),
        &state.config().completion,
        &state.shutdown,
    )
    .await?;
    Ok(Json(generated))
}

async fn generate_css_handler(
    State(state): State<AppState>,
    Json(req): Json<GenerateCssRequest>,
) -> ApiResult<Json<GenerateCssResponse>> {
    let outcome = pipeline::generate_project_css(
        &state.store,
        &req.project_id,
        req.instructions.as_deref(),
        state.client.as_ref(),
        &state.shutdown,
    )
    .await?;
    let generated = outcome.generated;
    Ok(Json(GenerateCssResponse {
        css: generated.css,
        download_url: format!("/api/download/{}", req.project_id),
        summary: generated.summary,
        report: generated.report,
    }))
}

async fn project_summary_handler(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> ApiResult<Json<ProjectSummary>> {
    Ok(Json(summary_of(&state, &project_id).await?))
}

/// Zips the enhanced project, streams it back and deletes the archive.
async fn download_handler(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> ApiResult<Response> {
    let zip_path = pipeline::build_archive(&state.store, &project_id).await?;
    let bytes = tokio::fs::read(&zip_path)
        .await
        .map_err(|e| io_error_with_path(e, &zip_path))?;
    if let Err(e) = tokio::fs::remove_file(&zip_path).await {
        log::warn!("Failed to delete archive '{}': {}", zip_path.display(), e);
    }

    let disposition = format!(
        "attachment; filename=\"autocss-enhanced-{}.zip\"",
        project_id
    );
    Ok((
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}
