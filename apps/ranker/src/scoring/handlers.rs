//! Axum route handlers for the CV pool and scoring API.

use std::path::PathBuf;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::scoring::upload::{
    allowed_file, content_type, list_stored, resolve_stored, sanitize_filename, store,
};
use crate::scoring::{Flag, ScoreResult, Tier};
use crate::state::AppState;

/// Multipart field carrying CV files.
const UPLOAD_FIELD: &str = "cvs";

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub stored: Vec<String>,
    pub rejected: Vec<String>,
}

/// Optional upload-date range for the pool listing, `YYYY-MM-DD`, inclusive.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CvListResponse {
    pub cvs: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ScoreRequest {
    pub filename: String,
    #[serde(default)]
    pub jd_text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ScoreResponse {
    pub filename: String,
    pub score: f64,
    pub status: Tier,
    pub flags: Vec<Flag>,
    pub insights: Vec<String>,
    pub scored_at: DateTime<Utc>,
}

impl ScoreResponse {
    fn new(filename: String, result: ScoreResult) -> Self {
        Self {
            filename,
            status: result.tier(),
            score: result.score,
            flags: result.flags,
            insights: result.insights,
            scored_at: Utc::now(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RankRequest {
    #[serde(default)]
    pub jd_text: String,
    pub filenames: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RankResponse {
    pub results: Vec<ScoreResponse>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/cvs
pub async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), AppError> {
    let dir = &state.config.upload_dir;
    let mut stored = Vec::new();
    let mut rejected = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let original = field.file_name().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read upload '{original}': {e}")))?;

        let name = match sanitize_filename(&original) {
            Some(name) if allowed_file(&original) && allowed_file(&name) => name,
            _ => {
                warn!("Rejected upload '{original}'");
                rejected.push(original);
                continue;
            }
        };

        let saved = store(dir, &name, &data)
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to store '{name}': {e}")))?;
        stored.push(saved);
    }

    if stored.is_empty() && rejected.is_empty() {
        return Err(AppError::Validation(format!(
            "No files found in multipart field '{UPLOAD_FIELD}'"
        )));
    }

    info!("Stored {} CVs, rejected {}", stored.len(), rejected.len());
    Ok((StatusCode::CREATED, Json(UploadResponse { stored, rejected })))
}

/// GET /api/v1/cvs?date_from=&date_to=
pub async fn handle_list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<CvListResponse>, AppError> {
    if let (Some(from), Some(to)) = (query.date_from, query.date_to) {
        if from > to {
            return Err(AppError::Validation(format!(
                "date_from {from} is after date_to {to}"
            )));
        }
    }

    let cvs = list_stored(&state.config.upload_dir, query.date_from, query.date_to)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to list uploads: {e}")))?;
    Ok(Json(CvListResponse { cvs }))
}

/// GET /api/v1/cvs/:filename
///
/// Serves a stored CV inline with a content type matching its extension.
pub async fn handle_download(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let path = locate(&state, &filename)?;
    let data = tokio::fs::read(&path)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to read '{filename}': {e}")))?;

    let disposition = format!("inline; filename=\"{}\"", filename.replace('"', ""));
    Ok((
        [
            (header::CONTENT_TYPE, content_type(&filename).to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        data,
    ))
}

/// DELETE /api/v1/cvs/:filename
pub async fn handle_delete(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<StatusCode, AppError> {
    let path = locate(&state, &filename)?;
    tokio::fs::remove_file(&path)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to delete '{filename}': {e}")))?;
    info!("Deleted CV {filename}");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/score
pub async fn handle_score(
    State(state): State<AppState>,
    Json(req): Json<ScoreRequest>,
) -> Result<Json<ScoreResponse>, AppError> {
    let path = locate(&state, &req.filename)?;

    let engine = state.engine.clone();
    let result = tokio::task::spawn_blocking(move || engine.score(&path, &req.jd_text))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in scoring: {e}")))?;

    Ok(Json(ScoreResponse::new(req.filename, result)))
}

/// POST /api/v1/rank
///
/// Scores every listed CV against one job description, best first.
pub async fn handle_rank(
    State(state): State<AppState>,
    Json(req): Json<RankRequest>,
) -> Result<Json<RankResponse>, AppError> {
    if req.filenames.is_empty() {
        return Err(AppError::Validation("filenames must not be empty".to_string()));
    }

    let targets: Vec<(String, PathBuf)> = req
        .filenames
        .into_iter()
        .map(|name| locate(&state, &name).map(|path| (name, path)))
        .collect::<Result<_, _>>()?;

    let engine = state.engine.clone();
    let jd_text = req.jd_text;
    let mut results = tokio::task::spawn_blocking(move || {
        targets
            .into_iter()
            .map(|(name, path)| {
                let result = engine.score(&path, &jd_text);
                ScoreResponse::new(name, result)
            })
            .collect::<Vec<_>>()
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in ranking: {e}")))?;

    sort_ranked(&mut results);
    info!("Ranked {} CVs", results.len());
    Ok(Json(RankResponse { results }))
}

/// Highest score first, ties by file name.
fn sort_ranked(results: &mut [ScoreResponse]) {
    results.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.filename.cmp(&b.filename))
    });
}

fn locate(state: &AppState, filename: &str) -> Result<PathBuf, AppError> {
    let path = resolve_stored(&state.config.upload_dir, filename)
        .ok_or_else(|| AppError::Validation(format!("Invalid file name '{filename}'")))?;
    if !path.is_file() {
        return Err(AppError::NotFound(format!("CV {filename} not found")));
    }
    Ok(path)
}
