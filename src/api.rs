// src/api.rs

//! HTTP surface around the notice store.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::AppError;
use crate::models::Notice;
use crate::pipeline::run_check;
use crate::services::NoticeSource;
use crate::storage::NoticeStore;

/// Shared state injected into every handler.
#[derive(Clone)]
pub struct AppState {
    store: Arc<NoticeStore>,
    source: Arc<dyn NoticeSource>,
    service_name: String,
}

impl AppState {
    pub fn new(
        store: Arc<NoticeStore>,
        source: Arc<dyn NoticeSource>,
        service_name: impl Into<String>,
    ) -> Self {
        Self {
            store,
            source,
            service_name: service_name.into(),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/api/notices", get(check_notices))
        .route("/api/notices/all", get(all_notices))
        .route("/api/notices/reset", post(reset_notices))
        .route("/api/stats", get(stats))
        .route("/api/backup", post(backup))
        .route("/api/restore", post(restore))
        .route("/api/health", get(health))
        .with_state(state)
}

/// Any failure is reported as `{status: "error", message}`.
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<AppError> for ApiError {
    fn from(e: AppError) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    }
}

/// Bad request bodies keep axum's status code (400, 415 or 422).
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "status": "error", "message": self.message }));
        (self.status, body).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Serialize)]
struct CheckResp {
    status: &'static str,
    total_count: usize,
    saved_count: usize,
    new_count: usize,
    has_updates: bool,
    last_update: Option<DateTime<Utc>>,
    message: String,
    data: Vec<Notice>,
}

async fn check_notices(State(state): State<AppState>) -> ApiResult<CheckResp> {
    let outcome = run_check(&*state.source, &state.store)
        .await
        .inspect_err(|e| log::error!("Scraping error: {}", e))?;

    Ok(Json(CheckResp {
        status: "success",
        total_count: outcome.total_count,
        saved_count: outcome.saved_count,
        new_count: outcome.new_count(),
        has_updates: outcome.has_updates(),
        last_update: outcome.last_update,
        message: outcome.message(),
        data: outcome.new_notices,
    }))
}

#[derive(Serialize)]
struct AllResp {
    status: &'static str,
    count: usize,
    last_update: Option<DateTime<Utc>>,
    data: Vec<Notice>,
}

async fn all_notices(State(state): State<AppState>) -> ApiResult<AllResp> {
    let data = state.store.list_all().await;
    let last_update = state.store.last_update().await;

    Ok(Json(AllResp {
        status: "success",
        count: data.len(),
        last_update,
        data,
    }))
}

#[derive(Serialize)]
struct MessageResp {
    status: &'static str,
    message: String,
}

async fn reset_notices(State(state): State<AppState>) -> ApiResult<MessageResp> {
    let cleared = state
        .store
        .reset()
        .await
        .inspect_err(|e| log::error!("Error resetting notices: {}", e))?;

    Ok(Json(MessageResp {
        status: "success",
        message: format!("Cleared {cleared} notices from storage"),
    }))
}

#[derive(Serialize)]
struct StatsResp {
    status: &'static str,
    total_notices: usize,
    last_update: Option<DateTime<Utc>>,
    storage_file: String,
    storage_version: String,
}

async fn stats(State(state): State<AppState>) -> ApiResult<StatsResp> {
    let info = state.store.info().await;

    Ok(Json(StatsResp {
        status: "success",
        total_notices: info.count,
        last_update: info.last_update,
        storage_file: state.store.file_name().to_string(),
        storage_version: info.version,
    }))
}

#[derive(Serialize)]
struct BackupResp {
    status: &'static str,
    message: &'static str,
    backup_file: String,
}

async fn backup(State(state): State<AppState>) -> ApiResult<BackupResp> {
    let path = state
        .store
        .backup()
        .await
        .inspect_err(|e| log::error!("Error creating backup: {}", e))?;

    Ok(Json(BackupResp {
        status: "success",
        message: "Backup created successfully",
        backup_file: path.display().to_string(),
    }))
}

#[derive(Deserialize)]
struct RestoreReq {
    backup_file: String,
}

#[derive(Serialize)]
struct RestoreResp {
    status: &'static str,
    message: String,
    count: usize,
}

async fn restore(
    State(state): State<AppState>,
    payload: Result<Json<RestoreReq>, JsonRejection>,
) -> ApiResult<RestoreResp> {
    let Json(body) = payload?;
    let restored = state
        .store
        .restore(&body.backup_file)
        .await
        .inspect_err(|e| log::error!("Error restoring backup: {}", e))?;

    if !restored {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            format!("Backup {} could not be restored", body.backup_file),
        ));
    }

    Ok(Json(RestoreResp {
        status: "success",
        message: format!("Restored backup {}", body.backup_file),
        count: state.store.count().await,
    }))
}

async fn health(State(state): State<AppState>) -> Response {
    if let Err(e) = state.store.health_check().await {
        log::error!("Health check failed: {}", e);
        let body = Json(json!({
            "status": "error",
            "message": "Storage connection failed",
            "error": e.to_string(),
        }));
        return (StatusCode::INTERNAL_SERVER_ERROR, body).into_response();
    }

    let info = state.store.info().await;
    Json(json!({
        "status": "success",
        "message": "API is running",
        "timestamp": Utc::now(),
        "saved_notices_count": info.count,
        "storage_status": "connected",
        "storage_file": info.location.display().to_string(),
    }))
    .into_response()
}

async fn root(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "message": state.service_name,
        "version": env!("CARGO_PKG_VERSION"),
        "features": [
            "Web scraping with change detection",
            "JSON file-based persistent storage",
            "RESTful API endpoints",
            "Backup and restore",
        ],
        "endpoints": {
            "GET /api/notices": "Get new notices",
            "GET /api/notices/all": "Get all saved notices",
            "POST /api/notices/reset": "Reset saved data",
            "GET /api/stats": "Storage statistics",
            "POST /api/backup": "Create backup",
            "POST /api/restore": "Restore a backup",
            "GET /api/health": "Health check",
        },
        "status": "running",
    }))
}
