use crate::charts::build_batch_dashboard;
use crate::errors::AppError;
use crate::models::{ActivityBatch, DashboardQuery, DashboardResponse};
use crate::state::AppState;
use crate::ui::render_index;
use axum::{
    extract::{Path, Query, State},
    http::{header::AUTHORIZATION, HeaderMap},
    response::Html,
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use tracing::info;

pub async fn index() -> Html<String> {
    Html(render_index(None))
}

pub async fn user_page(Path(username): Path<String>) -> Result<Html<String>, AppError> {
    let username = require_username(&username)?;
    Ok(Html(render_index(Some(username))))
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn get_dashboard(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<DashboardResponse>, AppError> {
    let batch = state.source.fetch_all().await?;
    Ok(Json(dashboard_for(&state, &batch, query)))
}

pub async fn get_user_dashboard(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(query): Query<DashboardQuery>,
    headers: HeaderMap,
) -> Result<Json<DashboardResponse>, AppError> {
    let username = require_username(&username)?;
    let batch = state
        .source
        .fetch_for_user(username, headers.get(AUTHORIZATION))
        .await?;
    Ok(Json(dashboard_for(&state, &batch, query)))
}

fn dashboard_for(state: &AppState, batch: &ActivityBatch, query: DashboardQuery) -> DashboardResponse {
    let dashboard = build_batch_dashboard(
        batch,
        query.unit,
        state.min_trailing_days,
        Utc::now().date_naive(),
    );
    info!(
        records = dashboard.summary.record_count,
        skipped = dashboard.summary.skipped_records,
        sites = dashboard.time_by_site.labels.len(),
        "built dashboard"
    );
    dashboard
}

fn require_username(username: &str) -> Result<&str, AppError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(AppError::bad_request("username must not be empty"));
    }
    Ok(username)
}
