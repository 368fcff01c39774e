use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};
use sf_core::{ArticleStatus, ArticleSubmission, StoredArticle};
use std::sync::Arc;

use crate::error::ApiError;
use crate::AppState;

pub async fn fetch_news(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let report = state.ingestor.ingest().await?;
    Ok(Json(json!({
        "message": format!("{} news articles fetched and stored.", report.fetched)
    })))
}

pub async fn add_news(
    State(state): State<Arc<AppState>>,
    Json(submission): Json<ArticleSubmission>,
) -> Result<Json<Value>, ApiError> {
    let status = state.ingestor.submit(submission).await?;
    let message = match status {
        ArticleStatus::New | ArticleStatus::Updated => "Article added/updated.",
        ArticleStatus::Unchanged => "No changes made, article already up to date.",
    };
    Ok(Json(json!({ "message": message, "status": status })))
}

pub async fn list_news(State(state): State<Arc<AppState>>) -> Result<Json<Vec<StoredArticle>>, ApiError> {
    Ok(Json(state.ingestor.list().await?))
}

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.ingestor.storage().count_articles().await {
        Ok(count) => (
            StatusCode::OK,
            Json(json!({ "status": "ok", "source": state.ingestor.source_name(), "articles": count })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unavailable", "error": e.to_string() })),
            )
        }
    }
}
