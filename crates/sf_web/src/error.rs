use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use sf_core::Error;

/// Maps a core error onto the flat `{"error": ...}` payload.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            Error::Feed { .. } | Error::Http(_) => {
                tracing::warn!("News feed request failed: {}", self.0);
                (StatusCode::BAD_GATEWAY, "Failed to fetch news from NewsAPI".to_string())
            }
            Error::InvalidArticle(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
            _ => {
                tracing::error!("Request failed: {}", self.0);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
