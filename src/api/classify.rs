use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::time::Duration;

use crate::{
    api::dtos::{ClassifyInfoResponse, ClassifyRequest},
    app_state::AppState,
    auth::{dtos::ErrorResponse, middleware::AuthenticatedUser},
    classifier::{self, ClassifyTarget},
};

/// `POST /api/classify` — classify one item or a batch of unclassified ones.
pub async fn classify(
    _auth_user: AuthenticatedUser,
    State(state): State<AppState>,
    Json(payload): Json<ClassifyRequest>,
) -> Response {
    let target = match payload.news_id {
        Some(id) => ClassifyTarget::Single(id),
        None => ClassifyTarget::Batch(
            payload
                .batch_size
                .unwrap_or_else(|| state.config.classify_batch_size()),
        ),
    };

    let report = classifier::run(
        state.chat.as_ref(),
        state.items.as_ref(),
        state.curation.as_ref(),
        state.categories.as_ref(),
        state.config.fallback_category(),
        Duration::from_millis(state.config.classify_delay_ms()),
        target,
    )
    .await;

    match report {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response(),
    }
}

/// `GET /api/classify` — how much is waiting, and into which categories.
pub async fn info(_auth_user: AuthenticatedUser, State(state): State<AppState>) -> Response {
    let unclassified_count = match state.items.unclassified_count().await {
        Ok(count) => count,
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Database error".to_string(),
                }),
            )
                .into_response();
        }
    };

    let categories = match state.categories.list_active().await {
        Ok(categories) => categories,
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Database error".to_string(),
                }),
            )
                .into_response();
        }
    };

    (
        StatusCode::OK,
        Json(ClassifyInfoResponse {
            unclassified_count,
            categories,
        }),
    )
        .into_response()
}
