use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::{
    api::dtos::{CreateSourceRequest, DeleteSourceResponse, UpdateSourceRequest},
    app_state::AppState,
    auth::{dtos::ErrorResponse, middleware::AuthenticatedUser},
    entities::{NewSource, SourceUpdate},
};

fn db_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: "Database error".to_string(),
        }),
    )
        .into_response()
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: "Source not found".to_string(),
        }),
    )
        .into_response()
}

/// `GET /api/news-sources`
pub async fn list(_auth_user: AuthenticatedUser, State(state): State<AppState>) -> Response {
    match state.sources.list(false).await {
        Ok(sources) => (StatusCode::OK, Json(sources)).into_response(),
        Err(_) => db_error(),
    }
}

/// `POST /api/news-sources`
pub async fn create(
    _auth_user: AuthenticatedUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateSourceRequest>,
) -> Response {
    if let Err(error) = payload.validate() {
        return (StatusCode::BAD_REQUEST, Json(ErrorResponse { error })).into_response();
    }

    let new_source = NewSource {
        name: payload.name,
        url: payload.url,
        kind: payload.kind,
        active: payload.active,
        scraping_config: payload.scraping_config,
        fetch_interval_secs: payload.fetch_interval_secs.unwrap_or(3600),
    };

    match state.sources.create(new_source).await {
        Ok(source) => (StatusCode::CREATED, Json(source)).into_response(),
        Err(_) => db_error(),
    }
}

/// `GET /api/news-sources/{id}`
pub async fn get_one(
    _auth_user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Response {
    match state.sources.get(id).await {
        Ok(Some(source)) => (StatusCode::OK, Json(source)).into_response(),
        Ok(None) => not_found(),
        Err(_) => db_error(),
    }
}

/// `PUT /api/news-sources/{id}`
pub async fn update(
    _auth_user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateSourceRequest>,
) -> Response {
    if let Err(error) = payload.validate() {
        return (StatusCode::BAD_REQUEST, Json(ErrorResponse { error })).into_response();
    }

    let update = SourceUpdate {
        name: payload.name,
        url: payload.url,
        active: payload.active,
        scraping_config: payload.scraping_config,
        fetch_interval_secs: payload.fetch_interval_secs,
    };

    match state.sources.update(id, update).await {
        Ok(Some(source)) => (StatusCode::OK, Json(source)).into_response(),
        Ok(None) => not_found(),
        Err(_) => db_error(),
    }
}

/// `DELETE /api/news-sources/{id}` — a source that still owns scraped items
/// is deactivated instead of deleted.
pub async fn delete(
    _auth_user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Response {
    let source = match state.sources.get(id).await {
        Ok(Some(source)) => source,
        Ok(None) => return not_found(),
        Err(_) => return db_error(),
    };

    let item_count = match state.items.count_for_source(source.id).await {
        Ok(count) => count,
        Err(_) => return db_error(),
    };

    if item_count > 0 {
        let update = SourceUpdate {
            active: Some(false),
            ..Default::default()
        };
        return match state.sources.update(id, update).await {
            Ok(Some(_)) => (
                StatusCode::OK,
                Json(DeleteSourceResponse {
                    deleted: false,
                    deactivated: true,
                }),
            )
                .into_response(),
            Ok(None) => not_found(),
            Err(_) => db_error(),
        };
    }

    match state.sources.delete(id).await {
        Ok(true) => (
            StatusCode::OK,
            Json(DeleteSourceResponse {
                deleted: true,
                deactivated: false,
            }),
        )
            .into_response(),
        Ok(false) => not_found(),
        Err(_) => db_error(),
    }
}
