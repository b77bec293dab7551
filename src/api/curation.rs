use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::{
    api::dtos::{
        BulkDeleteRequest, BulkDeleteResponse, CurationActionRequest, CurationActionResponse,
        CurationDetailResponse, CurationListQuery, CurationListResponse,
        CurationTransitionRequest, HistoricalRequest, SourcesHistoricalRequest,
    },
    app_state::AppState,
    auth::{dtos::ErrorResponse, middleware::AuthenticatedUser},
    curation::CurationError,
    reprocess,
};

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

fn error_response(err: CurationError) -> Response {
    let status = match &err {
        CurationError::NotFound => StatusCode::NOT_FOUND,
        CurationError::InvalidTransition { .. } | CurationError::PublishedImmutable => {
            StatusCode::CONFLICT
        }
        CurationError::MissingField(_) => StatusCode::BAD_REQUEST,
        CurationError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
        .into_response()
}

/// `GET /api/curation?status&page&limit` — the curation queue.
pub async fn list(
    _auth_user: AuthenticatedUser,
    State(state): State<AppState>,
    Query(query): Query<CurationListQuery>,
) -> Response {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);

    match state.curation.list(query.status, page, limit).await {
        Ok((records, total)) => (
            StatusCode::OK,
            Json(CurationListResponse {
                records,
                total,
                page,
                limit,
            }),
        )
            .into_response(),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: "Database error".to_string(),
            }),
        )
            .into_response(),
    }
}

/// `POST /api/curation` — apply a state-machine transition.
pub async fn action(
    _auth_user: AuthenticatedUser,
    State(state): State<AppState>,
    Json(payload): Json<CurationActionRequest>,
) -> Response {
    let action = payload.data.into_action(payload.action);
    match state.curation_ctx().apply(payload.curation_id, action).await {
        Ok(outcome) => (
            StatusCode::OK,
            Json(CurationActionResponse {
                record: outcome.record,
                article: outcome.article,
            }),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

/// `GET /api/curation/{id}` — record plus the item it wraps.
pub async fn detail(
    _auth_user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Response {
    let record = match state.curation.get(id).await {
        Ok(Some(record)) => record,
        Ok(None) => return error_response(CurationError::NotFound),
        Err(e) => return error_response(CurationError::Storage(e)),
    };

    let item = match state.items.get(record.item_id).await {
        Ok(Some(item)) => item,
        Ok(None) => {
            return error_response(CurationError::Storage(anyhow::anyhow!(
                "item {} missing for record {}",
                record.item_id,
                record.id
            )));
        }
        Err(e) => return error_response(CurationError::Storage(e)),
    };

    (
        StatusCode::OK,
        Json(CurationDetailResponse { record, item }),
    )
        .into_response()
}

/// `PUT /api/curation/{id}` — transition with the id in the path.
pub async fn transition(
    _auth_user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CurationTransitionRequest>,
) -> Response {
    let action = payload.data.into_action(payload.action);
    match state.curation_ctx().apply(id, action).await {
        Ok(outcome) => (
            StatusCode::OK,
            Json(CurationActionResponse {
                record: outcome.record,
                article: outcome.article,
            }),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

/// `DELETE /api/curation/{id}` — refuse for published records.
pub async fn delete(
    _auth_user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Response {
    match state.curation_ctx().delete(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(err),
    }
}

/// `POST /api/curation/bulk-delete` — all-or-nothing over the id set.
pub async fn bulk_delete(
    _auth_user: AuthenticatedUser,
    State(state): State<AppState>,
    Json(payload): Json<BulkDeleteRequest>,
) -> Response {
    if payload.ids.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "No ids supplied".to_string(),
            }),
        )
            .into_response();
    }

    match state.curation_ctx().bulk_delete(payload.ids).await {
        Ok(deleted) => (StatusCode::OK, Json(BulkDeleteResponse { deleted })).into_response(),
        Err(err) => error_response(err),
    }
}

/// `POST /api/curation/historical` — re-ingest published articles.
pub async fn historical(
    _auth_user: AuthenticatedUser,
    State(state): State<AppState>,
    Json(payload): Json<HistoricalRequest>,
) -> Response {
    if payload.end_date < payload.start_date {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "end_date precedes start_date".to_string(),
            }),
        )
            .into_response();
    }

    let report = reprocess::from_articles(
        state.sources.as_ref(),
        state.items.as_ref(),
        state.curation.as_ref(),
        state.articles.as_ref(),
        payload.start_date,
        payload.end_date,
        payload.category_id,
        payload.limit,
    )
    .await;

    match report {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: "Database error".to_string(),
            }),
        )
            .into_response(),
    }
}

/// `POST /api/curation/sources-historical` — re-queue scraped items.
pub async fn sources_historical(
    _auth_user: AuthenticatedUser,
    State(state): State<AppState>,
    Json(payload): Json<SourcesHistoricalRequest>,
) -> Response {
    if payload.end_date < payload.start_date {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "end_date precedes start_date".to_string(),
            }),
        )
            .into_response();
    }

    let report = reprocess::from_source_items(
        state.items.as_ref(),
        state.curation.as_ref(),
        payload.start_date,
        payload.end_date,
        payload.source_ids,
        payload.reprocess_type,
        payload.limit,
    )
    .await;

    match report {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: "Database error".to_string(),
            }),
        )
            .into_response(),
    }
}
