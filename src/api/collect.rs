use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{Duration, Utc};
use std::collections::HashMap;

use crate::{
    api::dtos::{CollectRequest, CollectResponse, StatsQuery, StatsResponse},
    app_state::AppState,
    auth::{dtos::ErrorResponse, middleware::AuthenticatedUser},
    collector,
};

/// `POST /api/collect` — run collection for one source or all active ones.
pub async fn collect(
    _auth_user: AuthenticatedUser,
    State(state): State<AppState>,
    Json(payload): Json<CollectRequest>,
) -> Response {
    let outcomes = match payload.source_id {
        Some(source_id) => {
            let source = match state.sources.get(source_id).await {
                Ok(Some(source)) => source,
                Ok(None) => {
                    return (
                        StatusCode::NOT_FOUND,
                        Json(ErrorResponse {
                            error: "Source not found".to_string(),
                        }),
                    )
                        .into_response();
                }
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
            vec![
                collector::collect_source(
                    state.sources.as_ref(),
                    state.items.as_ref(),
                    &source,
                    payload.force_refresh,
                )
                .await,
            ]
        }
        None => {
            collector::collect_all(
                state.sources.as_ref(),
                state.items.as_ref(),
                payload.force_refresh,
            )
            .await
        }
    };

    (
        StatusCode::OK,
        Json(CollectResponse::from_outcomes(outcomes)),
    )
        .into_response()
}

/// `GET /api/collect?timeframe=24h|7d|30d|all` — aggregate pipeline stats.
pub async fn stats(
    _auth_user: AuthenticatedUser,
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> Response {
    let timeframe = query.timeframe.unwrap_or_else(|| "24h".to_string());
    let since = match timeframe.as_str() {
        "24h" => Some(Utc::now() - Duration::hours(24)),
        "7d" => Some(Utc::now() - Duration::days(7)),
        "30d" => Some(Utc::now() - Duration::days(30)),
        "all" => None,
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: format!("Unknown timeframe '{timeframe}'"),
                }),
            )
                .into_response();
        }
    };

    let sources = match state.sources.list(false).await {
        Ok(sources) => sources,
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

    let items_collected = match state.items.count_since(since).await {
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

    let status_counts: HashMap<_, _> = match state.curation.status_counts(since).await {
        Ok(counts) => counts.into_iter().collect(),
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
        Json(StatsResponse {
            timeframe,
            sources_total: sources.len(),
            sources_active: sources.iter().filter(|s| s.active).count(),
            items_collected,
            status_counts,
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_state::test_support::MockParts;
    use crate::auth::jwt::JwtService;
    use crate::config::Config;
    use crate::entities::CurationStatus;
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Request, header::AUTHORIZATION},
        routing::{get, post},
    };
    use tower::ServiceExt;
    use uuid::Uuid;

    fn token() -> String {
        let config = Config::from_env().expect("Failed to load config");
        JwtService::new(config.jwt_secret())
            .generate_token(Uuid::new_v4())
            .expect("Failed to generate token")
    }

    fn app(state: AppState) -> Router {
        Router::new()
            .route("/collect", post(collect).get(stats))
            .with_state(state)
    }

    #[tokio::test]
    async fn collect_unknown_source_is_404() {
        let mut parts = MockParts::default();
        parts.sources.expect_get().returning(|_| Ok(None));
        let app = app(parts.into_state());

        let request = Request::builder()
            .method("POST")
            .uri("/collect")
            .header(AUTHORIZATION, format!("Bearer {}", token()))
            .header("content-type", "application/json")
            .body(Body::from(
                serde_json::json!({"source_id": Uuid::new_v4()}).to_string(),
            ))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn collect_requires_auth() {
        let app = app(MockParts::default().into_state());

        let request = Request::builder()
            .method("POST")
            .uri("/collect")
            .header("content-type", "application/json")
            .body(Body::from("{}"))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn stats_rejects_unknown_timeframe() {
        let app = app(MockParts::default().into_state());

        let request = Request::builder()
            .method("GET")
            .uri("/collect?timeframe=yesterday")
            .header(AUTHORIZATION, format!("Bearer {}", token()))
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn stats_aggregates_counts() {
        let mut parts = MockParts::default();
        parts.sources.expect_list().returning(|_| Ok(Vec::new()));
        parts.items.expect_count_since().returning(|_| Ok(42));
        parts
            .curation
            .expect_status_counts()
            .returning(|_| Ok(vec![(CurationStatus::Pending, 7), (CurationStatus::Published, 3)]));
        let app = app(parts.into_state());

        let request = Request::builder()
            .method("GET")
            .uri("/collect?timeframe=7d")
            .header(AUTHORIZATION, format!("Bearer {}", token()))
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["items_collected"], 42);
        assert_eq!(json["status_counts"]["pending"], 7);
        assert_eq!(json["status_counts"]["published"], 3);
    }
}
