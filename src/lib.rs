pub mod api;
pub mod app_state;
pub mod auth;
pub mod classifier;
pub mod collector;
pub mod config;
pub mod curation;
pub mod entities;
pub mod fetcher;
pub mod health;
pub mod middleware;
pub mod passwords;
pub mod reprocess;
pub mod repositories;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use app_state::AppState;

/// Assemble the HTTP surface. Everything under `/api` requires a bearer
/// token (enforced by the `AuthenticatedUser` extractor in each handler);
/// login and the health probe stay public.
pub fn app(state: AppState) -> Router {
    let admin = Router::new()
        .route("/collect", post(api::collect::collect).get(api::collect::stats))
        .route("/classify", post(api::classify::classify).get(api::classify::info))
        .route("/curation", get(api::curation::list).post(api::curation::action))
        .route("/curation/bulk-delete", post(api::curation::bulk_delete))
        .route("/curation/historical", post(api::curation::historical))
        .route(
            "/curation/sources-historical",
            post(api::curation::sources_historical),
        )
        .route(
            "/curation/{id}",
            get(api::curation::detail)
                .put(api::curation::transition)
                .delete(api::curation::delete),
        )
        .route("/news-sources", get(api::sources::list).post(api::sources::create))
        .route(
            "/news-sources/{id}",
            get(api::sources::get_one)
                .put(api::sources::update)
                .delete(api::sources::delete),
        );

    Router::new()
        .route("/healthz", get(health::health_check))
        .route("/auth/login", post(auth::handlers::login))
        .nest("/api", admin)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state)
}
