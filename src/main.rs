use std::net::SocketAddr;

use newsdesk::{
    app_state::AppState,
    config::Config,
    middleware::{RateLimit, rate_limit_middleware},
};
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(config.database_url())
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    let bind_addr = config.bind_addr().to_string();
    let state = AppState::new(pool, config);

    let rate_limit = RateLimit::new(300, 60);
    let app = newsdesk::app(state).layer(axum::middleware::from_fn_with_state(
        rate_limit,
        rate_limit_middleware,
    ));

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(addr = %bind_addr, "newsdesk listening");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
