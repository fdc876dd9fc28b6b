use std::sync::Arc;

use sqlx::PgPool;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api::app::build_router;
use api::auth::AuthConfig;
use api::services::notify::LogSink;
use api::state::AppState;
use infra::PgStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let pool = PgPool::connect(&std::env::var("DATABASE_URL")?).await?;
    infra::db::ping(&pool).await?;
    tracing::info!("Connected to Postgres");
    sqlx::migrate!("../infra/migrations").run(&pool).await?;

    let auth_config = AuthConfig::from_env()?;
    let state = AppState::new(
        Arc::new(PgStore::new(pool)),
        Arc::new(LogSink),
        auth_config,
    );

    let app = build_router(state);

    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "8080".into())
        .parse()?;
    let addr = format!("0.0.0.0:{port}");
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
