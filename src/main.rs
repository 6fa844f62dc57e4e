use anyhow::Context;
use dotenv::dotenv;
use tokio::sync::broadcast;
use tracing::info;

mod app;
mod app_state;
mod config;
mod db;
mod error;
mod middleware;
mod modules;
mod scheduling;
mod telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    telemetry::init_telemetry()?;

    let env = config::init()?.clone();

    let pool = db::init_pool().await.context("Failed to initialize database pool")?;

    // Event channel the external real-time delivery layer subscribes to.
    let (events_tx, _) = broadcast::channel(256);

    let state = app_state::AppState::new(pool, env.clone(), events_tx);
    let app = app::create_router(state);

    let addr = env.server_addr();
    info!("{} listening on {}", env.app.name, addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .await
        .context("Failed to serve application")?;

    Ok(())
}
