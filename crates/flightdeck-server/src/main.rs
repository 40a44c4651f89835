use tracing_subscriber::EnvFilter;

use flightdeck_server::config::load_config;
use flightdeck_server::routers::app_router;
use flightdeck_server::scheduler::CleanupScheduler;
use flightdeck_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cfg = load_config()?;
    cfg.validate()?;

    let state = AppState::init(&cfg).await?;

    let scheduler = CleanupScheduler::new(
        cfg.cleanup.clone(),
        state.users.clone(),
        state.memory.clone(),
        state.clock.clone(),
    );
    scheduler.start();

    let app = app_router(state);

    let addr = cfg.server.bind.clone();
    tracing::info!("flightdeck-server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.stop();

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
