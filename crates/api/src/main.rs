use anyhow::Context;

use calendar_infra::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    calendar_observability::init();

    let config = AppConfig::from_env().context("invalid configuration")?;

    let app = calendar_api::app::build_app(&config.store)
        .await
        .context("failed to build services")?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
    }
}
