use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use portal_metrics::config::Settings;
use portal_metrics::sampler::PerformanceSampler;
use portal_metrics::{server, telemetry, AppState};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Settings & logging ────────────────────────────────────
    let settings = Settings::load(None)?;
    telemetry::init(&settings.log)?;

    // ── 2. Build shared state ────────────────────────────────────
    let bind_addr = settings.server.bind_addr.clone();
    let sample_every = Duration::from_secs(settings.metrics.sample_interval_secs);
    let state = Arc::new(AppState::new(settings));

    // ── 3. Start periodic performance sampling ───────────────────
    let sampler = PerformanceSampler::spawn(state.metrics.clone(), sample_every);

    // ── 4. Build Axum router ─────────────────────────────────────
    let app = server::create_router(state);

    // ── 5. Bind & serve ──────────────────────────────────────────
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind to {bind_addr}"))?;

    info!("Server listening on http://{bind_addr}");
    info!("Metrics summary → http://{bind_addr}/api/monitoring/metrics");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server exited with error")?;

    // ── 6. Stop sampling ─────────────────────────────────────────
    sampler.shutdown().await;
    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
