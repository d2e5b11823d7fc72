use anyhow::{Context, Result};
use tracing::info;
use weesee::{create_router, AppState, Config};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cfg = Config::load("config/weesee")?;

    info!("WeeSee tracker v0.1.0");
    info!("Loaded config: {}", cfg.service.name);
    info!("Progress reports go to {}", cfg.tracker.tracking_endpoint);
    info!(
        "Sampling every {}s (progress) / {}s (emotion), close gate at {:.0}%",
        cfg.tracker.progress_interval_secs,
        cfg.tracker.emotion_interval_secs,
        cfg.tracker.close_threshold_percent
    );

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("HTTP server listening on {}", addr);

    axum::serve(listener, create_router(AppState::new()))
        .await
        .context("HTTP server failed")?;

    Ok(())
}
