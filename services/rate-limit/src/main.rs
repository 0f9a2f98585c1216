use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use edge_rate_limit::{create_router, telemetry, ApiState, RateLimitConfig, RateLimiter};

#[tokio::main]
async fn main() -> Result<()> {
    let config = RateLimitConfig::from_env()?;
    init_tracing(&config.log_level)?;

    info!(
        host = %config.server_host,
        port = config.server_port,
        interval_ms = config.refresh_interval_ms,
        usage_estimator = %config.usage_estimator_endpoint,
        emails = %config.emails_endpoint,
        ownership_db = %config.ownership_db_path.display(),
        "starting rate-limit service"
    );

    let metrics = telemetry::setup_metrics()?;
    let limiter = RateLimiter::from_config(&config)?;
    limiter.start().await;

    let addr: SocketAddr = config
        .listen_addr()
        .parse()
        .context("invalid listen address")?;
    let state = Arc::new(ApiState::new(limiter.clone(), config).with_metrics(metrics));
    let router = create_router(state);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    limiter.stop();
    info!("rate-limit service shutting down");
    Ok(())
}

fn init_tracing(default_level: &str) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install CTRL+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
