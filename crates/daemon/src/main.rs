#![forbid(unsafe_code)]

use bark_daemon::config::Args;
use bark_daemon::http::{self, AppState};
use bark_daemon::service::Services;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Args::parse().into_config();

    tracing_subscriber::registry()
        .with(EnvFilter::new(&config.log))
        .with(tracing_subscriber::fmt::layer())
        .init();

    config.validate()?;
    info!(?config, "bark daemon starting");

    let services = Services::from_config(&config).await?;
    let app = http::router(AppState::new(&services, config.request_timeout));

    let listener = TcpListener::bind(config.listen).await?;
    info!(listen = %config.listen, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("bark daemon stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
