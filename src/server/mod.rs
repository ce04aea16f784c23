pub mod router;
pub mod state;

use std::future::IntoFuture;

use crate::config::SseConfig;
use crate::error::{Result, SseError};
use crate::stream::FilteredSseStream;

/// Start the HTTP server with the given configuration.
///
/// Runs until Ctrl-C; open event streams are cut when the server stops.
pub async fn start(config: &SseConfig) -> Result<()> {
    let provider = config.provider.connect().await?;
    tracing::info!(provider = provider.name(), channel = %config.channel, "Initialized stream");

    let stream = FilteredSseStream::new(config.channel.clone(), provider);
    let app_state = state::AppState::new(stream, config.header_overrides()?, config.retry_ms)
        .with_keep_alive(config.keep_alive());
    let app = router::build(app_state);

    let bind_addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| SseError::Server(format!("Failed to bind to {bind_addr}: {e}")))?;

    tracing::info!("Server listening on {bind_addr}");

    // Event streams never end on their own, so there is no graceful drain
    tokio::select! {
        result = axum::serve(listener, app).into_future() => {
            result.map_err(|e| SseError::Server(format!("Server error: {e}")))?;
        }
        _ = shutdown_signal() => {}
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
