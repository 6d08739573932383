use tokio::signal;

/// Resolves on Ctrl+C so axum can drain in-flight requests.
pub async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => {
            #[cfg(not(windows))]
            println!();
            tracing::info!("Ctrl+C received. Shutting down gracefully.");
        }
        Err(e) => {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
