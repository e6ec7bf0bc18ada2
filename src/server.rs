//! HTTP server startup.

use std::sync::Arc;

use anyhow::Result;

use crate::api::create_router;
use crate::context::AppContext;

/// Serve the roster API on `bind` (e.g. `127.0.0.1:8000`) until the
/// process receives Ctrl-C.
pub async fn start_http(ctx: Arc<AppContext>, bind: &str) -> Result<()> {
    let policy = ctx.roster().policy();
    let router = create_router(ctx);
    let listener = tokio::net::TcpListener::bind(bind).await?;

    tracing::info!(
        signup_policy = %policy,
        "Activity roster listening on http://{}",
        listener.local_addr()?
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
