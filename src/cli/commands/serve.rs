use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::config;
use crate::router;
use crate::state::AppState;

/// Serve the compliance routes on their own, with no host platform behind them.
pub async fn handle(bind: Option<String>) -> anyhow::Result<()> {
    let config = config();
    info!("Starting df-compliance in {:?} mode ({:?} license)", config.environment, config.compliance.license);

    let state = AppState::from_config(config).await?;
    let mut app = router::app(Router::new(), state);
    if config.api.enable_request_logging {
        app = app.layer(TraceLayer::new_for_http());
    }

    let bind_addr = bind.unwrap_or_else(|| config.api.bind_address.clone());
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind {}: {}", bind_addr, e))?;

    info!("df-compliance listening on http://{}", bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
