use pixel_tracker::api::HttpStatsService;
use pixel_tracker::{AppState, Config, Session, load_identity, router};
use std::{net::SocketAddr, sync::Arc};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = Config::from_env();
    let identity = load_identity(&config.identity_path).await?;
    info!(user_id = identity.id, "host identity loaded");

    let service = HttpStatsService::new(&config.api_base_url, config.request_timeout, identity.id)?;
    let mut session = Session::new(Arc::new(service), identity, config.session_options());
    session.load().await;

    let app = router(AppState::new(session));
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    info!("listening on http://{addr}, stats service at {}", config.api_base_url);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutting down"),
        Err(err) => {
            error!("failed to listen for ctrl-c: {err}");
            std::future::pending::<()>().await;
        }
    }
}
