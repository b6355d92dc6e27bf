use std::sync::Arc;
use timetalker_server::{AppState, ServerConfig, db, retention, router};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment
    let config = ServerConfig::from_env().expect("failed to load configuration");
    tracing::info!("Loaded configuration");

    let db_pool = db::connect(&config.database_url)
        .await
        .expect("failed to open database");

    tracing::info!("Running database migrations...");
    db::migrate(&db_pool)
        .await
        .expect("failed to run migrations");

    // First run happens immediately, then on every interval
    retention::spawn(db_pool.clone(), config.retention.clone());

    let app_state =
        Arc::new(AppState::from_config(db_pool, &config).expect("failed to build language model client"));
    tracing::info!(personas = app_state.personas.list().len(), "Persona catalog loaded");

    let app = router(app_state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("failed to bind to address");

    tracing::info!("listening on http://{}", config.bind_addr);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
