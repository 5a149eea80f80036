use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn")),
        )
        .init();

    if let Err(e) = run().await {
        tracing::error!("server failed: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), String> {
    server::config::load_config();
    let flags = server::config::feature_flags();

    if flags.telemetry {
        server::telemetry::init_telemetry()?;
    }
    server::health::record_start_time();

    let pool = server::db::create_pool()?;
    server::db::run_migrations(&pool)
        .await
        .map_err(|e| format!("Failed to run migrations: {e}"))?;

    let store = server::storage::DocumentStore::from_config().await?;
    let sms = server::sms::SmsSender::from_config()?;
    tracing::info!(
        storage = store.backend_name(),
        sms_gateway = flags.sms_gateway,
        "integrations ready"
    );

    let state = server::db::AppState::new(pool, store, sms);
    let mut router = server::openapi::api_router(state);

    if flags.telemetry {
        router = router.layer(server::telemetry::OtelTraceLayer);
    }

    // Base64 JSON uploads: must stay above the decoded document size cap.
    let max_body: usize = std::env::var("MAX_UPLOAD_BYTES")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(25 * 1024 * 1024);

    let router = router
        .layer(axum::extract::DefaultBodyLimit::max(max_body))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| format!("Failed to bind {addr}: {e}"))?;
    tracing::info!(%addr, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| format!("Server error: {e}"))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for shutdown signal: {e}");
    }
    tracing::info!("shutdown signal received");
}
