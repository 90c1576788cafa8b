use crate::cli::ServeArgs;
use crate::infra::{build_identity, build_service, AppState};
use crate::routes::with_sleep_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use sleep_smart::config::AppConfig;
use sleep_smart::error::AppError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs, mut config: AppConfig) -> Result<(), AppError> {
    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let service = Arc::new(build_service(&config)?);
    let identity = build_identity(&config)?;
    info!(
        identity = identity.name(),
        storage = config.storage.label(),
        "collaborators configured"
    );

    let app = with_sleep_routes(service, identity)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "sleep smart service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
