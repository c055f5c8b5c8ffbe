use crate::cli::ServeArgs;
use crate::infra::{AppState, AuditDefaults};
use crate::routes::audit_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use ticket_audit::config::AppConfig;
use ticket_audit::error::AppError;
use ticket_audit::telemetry;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let audit = AuditDefaults::from_paths(config.audit.clone())?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        audit: Arc::new(audit),
    };

    let app = audit_routes()
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        tower_map = %config.audit.tower_map.display(),
        category_map = %config.audit.category_map.display(),
        "ticket audit service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
