use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryApplicantStateStore};
use crate::routes::with_tasklist_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use grants_ui::config::AppConfig;
use grants_ui::error::AppError;
use grants_ui::tasklist::{FileTasklistStore, TasklistService};
use grants_ui::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(config_dir) = args.config_dir.take() {
        config.tasklists.config_dir = config_dir;
    }

    telemetry::init(&config.telemetry)?;

    if !config.tasklists.config_dir.is_dir() {
        warn!(
            config_dir = %config.tasklists.config_dir.display(),
            "tasklist directory does not exist; every tasklist will be reported as not found"
        );
    }

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let documents = Arc::new(FileTasklistStore::new(
        config.tasklists.config_dir.clone(),
    ));
    let applicant_state = Arc::new(InMemoryApplicantStateStore::default());
    let service = Arc::new(TasklistService::new(
        documents,
        applicant_state,
        config.environment,
    ));

    let app = with_tasklist_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        config_dir = %config.tasklists.config_dir.display(),
        "tasklist service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
