use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryDraftStore, LoggingRelay};
use crate::routes::with_site_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use loan_intake::config::AppConfig;
use loan_intake::error::AppError;
use loan_intake::telemetry;
use loan_intake::workflows::application::ApplicationIntakeService;
use loan_intake::workflows::officers::OfficerDirectory;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(static_dir) = args.static_dir.take() {
        config.site.static_dir = static_dir;
    }

    telemetry::init(&config.telemetry)?;

    if !config.site.index_file().is_file() {
        warn!(
            static_dir = %config.site.static_dir.display(),
            "site index not found; only API routes will respond"
        );
    }

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let officers = Arc::new(OfficerDirectory::standard());
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        officers: officers.clone(),
    };

    let store = Arc::new(InMemoryDraftStore::with_idle_timeout(
        config.drafts.idle_timeout,
    ));
    let relay = Arc::new(LoggingRelay::default());
    let intake_service = Arc::new(ApplicationIntakeService::new(store, relay, officers));

    let app = with_site_routes(intake_service, &config.site)
        .layer(Extension(app_state))
        .layer(TraceLayer::new_for_http())
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "loan intake service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
