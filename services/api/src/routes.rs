use crate::infra::AppState;
use axum::extract::{Path, Request};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Extension;
use axum::Json;
use loan_intake::config::SiteConfig;
use loan_intake::error::AppError;
use loan_intake::workflows::application::{
    application_router, ApplicationIntakeService, DraftStore, OfficerId, SubmissionRelay,
};
use loan_intake::workflows::calculator::{AmortizationYear, LoanScenario, PaymentBreakdown};
use loan_intake::workflows::officers::LoanOfficer;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt;
use tower_http::services::{ServeDir, ServeFile};

#[derive(Debug, Deserialize)]
pub(crate) struct CalculatorRequest {
    #[serde(flatten)]
    pub(crate) scenario: LoanScenario,
    #[serde(default)]
    pub(crate) include_schedule: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct CalculatorResponse {
    pub(crate) scenario: LoanScenario,
    pub(crate) breakdown: PaymentBreakdown,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) schedule: Option<Vec<AmortizationYear>>,
}

/// Wizard API, calculator, officer directory, and operational endpoints. Any
/// other non-API path is answered from the built site, with unknown paths
/// falling back to its index page so client-side routes survive a reload.
pub(crate) fn with_site_routes<S, R>(
    service: Arc<ApplicationIntakeService<S, R>>,
    site: &SiteConfig,
) -> axum::Router
where
    S: DraftStore + 'static,
    R: SubmissionRelay + 'static,
{
    let spa = ServeDir::new(&site.static_dir).fallback(ServeFile::new(site.index_file()));
    let site_fallback = move |request: Request| serve_site(spa.clone(), request);

    application_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/calculator",
            axum::routing::post(calculator_endpoint),
        )
        .route("/api/v1/officers", axum::routing::get(officers_endpoint))
        .route(
            "/api/v1/officers/:officer_id",
            axum::routing::get(officer_endpoint),
        )
        .fallback(site_fallback)
}

/// Unmatched `/api` paths get a JSON 404; everything else comes from the site.
async fn serve_site(spa: ServeDir<ServeFile>, request: Request) -> Response {
    let path = request.uri().path();
    if path == "/api" || path.starts_with("/api/") {
        let payload = json!({ "error": format!("no API endpoint at {path}") });
        return (StatusCode::NOT_FOUND, Json(payload)).into_response();
    }

    match spa.oneshot(request).await {
        Ok(response) => response.into_response(),
        Err(never) => match never {},
    }
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn calculator_endpoint(
    Json(request): Json<CalculatorRequest>,
) -> Result<Json<CalculatorResponse>, AppError> {
    let CalculatorRequest {
        scenario,
        include_schedule,
    } = request;

    let breakdown = scenario.breakdown()?;
    let schedule = if include_schedule {
        Some(scenario.amortization_schedule()?)
    } else {
        None
    };

    Ok(Json(CalculatorResponse {
        scenario,
        breakdown,
        schedule,
    }))
}

pub(crate) async fn officers_endpoint(
    Extension(state): Extension<AppState>,
) -> Json<Vec<LoanOfficer>> {
    Json(state.officers.all().to_vec())
}

pub(crate) async fn officer_endpoint(
    Extension(state): Extension<AppState>,
    Path(officer_id): Path<u32>,
) -> Response {
    match state.officers.find(OfficerId(officer_id)) {
        Some(officer) => Json(officer.clone()).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("loan officer {officer_id} is not in the directory") })),
        )
            .into_response(),
    }
}
