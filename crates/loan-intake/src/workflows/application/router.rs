use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::documents::{DocumentSlot, FileCandidate, FileDescriptor};
use super::domain::{
    DraftId, FinancialInfo, LivingHistory, LoanPurpose, OfficerId, PersonalInfo,
    PreviousResidence, PropertyInfo,
};
use super::draft::DraftError;
use super::fields::{FieldId, Section};
use super::repository::{DraftStore, StoreError};
use super::service::{ApplicationIntakeService, IntakeServiceError};
use super::submission::SubmissionRelay;

type SharedService<S, R> = Arc<ApplicationIntakeService<S, R>>;

/// Router builder exposing the wizard over HTTP. Every route addresses exactly
/// one draft by its id.
pub fn application_router<S, R>(service: SharedService<S, R>) -> Router
where
    S: DraftStore + 'static,
    R: SubmissionRelay + 'static,
{
    Router::new()
        .route("/api/v1/applications", post(open_handler::<S, R>))
        .route(
            "/api/v1/applications/:draft_id",
            get(view_handler::<S, R>).delete(discard_handler::<S, R>),
        )
        .route(
            "/api/v1/applications/:draft_id/purpose",
            put(purpose_handler::<S, R>),
        )
        .route(
            "/api/v1/applications/:draft_id/personal",
            put(personal_handler::<S, R>),
        )
        .route(
            "/api/v1/applications/:draft_id/property",
            put(property_handler::<S, R>),
        )
        .route(
            "/api/v1/applications/:draft_id/financial",
            put(financial_handler::<S, R>),
        )
        .route(
            "/api/v1/applications/:draft_id/living-history",
            put(living_history_handler::<S, R>),
        )
        .route(
            "/api/v1/applications/:draft_id/living-history/previous",
            post(add_residence_handler::<S, R>),
        )
        .route(
            "/api/v1/applications/:draft_id/living-history/previous/:index",
            put(update_residence_handler::<S, R>).delete(remove_residence_handler::<S, R>),
        )
        .route(
            "/api/v1/applications/:draft_id/documents/:slot",
            post(attach_handler::<S, R>).delete(clear_documents_handler::<S, R>),
        )
        .route(
            "/api/v1/applications/:draft_id/documents/:slot/:index",
            delete(remove_document_handler::<S, R>),
        )
        .route(
            "/api/v1/applications/:draft_id/terms",
            put(terms_handler::<S, R>),
        )
        .route(
            "/api/v1/applications/:draft_id/touched",
            post(touch_handler::<S, R>),
        )
        .route(
            "/api/v1/applications/:draft_id/sections/:section",
            get(section_handler::<S, R>),
        )
        .route(
            "/api/v1/applications/:draft_id/advance",
            post(advance_handler::<S, R>),
        )
        .route(
            "/api/v1/applications/:draft_id/retreat",
            post(retreat_handler::<S, R>),
        )
        .route(
            "/api/v1/applications/:draft_id/submit",
            post(submit_handler::<S, R>),
        )
        .with_state(service)
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct OpenDraftRequest {
    #[serde(default)]
    pub(crate) officer_id: Option<OfficerId>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PurposeRequest {
    pub(crate) purpose: LoanPurpose,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AttachRequest {
    pub(crate) files: Vec<FileCandidate>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TermsRequest {
    pub(crate) accepted: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TouchRequest {
    pub(crate) fields: Vec<FieldId>,
}

#[derive(Debug, Serialize)]
struct RemovedDocuments {
    removed: Vec<FileDescriptor>,
}

fn not_found(what: &str, raw: &str) -> Response {
    let payload = json!({ "error": format!("unknown {what} '{raw}'") });
    (StatusCode::NOT_FOUND, Json(payload)).into_response()
}

fn parse_draft_id(raw: &str) -> Result<DraftId, Response> {
    raw.parse().map_err(|_| not_found("application", raw))
}

fn parse_slot(raw: &str) -> Result<DocumentSlot, Response> {
    raw.parse().map_err(|_| not_found("document slot", raw))
}

fn respond<T: Serialize>(status: StatusCode, result: Result<T, IntakeServiceError>) -> Response {
    match result {
        Ok(body) => (status, Json(body)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) fn error_response(error: IntakeServiceError) -> Response {
    let message = error.to_string();
    let (status, payload) = match error {
        IntakeServiceError::DraftNotFound(_)
        | IntakeServiceError::Store(StoreError::NotFound) => {
            (StatusCode::NOT_FOUND, json!({ "error": message }))
        }
        IntakeServiceError::Draft(DraftError::SectionIncomplete(report)) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            json!({ "error": message, "report": report }),
        ),
        IntakeServiceError::Draft(DraftError::Upload(rejection)) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            json!({ "error": message, "rejection": rejection }),
        ),
        IntakeServiceError::Draft(
            DraftError::PurposeMismatch { .. } | DraftError::UnknownResidence { .. },
        )
        | IntakeServiceError::UnknownOfficer(_) => {
            (StatusCode::UNPROCESSABLE_ENTITY, json!({ "error": message }))
        }
        IntakeServiceError::Draft(DraftError::AlreadySubmitted)
        | IntakeServiceError::Store(StoreError::Conflict) => {
            (StatusCode::CONFLICT, json!({ "error": message }))
        }
        IntakeServiceError::Draft(DraftError::Relay(_)) => {
            (StatusCode::BAD_GATEWAY, json!({ "error": message }))
        }
        IntakeServiceError::Store(StoreError::Unavailable(_)) => {
            (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": message }))
        }
    };

    (status, Json(payload)).into_response()
}

pub(crate) async fn open_handler<S, R>(
    State(service): State<SharedService<S, R>>,
    request: Option<Json<OpenDraftRequest>>,
) -> Response
where
    S: DraftStore + 'static,
    R: SubmissionRelay + 'static,
{
    let request = request.map(|Json(request)| request).unwrap_or_default();
    respond(StatusCode::CREATED, service.open(request.officer_id))
}

pub(crate) async fn view_handler<S, R>(
    State(service): State<SharedService<S, R>>,
    Path(draft_id): Path<String>,
) -> Response
where
    S: DraftStore + 'static,
    R: SubmissionRelay + 'static,
{
    let id = match parse_draft_id(&draft_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    respond(StatusCode::OK, service.get(&id).map(|draft| draft.view()))
}

pub(crate) async fn discard_handler<S, R>(
    State(service): State<SharedService<S, R>>,
    Path(draft_id): Path<String>,
) -> Response
where
    S: DraftStore + 'static,
    R: SubmissionRelay + 'static,
{
    let id = match parse_draft_id(&draft_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match service.discard(&id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn purpose_handler<S, R>(
    State(service): State<SharedService<S, R>>,
    Path(draft_id): Path<String>,
    Json(request): Json<PurposeRequest>,
) -> Response
where
    S: DraftStore + 'static,
    R: SubmissionRelay + 'static,
{
    let id = match parse_draft_id(&draft_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    respond(StatusCode::OK, service.select_purpose(&id, request.purpose))
}

pub(crate) async fn personal_handler<S, R>(
    State(service): State<SharedService<S, R>>,
    Path(draft_id): Path<String>,
    Json(info): Json<PersonalInfo>,
) -> Response
where
    S: DraftStore + 'static,
    R: SubmissionRelay + 'static,
{
    let id = match parse_draft_id(&draft_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    respond(StatusCode::OK, service.update_personal(&id, info))
}

pub(crate) async fn property_handler<S, R>(
    State(service): State<SharedService<S, R>>,
    Path(draft_id): Path<String>,
    Json(info): Json<PropertyInfo>,
) -> Response
where
    S: DraftStore + 'static,
    R: SubmissionRelay + 'static,
{
    let id = match parse_draft_id(&draft_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    respond(StatusCode::OK, service.update_property(&id, info))
}

pub(crate) async fn financial_handler<S, R>(
    State(service): State<SharedService<S, R>>,
    Path(draft_id): Path<String>,
    Json(info): Json<FinancialInfo>,
) -> Response
where
    S: DraftStore + 'static,
    R: SubmissionRelay + 'static,
{
    let id = match parse_draft_id(&draft_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    respond(StatusCode::OK, service.update_financial(&id, info))
}

pub(crate) async fn living_history_handler<S, R>(
    State(service): State<SharedService<S, R>>,
    Path(draft_id): Path<String>,
    Json(history): Json<LivingHistory>,
) -> Response
where
    S: DraftStore + 'static,
    R: SubmissionRelay + 'static,
{
    let id = match parse_draft_id(&draft_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    respond(StatusCode::OK, service.update_living_history(&id, history))
}

pub(crate) async fn add_residence_handler<S, R>(
    State(service): State<SharedService<S, R>>,
    Path(draft_id): Path<String>,
) -> Response
where
    S: DraftStore + 'static,
    R: SubmissionRelay + 'static,
{
    let id = match parse_draft_id(&draft_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    respond(
        StatusCode::CREATED,
        service
            .add_previous_residence(&id)
            .map(|index| json!({ "index": index })),
    )
}

pub(crate) async fn update_residence_handler<S, R>(
    State(service): State<SharedService<S, R>>,
    Path((draft_id, index)): Path<(String, usize)>,
    Json(residence): Json<PreviousResidence>,
) -> Response
where
    S: DraftStore + 'static,
    R: SubmissionRelay + 'static,
{
    let id = match parse_draft_id(&draft_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    respond(
        StatusCode::OK,
        service.update_previous_residence(&id, index, residence),
    )
}

pub(crate) async fn remove_residence_handler<S, R>(
    State(service): State<SharedService<S, R>>,
    Path((draft_id, index)): Path<(String, usize)>,
) -> Response
where
    S: DraftStore + 'static,
    R: SubmissionRelay + 'static,
{
    let id = match parse_draft_id(&draft_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    respond(StatusCode::OK, service.remove_previous_residence(&id, index))
}

pub(crate) async fn attach_handler<S, R>(
    State(service): State<SharedService<S, R>>,
    Path((draft_id, slot)): Path<(String, String)>,
    Json(request): Json<AttachRequest>,
) -> Response
where
    S: DraftStore + 'static,
    R: SubmissionRelay + 'static,
{
    let (id, slot) = match (parse_draft_id(&draft_id), parse_slot(&slot)) {
        (Ok(id), Ok(slot)) => (id, slot),
        (Err(response), _) | (_, Err(response)) => return response,
    };
    let batch = request.files.into_iter().map(FileDescriptor::from).collect();
    respond(StatusCode::OK, service.attach(&id, slot, batch))
}

pub(crate) async fn clear_documents_handler<S, R>(
    State(service): State<SharedService<S, R>>,
    Path((draft_id, slot)): Path<(String, String)>,
) -> Response
where
    S: DraftStore + 'static,
    R: SubmissionRelay + 'static,
{
    let (id, slot) = match (parse_draft_id(&draft_id), parse_slot(&slot)) {
        (Ok(id), Ok(slot)) => (id, slot),
        (Err(response), _) | (_, Err(response)) => return response,
    };
    respond(
        StatusCode::OK,
        service
            .remove_document(&id, slot, None)
            .map(|removed| RemovedDocuments { removed }),
    )
}

pub(crate) async fn remove_document_handler<S, R>(
    State(service): State<SharedService<S, R>>,
    Path((draft_id, slot, index)): Path<(String, String, usize)>,
) -> Response
where
    S: DraftStore + 'static,
    R: SubmissionRelay + 'static,
{
    let (id, slot) = match (parse_draft_id(&draft_id), parse_slot(&slot)) {
        (Ok(id), Ok(slot)) => (id, slot),
        (Err(response), _) | (_, Err(response)) => return response,
    };
    respond(
        StatusCode::OK,
        service
            .remove_document(&id, slot, Some(index))
            .map(|removed| RemovedDocuments { removed }),
    )
}

pub(crate) async fn terms_handler<S, R>(
    State(service): State<SharedService<S, R>>,
    Path(draft_id): Path<String>,
    Json(request): Json<TermsRequest>,
) -> Response
where
    S: DraftStore + 'static,
    R: SubmissionRelay + 'static,
{
    let id = match parse_draft_id(&draft_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    respond(StatusCode::OK, service.accept_terms(&id, request.accepted))
}

pub(crate) async fn touch_handler<S, R>(
    State(service): State<SharedService<S, R>>,
    Path(draft_id): Path<String>,
    Json(request): Json<TouchRequest>,
) -> Response
where
    S: DraftStore + 'static,
    R: SubmissionRelay + 'static,
{
    let id = match parse_draft_id(&draft_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    respond(StatusCode::OK, service.touch(&id, request.fields))
}

pub(crate) async fn section_handler<S, R>(
    State(service): State<SharedService<S, R>>,
    Path((draft_id, section)): Path<(String, String)>,
) -> Response
where
    S: DraftStore + 'static,
    R: SubmissionRelay + 'static,
{
    let id = match parse_draft_id(&draft_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let section = match section.parse::<Section>() {
        Ok(section) => section,
        Err(_) => return not_found("section", &section),
    };
    respond(StatusCode::OK, service.validate(&id, section))
}

pub(crate) async fn advance_handler<S, R>(
    State(service): State<SharedService<S, R>>,
    Path(draft_id): Path<String>,
) -> Response
where
    S: DraftStore + 'static,
    R: SubmissionRelay + 'static,
{
    let id = match parse_draft_id(&draft_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    respond(StatusCode::OK, service.advance(&id))
}

pub(crate) async fn retreat_handler<S, R>(
    State(service): State<SharedService<S, R>>,
    Path(draft_id): Path<String>,
) -> Response
where
    S: DraftStore + 'static,
    R: SubmissionRelay + 'static,
{
    let id = match parse_draft_id(&draft_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    respond(StatusCode::OK, service.retreat(&id))
}

pub(crate) async fn submit_handler<S, R>(
    State(service): State<SharedService<S, R>>,
    Path(draft_id): Path<String>,
) -> Response
where
    S: DraftStore + 'static,
    R: SubmissionRelay + 'static,
{
    let id = match parse_draft_id(&draft_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    respond(StatusCode::ACCEPTED, service.submit(&id))
}
