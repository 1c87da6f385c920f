use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{AssignmentId, ReportFilter, ReportId, ReportStatus, ReportSubmission};
use super::providers::{Geocoder, WeatherProvider};
use super::repository::{IntakeStore, RepositoryError};
use super::service::{IntakeError, ReportIntakeService};
use crate::dispatch::{
    self, Coordinates, Country, CoverageZone, Organisation, OrganisationId, OrganisationType,
    RoutingError, WeatherObservation,
};
use crate::error::AppError;

/// Router exposing report intake, organisation lookup, and risk endpoints.
pub fn intake_router<S, W, G>(service: Arc<ReportIntakeService<S, W, G>>) -> Router
where
    S: IntakeStore + 'static,
    W: WeatherProvider + 'static,
    G: Geocoder + 'static,
{
    Router::new()
        .route(
            "/api/v1/reports",
            post(submit_handler::<S, W, G>).get(list_handler::<S, W, G>),
        )
        .route("/api/v1/reports/:report_id", get(report_handler::<S, W, G>))
        .route(
            "/api/v1/reports/:report_id/status",
            post(status_handler::<S, W, G>),
        )
        .route(
            "/api/v1/reports/:report_id/audit",
            get(audit_handler::<S, W, G>),
        )
        .route(
            "/api/v1/reports/:report_id/assignments",
            post(create_assignment_handler::<S, W, G>).get(assignments_handler::<S, W, G>),
        )
        .route(
            "/api/v1/assignments/:assignment_id/accept",
            post(accept_assignment_handler::<S, W, G>),
        )
        .route(
            "/api/v1/assignments/:assignment_id/complete",
            post(complete_assignment_handler::<S, W, G>),
        )
        .route(
            "/api/v1/organisations",
            get(organisations_handler::<S, W, G>).post(upsert_organisation_handler::<S, W, G>),
        )
        .route(
            "/api/v1/organisations/nearest",
            get(nearest_handler::<S, W, G>),
        )
        .route(
            "/api/v1/organisations/:organisation_id/active",
            post(organisation_active_handler::<S, W, G>),
        )
        .route("/api/v1/risk/classify", post(classify_handler))
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReportListQuery {
    organisation_id: Option<String>,
    status: Option<ReportStatus>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusUpdateRequest {
    status: ReportStatus,
    #[serde(default)]
    actor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OrganisationListQuery {
    #[serde(default)]
    active_only: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NearestQuery {
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ActiveUpdateRequest {
    active: bool,
    #[serde(default)]
    actor: Option<String>,
}

/// Directory entry as submitted by an administrator. Omitted fields take the
/// same defaults as a new organisation in the admin console.
#[derive(Debug, Deserialize)]
pub(crate) struct OrganisationUpsertRequest {
    id: String,
    name: String,
    #[serde(rename = "type", default = "default_organisation_type")]
    kind: OrganisationType,
    primary_contact_email: String,
    #[serde(default)]
    primary_contact_phone: String,
    #[serde(default = "default_active")]
    active: bool,
    #[serde(default = "default_country")]
    country: Country,
    #[serde(default)]
    coverage_zones: Vec<CoverageZone>,
    coverage_center: Coordinates,
    #[serde(default)]
    actor: Option<String>,
}

fn default_organisation_type() -> OrganisationType {
    OrganisationType::Primary
}

fn default_active() -> bool {
    true
}

fn default_country() -> Country {
    Country::Ireland
}

impl OrganisationUpsertRequest {
    fn into_parts(self) -> (Organisation, Option<String>) {
        let organisation = Organisation {
            id: OrganisationId::new(self.id),
            name: self.name,
            kind: self.kind,
            primary_contact_email: self.primary_contact_email,
            primary_contact_phone: self.primary_contact_phone,
            active: self.active,
            country: self.country,
            coverage_zones: self.coverage_zones,
            coverage_center: self.coverage_center,
        };
        (organisation, self.actor)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct AssignmentRequest {
    responder_id: String,
    #[serde(default)]
    organisation_id: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub(crate) struct AcceptRequest {
    #[serde(default)]
    actor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CompleteRequest {
    outcome: String,
    #[serde(default)]
    actor: Option<String>,
}

pub(crate) async fn submit_handler<S, W, G>(
    State(service): State<Arc<ReportIntakeService<S, W, G>>>,
    axum::Json(submission): axum::Json<ReportSubmission>,
) -> Response
where
    S: IntakeStore + 'static,
    W: WeatherProvider + 'static,
    G: Geocoder + 'static,
{
    match service.submit(submission).await {
        Ok(submitted) => (StatusCode::CREATED, axum::Json(submitted)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn list_handler<S, W, G>(
    State(service): State<Arc<ReportIntakeService<S, W, G>>>,
    Query(query): Query<ReportListQuery>,
) -> Response
where
    S: IntakeStore + 'static,
    W: WeatherProvider + 'static,
    G: Geocoder + 'static,
{
    let filter = ReportFilter {
        organisation_id: query.organisation_id.map(OrganisationId::new),
        status: query.status,
    };
    match service.list(&filter) {
        Ok(reports) => (StatusCode::OK, axum::Json(reports)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn report_handler<S, W, G>(
    State(service): State<Arc<ReportIntakeService<S, W, G>>>,
    Path(report_id): Path<String>,
) -> Response
where
    S: IntakeStore + 'static,
    W: WeatherProvider + 'static,
    G: Geocoder + 'static,
{
    match service.get(&ReportId(report_id)) {
        Ok(report) => (StatusCode::OK, axum::Json(report)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn status_handler<S, W, G>(
    State(service): State<Arc<ReportIntakeService<S, W, G>>>,
    Path(report_id): Path<String>,
    axum::Json(request): axum::Json<StatusUpdateRequest>,
) -> Response
where
    S: IntakeStore + 'static,
    W: WeatherProvider + 'static,
    G: Geocoder + 'static,
{
    let id = ReportId(report_id);
    match service.update_status(&id, request.status, request.actor.as_deref()) {
        Ok(report) => (StatusCode::OK, axum::Json(report)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn audit_handler<S, W, G>(
    State(service): State<Arc<ReportIntakeService<S, W, G>>>,
    Path(report_id): Path<String>,
) -> Response
where
    S: IntakeStore + 'static,
    W: WeatherProvider + 'static,
    G: Geocoder + 'static,
{
    match service.audit_trail(&ReportId(report_id)) {
        Ok(entries) => (StatusCode::OK, axum::Json(entries)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn organisations_handler<S, W, G>(
    State(service): State<Arc<ReportIntakeService<S, W, G>>>,
    Query(query): Query<OrganisationListQuery>,
) -> Response
where
    S: IntakeStore + 'static,
    W: WeatherProvider + 'static,
    G: Geocoder + 'static,
{
    match service.organisations(query.active_only) {
        Ok(organisations) => (StatusCode::OK, axum::Json(organisations)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn nearest_handler<S, W, G>(
    State(service): State<Arc<ReportIntakeService<S, W, G>>>,
    Query(query): Query<NearestQuery>,
) -> Response
where
    S: IntakeStore + 'static,
    W: WeatherProvider + 'static,
    G: Geocoder + 'static,
{
    let point = Coordinates {
        latitude: query.latitude,
        longitude: query.longitude,
    };
    match service.nearest_organisation(point) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn organisation_active_handler<S, W, G>(
    State(service): State<Arc<ReportIntakeService<S, W, G>>>,
    Path(organisation_id): Path<String>,
    axum::Json(request): axum::Json<ActiveUpdateRequest>,
) -> Response
where
    S: IntakeStore + 'static,
    W: WeatherProvider + 'static,
    G: Geocoder + 'static,
{
    let id = OrganisationId::new(organisation_id);
    match service.set_organisation_active(&id, request.active, request.actor.as_deref()) {
        Ok(organisation) => (StatusCode::OK, axum::Json(organisation)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn upsert_organisation_handler<S, W, G>(
    State(service): State<Arc<ReportIntakeService<S, W, G>>>,
    axum::Json(request): axum::Json<OrganisationUpsertRequest>,
) -> Response
where
    S: IntakeStore + 'static,
    W: WeatherProvider + 'static,
    G: Geocoder + 'static,
{
    let (organisation, actor) = request.into_parts();
    match service.upsert_organisation(organisation, actor.as_deref()) {
        Ok(organisation) => (StatusCode::OK, axum::Json(organisation)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn create_assignment_handler<S, W, G>(
    State(service): State<Arc<ReportIntakeService<S, W, G>>>,
    Path(report_id): Path<String>,
    axum::Json(request): axum::Json<AssignmentRequest>,
) -> Response
where
    S: IntakeStore + 'static,
    W: WeatherProvider + 'static,
    G: Geocoder + 'static,
{
    let organisation_id = request.organisation_id.map(OrganisationId::new);
    match service.create_assignment(
        &ReportId(report_id),
        &request.responder_id,
        organisation_id,
    ) {
        Ok(assignment) => (StatusCode::CREATED, axum::Json(assignment)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn assignments_handler<S, W, G>(
    State(service): State<Arc<ReportIntakeService<S, W, G>>>,
    Path(report_id): Path<String>,
) -> Response
where
    S: IntakeStore + 'static,
    W: WeatherProvider + 'static,
    G: Geocoder + 'static,
{
    match service.assignments(&ReportId(report_id)) {
        Ok(assignments) => (StatusCode::OK, axum::Json(assignments)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn accept_assignment_handler<S, W, G>(
    State(service): State<Arc<ReportIntakeService<S, W, G>>>,
    Path(assignment_id): Path<String>,
    request: Option<axum::Json<AcceptRequest>>,
) -> Response
where
    S: IntakeStore + 'static,
    W: WeatherProvider + 'static,
    G: Geocoder + 'static,
{
    let request = request.map(|axum::Json(request)| request).unwrap_or_default();
    let id = AssignmentId(assignment_id);
    match service.accept_assignment(&id, request.actor.as_deref()) {
        Ok(assignment) => (StatusCode::OK, axum::Json(assignment)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn complete_assignment_handler<S, W, G>(
    State(service): State<Arc<ReportIntakeService<S, W, G>>>,
    Path(assignment_id): Path<String>,
    axum::Json(request): axum::Json<CompleteRequest>,
) -> Response
where
    S: IntakeStore + 'static,
    W: WeatherProvider + 'static,
    G: Geocoder + 'static,
{
    let id = AssignmentId(assignment_id);
    match service.complete_assignment(&id, &request.outcome, request.actor.as_deref()) {
        Ok(assignment) => (StatusCode::OK, axum::Json(assignment)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn classify_handler(
    axum::Json(observation): axum::Json<WeatherObservation>,
) -> Result<axum::Json<serde_json::Value>, AppError> {
    observation.validate()?;

    let assessment = dispatch::assess(&observation);
    Ok(axum::Json(json!({
        "tier": assessment.tier,
        "rule": assessment.rule,
        "description": assessment.tier.description(),
    })))
}

/// HTTP status for a failed intake operation.
pub(crate) fn intake_status(error: &IntakeError) -> StatusCode {
    match error {
        IntakeError::Routing(RoutingError::InvalidCoordinates(_))
        | IntakeError::Routing(RoutingError::InvalidObservation { .. })
        | IntakeError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        IntakeError::Repository(RepositoryError::NotFound) | IntakeError::NoActiveOrganisations => {
            StatusCode::NOT_FOUND
        }
        IntakeError::Repository(RepositoryError::Conflict)
        | IntakeError::AssignmentClosed { .. } => StatusCode::CONFLICT,
        IntakeError::Weather(_) | IntakeError::Geocoding(_) => StatusCode::BAD_GATEWAY,
        IntakeError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn error_response(error: IntakeError) -> Response {
    let payload = json!({
        "error": error.to_string(),
    });
    (intake_status(&error), axum::Json(payload)).into_response()
}
