use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::domain::{
    Assignment, AssignmentId, Report, ReportFilter, ReportId, ReportStatus, ReportSubmission,
};
use super::providers::{Geocoder, ProviderError, WeatherProvider};
use super::repository::{AuditEntry, AuditKind, IntakeStore, RepositoryError};
use crate::dispatch::{
    geo, Coordinates, Organisation, OrganisationId, RiskAssessment, RoutingContext,
    RoutingDecision, RoutingError, RoutingPolicy, RoutingResolver,
};

const SYSTEM_ACTOR: &str = "system";

/// Service composing the collaborators, the routing resolver, and storage.
pub struct ReportIntakeService<S, W, G> {
    store: Arc<S>,
    weather: Arc<W>,
    geocoder: Arc<G>,
    resolver: Arc<RoutingResolver>,
}

/// Outcome of a submission as returned to the spotter.
#[derive(Debug, Clone, Serialize)]
pub struct SubmittedReport {
    pub report: Report,
    pub decision: RoutingDecision,
    pub risk: RiskAssessment,
}

/// Result of the stand-alone nearest lookup.
#[derive(Debug, Clone, Serialize)]
pub struct NearestOrganisationView {
    pub organisation: Organisation,
    pub distance_km: f64,
    /// Whether the point also falls inside one of the organisation's zones.
    pub within_coverage: bool,
}

impl<S, W, G> ReportIntakeService<S, W, G>
where
    S: IntakeStore + 'static,
    W: WeatherProvider + 'static,
    G: Geocoder + 'static,
{
    pub fn new(store: Arc<S>, weather: Arc<W>, geocoder: Arc<G>, policy: RoutingPolicy) -> Self {
        Self {
            store,
            weather,
            geocoder,
            resolver: Arc::new(RoutingResolver::new(policy)),
        }
    }

    pub fn policy(&self) -> &RoutingPolicy {
        self.resolver.policy()
    }

    /// Locate, classify, route, and store a new report.
    ///
    /// Collaborator failures abort before anything is routed or written.
    pub async fn submit(
        &self,
        submission: ReportSubmission,
    ) -> Result<SubmittedReport, IntakeError> {
        let location = Coordinates::new(submission.latitude, submission.longitude)
            .map_err(RoutingError::from)?;

        let address = self
            .geocoder
            .reverse(location)
            .await
            .map_err(IntakeError::Geocoding)?;
        debug!(city = %address.city, country = %address.country, "reverse geocoded report");

        let observation = self
            .weather
            .current(location)
            .await
            .map_err(IntakeError::Weather)?;

        let context = RoutingContext::assess(location, address.city.clone(), observation)?;
        let organisations = self.store.active()?;
        let decision = self.resolver.resolve(&context, &organisations)?;

        let now = Utc::now();
        let report = Report {
            id: self.store.next_report_id()?,
            latitude: location.latitude,
            longitude: location.longitude,
            gps_accuracy_meters: submission.gps_accuracy_meters,
            address: address.formatted_address,
            city: address.city,
            county: address.county,
            country: address.country,
            temperature_celsius: context.observation.temperature_celsius,
            feels_like_celsius: context.observation.feels_like_celsius,
            weather_description: context.observation.description.clone(),
            risk_tier: context.risk_tier(),
            notes: submission.notes,
            has_photo: submission.has_photo,
            photo_url: submission.photo_url,
            contact_preference: submission.contact_preference,
            contact_name: submission.contact_name,
            contact_phone: submission.contact_phone,
            contact_email: submission.contact_email,
            spotter_id: submission.spotter_id,
            owner_organisation_id: decision.owner_organisation_id.clone(),
            status: ReportStatus::New,
            created_at: now,
            updated_at: now,
        };
        let report = self.store.insert(report)?;

        let mut routing_entry =
            AuditEntry::new(AuditKind::ReportRouting, Some(report.id.clone()), SYSTEM_ACTOR)
                .with("city", &report.city)
                .with("temperature_celsius", report.temperature_celsius)
                .with("risk_tier", context.risk_tier().label())
                .with("routing_method", decision.method.label())
                .with("owner_organisation_id", &decision.owner_organisation_id);
        if let Some(rule) = context.risk.rule {
            routing_entry = routing_entry.with("risk_rule", rule);
        }
        if let Some(distance) = decision.distance_km {
            routing_entry = routing_entry.with("distance_km", format!("{distance:.2}"));
        }
        self.store.append(routing_entry)?;

        if let Some(notification) = &decision.secondary_notification {
            self.store.append(
                AuditEntry::new(
                    AuditKind::SecondaryNotification,
                    Some(report.id.clone()),
                    SYSTEM_ACTOR,
                )
                .with("organisation_id", &notification.organisation_id)
                .with("reason", notification.reason.label()),
            )?;
            warn!(
                report_id = %report.id,
                organisation_id = %notification.organisation_id,
                reason = notification.reason.label(),
                "secondary organisation notified"
            );
        }

        info!(
            report_id = %report.id,
            organisation_id = %decision.owner_organisation_id,
            routing_method = decision.method.label(),
            risk_tier = context.risk_tier().label(),
            "report routed"
        );

        Ok(SubmittedReport {
            report,
            decision,
            risk: context.risk,
        })
    }

    pub fn get(&self, report_id: &ReportId) -> Result<Report, IntakeError> {
        let report = self
            .store
            .fetch(report_id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(report)
    }

    pub fn list(&self, filter: &ReportFilter) -> Result<Vec<Report>, IntakeError> {
        Ok(self.store.list(filter)?)
    }

    pub fn update_status(
        &self,
        report_id: &ReportId,
        status: ReportStatus,
        actor: Option<&str>,
    ) -> Result<Report, IntakeError> {
        let (report, previous) = self.move_report(report_id, status)?;

        let actor = actor.unwrap_or(SYSTEM_ACTOR);
        self.store.append(
            AuditEntry::new(AuditKind::StatusUpdate, Some(report.id.clone()), actor)
                .with("from", previous.label())
                .with("to", status.label()),
        )?;
        info!(
            report_id = %report.id,
            status = status.label(),
            actor,
            "report status updated"
        );

        Ok(report)
    }

    fn move_report(
        &self,
        report_id: &ReportId,
        status: ReportStatus,
    ) -> Result<(Report, ReportStatus), IntakeError> {
        let mut report = self.get(report_id)?;
        let previous = report.status;
        report.status = status;
        report.updated_at = Utc::now();
        self.store.update(report.clone())?;
        Ok((report, previous))
    }

    pub fn audit_trail(&self, report_id: &ReportId) -> Result<Vec<AuditEntry>, IntakeError> {
        self.get(report_id)?;
        Ok(self.store.for_report(report_id)?)
    }

    /// Closest active organisation to an arbitrary point.
    pub fn nearest_organisation(
        &self,
        point: Coordinates,
    ) -> Result<NearestOrganisationView, IntakeError> {
        let organisations = self.store.all()?;
        let found = geo::nearest(point, &organisations)
            .map_err(RoutingError::from)?
            .ok_or(IntakeError::NoActiveOrganisations)?;

        let organisation = organisations
            .into_iter()
            .find(|organisation| organisation.id == found.id)
            .ok_or(RepositoryError::NotFound)?;
        let within_coverage = organisation.covers(point);

        Ok(NearestOrganisationView {
            organisation,
            distance_km: found.distance_km,
            within_coverage,
        })
    }

    pub fn organisations(&self, active_only: bool) -> Result<Vec<Organisation>, IntakeError> {
        let organisations = if active_only {
            self.store.active()?
        } else {
            self.store.all()?
        };
        Ok(organisations)
    }

    pub fn set_organisation_active(
        &self,
        organisation_id: &OrganisationId,
        active: bool,
        actor: Option<&str>,
    ) -> Result<Organisation, IntakeError> {
        let organisation = self.store.set_active(organisation_id, active)?;

        let actor = actor.unwrap_or(SYSTEM_ACTOR);
        self.store.append(
            AuditEntry::new(AuditKind::OrganisationUpdate, None, actor)
                .with("organisation_id", organisation_id)
                .with("active", active),
        )?;
        info!(organisation_id = %organisation_id, active, actor, "organisation updated");

        Ok(organisation)
    }

    /// Create or replace a directory entry. Routing sees the change on the
    /// next submission.
    pub fn upsert_organisation(
        &self,
        organisation: Organisation,
        actor: Option<&str>,
    ) -> Result<Organisation, IntakeError> {
        if organisation.id.as_str().trim().is_empty() {
            return Err(IntakeError::InvalidRequest(
                "organisation id is required".to_string(),
            ));
        }
        if organisation.name.trim().is_empty() {
            return Err(IntakeError::InvalidRequest(
                "organisation name is required".to_string(),
            ));
        }
        organisation
            .coverage_center
            .validate()
            .map_err(RoutingError::from)?;
        for zone in &organisation.coverage_zones {
            zone.validate()
                .map_err(|err| IntakeError::InvalidRequest(err.to_string()))?;
        }

        let change = match self.store.find(&organisation.id)? {
            Some(_) => "updated",
            None => "created",
        };
        self.store.upsert(organisation.clone())?;

        let actor = actor.unwrap_or(SYSTEM_ACTOR);
        self.store.append(
            AuditEntry::new(AuditKind::OrganisationUpdate, None, actor)
                .with("organisation_id", &organisation.id)
                .with("change", change)
                .with("active", organisation.active),
        )?;
        info!(organisation_id = %organisation.id, change, actor, "organisation saved");

        Ok(organisation)
    }

    /// Hand a report to a responder and mark it `ASSIGNED`.
    ///
    /// The assignment belongs to `organisation_id` when given, otherwise to the
    /// report's owner.
    pub fn create_assignment(
        &self,
        report_id: &ReportId,
        responder_id: &str,
        organisation_id: Option<OrganisationId>,
    ) -> Result<Assignment, IntakeError> {
        let responder_id = responder_id.trim();
        if responder_id.is_empty() {
            return Err(IntakeError::InvalidRequest(
                "responder id is required".to_string(),
            ));
        }

        let report = self.get(report_id)?;
        let organisation_id = match organisation_id {
            Some(id) => {
                self.store.find(&id)?.ok_or(RepositoryError::NotFound)?;
                id
            }
            None => report.owner_organisation_id.clone(),
        };

        let assignment = self.store.insert_assignment(Assignment {
            id: self.store.next_assignment_id()?,
            report_id: report.id.clone(),
            responder_id: responder_id.to_string(),
            organisation_id,
            assigned_at: Utc::now(),
            accepted_at: None,
            completed_at: None,
            outcome: None,
        })?;
        let (_, previous) = self.move_report(&report.id, ReportStatus::Assigned)?;

        self.store.append(
            AuditEntry::new(
                AuditKind::AssignmentCreated,
                Some(report.id.clone()),
                responder_id,
            )
            .with("assignment_id", &assignment.id)
            .with("organisation_id", &assignment.organisation_id)
            .with("from", previous.label())
            .with("to", ReportStatus::Assigned.label()),
        )?;
        info!(
            report_id = %report.id,
            assignment_id = %assignment.id,
            responder_id,
            "report assigned"
        );

        Ok(assignment)
    }

    /// Responder confirms they are on the way; the report moves to `IN_PROGRESS`.
    pub fn accept_assignment(
        &self,
        assignment_id: &AssignmentId,
        actor: Option<&str>,
    ) -> Result<Assignment, IntakeError> {
        let mut assignment = self.open_assignment(assignment_id)?;
        if assignment.is_accepted() {
            return Err(IntakeError::AssignmentClosed {
                assignment_id: assignment.id,
                state: "accepted",
            });
        }

        assignment.accepted_at = Some(Utc::now());
        self.store.update_assignment(assignment.clone())?;
        let (_, previous) = self.move_report(&assignment.report_id, ReportStatus::InProgress)?;

        let actor = actor.unwrap_or(assignment.responder_id.as_str());
        self.store.append(
            AuditEntry::new(
                AuditKind::AssignmentAccepted,
                Some(assignment.report_id.clone()),
                actor,
            )
            .with("assignment_id", &assignment.id)
            .with("from", previous.label())
            .with("to", ReportStatus::InProgress.label()),
        )?;
        info!(assignment_id = %assignment.id, actor, "assignment accepted");

        Ok(assignment)
    }

    /// Close the assignment with the responder's outcome and resolve the report.
    pub fn complete_assignment(
        &self,
        assignment_id: &AssignmentId,
        outcome: &str,
        actor: Option<&str>,
    ) -> Result<Assignment, IntakeError> {
        let outcome = outcome.trim();
        if outcome.is_empty() {
            return Err(IntakeError::InvalidRequest("outcome is required".to_string()));
        }

        let mut assignment = self.open_assignment(assignment_id)?;
        assignment.completed_at = Some(Utc::now());
        assignment.outcome = Some(outcome.to_string());
        self.store.update_assignment(assignment.clone())?;
        let (_, previous) = self.move_report(&assignment.report_id, ReportStatus::Resolved)?;

        let actor = actor.unwrap_or(assignment.responder_id.as_str());
        self.store.append(
            AuditEntry::new(
                AuditKind::AssignmentCompleted,
                Some(assignment.report_id.clone()),
                actor,
            )
            .with("assignment_id", &assignment.id)
            .with("outcome", outcome)
            .with("from", previous.label())
            .with("to", ReportStatus::Resolved.label()),
        )?;
        info!(assignment_id = %assignment.id, actor, "assignment completed");

        Ok(assignment)
    }

    /// Assignments for a report, newest first.
    pub fn assignments(&self, report_id: &ReportId) -> Result<Vec<Assignment>, IntakeError> {
        self.get(report_id)?;
        Ok(self.store.assignments_for_report(report_id)?)
    }

    fn open_assignment(&self, assignment_id: &AssignmentId) -> Result<Assignment, IntakeError> {
        let assignment = self
            .store
            .fetch_assignment(assignment_id)?
            .ok_or(RepositoryError::NotFound)?;
        if assignment.is_completed() {
            return Err(IntakeError::AssignmentClosed {
                assignment_id: assignment.id,
                state: "completed",
            });
        }
        Ok(assignment)
    }
}

/// Error raised by the intake service.
#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error(transparent)]
    Routing(#[from] RoutingError),
    #[error("weather lookup failed: {0}")]
    Weather(#[source] ProviderError),
    #[error("reverse geocoding failed: {0}")]
    Geocoding(#[source] ProviderError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("no active organisations")]
    NoActiveOrganisations,
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("assignment {assignment_id} is already {state}")]
    AssignmentClosed {
        assignment_id: AssignmentId,
        state: &'static str,
    },
}
