use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{Assignment, AssignmentId, Report, ReportFilter, ReportId};
use crate::dispatch::{Organisation, OrganisationId};

/// Storage abstraction for submitted reports.
pub trait ReportRepository: Send + Sync {
    /// Next sequential id for this store, formatted `rpt-000001`.
    fn next_report_id(&self) -> Result<ReportId, RepositoryError>;
    fn insert(&self, report: Report) -> Result<Report, RepositoryError>;
    fn update(&self, report: Report) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &ReportId) -> Result<Option<Report>, RepositoryError>;
    /// Matching reports, newest first.
    fn list(&self, filter: &ReportFilter) -> Result<Vec<Report>, RepositoryError>;
}

/// Responder organisations available for routing.
///
/// Listings must come back in insertion order; nearest-organisation ties are
/// broken by that order.
pub trait OrganisationDirectory: Send + Sync {
    fn all(&self) -> Result<Vec<Organisation>, RepositoryError>;
    fn find(&self, id: &OrganisationId) -> Result<Option<Organisation>, RepositoryError>;
    fn upsert(&self, organisation: Organisation) -> Result<(), RepositoryError>;
    fn set_active(&self, id: &OrganisationId, active: bool)
        -> Result<Organisation, RepositoryError>;

    fn active(&self) -> Result<Vec<Organisation>, RepositoryError> {
        Ok(self
            .all()?
            .into_iter()
            .filter(|organisation| organisation.active)
            .collect())
    }
}

/// Responder assignments against stored reports.
pub trait AssignmentRepository: Send + Sync {
    /// Next sequential id for this store, formatted `asg-000001`.
    fn next_assignment_id(&self) -> Result<AssignmentId, RepositoryError>;
    fn insert_assignment(&self, assignment: Assignment) -> Result<Assignment, RepositoryError>;
    fn update_assignment(&self, assignment: Assignment) -> Result<(), RepositoryError>;
    fn fetch_assignment(&self, id: &AssignmentId) -> Result<Option<Assignment>, RepositoryError>;
    /// Assignments for one report, newest first.
    fn assignments_for_report(
        &self,
        report_id: &ReportId,
    ) -> Result<Vec<Assignment>, RepositoryError>;
}

/// Append-only record of routing and workflow events.
pub trait AuditLog: Send + Sync {
    fn append(&self, entry: AuditEntry) -> Result<(), RepositoryError>;
    fn for_report(&self, report_id: &ReportId) -> Result<Vec<AuditEntry>, RepositoryError>;
}

/// Everything the intake service persists to, usually one backing store.
pub trait IntakeStore:
    ReportRepository + AssignmentRepository + OrganisationDirectory + AuditLog
{
}

impl<T> IntakeStore for T where
    T: ReportRepository + AssignmentRepository + OrganisationDirectory + AuditLog
{
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditKind {
    ReportRouting,
    SecondaryNotification,
    StatusUpdate,
    OrganisationUpdate,
    AssignmentCreated,
    AssignmentAccepted,
    AssignmentCompleted,
}

impl AuditKind {
    pub const fn label(self) -> &'static str {
        match self {
            AuditKind::ReportRouting => "REPORT_ROUTING",
            AuditKind::SecondaryNotification => "SECONDARY_NOTIFICATION",
            AuditKind::StatusUpdate => "STATUS_UPDATE",
            AuditKind::OrganisationUpdate => "ORGANISATION_UPDATE",
            AuditKind::AssignmentCreated => "ASSIGNMENT_CREATED",
            AuditKind::AssignmentAccepted => "ASSIGNMENT_ACCEPTED",
            AuditKind::AssignmentCompleted => "ASSIGNMENT_COMPLETED",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub kind: AuditKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_id: Option<ReportId>,
    pub actor: String,
    pub metadata: BTreeMap<String, String>,
    pub created_at: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(kind: AuditKind, report_id: Option<ReportId>, actor: impl Into<String>) -> Self {
        Self {
            kind,
            report_id,
            actor: actor.into(),
            metadata: BTreeMap::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with(mut self, key: &str, value: impl ToString) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
