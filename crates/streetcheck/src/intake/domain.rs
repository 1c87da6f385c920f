use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dispatch::{OrganisationId, RiskTier};

/// Identifier wrapper for stored reports.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReportId(pub String);

impl std::fmt::Display for ReportId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier wrapper for responder assignments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssignmentId(pub String);

impl std::fmt::Display for AssignmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// How the spotter agreed to be contacted about the report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContactPreference {
    #[default]
    Anonymous,
    NameOnly,
    Phone,
    Email,
    All,
}

/// Workflow state of a report once an organisation owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportStatus {
    New,
    Assigned,
    InProgress,
    Resolved,
    CouldNotFind,
}

impl ReportStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ReportStatus::New => "NEW",
            ReportStatus::Assigned => "ASSIGNED",
            ReportStatus::InProgress => "IN_PROGRESS",
            ReportStatus::Resolved => "RESOLVED",
            ReportStatus::CouldNotFind => "COULD_NOT_FIND",
        }
    }
}

/// Payload a member of the public submits from the field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSubmission {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub gps_accuracy_meters: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub has_photo: bool,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub contact_preference: ContactPreference,
    #[serde(default)]
    pub contact_name: Option<String>,
    #[serde(default)]
    pub contact_phone: Option<String>,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub spotter_id: Option<String>,
}

/// Stored report with the location, weather and routing snapshot taken at
/// submission time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: ReportId,
    pub latitude: f64,
    pub longitude: f64,
    pub gps_accuracy_meters: Option<f64>,
    pub address: String,
    pub city: String,
    pub county: String,
    pub country: String,
    pub temperature_celsius: f64,
    pub feels_like_celsius: f64,
    pub weather_description: String,
    pub risk_tier: RiskTier,
    pub notes: Option<String>,
    pub has_photo: bool,
    pub photo_url: Option<String>,
    pub contact_preference: ContactPreference,
    pub contact_name: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_email: Option<String>,
    pub spotter_id: Option<String>,
    pub owner_organisation_id: OrganisationId,
    pub status: ReportStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Optional narrowing for report listings. Empty means everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ReportFilter {
    #[serde(default)]
    pub organisation_id: Option<OrganisationId>,
    #[serde(default)]
    pub status: Option<ReportStatus>,
}

impl ReportFilter {
    pub fn matches(&self, report: &Report) -> bool {
        let organisation = self
            .organisation_id
            .as_ref()
            .map_or(true, |id| &report.owner_organisation_id == id);
        let status = self.status.map_or(true, |status| report.status == status);
        organisation && status
    }
}

/// A responder taking a report on behalf of an organisation.
///
/// Acceptance is optional; a responder may complete straight from assignment.
/// Once `completed_at` is set the assignment is closed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: AssignmentId,
    pub report_id: ReportId,
    pub responder_id: String,
    pub organisation_id: OrganisationId,
    pub assigned_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub outcome: Option<String>,
}

impl Assignment {
    pub fn is_accepted(&self) -> bool {
        self.accepted_at.is_some()
    }

    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }
}
