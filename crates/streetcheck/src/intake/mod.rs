//! Report intake: locate and classify a submission, route it through
//! [`crate::dispatch`], and keep the report with its assignments and audit
//! trail.
//!
//! Weather and geocoding are collaborators behind [`WeatherProvider`] and
//! [`Geocoder`]; storage sits behind the repository traits so the service can
//! run against [`InMemoryStore`] in tests and the demo.

pub mod domain;
pub mod memory;
pub mod providers;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    Assignment, AssignmentId, ContactPreference, Report, ReportFilter, ReportId, ReportStatus,
    ReportSubmission,
};
pub use memory::InMemoryStore;
pub use providers::{GeocodedAddress, Geocoder, ProviderError, WeatherProvider};
pub use repository::{
    AssignmentRepository, AuditEntry, AuditKind, AuditLog, IntakeStore, OrganisationDirectory,
    RepositoryError, ReportRepository,
};
pub use router::intake_router;
pub use service::{IntakeError, NearestOrganisationView, ReportIntakeService, SubmittedReport};
