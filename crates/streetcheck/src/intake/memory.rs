use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use super::domain::{Assignment, AssignmentId, Report, ReportFilter, ReportId};
use super::repository::{
    AssignmentRepository, AuditEntry, AuditLog, OrganisationDirectory, RepositoryError,
    ReportRepository,
};
use crate::dispatch::{Organisation, OrganisationId};

/// Process-local store backing every intake trait. Clones share state.
#[derive(Default, Clone)]
pub struct InMemoryStore {
    reports: Arc<Mutex<Vec<Report>>>,
    assignments: Arc<Mutex<Vec<Assignment>>>,
    report_sequence: Arc<AtomicU64>,
    assignment_sequence: Arc<AtomicU64>,
    organisations: Arc<Mutex<Vec<Organisation>>>,
    audit: Arc<Mutex<Vec<AuditEntry>>>,
}

impl InMemoryStore {
    pub fn with_organisations(organisations: Vec<Organisation>) -> Self {
        Self {
            organisations: Arc::new(Mutex::new(organisations)),
            ..Self::default()
        }
    }

    pub fn audit_entries(&self) -> Vec<AuditEntry> {
        self.audit.lock().expect("audit mutex poisoned").clone()
    }
}

fn next_in(sequence: &AtomicU64) -> u64 {
    sequence.fetch_add(1, Ordering::Relaxed) + 1
}

impl ReportRepository for InMemoryStore {
    fn next_report_id(&self) -> Result<ReportId, RepositoryError> {
        Ok(ReportId(format!("rpt-{:06}", next_in(&self.report_sequence))))
    }

    fn insert(&self, report: Report) -> Result<Report, RepositoryError> {
        let mut guard = self.reports.lock().expect("report mutex poisoned");
        if guard.iter().any(|existing| existing.id == report.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.push(report.clone());
        Ok(report)
    }

    fn update(&self, report: Report) -> Result<(), RepositoryError> {
        let mut guard = self.reports.lock().expect("report mutex poisoned");
        match guard.iter_mut().find(|existing| existing.id == report.id) {
            Some(slot) => {
                *slot = report;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch(&self, id: &ReportId) -> Result<Option<Report>, RepositoryError> {
        let guard = self.reports.lock().expect("report mutex poisoned");
        Ok(guard.iter().find(|report| &report.id == id).cloned())
    }

    fn list(&self, filter: &ReportFilter) -> Result<Vec<Report>, RepositoryError> {
        let guard = self.reports.lock().expect("report mutex poisoned");
        Ok(guard
            .iter()
            .rev()
            .filter(|report| filter.matches(report))
            .cloned()
            .collect())
    }
}

impl AssignmentRepository for InMemoryStore {
    fn next_assignment_id(&self) -> Result<AssignmentId, RepositoryError> {
        Ok(AssignmentId(format!(
            "asg-{:06}",
            next_in(&self.assignment_sequence)
        )))
    }

    fn insert_assignment(&self, assignment: Assignment) -> Result<Assignment, RepositoryError> {
        let mut guard = self.assignments.lock().expect("assignment mutex poisoned");
        if guard.iter().any(|existing| existing.id == assignment.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.push(assignment.clone());
        Ok(assignment)
    }

    fn update_assignment(&self, assignment: Assignment) -> Result<(), RepositoryError> {
        let mut guard = self.assignments.lock().expect("assignment mutex poisoned");
        match guard.iter_mut().find(|existing| existing.id == assignment.id) {
            Some(slot) => {
                *slot = assignment;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch_assignment(&self, id: &AssignmentId) -> Result<Option<Assignment>, RepositoryError> {
        let guard = self.assignments.lock().expect("assignment mutex poisoned");
        Ok(guard.iter().find(|assignment| &assignment.id == id).cloned())
    }

    fn assignments_for_report(
        &self,
        report_id: &ReportId,
    ) -> Result<Vec<Assignment>, RepositoryError> {
        let guard = self.assignments.lock().expect("assignment mutex poisoned");
        Ok(guard
            .iter()
            .rev()
            .filter(|assignment| &assignment.report_id == report_id)
            .cloned()
            .collect())
    }
}

impl OrganisationDirectory for InMemoryStore {
    fn all(&self) -> Result<Vec<Organisation>, RepositoryError> {
        Ok(self
            .organisations
            .lock()
            .expect("directory mutex poisoned")
            .clone())
    }

    fn find(&self, id: &OrganisationId) -> Result<Option<Organisation>, RepositoryError> {
        let guard = self.organisations.lock().expect("directory mutex poisoned");
        Ok(guard.iter().find(|organisation| &organisation.id == id).cloned())
    }

    fn upsert(&self, organisation: Organisation) -> Result<(), RepositoryError> {
        let mut guard = self.organisations.lock().expect("directory mutex poisoned");
        match guard.iter_mut().find(|existing| existing.id == organisation.id) {
            Some(slot) => *slot = organisation,
            None => guard.push(organisation),
        }
        Ok(())
    }

    fn set_active(
        &self,
        id: &OrganisationId,
        active: bool,
    ) -> Result<Organisation, RepositoryError> {
        let mut guard = self.organisations.lock().expect("directory mutex poisoned");
        let organisation = guard
            .iter_mut()
            .find(|organisation| &organisation.id == id)
            .ok_or(RepositoryError::NotFound)?;
        organisation.active = active;
        Ok(organisation.clone())
    }
}

impl AuditLog for InMemoryStore {
    fn append(&self, entry: AuditEntry) -> Result<(), RepositoryError> {
        self.audit.lock().expect("audit mutex poisoned").push(entry);
        Ok(())
    }

    fn for_report(&self, report_id: &ReportId) -> Result<Vec<AuditEntry>, RepositoryError> {
        let guard = self.audit.lock().expect("audit mutex poisoned");
        Ok(guard
            .iter()
            .filter(|entry| entry.report_id.as_ref() == Some(report_id))
            .cloned()
            .collect())
    }
}
