//! Patient directory: the set of patients and the current selection.

use tracing::info;

use crate::db::{Database, DbError, DbResult};
use crate::models::{Patient, Scope};
use crate::navigator::{Navigator, NavigatorResult};

/// Holds the current patient selection.
///
/// With no selection the navigator shows every record (the single implicit
/// patient of a fresh install).
#[derive(Debug, Clone, Default)]
pub struct PatientDirectory {
    current: Option<i64>,
}

impl PatientDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently selected patient id.
    pub fn current(&self) -> Option<i64> {
        self.current
    }

    /// Scope that matches the current selection.
    pub fn scope(&self) -> Scope {
        self.current.map(Scope::Patient).unwrap_or(Scope::All)
    }

    /// Create a patient. Names need not be unique.
    pub fn create(&self, db: &Database, name: &str) -> DbResult<Patient> {
        let patient = db.insert_patient(name.trim())?;
        info!(id = patient.id, "Created patient");
        Ok(patient)
    }

    /// Select a patient and load their records into the navigator.
    pub fn select(
        &mut self,
        db: &Database,
        navigator: &mut Navigator,
        patient_id: i64,
    ) -> NavigatorResult<Patient> {
        let patient = db
            .get_patient(patient_id)?
            .ok_or_else(|| DbError::NotFound(format!("patient {}", patient_id)))?;

        self.current = Some(patient.id);
        navigator.load_summaries(db, Scope::Patient(patient.id))?;
        info!(id = patient.id, "Selected patient");
        Ok(patient)
    }

    /// Drop the selection and show every record.
    pub fn clear(&mut self, db: &Database, navigator: &mut Navigator) -> NavigatorResult<()> {
        self.current = None;
        navigator.load_summaries(db, Scope::All)
    }

    /// All patients in creation order.
    pub fn list(&self, db: &Database) -> DbResult<Vec<Patient>> {
        db.list_patients()
    }

    /// Fuzzy name search.
    pub fn search(&self, db: &Database, query: &str, limit: usize) -> DbResult<Vec<Patient>> {
        db.search_patients(query, limit)
    }
}
