//! A front-end session: one database, one patient selection, one navigator.
//!
//! Each user action maps to one method and runs to completion before the next.

use std::path::{Path, PathBuf};

use crate::db::{Database, DbResult};
use crate::directory::PatientDirectory;
use crate::documents::DocumentStore;
use crate::export::{self, CsvResult, ImportReport};
use crate::models::{
    Document, FieldSet, HealthRecord, Patient, PatientDetails, RecordSummary, Scope,
};
use crate::navigator::{Cursor, Mode, Navigator, NavigatorResult, SaveOutcome, WrapPolicy};

/// Session settings supplied by the front end.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Where uploaded documents are copied
    pub documents_dir: PathBuf,
    pub wrap: WrapPolicy,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            documents_dir: PathBuf::from("uploaded_docs"),
            wrap: WrapPolicy::Clamp,
        }
    }
}

/// Database, patient directory, navigator and document store wired together.
pub struct Session {
    db: Database,
    directory: PatientDirectory,
    navigator: Navigator,
    documents: DocumentStore,
}

impl Session {
    /// Start a session over `db` showing every record.
    pub fn new(db: Database, options: SessionOptions) -> NavigatorResult<Self> {
        let mut navigator = Navigator::new(options.wrap);
        navigator.load_summaries(&db, PatientDirectory::new().scope())?;

        Ok(Self {
            db,
            directory: PatientDirectory::new(),
            navigator,
            documents: DocumentStore::new(options.documents_dir),
        })
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn documents(&self) -> &DocumentStore {
        &self.documents
    }

    pub fn mode(&self) -> Mode {
        self.navigator.mode()
    }

    pub fn cursor(&self) -> Cursor {
        self.navigator.cursor()
    }

    pub fn summaries(&self) -> &[RecordSummary] {
        self.navigator.summaries()
    }

    pub fn counter(&self) -> String {
        self.navigator.counter()
    }

    // =========================================================================
    // Patients
    // =========================================================================

    pub fn create_patient(&self, name: &str) -> DbResult<Patient> {
        self.directory.create(&self.db, name)
    }

    pub fn select_patient(&mut self, patient_id: i64) -> NavigatorResult<Patient> {
        self.directory
            .select(&self.db, &mut self.navigator, patient_id)
    }

    pub fn clear_patient(&mut self) -> NavigatorResult<()> {
        self.directory.clear(&self.db, &mut self.navigator)
    }

    pub fn current_patient(&self) -> DbResult<Option<Patient>> {
        match self.directory.current() {
            Some(id) => self.db.get_patient(id),
            None => Ok(None),
        }
    }

    pub fn patients(&self) -> DbResult<Vec<Patient>> {
        self.directory.list(&self.db)
    }

    pub fn find_patients(&self, query: &str, limit: usize) -> DbResult<Vec<Patient>> {
        self.directory.search(&self.db, query, limit)
    }

    // =========================================================================
    // Profile
    // =========================================================================

    /// True until the one-time profile has been recorded.
    pub fn needs_patient_details(&self) -> DbResult<bool> {
        Ok(self.db.get_patient_details()?.is_none())
    }

    pub fn patient_details(&self) -> DbResult<Option<PatientDetails>> {
        self.db.get_patient_details()
    }

    pub fn create_patient_details(&self, details: &PatientDetails) -> DbResult<()> {
        self.db.create_patient_details(details)
    }

    // =========================================================================
    // Records
    // =========================================================================

    pub fn reload(&mut self) -> NavigatorResult<()> {
        let scope = self.directory.scope();
        self.navigator.load_summaries(&self.db, scope)
    }

    pub fn current_record(&self) -> NavigatorResult<Option<HealthRecord>> {
        self.navigator.current_record(&self.db)
    }

    pub fn current_fields(&self) -> NavigatorResult<FieldSet> {
        self.navigator.current_fields(&self.db)
    }

    pub fn select_next(&mut self) -> NavigatorResult<Option<HealthRecord>> {
        self.navigator.select_next(&self.db)
    }

    pub fn select_previous(&mut self) -> NavigatorResult<Option<HealthRecord>> {
        self.navigator.select_previous(&self.db)
    }

    pub fn select_record(&mut self, id: i64) -> bool {
        self.navigator.select(id)
    }

    pub fn begin_new(&mut self) -> FieldSet {
        self.navigator.begin_new()
    }

    pub fn begin_edit(&mut self) -> NavigatorResult<Option<FieldSet>> {
        self.navigator.begin_edit(&self.db)
    }

    pub fn toggle_mode(&mut self) -> Mode {
        self.navigator.toggle_mode()
    }

    pub fn save(&mut self, fields: &FieldSet) -> NavigatorResult<SaveOutcome> {
        self.navigator.save(&self.db, fields)
    }

    pub fn delete_current(&mut self) -> NavigatorResult<Option<i64>> {
        self.navigator.delete_current(&self.db, &self.documents)
    }

    // =========================================================================
    // Documents
    // =========================================================================

    pub fn attach_document(&mut self, source: &Path) -> NavigatorResult<Option<Document>> {
        self.navigator
            .attach_document(&self.db, &self.documents, source)
    }

    pub fn current_documents(&self) -> NavigatorResult<Vec<Document>> {
        self.navigator.documents(&self.db, &self.documents)
    }

    pub fn download_document(&self, dest_dir: &Path) -> NavigatorResult<Option<PathBuf>> {
        self.navigator
            .download_document(&self.db, &self.documents, dest_dir)
    }

    // =========================================================================
    // CSV
    // =========================================================================

    /// Export every record in the store.
    pub fn export_csv(&self, path: &Path) -> CsvResult<usize> {
        export::export_csv_file(&self.db, Scope::All, path)
    }

    /// Import under the selected patient, then reload the list.
    pub fn import_csv(&mut self, path: &Path) -> CsvResult<ImportReport> {
        let report =
            export::import_csv_file(&self.db, &self.documents, self.directory.current(), path)?;
        self.navigator.refresh(&self.db)?;
        Ok(report)
    }
}
