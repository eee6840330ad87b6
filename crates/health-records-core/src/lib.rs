//! Health Records Core Library
//!
//! Local-first store of a patient's medical visit history, with a record
//! navigator that a desktop or terminal front end drives one action at a time.
//!
//! # Architecture
//!
//! ```text
//!        user action (New / Edit / Save / Delete / ▲ / ▼ / Upload / Import)
//!                                     │
//!                                     ▼
//!   ┌──────────────────┐      ┌──────────────────┐      ┌──────────────────┐
//!   │ PatientDirectory │─────▶│    Navigator     │─────▶│  DocumentStore   │
//!   │ current patient  │scope │ cursor + mode    │      │ uploaded_docs/   │
//!   └──────────────────┘      │ summary cache    │      └──────────────────┘
//!                             └────────┬─────────┘
//!                                      │ insert / update / delete, then reload
//!                                      ▼
//!                             ┌──────────────────┐      ┌──────────────────┐
//!                             │  SQLite Database │◀────▶│   CSV exchange   │
//!                             └──────────────────┘      └──────────────────┘
//! ```
//!
//! # Core Principle
//!
//! **The store is the source of truth.** The navigator's summary list is a
//! cache reloaded after every mutation, and its cursor never dangles.
//!
//! # Modules
//!
//! - [`db`]: SQLite database layer
//! - [`models`]: Domain types (Patient, HealthRecord, FieldSet, Document, etc.)
//! - [`navigator`]: Cursor, view/edit mode and record lifecycle
//! - [`directory`]: Patient directory and selection
//! - [`documents`]: Document copies and checksums
//! - [`export`]: CSV export and import
//! - [`session`]: Everything wired together for a front end

pub mod db;
pub mod directory;
pub mod documents;
pub mod export;
pub mod models;
pub mod navigator;
pub mod session;

// Re-export commonly used types
pub use db::Database;
pub use directory::PatientDirectory;
pub use documents::DocumentStore;
pub use export::{ImportReport, CSV_HEADER};
pub use models::{
    Document, Field, FieldSet, HealthRecord, Patient, PatientDetails, RecordSummary, Scope,
};
pub use navigator::{Cursor, Mode, Navigator, SaveOutcome, WrapPolicy};
pub use session::{Session, SessionOptions};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::path::Path;
use std::sync::{Arc, Mutex};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum HealthRecordsError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Document error: {0}")]
    DocumentError(String),

    #[error("CSV error: {0}")]
    CsvError(String),
}

impl From<db::DbError> for HealthRecordsError {
    fn from(e: db::DbError) -> Self {
        match e {
            db::DbError::NotFound(what) => HealthRecordsError::NotFound(what),
            db::DbError::Constraint(msg) => HealthRecordsError::InvalidInput(msg),
            other => HealthRecordsError::DatabaseError(other.to_string()),
        }
    }
}

impl From<documents::DocumentError> for HealthRecordsError {
    fn from(e: documents::DocumentError) -> Self {
        match e {
            documents::DocumentError::Database(e) => e.into(),
            other => HealthRecordsError::DocumentError(other.to_string()),
        }
    }
}

impl From<navigator::NavigatorError> for HealthRecordsError {
    fn from(e: navigator::NavigatorError) -> Self {
        match e {
            navigator::NavigatorError::Database(e) => e.into(),
            navigator::NavigatorError::Document(e) => e.into(),
        }
    }
}

impl From<export::CsvError> for HealthRecordsError {
    fn from(e: export::CsvError) -> Self {
        match e {
            export::CsvError::Database(e) => e.into(),
            export::CsvError::Document(e) => e.into(),
            other => HealthRecordsError::CsvError(other.to_string()),
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for HealthRecordsError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        HealthRecordsError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a database at the given path.
#[uniffi::export]
pub fn open_session(
    db_path: String,
    documents_dir: String,
    wrap_navigation: bool,
) -> Result<Arc<HealthRecordsCore>, HealthRecordsError> {
    let db = Database::open(&db_path)?;
    HealthRecordsCore::wrap(db, documents_dir, wrap_navigation)
}

/// Create an in-memory database (for testing).
#[uniffi::export]
pub fn open_session_in_memory(
    documents_dir: String,
) -> Result<Arc<HealthRecordsCore>, HealthRecordsError> {
    let db = Database::open_in_memory()?;
    HealthRecordsCore::wrap(db, documents_dir, false)
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe session wrapper for FFI.
#[derive(uniffi::Object)]
pub struct HealthRecordsCore {
    session: Mutex<Session>,
}

impl HealthRecordsCore {
    fn wrap(
        db: Database,
        documents_dir: String,
        wrap_navigation: bool,
    ) -> Result<Arc<Self>, HealthRecordsError> {
        let options = SessionOptions {
            documents_dir: documents_dir.into(),
            wrap: if wrap_navigation {
                WrapPolicy::Wrap
            } else {
                WrapPolicy::Clamp
            },
        };
        Ok(Arc::new(Self {
            session: Mutex::new(Session::new(db, options)?),
        }))
    }
}

#[uniffi::export]
impl HealthRecordsCore {
    // =========================================================================
    // Patient Operations
    // =========================================================================

    /// Create a new patient.
    pub fn create_patient(&self, name: String) -> Result<FfiPatient, HealthRecordsError> {
        let session = self.session.lock()?;
        Ok(session.create_patient(&name)?.into())
    }

    /// List all patients.
    pub fn list_patients(&self) -> Result<Vec<FfiPatient>, HealthRecordsError> {
        let session = self.session.lock()?;
        Ok(session.patients()?.into_iter().map(|p| p.into()).collect())
    }

    /// Search patients by name.
    pub fn search_patients(
        &self,
        query: String,
        limit: u32,
    ) -> Result<Vec<FfiPatient>, HealthRecordsError> {
        let session = self.session.lock()?;
        let patients = session.find_patients(&query, limit as usize)?;
        Ok(patients.into_iter().map(|p| p.into()).collect())
    }

    /// Select a patient and load their records.
    pub fn select_patient(&self, patient_id: i64) -> Result<FfiPatient, HealthRecordsError> {
        let mut session = self.session.lock()?;
        Ok(session.select_patient(patient_id)?.into())
    }

    /// Show every record again.
    pub fn clear_patient(&self) -> Result<(), HealthRecordsError> {
        let mut session = self.session.lock()?;
        Ok(session.clear_patient()?)
    }

    // =========================================================================
    // Profile Operations
    // =========================================================================

    /// True until the one-time profile is recorded.
    pub fn needs_patient_details(&self) -> Result<bool, HealthRecordsError> {
        let session = self.session.lock()?;
        Ok(session.needs_patient_details()?)
    }

    pub fn get_patient_details(&self) -> Result<Option<FfiPatientDetails>, HealthRecordsError> {
        let session = self.session.lock()?;
        Ok(session.patient_details()?.map(|d| d.into()))
    }

    pub fn create_patient_details(
        &self,
        details: FfiPatientDetails,
    ) -> Result<(), HealthRecordsError> {
        let session = self.session.lock()?;
        Ok(session.create_patient_details(&details.into())?)
    }

    // =========================================================================
    // Navigator Operations
    // =========================================================================

    /// Snapshot of the navigator for rendering.
    pub fn state(&self) -> Result<FfiNavigatorState, HealthRecordsError> {
        let session = self.session.lock()?;
        Ok(FfiNavigatorState {
            mode: session.mode().into(),
            cursor: session.cursor().into(),
            counter: session.counter(),
            summaries: session
                .summaries()
                .iter()
                .cloned()
                .map(|s| s.into())
                .collect(),
            current_patient_id: session.current_patient()?.map(|p| p.id),
        })
    }

    pub fn current_record(&self) -> Result<Option<FfiHealthRecord>, HealthRecordsError> {
        let session = self.session.lock()?;
        Ok(session.current_record()?.map(|r| r.into()))
    }

    pub fn select_next(&self) -> Result<Option<FfiHealthRecord>, HealthRecordsError> {
        let mut session = self.session.lock()?;
        Ok(session.select_next()?.map(|r| r.into()))
    }

    pub fn select_previous(&self) -> Result<Option<FfiHealthRecord>, HealthRecordsError> {
        let mut session = self.session.lock()?;
        Ok(session.select_previous()?.map(|r| r.into()))
    }

    /// Jump to a record from the list. Returns false if it is not listed.
    pub fn select_record(&self, record_id: i64) -> Result<bool, HealthRecordsError> {
        let mut session = self.session.lock()?;
        Ok(session.select_record(record_id))
    }

    pub fn begin_new(&self) -> Result<FfiFieldSet, HealthRecordsError> {
        let mut session = self.session.lock()?;
        Ok(session.begin_new().into())
    }

    pub fn begin_edit(&self) -> Result<Option<FfiFieldSet>, HealthRecordsError> {
        let mut session = self.session.lock()?;
        Ok(session.begin_edit()?.map(|f| f.into()))
    }

    pub fn toggle_mode(&self) -> Result<FfiMode, HealthRecordsError> {
        let mut session = self.session.lock()?;
        Ok(session.toggle_mode().into())
    }

    pub fn save(&self, fields: FfiFieldSet) -> Result<FfiSaveOutcome, HealthRecordsError> {
        let mut session = self.session.lock()?;
        Ok(session.save(&fields.into())?.into())
    }

    /// Delete the current record. Returns its id, or None if nothing was selected.
    pub fn delete_current(&self) -> Result<Option<i64>, HealthRecordsError> {
        let mut session = self.session.lock()?;
        Ok(session.delete_current()?)
    }

    // =========================================================================
    // Document Operations
    // =========================================================================

    pub fn attach_document(
        &self,
        source_path: String,
    ) -> Result<Option<FfiDocument>, HealthRecordsError> {
        let mut session = self.session.lock()?;
        Ok(session
            .attach_document(Path::new(&source_path))?
            .map(|d| d.into()))
    }

    pub fn list_documents(&self) -> Result<Vec<FfiDocument>, HealthRecordsError> {
        let session = self.session.lock()?;
        Ok(session
            .current_documents()?
            .into_iter()
            .map(|d| d.into())
            .collect())
    }

    pub fn download_document(
        &self,
        dest_dir: String,
    ) -> Result<Option<String>, HealthRecordsError> {
        let session = self.session.lock()?;
        Ok(session
            .download_document(Path::new(&dest_dir))?
            .map(|p| p.to_string_lossy().into_owned()))
    }

    // =========================================================================
    // CSV Operations
    // =========================================================================

    /// Export all records. Returns the number of rows written.
    pub fn export_csv(&self, path: String) -> Result<u32, HealthRecordsError> {
        let session = self.session.lock()?;
        Ok(session.export_csv(Path::new(&path))? as u32)
    }

    /// Import records under the selected patient.
    pub fn import_csv(&self, path: String) -> Result<FfiImportReport, HealthRecordsError> {
        let mut session = self.session.lock()?;
        Ok(session.import_csv(Path::new(&path))?.into())
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe patient.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatient {
    pub id: i64,
    pub name: String,
}

impl From<Patient> for FfiPatient {
    fn from(patient: Patient) -> Self {
        Self {
            id: patient.id,
            name: patient.name,
        }
    }
}

/// FFI-safe patient profile.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatientDetails {
    pub name: String,
    pub age: Option<u32>,
    pub sex: String,
    pub existing_disease: String,
    pub allergy: String,
}

impl From<PatientDetails> for FfiPatientDetails {
    fn from(d: PatientDetails) -> Self {
        Self {
            name: d.name,
            age: d.age,
            sex: d.sex,
            existing_disease: d.existing_disease,
            allergy: d.allergy,
        }
    }
}

impl From<FfiPatientDetails> for PatientDetails {
    fn from(d: FfiPatientDetails) -> Self {
        PatientDetails {
            name: d.name,
            age: d.age,
            sex: d.sex,
            existing_disease: d.existing_disease,
            allergy: d.allergy,
        }
    }
}

/// FFI-safe editable fields.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiFieldSet {
    pub date: String,
    pub complaint: String,
    pub doctor: String,
    pub investigation: String,
    pub diagnosis: String,
    pub medication: String,
    pub notes: String,
    pub follow_up: String,
}

impl From<FieldSet> for FfiFieldSet {
    fn from(f: FieldSet) -> Self {
        Self {
            date: f.date,
            complaint: f.complaint,
            doctor: f.doctor,
            investigation: f.investigation,
            diagnosis: f.diagnosis,
            medication: f.medication,
            notes: f.notes,
            follow_up: f.follow_up,
        }
    }
}

impl From<FfiFieldSet> for FieldSet {
    fn from(f: FfiFieldSet) -> Self {
        FieldSet {
            date: f.date,
            complaint: f.complaint,
            doctor: f.doctor,
            investigation: f.investigation,
            diagnosis: f.diagnosis,
            medication: f.medication,
            notes: f.notes,
            follow_up: f.follow_up,
        }
    }
}

/// FFI-safe health record.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiHealthRecord {
    pub id: i64,
    pub patient_id: Option<i64>,
    pub fields: FfiFieldSet,
    pub document_path: Option<String>,
    /// Read-only detail panel text
    pub details: String,
}

impl From<HealthRecord> for FfiHealthRecord {
    fn from(record: HealthRecord) -> Self {
        let details = record.render_details();
        Self {
            id: record.id,
            patient_id: record.patient_id,
            fields: record.fields.into(),
            document_path: record.document_path,
            details,
        }
    }
}

/// FFI-safe summary list entry.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiRecordSummary {
    pub id: i64,
    pub date: String,
}

impl From<RecordSummary> for FfiRecordSummary {
    fn from(s: RecordSummary) -> Self {
        Self {
            id: s.id,
            date: s.date,
        }
    }
}

/// FFI-safe view/edit mode.
#[derive(Debug, Clone, Copy, uniffi::Enum)]
pub enum FfiMode {
    View,
    Edit,
}

impl From<Mode> for FfiMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::View => FfiMode::View,
            Mode::Edit => FfiMode::Edit,
        }
    }
}

/// FFI-safe cursor.
#[derive(Debug, Clone, Copy, uniffi::Enum)]
pub enum FfiCursor {
    Empty,
    Unsaved,
    Record { id: i64 },
}

impl From<Cursor> for FfiCursor {
    fn from(cursor: Cursor) -> Self {
        match cursor {
            Cursor::Empty => FfiCursor::Empty,
            Cursor::Unsaved => FfiCursor::Unsaved,
            Cursor::Record(id) => FfiCursor::Record { id },
        }
    }
}

/// FFI-safe navigator snapshot.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNavigatorState {
    pub mode: FfiMode,
    pub cursor: FfiCursor,
    pub counter: String,
    pub summaries: Vec<FfiRecordSummary>,
    pub current_patient_id: Option<i64>,
}

/// FFI-safe save result.
#[derive(Debug, Clone, Copy, uniffi::Enum)]
pub enum FfiSaveOutcome {
    Inserted { id: i64 },
    Updated { id: i64 },
    Unchanged { id: i64 },
    Empty,
    NotEditing,
}

impl From<SaveOutcome> for FfiSaveOutcome {
    fn from(outcome: SaveOutcome) -> Self {
        match outcome {
            SaveOutcome::Inserted(id) => FfiSaveOutcome::Inserted { id },
            SaveOutcome::Updated(id) => FfiSaveOutcome::Updated { id },
            SaveOutcome::Unchanged(id) => FfiSaveOutcome::Unchanged { id },
            SaveOutcome::Empty => FfiSaveOutcome::Empty,
            SaveOutcome::NotEditing => FfiSaveOutcome::NotEditing,
        }
    }
}

/// FFI-safe attached document.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDocument {
    pub id: i64,
    pub record_id: i64,
    pub file_name: String,
    pub stored_path: String,
    pub sha256: String,
    pub size_bytes: u64,
    pub attached_at: String,
}

impl From<Document> for FfiDocument {
    fn from(d: Document) -> Self {
        Self {
            id: d.id,
            record_id: d.record_id,
            file_name: d.file_name,
            stored_path: d.stored_path,
            sha256: d.sha256,
            size_bytes: d.size_bytes,
            attached_at: d.attached_at,
        }
    }
}

/// FFI-safe import summary.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiImportReport {
    pub imported: u32,
    /// `line N: reason` for every skipped row
    pub skipped: Vec<String>,
    pub missing_documents: Vec<String>,
    /// `line N: path: error` for documents that could not be copied in
    pub failed_documents: Vec<String>,
}

impl From<ImportReport> for FfiImportReport {
    fn from(report: ImportReport) -> Self {
        Self {
            imported: report.imported.len() as u32,
            skipped: report
                .skipped
                .iter()
                .map(|row| format!("line {}: {}", row.line, row.reason))
                .collect(),
            missing_documents: report.missing_documents,
            failed_documents: report
                .failed_documents
                .iter()
                .map(|d| format!("line {}: {}: {}", d.line, d.path, d.error))
                .collect(),
        }
    }
}
