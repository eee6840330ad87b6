//! CSV exchange format.
//!
//! One header row with fixed column names, then one row per record in store
//! order. Import reads the same layout back under a chosen patient.

use std::fmt;
use std::io::{self, Read, Write};
use std::path::Path;

use csv::{ErrorKind, ReaderBuilder, StringRecord, Writer};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::db::{Database, DbError};
use crate::documents::{DocumentError, DocumentStore};
use crate::models::{Field, FieldSet, Scope};
use crate::navigator::NavigatorError;

/// Column names, in order.
pub const CSV_HEADER: [&str; 11] = [
    "ID",
    "Patient ID",
    "Date",
    "Complaint",
    "Doctor",
    "Investigation",
    "Diagnosis",
    "Medication",
    "Notes",
    "Follow-up",
    "Document Path",
];

/// Index of the first clinical column (`Date`).
const FIRST_FIELD_COLUMN: usize = 2;
/// Index of the `Document Path` column.
const DOCUMENT_COLUMN: usize = 10;

/// CSV errors.
#[derive(Error, Debug)]
pub enum CsvError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    #[error("CSV file is empty")]
    Empty,
}

pub type CsvResult<T> = Result<T, CsvError>;

impl From<NavigatorError> for CsvError {
    fn from(e: NavigatorError) -> Self {
        match e {
            NavigatorError::Database(e) => CsvError::Database(e),
            NavigatorError::Document(e) => CsvError::Document(e),
        }
    }
}

/// Why an import row was not inserted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// Row did not have exactly the header's column count
    ColumnCount { expected: usize, found: usize },
    /// Every clinical field was blank
    Blank,
    /// Row was not valid UTF-8
    InvalidText,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::ColumnCount { expected, found } => {
                write!(f, "expected {} columns, found {}", expected, found)
            }
            SkipReason::Blank => write!(f, "blank row"),
            SkipReason::InvalidText => write!(f, "not valid UTF-8"),
        }
    }
}

/// A row left out of an import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRow {
    /// 1-based line where the row starts
    pub line: usize,
    pub reason: SkipReason,
}

/// A document that exists but could not be copied in. The record itself was
/// imported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedDocument {
    pub line: usize,
    pub path: String,
    pub error: String,
}

/// Summary of an import run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    /// Ids of inserted records, in file order
    pub imported: Vec<i64>,
    pub skipped: Vec<SkippedRow>,
    /// Document paths that no longer exist and were not attached
    pub missing_documents: Vec<String>,
    pub failed_documents: Vec<FailedDocument>,
}

/// Write every record in `scope` as CSV. Returns the number of data rows.
pub fn export_csv<W: Write>(db: &Database, scope: Scope, writer: W) -> CsvResult<usize> {
    let mut wtr = Writer::from_writer(writer);
    wtr.write_record(CSV_HEADER)?;

    let records = db.list_records(scope)?;
    for record in &records {
        let mut columns = Vec::with_capacity(CSV_HEADER.len());
        columns.push(record.id.to_string());
        columns.push(record.patient_id.map(|id| id.to_string()).unwrap_or_default());
        columns.extend(record.fields.iter().map(|(_, value)| value.to_string()));
        columns.push(record.document_path.clone().unwrap_or_default());
        wtr.write_record(&columns)?;
    }

    wtr.flush()?;
    info!(?scope, rows = records.len(), "Exported records to CSV");
    Ok(records.len())
}

/// Write every record in `scope` to a CSV file.
pub fn export_csv_file(db: &Database, scope: Scope, path: &Path) -> CsvResult<usize> {
    let file = std::fs::File::create(path)?;
    export_csv(db, scope, io::BufWriter::new(file))
}

/// Read CSV rows and insert them as new records under `patient_id`.
///
/// The header row is skipped. Rows with the wrong column count, with every
/// clinical field blank, or with invalid UTF-8 are reported in the result,
/// not fatal. A document path that still exists on disk is copied into
/// `documents` and attached; a copy that fails is reported and the import
/// goes on.
pub fn import_csv<R: Read>(
    db: &Database,
    documents: &DocumentStore,
    patient_id: Option<i64>,
    reader: R,
) -> CsvResult<ImportReport> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let header = rdr.headers()?;
    if header.is_empty() {
        return Err(CsvError::Empty);
    }
    if header.iter().map(str::trim).ne(CSV_HEADER.iter().copied()) {
        warn!(found = ?header, "Unexpected CSV header; importing anyway");
    }

    let mut report = ImportReport::default();
    for result in rdr.records() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                if !matches!(e.kind(), ErrorKind::Utf8 { .. }) {
                    return Err(e.into());
                }
                let line = e.position().map(|p| p.line() as usize).unwrap_or_default();
                warn!(line, "Skipping CSV row that is not valid UTF-8");
                report.skipped.push(SkippedRow {
                    line,
                    reason: SkipReason::InvalidText,
                });
                continue;
            }
        };
        import_row(db, documents, patient_id, &record, &mut report)?;
    }

    info!(
        imported = report.imported.len(),
        skipped = report.skipped.len(),
        "Imported records from CSV"
    );
    Ok(report)
}

fn import_row(
    db: &Database,
    documents: &DocumentStore,
    patient_id: Option<i64>,
    record: &StringRecord,
    report: &mut ImportReport,
) -> CsvResult<()> {
    let line = record.position().map(|p| p.line() as usize).unwrap_or_default();

    if record.len() != CSV_HEADER.len() {
        warn!(line, found = record.len(), "Skipping CSV row with wrong column count");
        report.skipped.push(SkippedRow {
            line,
            reason: SkipReason::ColumnCount {
                expected: CSV_HEADER.len(),
                found: record.len(),
            },
        });
        return Ok(());
    }

    let mut fields = FieldSet::default();
    for (field, value) in Field::ALL
        .iter()
        .zip(record.iter().skip(FIRST_FIELD_COLUMN).take(Field::ALL.len()))
    {
        fields.set(*field, value);
    }
    if fields.is_blank() {
        warn!(line, "Skipping blank CSV row");
        report.skipped.push(SkippedRow {
            line,
            reason: SkipReason::Blank,
        });
        return Ok(());
    }

    let id = db.insert_record(patient_id, &fields)?;
    report.imported.push(id);

    let document = record.get(DOCUMENT_COLUMN).unwrap_or_default().trim();
    if document.is_empty() {
        return Ok(());
    }

    let path = Path::new(document);
    if !path.is_file() {
        warn!(line, path = document, "Document in CSV not found");
        report.missing_documents.push(document.to_string());
        return Ok(());
    }

    match documents.attach(db, id, path) {
        Ok(_) => Ok(()),
        Err(DocumentError::Database(e)) => Err(e.into()),
        Err(e) => {
            warn!(line, path = document, error = %e, "Could not attach document from CSV");
            report.failed_documents.push(FailedDocument {
                line,
                path: document.to_string(),
                error: e.to_string(),
            });
            Ok(())
        }
    }
}

/// Import a CSV file.
pub fn import_csv_file(
    db: &Database,
    documents: &DocumentStore,
    patient_id: Option<i64>,
    path: &Path,
) -> CsvResult<ImportReport> {
    let file = std::fs::File::open(path)?;
    import_csv(db, documents, patient_id, io::BufReader::new(file))
}
