//! SQLite schema definition.

/// Complete database schema for health records.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Patients
-- ============================================================================

CREATE TABLE IF NOT EXISTS patients (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,                          -- not unique
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_patients_name ON patients(name);

-- ============================================================================
-- Health Records
-- ============================================================================

CREATE TABLE IF NOT EXISTS health_records (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    patient_id INTEGER REFERENCES patients(id),  -- NULL = implicit patient
    date TEXT NOT NULL DEFAULT '',
    complaint TEXT NOT NULL DEFAULT '',
    doctor TEXT NOT NULL DEFAULT '',
    investigation TEXT NOT NULL DEFAULT '',
    diagnosis TEXT NOT NULL DEFAULT '',
    medication TEXT NOT NULL DEFAULT '',
    notes TEXT NOT NULL DEFAULT '',
    follow_up TEXT NOT NULL DEFAULT '',
    document_path TEXT,                          -- newest attachment
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_records_patient ON health_records(patient_id);

-- ============================================================================
-- Documents (one record, many attachments)
-- ============================================================================

CREATE TABLE IF NOT EXISTS documents (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    record_id INTEGER NOT NULL REFERENCES health_records(id) ON DELETE CASCADE,
    file_name TEXT NOT NULL,
    stored_path TEXT NOT NULL,
    sha256 TEXT NOT NULL,
    size_bytes INTEGER NOT NULL DEFAULT 0,
    attached_at TEXT NOT NULL DEFAULT (datetime('now')),
    UNIQUE (record_id, file_name)
);

CREATE INDEX IF NOT EXISTS idx_documents_record ON documents(record_id);

-- ============================================================================
-- Patient Details (single row profile)
-- ============================================================================

CREATE TABLE IF NOT EXISTS patient_details (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    name TEXT NOT NULL,
    age INTEGER,
    sex TEXT NOT NULL DEFAULT '',
    existing_disease TEXT NOT NULL DEFAULT '',
    allergy TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;
