//! Health record database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbResult};
use crate::models::{FieldSet, HealthRecord, RecordSummary, Scope};

const RECORD_COLUMNS: &str = r#"
    id, patient_id, date, complaint, doctor, investigation, diagnosis,
    medication, notes, follow_up, document_path, created_at, updated_at
"#;

impl Database {
    /// Insert a record under `patient_id` and return the assigned id.
    pub fn insert_record(&self, patient_id: Option<i64>, fields: &FieldSet) -> DbResult<i64> {
        let now = chrono::Utc::now().to_rfc3339();
        self.conn.execute(
            r#"
            INSERT INTO health_records (
                patient_id, date, complaint, doctor, investigation, diagnosis,
                medication, notes, follow_up, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)
            "#,
            params![
                patient_id,
                fields.date,
                fields.complaint,
                fields.doctor,
                fields.investigation,
                fields.diagnosis,
                fields.medication,
                fields.notes,
                fields.follow_up,
                now,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Overwrite the editable fields of a record.
    pub fn update_record(&self, id: i64, fields: &FieldSet) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE health_records SET
                date = ?2,
                complaint = ?3,
                doctor = ?4,
                investigation = ?5,
                diagnosis = ?6,
                medication = ?7,
                notes = ?8,
                follow_up = ?9,
                updated_at = ?10
            WHERE id = ?1
            "#,
            params![
                id,
                fields.date,
                fields.complaint,
                fields.doctor,
                fields.investigation,
                fields.diagnosis,
                fields.medication,
                fields.notes,
                fields.follow_up,
                chrono::Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Point a record at its newest attached document.
    pub fn set_document_path(&self, id: i64, path: Option<&str>) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE health_records SET document_path = ?2 WHERE id = ?1",
            params![id, path],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a record by id.
    pub fn get_record(&self, id: i64) -> DbResult<Option<HealthRecord>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM health_records WHERE id = ?", RECORD_COLUMNS),
                [id],
                record_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Delete a record. Its document rows go with it.
    pub fn delete_record(&self, id: i64) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM health_records WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }

    /// All records in scope, in insertion order.
    pub fn list_records(&self, scope: Scope) -> DbResult<Vec<HealthRecord>> {
        match scope {
            Scope::All => {
                let mut stmt = self.conn.prepare(&format!(
                    "SELECT {} FROM health_records ORDER BY id",
                    RECORD_COLUMNS
                ))?;
                let rows = stmt.query_map([], record_from_row)?;
                rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
            }
            Scope::Patient(patient_id) => {
                let mut stmt = self.conn.prepare(&format!(
                    "SELECT {} FROM health_records WHERE patient_id = ? ORDER BY id",
                    RECORD_COLUMNS
                ))?;
                let rows = stmt.query_map([patient_id], record_from_row)?;
                rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
            }
        }
    }

    /// `(id, date)` summaries in scope, in insertion order.
    pub fn list_record_summaries(&self, scope: Scope) -> DbResult<Vec<RecordSummary>> {
        match scope {
            Scope::All => {
                let mut stmt = self
                    .conn
                    .prepare("SELECT id, date FROM health_records ORDER BY id")?;
                let rows = stmt.query_map([], summary_from_row)?;
                rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
            }
            Scope::Patient(patient_id) => {
                let mut stmt = self.conn.prepare(
                    "SELECT id, date FROM health_records WHERE patient_id = ? ORDER BY id",
                )?;
                let rows = stmt.query_map([patient_id], summary_from_row)?;
                rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
            }
        }
    }

    /// Ids of every record in scope, in insertion order.
    pub fn list_record_ids(&self, scope: Scope) -> DbResult<Vec<i64>> {
        Ok(self
            .list_record_summaries(scope)?
            .into_iter()
            .map(|s| s.id)
            .collect())
    }
}

fn summary_from_row(row: &Row<'_>) -> rusqlite::Result<RecordSummary> {
    Ok(RecordSummary {
        id: row.get(0)?,
        date: row.get(1)?,
    })
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<HealthRecord> {
    Ok(HealthRecord {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        fields: FieldSet {
            date: row.get(2)?,
            complaint: row.get(3)?,
            doctor: row.get(4)?,
            investigation: row.get(5)?,
            diagnosis: row.get(6)?,
            medication: row.get(7)?,
            notes: row.get(8)?,
            follow_up: row.get(9)?,
        },
        document_path: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}
