//! Document attachment database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbResult};
use crate::models::Document;

impl Database {
    /// Record an attachment, replacing an earlier one with the same file name
    /// on the same record. Returns the stored row.
    pub fn upsert_document(
        &self,
        record_id: i64,
        file_name: &str,
        stored_path: &str,
        sha256: &str,
        size_bytes: u64,
    ) -> DbResult<Document> {
        let attached_at = chrono::Utc::now().to_rfc3339();
        self.conn.execute(
            r#"
            INSERT INTO documents (
                record_id, file_name, stored_path, sha256, size_bytes, attached_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(record_id, file_name) DO UPDATE SET
                stored_path = excluded.stored_path,
                sha256 = excluded.sha256,
                size_bytes = excluded.size_bytes,
                attached_at = excluded.attached_at
            "#,
            params![
                record_id,
                file_name,
                stored_path,
                sha256,
                size_bytes as i64,
                attached_at,
            ],
        )?;

        self.conn
            .query_row(
                r#"
                SELECT id, record_id, file_name, stored_path, sha256, size_bytes, attached_at
                FROM documents
                WHERE record_id = ?1 AND file_name = ?2
                "#,
                params![record_id, file_name],
                document_from_row,
            )
            .map_err(Into::into)
    }

    /// All documents attached to a record, oldest first.
    pub fn list_documents(&self, record_id: i64) -> DbResult<Vec<Document>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, record_id, file_name, stored_path, sha256, size_bytes, attached_at
            FROM documents
            WHERE record_id = ?
            ORDER BY attached_at, id
            "#,
        )?;

        let rows = stmt.query_map([record_id], document_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Get a document by id.
    pub fn get_document(&self, id: i64) -> DbResult<Option<Document>> {
        self.conn
            .query_row(
                r#"
                SELECT id, record_id, file_name, stored_path, sha256, size_bytes, attached_at
                FROM documents
                WHERE id = ?
                "#,
                [id],
                document_from_row,
            )
            .optional()
            .map_err(Into::into)
    }
}

fn document_from_row(row: &Row<'_>) -> rusqlite::Result<Document> {
    let size: i64 = row.get(5)?;
    Ok(Document {
        id: row.get(0)?,
        record_id: row.get(1)?,
        file_name: row.get(2)?,
        stored_path: row.get(3)?,
        sha256: row.get(4)?,
        size_bytes: size.max(0) as u64,
        attached_at: row.get(6)?,
    })
}
