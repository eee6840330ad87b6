//! Patient database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbResult};
use crate::models::Patient;

/// Minimum Jaro-Winkler similarity for a fuzzy name match.
const NAME_MATCH_THRESHOLD: f64 = 0.75;

impl Database {
    /// Insert a new patient and return it with its assigned id.
    ///
    /// No duplicate check: patients sharing a name stay distinct by id.
    pub fn insert_patient(&self, name: &str) -> DbResult<Patient> {
        let created_at = chrono::Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO patients (name, created_at) VALUES (?1, ?2)",
            params![name, created_at],
        )?;

        Ok(Patient {
            id: self.conn.last_insert_rowid(),
            name: name.to_string(),
            created_at,
        })
    }

    /// Get a patient by id.
    pub fn get_patient(&self, id: i64) -> DbResult<Option<Patient>> {
        self.conn
            .query_row(
                "SELECT id, name, created_at FROM patients WHERE id = ?",
                [id],
                patient_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List all patients in creation order.
    pub fn list_patients(&self) -> DbResult<Vec<Patient>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, created_at FROM patients ORDER BY id")?;

        let rows = stmt.query_map([], patient_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Search patients by name, tolerating typos.
    ///
    /// Prefix matches rank first, then Jaro-Winkler similarity.
    pub fn search_patients(&self, query: &str, limit: usize) -> DbResult<Vec<Patient>> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(f64, Patient)> = self
            .list_patients()?
            .into_iter()
            .filter_map(|patient| {
                let name = patient.name.to_lowercase();
                let score = if name.starts_with(&needle) {
                    1.0 + strsim::jaro_winkler(&needle, &name)
                } else {
                    // Compare against each name part so "doe" finds "Jane Doe"
                    name.split_whitespace()
                        .map(|part| strsim::jaro_winkler(&needle, part))
                        .chain(std::iter::once(strsim::jaro_winkler(&needle, &name)))
                        .fold(0.0, f64::max)
                };
                (score >= NAME_MATCH_THRESHOLD).then_some((score, patient))
            })
            .collect();

        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.1.id.cmp(&b.1.id))
        });

        Ok(scored.into_iter().take(limit).map(|(_, p)| p).collect())
    }
}

fn patient_from_row(row: &Row<'_>) -> rusqlite::Result<Patient> {
    Ok(Patient {
        id: row.get(0)?,
        name: row.get(1)?,
        created_at: row.get(2)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    #[test]
    fn test_insert_and_get() {
        let db = setup_db();

        let patient = db.insert_patient("Jane Doe").unwrap();
        assert!(patient.id > 0);

        let retrieved = db.get_patient(patient.id).unwrap().unwrap();
        assert_eq!(retrieved.name, "Jane Doe");
        assert!(db.get_patient(patient.id + 100).unwrap().is_none());
    }

    #[test]
    fn test_duplicate_names_are_distinct() {
        let db = setup_db();

        let first = db.insert_patient("Jane Doe").unwrap();
        let second = db.insert_patient("Jane Doe").unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(db.list_patients().unwrap().len(), 2);
    }

    #[test]
    fn test_list_in_creation_order() {
        let db = setup_db();
        db.insert_patient("Zed").unwrap();
        db.insert_patient("Amy").unwrap();

        let names: Vec<_> = db
            .list_patients()
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Zed", "Amy"]);
    }

    #[test]
    fn test_search_patients() {
        let db = setup_db();
        db.insert_patient("Jane Doe").unwrap();
        db.insert_patient("Janet Smith").unwrap();
        db.insert_patient("Robert Brown").unwrap();

        let results = db.search_patients("Jan", 10).unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|p| p.name.starts_with("Jan")));

        // Typo in last name still finds the patient
        let results = db.search_patients("Doh", 10).unwrap();
        assert_eq!(results[0].name, "Jane Doe");

        assert!(db.search_patients("   ", 10).unwrap().is_empty());
        assert!(db.search_patients("xyzzy", 10).unwrap().is_empty());
    }
}
