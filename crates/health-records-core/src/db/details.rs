//! Patient details profile operations.

use rusqlite::{params, OptionalExtension};

use super::{Database, DbError, DbResult};
use crate::models::PatientDetails;

impl Database {
    /// Store the profile. It can only be created once.
    pub fn create_patient_details(&self, details: &PatientDetails) -> DbResult<()> {
        if self.get_patient_details()?.is_some() {
            return Err(DbError::Constraint(
                "Patient details already recorded".to_string(),
            ));
        }

        self.conn.execute(
            r#"
            INSERT INTO patient_details (
                id, name, age, sex, existing_disease, allergy, created_at
            ) VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                details.name,
                details.age,
                details.sex,
                details.existing_disease,
                details.allergy,
                chrono::Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Read the profile, if one was recorded.
    pub fn get_patient_details(&self) -> DbResult<Option<PatientDetails>> {
        self.conn
            .query_row(
                r#"
                SELECT name, age, sex, existing_disease, allergy
                FROM patient_details
                WHERE id = 1
                "#,
                [],
                |row| {
                    Ok(PatientDetails {
                        name: row.get(0)?,
                        age: row.get(1)?,
                        sex: row.get(2)?,
                        existing_disease: row.get(3)?,
                        allergy: row.get(4)?,
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }
}
