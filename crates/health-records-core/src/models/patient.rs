//! Patient models.

use serde::{Deserialize, Serialize};

/// A named patient owning a sequence of health records.
///
/// Names are not unique: two patients may share a name and remain distinct
/// by identifier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    /// Store-assigned identifier
    pub id: i64,
    /// Display name
    pub name: String,
    /// Creation timestamp
    pub created_at: String,
}

/// The single free-text medical history profile.
///
/// Created once, read afterwards. Whether to ask for it is left to the
/// front end (see `Session::needs_patient_details`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PatientDetails {
    pub name: String,
    pub age: Option<u32>,
    pub sex: String,
    /// Existing conditions
    pub existing_disease: String,
    pub allergy: String,
}

impl PatientDetails {
    /// Create a profile with the required name.
    pub fn new(name: String) -> Self {
        Self {
            name,
            ..Default::default()
        }
    }

    /// Render the profile as `Label: value` lines.
    pub fn render(&self) -> String {
        let age = self.age.map(|a| a.to_string()).unwrap_or_default();
        format!(
            "Name: {}\nAge: {}\nSex: {}\nExisting Disease: {}\nAllergy: {}\n",
            self.name, age, self.sex, self.existing_disease, self.allergy
        )
    }
}
