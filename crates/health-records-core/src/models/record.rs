//! Health record models.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One editable field of a health record, in display order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Field {
    Date,
    Complaint,
    Doctor,
    Investigation,
    Diagnosis,
    Medication,
    Notes,
    FollowUp,
}

impl Field {
    /// All fields in display order.
    pub const ALL: [Field; 8] = [
        Field::Date,
        Field::Complaint,
        Field::Doctor,
        Field::Investigation,
        Field::Diagnosis,
        Field::Medication,
        Field::Notes,
        Field::FollowUp,
    ];

    /// Human-readable label, also used as the CSV column name.
    pub fn label(&self) -> &'static str {
        match self {
            Field::Date => "Date",
            Field::Complaint => "Complaint",
            Field::Doctor => "Doctor",
            Field::Investigation => "Investigation",
            Field::Diagnosis => "Diagnosis",
            Field::Medication => "Medication",
            Field::Notes => "Notes",
            Field::FollowUp => "Follow-up",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error returned when a label does not name a [`Field`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown field label: {0}")]
pub struct UnknownField(pub String);

impl FromStr for Field {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect::<String>()
            .to_lowercase();

        match key.as_str() {
            "date" => Ok(Field::Date),
            "complaint" => Ok(Field::Complaint),
            "doctor" => Ok(Field::Doctor),
            "investigation" => Ok(Field::Investigation),
            "diagnosis" => Ok(Field::Diagnosis),
            "medication" => Ok(Field::Medication),
            "notes" => Ok(Field::Notes),
            "followup" => Ok(Field::FollowUp),
            _ => Err(UnknownField(s.to_string())),
        }
    }
}

/// The editable contents of a record, passed between the front end and the
/// navigator instead of living in widgets.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct FieldSet {
    pub date: String,
    pub complaint: String,
    pub doctor: String,
    pub investigation: String,
    pub diagnosis: String,
    pub medication: String,
    pub notes: String,
    pub follow_up: String,
}

impl FieldSet {
    /// Build from `label → value` pairs. Unknown labels are rejected.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, UnknownField>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut fields = Self::default();
        for (label, value) in pairs {
            let field: Field = label.as_ref().parse()?;
            fields.set(field, value);
        }
        Ok(fields)
    }

    /// Get a field value.
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Date => &self.date,
            Field::Complaint => &self.complaint,
            Field::Doctor => &self.doctor,
            Field::Investigation => &self.investigation,
            Field::Diagnosis => &self.diagnosis,
            Field::Medication => &self.medication,
            Field::Notes => &self.notes,
            Field::FollowUp => &self.follow_up,
        }
    }

    /// Set a field value.
    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let slot = match field {
            Field::Date => &mut self.date,
            Field::Complaint => &mut self.complaint,
            Field::Doctor => &mut self.doctor,
            Field::Investigation => &mut self.investigation,
            Field::Diagnosis => &mut self.diagnosis,
            Field::Medication => &mut self.medication,
            Field::Notes => &mut self.notes,
            Field::FollowUp => &mut self.follow_up,
        };
        *slot = value.into();
    }

    /// Iterate `(field, value)` in display order.
    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> + '_ {
        Field::ALL.iter().map(move |f| (*f, self.get(*f)))
    }

    /// Copy with surrounding whitespace stripped from every value.
    pub fn trimmed(&self) -> Self {
        let mut out = Self::default();
        for (field, value) in self.iter() {
            out.set(field, value.trim());
        }
        out
    }

    /// True if every field is empty or whitespace.
    pub fn is_blank(&self) -> bool {
        self.iter().all(|(_, value)| value.trim().is_empty())
    }
}

/// A persisted health record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthRecord {
    /// Store-assigned identifier, stable after insert
    pub id: i64,
    /// Owning patient; `None` for the single implicit patient
    pub patient_id: Option<i64>,
    pub fields: FieldSet,
    /// Most recently attached document, if any
    pub document_path: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl HealthRecord {
    /// Read-only detail panel text.
    pub fn render_details(&self) -> String {
        let mut out = String::new();
        for (field, value) in self.fields.iter() {
            out.push_str(&format!("{}: {}\n\n", field.label(), value));
        }
        if let Some(path) = &self.document_path {
            out.push_str(&format!("Document: {}\n", path));
        }
        out
    }

    /// Summary entry for the navigator list.
    pub fn summary(&self) -> RecordSummary {
        RecordSummary {
            id: self.id,
            date: self.fields.date.clone(),
        }
    }
}

/// Cached `(id, date)` pair shown in the record list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecordSummary {
    pub id: i64,
    pub date: String,
}

/// The subset of records visible to the navigator.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum Scope {
    /// Every record in the store
    #[default]
    All,
    /// Records owned by one patient
    Patient(i64),
}

impl Scope {
    /// Patient that new records in this scope belong to.
    pub fn patient_id(&self) -> Option<i64> {
        match self {
            Scope::All => None,
            Scope::Patient(id) => Some(*id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_parse_labels() {
        assert_eq!("Date".parse::<Field>().unwrap(), Field::Date);
        assert_eq!("follow-up".parse::<Field>().unwrap(), Field::FollowUp);
        assert_eq!("Follow_Up".parse::<Field>().unwrap(), Field::FollowUp);
        assert_eq!(" notes ".parse::<Field>().unwrap(), Field::Notes);
        assert!("weight".parse::<Field>().is_err());
    }

    #[test]
    fn test_labels_round_trip() {
        for field in Field::ALL {
            assert_eq!(field.label().parse::<Field>().unwrap(), field);
        }
    }

    #[test]
    fn test_from_pairs() {
        let fields =
            FieldSet::from_pairs([("Date", "2024-01-01"), ("Complaint", "Headache")]).unwrap();
        assert_eq!(fields.date, "2024-01-01");
        assert_eq!(fields.complaint, "Headache");
        assert!(fields.doctor.is_empty());

        let err = FieldSet::from_pairs([("Weight", "70kg")]).unwrap_err();
        assert_eq!(err, UnknownField("Weight".into()));
    }

    #[test]
    fn test_blank_and_trim() {
        let mut fields = FieldSet::default();
        assert!(fields.is_blank());

        fields.set(Field::Notes, "   ");
        assert!(fields.is_blank());

        fields.set(Field::Doctor, "  Dr. Rao ");
        assert!(!fields.is_blank());
        assert_eq!(fields.trimmed().doctor, "Dr. Rao");
        assert_eq!(fields.trimmed().notes, "");
    }

    #[test]
    fn test_render_details() {
        let record = HealthRecord {
            id: 1,
            patient_id: None,
            fields: FieldSet::from_pairs([("Date", "2024-01-01"), ("Diagnosis", "Migraine")])
                .unwrap(),
            document_path: None,
            created_at: String::new(),
            updated_at: String::new(),
        };

        let text = record.render_details();
        assert!(text.starts_with("Date: 2024-01-01\n\n"));
        assert!(text.contains("Diagnosis: Migraine"));
        assert!(text.contains("Follow-up: "));
        assert!(!text.contains("Document:"));
    }
}
