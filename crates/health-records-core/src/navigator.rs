//! Record navigator: the cursor, view/edit mode and cached summary list for
//! the active scope.
//!
//! The summary list is a cache of the store. Every mutating operation reloads
//! it before returning, and the cursor is re-pointed so that it always names a
//! record in the list, the unsaved-new-record sentinel, or nothing at all
//! (only when the list is empty).
//!
//! ```text
//!            begin_new / toggle(Empty)
//!   View ─────────────────────────────▶ Edit
//!    ▲  ◀───────────────────────────── │
//!    │        save / toggle            │
//!    └──── begin_edit (needs record) ──┘
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::db::{Database, DbError};
use crate::documents::{DocumentError, DocumentStore};
use crate::models::{Document, FieldSet, HealthRecord, RecordSummary, Scope};

/// Navigator errors. Only store and file-system faults end up here; user
/// mistakes (empty save, nothing selected) are reported through outcomes.
#[derive(Error, Debug)]
pub enum NavigatorError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Document error: {0}")]
    Document(#[from] DocumentError),
}

pub type NavigatorResult<T> = Result<T, NavigatorError>;

/// The navigator's pointer into the summary list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cursor {
    /// No record selected; only while the list is empty
    Empty,
    /// A new record is being written and has no id yet
    Unsaved,
    /// A persisted record
    Record(i64),
}

/// Whether fields may be changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    View,
    Edit,
}

/// What stepping past either end of the list does.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WrapPolicy {
    /// Stop at the first/last record
    #[default]
    Clamp,
    /// Continue from the other end
    Wrap,
}

/// Result of [`Navigator::save`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// A new row was inserted with this id
    Inserted(i64),
    /// The existing row was updated
    Updated(i64),
    /// Values matched the stored row; nothing written
    Unchanged(i64),
    /// Every field was blank; nothing written
    Empty,
    /// Not in edit mode; nothing written
    NotEditing,
}

impl SaveOutcome {
    /// Id of the saved record, if anything was saved.
    pub fn record_id(&self) -> Option<i64> {
        match self {
            SaveOutcome::Inserted(id) | SaveOutcome::Updated(id) | SaveOutcome::Unchanged(id) => {
                Some(*id)
            }
            SaveOutcome::Empty | SaveOutcome::NotEditing => None,
        }
    }
}

/// Record navigator and edit-state machine.
#[derive(Debug, Clone)]
pub struct Navigator {
    scope: Scope,
    records: Vec<RecordSummary>,
    cursor: Cursor,
    mode: Mode,
    wrap: WrapPolicy,
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new(WrapPolicy::default())
    }
}

impl Navigator {
    /// Create an empty navigator. Call [`Navigator::load_summaries`] before use.
    pub fn new(wrap: WrapPolicy) -> Self {
        Self {
            scope: Scope::All,
            records: Vec::new(),
            cursor: Cursor::Empty,
            mode: Mode::View,
            wrap,
        }
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn summaries(&self) -> &[RecordSummary] {
        &self.records
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn wrap_policy(&self) -> WrapPolicy {
        self.wrap
    }

    pub fn set_wrap_policy(&mut self, wrap: WrapPolicy) {
        self.wrap = wrap;
    }

    /// Id of the current persisted record.
    pub fn current_id(&self) -> Option<i64> {
        match self.cursor {
            Cursor::Record(id) => Some(id),
            Cursor::Empty | Cursor::Unsaved => None,
        }
    }

    /// Zero-based index of the current record in the summary list.
    pub fn position(&self) -> Option<usize> {
        let id = self.current_id()?;
        self.records.iter().position(|s| s.id == id)
    }

    /// Counter text, e.g. `Record: 002 of 005`.
    pub fn counter(&self) -> String {
        let total = self.records.len();
        match self.cursor {
            Cursor::Unsaved => format!("Record: new of {:03}", total),
            _ => {
                let current = self.position().map(|i| i + 1).unwrap_or(0);
                format!("Record: {:03} of {:03}", current, total)
            }
        }
    }

    /// Load the summaries for `scope` and point the cursor at the last record.
    ///
    /// Any unsaved edit is abandoned and the navigator returns to view mode.
    pub fn load_summaries(&mut self, db: &Database, scope: Scope) -> NavigatorResult<()> {
        self.scope = scope;
        self.records = db.list_record_summaries(scope)?;
        self.cursor = self.last_or_empty();
        self.mode = Mode::View;
        debug!(?scope, count = self.records.len(), "Loaded record summaries");
        Ok(())
    }

    /// Reload the summaries for the current scope, keeping the cursor on the
    /// same record when it still exists.
    pub fn refresh(&mut self, db: &Database) -> NavigatorResult<()> {
        let previous_index = self.position();
        self.records = db.list_record_summaries(self.scope)?;

        self.cursor = match self.cursor {
            Cursor::Record(id) if self.records.iter().any(|s| s.id == id) => Cursor::Record(id),
            Cursor::Record(_) => self.clamped(previous_index.unwrap_or(usize::MAX)),
            Cursor::Unsaved => Cursor::Unsaved,
            Cursor::Empty => self.last_or_empty(),
        };
        Ok(())
    }

    /// Step to the next record. Refused while editing.
    pub fn select_next(&mut self, db: &Database) -> NavigatorResult<Option<HealthRecord>> {
        self.step(db, true)
    }

    /// Step to the previous record. Refused while editing.
    pub fn select_previous(&mut self, db: &Database) -> NavigatorResult<Option<HealthRecord>> {
        self.step(db, false)
    }

    /// Point the cursor at a record from the summary list.
    ///
    /// Returns `false` (and leaves the cursor alone) while editing or if the
    /// id is not listed.
    pub fn select(&mut self, id: i64) -> bool {
        if self.mode == Mode::Edit {
            warn!(id, "Selection refused while editing");
            return false;
        }
        if self.records.iter().any(|s| s.id == id) {
            self.cursor = Cursor::Record(id);
            true
        } else {
            warn!(id, "Record not in current list");
            false
        }
    }

    /// Start a new record: blank fields, unsaved cursor, edit mode.
    pub fn begin_new(&mut self) -> FieldSet {
        self.cursor = Cursor::Unsaved;
        self.mode = Mode::Edit;
        FieldSet::default()
    }

    /// Enter edit mode on the current record.
    ///
    /// Returns the fields to pre-load, or `None` when already editing or when
    /// no record is selected.
    pub fn begin_edit(&mut self, db: &Database) -> NavigatorResult<Option<FieldSet>> {
        if self.mode != Mode::View {
            return Ok(None);
        }
        let Some(record) = self.current_record(db)? else {
            warn!("Edit requested with no record selected");
            return Ok(None);
        };
        self.mode = Mode::Edit;
        Ok(Some(record.fields))
    }

    /// Flip between view and edit mode and return the new mode.
    ///
    /// Entering edit with nothing selected starts a new record. Leaving edit
    /// while a new record is unsaved discards it.
    pub fn toggle_mode(&mut self) -> Mode {
        match self.mode {
            Mode::View => {
                if self.cursor == Cursor::Empty {
                    self.cursor = Cursor::Unsaved;
                }
                self.mode = Mode::Edit;
            }
            Mode::Edit => {
                if self.cursor == Cursor::Unsaved {
                    self.cursor = self.last_or_empty();
                }
                self.mode = Mode::View;
            }
        }
        self.mode
    }

    /// Persist `fields`: insert for a new record, update for an existing one.
    ///
    /// Values are trimmed. A blank field set or a save outside edit mode is
    /// logged and changes nothing.
    pub fn save(&mut self, db: &Database, fields: &FieldSet) -> NavigatorResult<SaveOutcome> {
        if self.mode != Mode::Edit {
            warn!("Save requested outside edit mode");
            return Ok(SaveOutcome::NotEditing);
        }

        let fields = fields.trimmed();
        if fields.is_blank() {
            warn!("Cannot save an empty record");
            return Ok(SaveOutcome::Empty);
        }

        let outcome = match self.cursor {
            Cursor::Record(id) => {
                let stored = db
                    .get_record(id)?
                    .ok_or_else(|| DbError::NotFound(format!("health record {}", id)))?;
                if stored.fields == fields {
                    SaveOutcome::Unchanged(id)
                } else {
                    db.update_record(id, &fields)?;
                    info!(id, "Updated health record");
                    SaveOutcome::Updated(id)
                }
            }
            Cursor::Unsaved | Cursor::Empty => {
                let id = db.insert_record(self.scope.patient_id(), &fields)?;
                info!(id, scope = ?self.scope, "Inserted health record");
                SaveOutcome::Inserted(id)
            }
        };

        if let Some(id) = outcome.record_id() {
            self.cursor = Cursor::Record(id);
        }
        self.refresh(db)?;
        self.mode = Mode::View;
        Ok(outcome)
    }

    /// Delete the current record together with its stored documents.
    ///
    /// The cursor stays at the same list position, moving to the new last
    /// record (or nothing) when the deleted one was last. Returns the deleted
    /// id, or `None` when no record was selected.
    pub fn delete_current(
        &mut self,
        db: &Database,
        documents: &DocumentStore,
    ) -> NavigatorResult<Option<i64>> {
        let Some(id) = self.current_id() else {
            warn!("Delete requested with no record selected");
            return Ok(None);
        };
        let index = self.position().unwrap_or(usize::MAX);

        documents.remove_files_for(db, id)?;
        db.delete_record(id)?;
        info!(id, "Deleted health record");

        self.records = db.list_record_summaries(self.scope)?;
        self.cursor = self.clamped(index);
        self.mode = Mode::View;
        Ok(Some(id))
    }

    /// The current persisted record.
    pub fn current_record(&self, db: &Database) -> NavigatorResult<Option<HealthRecord>> {
        match self.current_id() {
            Some(id) => Ok(db.get_record(id)?),
            None => Ok(None),
        }
    }

    /// Fields to show in the editor: the current record's, or blank.
    pub fn current_fields(&self, db: &Database) -> NavigatorResult<FieldSet> {
        if self.cursor == Cursor::Unsaved {
            return Ok(FieldSet::default());
        }
        Ok(self
            .current_record(db)?
            .map(|r| r.fields)
            .unwrap_or_default())
    }

    /// Attach a file to the current record. Requires edit mode and a saved
    /// record; otherwise logs and returns `None`.
    pub fn attach_document(
        &mut self,
        db: &Database,
        documents: &DocumentStore,
        source: &Path,
    ) -> NavigatorResult<Option<Document>> {
        if self.mode != Mode::Edit {
            warn!("Upload requested outside edit mode");
            return Ok(None);
        }
        let Some(id) = self.current_id() else {
            warn!("Upload requested with no saved record selected");
            return Ok(None);
        };

        let document = documents.attach(db, id, source)?;
        self.refresh(db)?;
        Ok(Some(document))
    }

    /// Documents attached to the current record.
    pub fn documents(
        &self,
        db: &Database,
        documents: &DocumentStore,
    ) -> NavigatorResult<Vec<Document>> {
        match self.current_id() {
            Some(id) => Ok(documents.list(db, id)?),
            None => Ok(Vec::new()),
        }
    }

    /// Copy the current record's newest document into `dest_dir`.
    pub fn download_document(
        &self,
        db: &Database,
        documents: &DocumentStore,
        dest_dir: &Path,
    ) -> NavigatorResult<Option<PathBuf>> {
        let Some(id) = self.current_id() else {
            warn!("Download requested with no record selected");
            return Ok(None);
        };
        Ok(documents.download(db, id, dest_dir)?)
    }

    fn step(&mut self, db: &Database, forward: bool) -> NavigatorResult<Option<HealthRecord>> {
        // The front end holds the draft for the current record
        if self.mode == Mode::Edit {
            warn!(cursor = ?self.cursor, "Scrolling refused while editing");
            return Ok(None);
        }
        let Some(index) = self.position() else {
            debug!(cursor = ?self.cursor, "Nothing to scroll");
            return Ok(None);
        };

        let len = self.records.len();
        let target = match (forward, self.wrap) {
            (true, _) if index + 1 < len => index + 1,
            (false, _) if index > 0 => index - 1,
            (true, WrapPolicy::Wrap) => 0,
            (false, WrapPolicy::Wrap) => len - 1,
            (_, WrapPolicy::Clamp) => index,
        };

        self.cursor = Cursor::Record(self.records[target].id);
        debug!(from = index, to = target, "Moved cursor");
        self.current_record(db)
    }

    fn last_or_empty(&self) -> Cursor {
        self.records
            .last()
            .map(|s| Cursor::Record(s.id))
            .unwrap_or(Cursor::Empty)
    }

    /// Cursor at `index`, or at the last record if `index` is past the end.
    fn clamped(&self, index: usize) -> Cursor {
        match self.records.get(index) {
            Some(s) => Cursor::Record(s.id),
            None => self.last_or_empty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Field;

    fn setup_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn fields(date: &str, complaint: &str) -> FieldSet {
        let mut fields = FieldSet::default();
        fields.set(Field::Date, date);
        fields.set(Field::Complaint, complaint);
        fields
    }

    fn save_new(nav: &mut Navigator, db: &Database, date: &str) -> i64 {
        nav.begin_new();
        nav.save(db, &fields(date, "visit"))
            .unwrap()
            .record_id()
            .unwrap()
    }

    #[test]
    fn test_empty_navigator() {
        let db = setup_db();
        let mut nav = Navigator::default();
        nav.load_summaries(&db, Scope::All).unwrap();

        assert_eq!(nav.cursor(), Cursor::Empty);
        assert_eq!(nav.mode(), Mode::View);
        assert_eq!(nav.counter(), "Record: 000 of 000");
        assert!(nav.select_next(&db).unwrap().is_none());
        assert!(nav.current_record(&db).unwrap().is_none());
    }

    #[test]
    fn test_load_points_at_last() {
        let db = setup_db();
        db.insert_record(None, &fields("2024-01-01", "a")).unwrap();
        let last = db.insert_record(None, &fields("2024-02-01", "b")).unwrap();

        let mut nav = Navigator::default();
        nav.load_summaries(&db, Scope::All).unwrap();

        assert_eq!(nav.cursor(), Cursor::Record(last));
        assert_eq!(nav.counter(), "Record: 002 of 002");

        // Idempotent
        nav.load_summaries(&db, Scope::All).unwrap();
        assert_eq!(nav.cursor(), Cursor::Record(last));
        assert_eq!(nav.summaries().len(), 2);
    }

    #[test]
    fn test_new_and_save_inserts() {
        let db = setup_db();
        let mut nav = Navigator::default();
        nav.load_summaries(&db, Scope::All).unwrap();

        let blank = nav.begin_new();
        assert!(blank.is_blank());
        assert_eq!(nav.cursor(), Cursor::Unsaved);
        assert_eq!(nav.mode(), Mode::Edit);
        assert_eq!(nav.counter(), "Record: new of 000");

        let outcome = nav.save(&db, &fields(" 2024-01-01 ", "Headache")).unwrap();
        let SaveOutcome::Inserted(id) = outcome else {
            panic!("expected insert, got {:?}", outcome);
        };

        assert_eq!(nav.cursor(), Cursor::Record(id));
        assert_eq!(nav.mode(), Mode::View);
        assert_eq!(nav.summaries(), &[RecordSummary { id, date: "2024-01-01".into() }]);
    }

    #[test]
    fn test_save_updates_existing() {
        let db = setup_db();
        let mut nav = Navigator::default();
        nav.load_summaries(&db, Scope::All).unwrap();
        let first = save_new(&mut nav, &db, "2024-01-01");
        save_new(&mut nav, &db, "2024-02-01");

        nav.select_previous(&db).unwrap();
        let mut loaded = nav.begin_edit(&db).unwrap().unwrap();
        assert_eq!(loaded.date, "2024-01-01");

        loaded.set(Field::Diagnosis, "Tension headache");
        let outcome = nav.save(&db, &loaded).unwrap();

        assert_eq!(outcome, SaveOutcome::Updated(first));
        // Cursor stays on the edited record, not the last one
        assert_eq!(nav.cursor(), Cursor::Record(first));
        assert_eq!(nav.summaries().len(), 2);
        assert_eq!(
            db.get_record(first).unwrap().unwrap().fields.diagnosis,
            "Tension headache"
        );
    }

    #[test]
    fn test_save_unchanged() {
        let db = setup_db();
        let mut nav = Navigator::default();
        nav.load_summaries(&db, Scope::All).unwrap();
        let id = save_new(&mut nav, &db, "2024-01-01");
        let before = db.get_record(id).unwrap().unwrap();

        let loaded = nav.begin_edit(&db).unwrap().unwrap();
        assert_eq!(nav.save(&db, &loaded).unwrap(), SaveOutcome::Unchanged(id));
        assert_eq!(db.get_record(id).unwrap().unwrap(), before);
    }

    #[test]
    fn test_empty_save_is_noop() {
        let db = setup_db();
        let mut nav = Navigator::default();
        nav.load_summaries(&db, Scope::All).unwrap();

        nav.begin_new();
        let mut blank = FieldSet::default();
        blank.set(Field::Notes, "   ");
        assert_eq!(nav.save(&db, &blank).unwrap(), SaveOutcome::Empty);

        assert_eq!(nav.cursor(), Cursor::Unsaved);
        assert_eq!(nav.mode(), Mode::Edit);
        assert!(db.list_record_ids(Scope::All).unwrap().is_empty());
    }

    #[test]
    fn test_save_requires_edit_mode() {
        let db = setup_db();
        let mut nav = Navigator::default();
        nav.load_summaries(&db, Scope::All).unwrap();

        let outcome = nav.save(&db, &fields("2024-01-01", "a")).unwrap();
        assert_eq!(outcome, SaveOutcome::NotEditing);
        assert!(db.list_record_ids(Scope::All).unwrap().is_empty());
    }

    #[test]
    fn test_clamped_navigation() {
        let db = setup_db();
        let mut nav = Navigator::default();
        nav.load_summaries(&db, Scope::All).unwrap();
        let first = save_new(&mut nav, &db, "2024-01-01");
        let second = save_new(&mut nav, &db, "2024-02-01");

        let shown = nav.select_previous(&db).unwrap().unwrap();
        assert_eq!(shown.id, first);
        assert_eq!(nav.counter(), "Record: 001 of 002");

        nav.select_previous(&db).unwrap();
        assert_eq!(nav.cursor(), Cursor::Record(first));

        nav.select_next(&db).unwrap();
        nav.select_next(&db).unwrap();
        assert_eq!(nav.cursor(), Cursor::Record(second));
    }

    #[test]
    fn test_scrolling_refused_while_editing() {
        let db = setup_db();
        let mut nav = Navigator::default();
        nav.load_summaries(&db, Scope::All).unwrap();
        let first = save_new(&mut nav, &db, "2024-01-01");
        let second = save_new(&mut nav, &db, "2024-02-01");

        nav.select_previous(&db).unwrap();
        let mut draft = nav.begin_edit(&db).unwrap().unwrap();
        draft.set(Field::Diagnosis, "Migraine");

        assert!(nav.select_next(&db).unwrap().is_none());
        assert!(nav.select_previous(&db).unwrap().is_none());
        assert!(!nav.select(second));
        assert_eq!(nav.cursor(), Cursor::Record(first));
        assert_eq!(nav.mode(), Mode::Edit);

        assert_eq!(nav.save(&db, &draft).unwrap(), SaveOutcome::Updated(first));
        assert_eq!(db.get_record(first).unwrap().unwrap().fields.diagnosis, "Migraine");
        let untouched = db.get_record(second).unwrap().unwrap();
        assert_eq!(untouched.fields.date, "2024-02-01");
        assert_eq!(untouched.fields.diagnosis, "");

        // Back in view mode scrolling works again
        assert!(nav.select_next(&db).unwrap().is_some());
        assert_eq!(nav.cursor(), Cursor::Record(second));
    }

    #[test]
    fn test_wrapped_navigation() {
        let db = setup_db();
        let mut nav = Navigator::new(WrapPolicy::Wrap);
        nav.load_summaries(&db, Scope::All).unwrap();
        let first = save_new(&mut nav, &db, "2024-01-01");
        let second = save_new(&mut nav, &db, "2024-02-01");

        nav.select_next(&db).unwrap();
        assert_eq!(nav.cursor(), Cursor::Record(first));

        nav.select_previous(&db).unwrap();
        assert_eq!(nav.cursor(), Cursor::Record(second));
    }

    #[test]
    fn test_delete_middle_moves_to_next() {
        let db = setup_db();
        let mut nav = Navigator::default();
        nav.load_summaries(&db, Scope::All).unwrap();
        let docs = DocumentStore::new(std::env::temp_dir().join("hr-nav-unused"));
        save_new(&mut nav, &db, "2024-01-01");
        let middle = save_new(&mut nav, &db, "2024-02-01");
        let last = save_new(&mut nav, &db, "2024-03-01");

        nav.select(middle);
        assert_eq!(nav.delete_current(&db, &docs).unwrap(), Some(middle));
        assert_eq!(nav.cursor(), Cursor::Record(last));
        assert_eq!(nav.summaries().len(), 2);
    }

    #[test]
    fn test_delete_last_clamps() {
        let db = setup_db();
        let mut nav = Navigator::default();
        nav.load_summaries(&db, Scope::All).unwrap();
        let docs = DocumentStore::new(std::env::temp_dir().join("hr-nav-unused"));
        let first = save_new(&mut nav, &db, "2024-01-01");
        save_new(&mut nav, &db, "2024-02-01");

        nav.delete_current(&db, &docs).unwrap();
        assert_eq!(nav.cursor(), Cursor::Record(first));

        nav.delete_current(&db, &docs).unwrap();
        assert_eq!(nav.cursor(), Cursor::Empty);
        assert!(nav.summaries().is_empty());

        // Nothing left to delete
        assert_eq!(nav.delete_current(&db, &docs).unwrap(), None);
    }

    #[test]
    fn test_toggle_mode() {
        let db = setup_db();
        let mut nav = Navigator::default();
        nav.load_summaries(&db, Scope::All).unwrap();

        // Edit with nothing selected starts a new record
        assert_eq!(nav.toggle_mode(), Mode::Edit);
        assert_eq!(nav.cursor(), Cursor::Unsaved);

        // Leaving edit discards the unsaved record
        assert_eq!(nav.toggle_mode(), Mode::View);
        assert_eq!(nav.cursor(), Cursor::Empty);

        let id = save_new(&mut nav, &db, "2024-01-01");
        assert_eq!(nav.toggle_mode(), Mode::Edit);
        assert_eq!(nav.cursor(), Cursor::Record(id));
    }

    #[test]
    fn test_begin_edit_rules() {
        let db = setup_db();
        let mut nav = Navigator::default();
        nav.load_summaries(&db, Scope::All).unwrap();

        // Nothing selected
        assert!(nav.begin_edit(&db).unwrap().is_none());
        assert_eq!(nav.mode(), Mode::View);

        save_new(&mut nav, &db, "2024-01-01");
        assert!(nav.begin_edit(&db).unwrap().is_some());
        // Already editing
        assert!(nav.begin_edit(&db).unwrap().is_none());
        assert_eq!(nav.mode(), Mode::Edit);
    }

    #[test]
    fn test_scope_isolation() {
        let db = setup_db();
        let jane = db.insert_patient("Jane").unwrap();
        let john = db.insert_patient("John").unwrap();

        let mut nav = Navigator::default();
        nav.load_summaries(&db, Scope::Patient(jane.id)).unwrap();
        let id = save_new(&mut nav, &db, "2024-01-01");
        assert_eq!(db.get_record(id).unwrap().unwrap().patient_id, Some(jane.id));

        nav.load_summaries(&db, Scope::Patient(john.id)).unwrap();
        assert!(nav.summaries().is_empty());
        assert_eq!(nav.cursor(), Cursor::Empty);

        nav.load_summaries(&db, Scope::All).unwrap();
        assert_eq!(nav.summaries().len(), 1);
    }

    #[test]
    fn test_load_discards_unsaved_edit() {
        let db = setup_db();
        let mut nav = Navigator::default();
        nav.load_summaries(&db, Scope::All).unwrap();
        save_new(&mut nav, &db, "2024-01-01");

        nav.begin_new();
        nav.load_summaries(&db, Scope::All).unwrap();
        assert_eq!(nav.mode(), Mode::View);
        assert!(matches!(nav.cursor(), Cursor::Record(_)));
    }

    #[test]
    fn test_upload_rules() {
        let db = setup_db();
        let dir = tempfile::tempdir().unwrap();
        let docs = DocumentStore::new(dir.path().join("docs"));
        let source = dir.path().join("scan.pdf");
        std::fs::write(&source, b"scan").unwrap();

        let mut nav = Navigator::default();
        nav.load_summaries(&db, Scope::All).unwrap();

        // New record not saved yet
        nav.begin_new();
        assert!(nav.attach_document(&db, &docs, &source).unwrap().is_none());

        let id = nav.save(&db, &fields("2024-01-01", "a")).unwrap().record_id().unwrap();
        // View mode
        assert!(nav.attach_document(&db, &docs, &source).unwrap().is_none());

        nav.begin_edit(&db).unwrap();
        let doc = nav.attach_document(&db, &docs, &source).unwrap().unwrap();
        assert_eq!(doc.record_id, id);
        assert_eq!(nav.documents(&db, &docs).unwrap().len(), 1);
    }
}
