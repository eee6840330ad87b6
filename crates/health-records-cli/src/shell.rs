//! Interactive command loop over a [`Session`].
//!
//! Each input line is one user action. Failures are printed and the loop
//! keeps going; only `close` or end of input stops it.

use anyhow::{bail, Context, Result};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tracing::debug;

use health_records_core::{Cursor, Field, FieldSet, Mode, PatientDetails, SaveOutcome, Session};

const HELP: &str = "\
Records:
  new                     start a blank record
  edit                    edit the current record
  view                    leave edit mode (discards unsaved changes)
  set <field> <value>     change a field while editing
  save                    save the record being edited
  delete                  delete the current record and its documents
  up / down               previous / next record
  show                    print the current record
Documents:
  upload <path>           attach a file (edit mode, saved record)
  download <dir>          copy the newest attachment into <dir>
  docs                    list attachments of the current record
CSV:
  export <path>           write every record to a CSV file
  import <path>           read records into the selected patient
Patients:
  patients                list patients
  patient add <name>      create a patient
  patient select <id>     show only this patient's records
  patient find <query>    fuzzy search by name
  patient clear           show every record again
Other:
  profile                 show the saved patient details
  help                    this text
  close                   quit";

/// One parsed shell command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    New,
    View,
    Edit,
    Set(Field, String),
    Save,
    Delete,
    Up,
    Down,
    Show,
    Upload(PathBuf),
    Download(PathBuf),
    Docs,
    Export(PathBuf),
    Import(PathBuf),
    Patients,
    PatientAdd(String),
    PatientSelect(i64),
    PatientFind(String),
    PatientClear,
    Profile,
    Help,
    Close,
}

impl Command {
    /// Parse one input line. Blank lines give `None`.
    pub fn parse(line: &str) -> Result<Option<Command>> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let (word, rest) = split_word(line);

        let command = match word.to_lowercase().as_str() {
            "new" => Command::New,
            "view" => Command::View,
            "edit" => Command::Edit,
            "save" => Command::Save,
            "delete" => Command::Delete,
            "up" | "prev" => Command::Up,
            "down" | "next" => Command::Down,
            "show" => Command::Show,
            "docs" => Command::Docs,
            "patients" => Command::Patients,
            "profile" => Command::Profile,
            "help" | "?" => Command::Help,
            "close" | "quit" | "exit" => Command::Close,
            "set" => {
                let (label, value) = split_word(rest);
                if label.is_empty() {
                    bail!("Usage: set <field> <value>");
                }
                let field: Field = label.parse()?;
                Command::Set(field, value.to_string())
            }
            "upload" => Command::Upload(required_path(rest, "upload <path>")?),
            "download" => Command::Download(required_path(rest, "download <dir>")?),
            "export" => Command::Export(required_path(rest, "export <path>")?),
            "import" => Command::Import(required_path(rest, "import <path>")?),
            "patient" => {
                let (sub, arg) = split_word(rest);
                match sub.to_lowercase().as_str() {
                    "add" if !arg.is_empty() => Command::PatientAdd(arg.to_string()),
                    "select" => {
                        let id = arg
                            .parse()
                            .with_context(|| format!("Not a patient id: {:?}", arg))?;
                        Command::PatientSelect(id)
                    }
                    "find" if !arg.is_empty() => Command::PatientFind(arg.to_string()),
                    "clear" => Command::PatientClear,
                    _ => bail!("Usage: patient add <name> | select <id> | find <query> | clear"),
                }
            }
            other => bail!("Unknown command: {} (try 'help')", other),
        };
        Ok(Some(command))
    }
}

fn split_word(s: &str) -> (&str, &str) {
    let s = s.trim();
    match s.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (s, ""),
    }
}

fn required_path(arg: &str, usage: &str) -> Result<PathBuf> {
    if arg.is_empty() {
        bail!("Usage: {}", usage);
    }
    Ok(PathBuf::from(arg))
}

/// The interactive front end: a session plus the edit buffer.
pub struct Shell<R, W> {
    session: Session,
    /// Fields being edited; `Some` exactly while in edit mode
    buffer: Option<FieldSet>,
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Shell<R, W> {
    pub fn new(session: Session, input: R, output: W) -> Self {
        Self {
            session,
            buffer: None,
            input,
            output,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Run until `close` or end of input.
    pub fn run(&mut self) -> Result<()> {
        self.prompt_profile()?;
        self.show()?;

        loop {
            write!(self.output, "{}", self.prompt())?;
            self.output.flush()?;

            let Some(line) = self.read_line()? else {
                break;
            };
            let command = match Command::parse(&line) {
                Ok(Some(command)) => command,
                Ok(None) => continue,
                Err(e) => {
                    writeln!(self.output, "{:#}", e)?;
                    continue;
                }
            };
            if command == Command::Close {
                break;
            }

            debug!(?command, "Executing");
            if let Err(e) = self.execute(command) {
                writeln!(self.output, "Error: {:#}", e)?;
            }
        }
        Ok(())
    }

    fn prompt(&self) -> String {
        let mode = match self.session.mode() {
            Mode::View => "view",
            Mode::Edit => "edit",
        };
        format!("[{}] {}> ", mode, self.session.counter())
    }

    fn read_line(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    fn ask(&mut self, label: &str) -> Result<Option<String>> {
        write!(self.output, "{}: ", label)?;
        self.output.flush()?;
        Ok(self.read_line()?.map(|s| s.trim().to_string()))
    }

    /// Ask for the one-time patient profile when none is stored.
    fn prompt_profile(&mut self) -> Result<()> {
        if !self.session.needs_patient_details()? {
            return Ok(());
        }
        writeln!(self.output, "Welcome! Please enter the patient's details.")?;

        let name = self.ask("Name")?.unwrap_or_default();
        if name.is_empty() {
            writeln!(self.output, "No name given, profile skipped.")?;
            return Ok(());
        }
        let age = self.ask("Age")?.unwrap_or_default();
        let sex = self.ask("Sex")?.unwrap_or_default();
        let existing_disease = self.ask("Existing disease")?.unwrap_or_default();
        let allergy = self.ask("Allergy")?.unwrap_or_default();

        let age = if age.is_empty() {
            None
        } else {
            match age.parse() {
                Ok(age) => Some(age),
                Err(_) => {
                    writeln!(self.output, "Age {:?} is not a number, left blank.", age)?;
                    None
                }
            }
        };

        let details = PatientDetails {
            name,
            age,
            sex,
            existing_disease,
            allergy,
        };
        self.session.create_patient_details(&details)?;
        writeln!(self.output, "Profile saved.")?;
        Ok(())
    }

    /// Run one command against the session.
    pub fn execute(&mut self, command: Command) -> Result<()> {
        match command {
            Command::New => {
                self.buffer = Some(self.session.begin_new());
                writeln!(self.output, "New record. Use 'set' then 'save'.")?;
            }
            Command::Edit => self.edit()?,
            Command::View => {
                if self.session.mode() == Mode::Edit {
                    self.session.toggle_mode();
                }
                self.buffer = None;
                self.show()?;
            }
            Command::Set(field, value) => match self.buffer.as_mut() {
                Some(buffer) => buffer.set(field, value),
                None => writeln!(self.output, "Not editing. Use 'new' or 'edit' first.")?,
            },
            Command::Save => self.save()?,
            Command::Delete => match self.session.delete_current()? {
                Some(id) => {
                    self.buffer = None;
                    writeln!(self.output, "Deleted record {}.", id)?;
                    self.show()?;
                }
                None => writeln!(self.output, "No record selected.")?,
            },
            Command::Up | Command::Down if self.session.mode() == Mode::Edit => {
                writeln!(self.output, "Finish editing first ('save' or 'view').")?;
            }
            Command::Up => {
                self.session.select_previous()?;
                self.show()?;
            }
            Command::Down => {
                self.session.select_next()?;
                self.show()?;
            }
            Command::Show => self.show()?,
            Command::Upload(path) => match self.session.attach_document(&path)? {
                Some(document) => writeln!(
                    self.output,
                    "Attached {} ({} bytes).",
                    document.file_name, document.size_bytes
                )?,
                None => writeln!(
                    self.output,
                    "Upload needs edit mode on a saved record."
                )?,
            },
            Command::Download(dir) => match self.session.download_document(&dir)? {
                Some(path) => writeln!(self.output, "Saved {}.", path.display())?,
                None => writeln!(self.output, "No document available.")?,
            },
            Command::Docs => {
                let documents = self.session.current_documents()?;
                if documents.is_empty() {
                    writeln!(self.output, "No documents.")?;
                }
                for document in documents {
                    writeln!(
                        self.output,
                        "{}  {}  {} bytes  {}",
                        document.id, document.file_name, document.size_bytes, document.attached_at
                    )?;
                }
            }
            Command::Export(path) => {
                let count = self
                    .session
                    .export_csv(&path)
                    .with_context(|| format!("Failed to export to {}", path.display()))?;
                writeln!(self.output, "Exported {} records.", count)?;
            }
            Command::Import(path) => {
                let report = self
                    .session
                    .import_csv(&path)
                    .with_context(|| format!("Failed to import {}", path.display()))?;
                writeln!(self.output, "Imported {} records.", report.imported.len())?;
                for row in &report.skipped {
                    writeln!(self.output, "  skipped line {}: {}", row.line, row.reason)?;
                }
                for missing in &report.missing_documents {
                    writeln!(self.output, "  document not found: {}", missing)?;
                }
                for failed in &report.failed_documents {
                    writeln!(
                        self.output,
                        "  document not attached (line {}): {}: {}",
                        failed.line, failed.path, failed.error
                    )?;
                }
                self.buffer = None;
            }
            Command::Patients => {
                let current = self.session.current_patient()?.map(|p| p.id);
                for patient in self.session.patients()? {
                    let marker = if Some(patient.id) == current { "*" } else { " " };
                    writeln!(self.output, "{} {}  {}", marker, patient.id, patient.name)?;
                }
            }
            Command::PatientAdd(name) => {
                let patient = self.session.create_patient(&name)?;
                writeln!(self.output, "Created patient {} ({}).", patient.id, patient.name)?;
            }
            Command::PatientSelect(id) => {
                let patient = self.session.select_patient(id)?;
                self.buffer = None;
                writeln!(self.output, "Selected {}.", patient.name)?;
                self.show()?;
            }
            Command::PatientFind(query) => {
                let found = self.session.find_patients(&query, 10)?;
                if found.is_empty() {
                    writeln!(self.output, "No matches.")?;
                }
                for patient in found {
                    writeln!(self.output, "  {}  {}", patient.id, patient.name)?;
                }
            }
            Command::PatientClear => {
                self.session.clear_patient()?;
                self.buffer = None;
                self.show()?;
            }
            Command::Profile => match self.session.patient_details()? {
                Some(details) => write!(self.output, "{}", details.render())?,
                None => writeln!(self.output, "No profile saved.")?,
            },
            Command::Help => writeln!(self.output, "{}", HELP)?,
            Command::Close => {}
        }
        Ok(())
    }

    fn edit(&mut self) -> Result<()> {
        if self.session.mode() == Mode::Edit {
            writeln!(self.output, "Already editing.")?;
            return Ok(());
        }
        match self.session.begin_edit()? {
            Some(fields) => self.buffer = Some(fields),
            None => {
                // Nothing selected: editing starts a new record
                self.session.toggle_mode();
                self.buffer = Some(self.session.current_fields()?);
            }
        }
        self.show()
    }

    fn save(&mut self) -> Result<()> {
        let Some(buffer) = self.buffer.clone() else {
            writeln!(self.output, "Not editing.")?;
            return Ok(());
        };

        match self.session.save(&buffer)? {
            SaveOutcome::Inserted(id) => writeln!(self.output, "Saved new record {}.", id)?,
            SaveOutcome::Updated(id) => writeln!(self.output, "Updated record {}.", id)?,
            SaveOutcome::Unchanged(id) => writeln!(self.output, "Record {} unchanged.", id)?,
            SaveOutcome::Empty => {
                writeln!(self.output, "Cannot save an empty record.")?;
                return Ok(());
            }
            SaveOutcome::NotEditing => {
                writeln!(self.output, "Not editing.")?;
                return Ok(());
            }
        }
        self.buffer = None;
        self.show()
    }

    fn show(&mut self) -> Result<()> {
        writeln!(self.output, "{}", self.session.counter())?;

        if let Some(buffer) = &self.buffer {
            for (field, value) in buffer.iter() {
                writeln!(self.output, "  {}: {}", field.label(), value)?;
            }
            return Ok(());
        }

        match self.session.current_record()? {
            Some(record) => write!(self.output, "{}", record.render_details())?,
            None if self.session.cursor() == Cursor::Unsaved => {
                writeln!(self.output, "(new record)")?
            }
            None => writeln!(self.output, "No records.")?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use health_records_core::{Database, SessionOptions};
    use std::io::Cursor as Input;
    use std::path::Path;

    fn session(dir: &Path) -> Session {
        let options = SessionOptions {
            documents_dir: dir.join("docs"),
            ..Default::default()
        };
        Session::new(Database::open_in_memory().unwrap(), options).unwrap()
    }

    fn run_script(session: Session, script: &str) -> (Session, String) {
        let mut output = Vec::new();
        let mut shell = Shell::new(session, Input::new(script.as_bytes()), &mut output);
        shell.run().unwrap();
        let Shell { session, .. } = shell;
        (session, String::from_utf8(output).unwrap())
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("  ").unwrap(), None);
        assert_eq!(Command::parse("NEW").unwrap(), Some(Command::New));
        assert_eq!(
            Command::parse("set follow-up next week").unwrap(),
            Some(Command::Set(Field::FollowUp, "next week".into()))
        );
        assert_eq!(
            Command::parse("set notes").unwrap(),
            Some(Command::Set(Field::Notes, String::new()))
        );
        assert_eq!(
            Command::parse("patient select 3").unwrap(),
            Some(Command::PatientSelect(3))
        );
        assert_eq!(
            Command::parse("patient add Jane Doe").unwrap(),
            Some(Command::PatientAdd("Jane Doe".into()))
        );
        assert_eq!(
            Command::parse("upload /tmp/scan 1.pdf").unwrap(),
            Some(Command::Upload(PathBuf::from("/tmp/scan 1.pdf")))
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(Command::parse("frobnicate").is_err());
        assert!(Command::parse("set colour red").is_err());
        assert!(Command::parse("set").is_err());
        assert!(Command::parse("patient select abc").is_err());
        assert!(Command::parse("patient add").is_err());
        assert!(Command::parse("export").is_err());
    }

    #[test]
    fn test_profile_prompt_on_first_run() {
        let dir = tempfile::tempdir().unwrap();
        let script = "Jane Doe\n34\nF\nAsthma\nPenicillin\nprofile\nclose\n";
        let (session, output) = run_script(session(dir.path()), script);

        assert!(output.contains("Profile saved."));
        let details = session.patient_details().unwrap().unwrap();
        assert_eq!(details.name, "Jane Doe");
        assert_eq!(details.age, Some(34));
        assert_eq!(details.allergy, "Penicillin");
    }

    #[test]
    fn test_new_record_flow() {
        let dir = tempfile::tempdir().unwrap();
        let s = session(dir.path());
        s.create_patient_details(&PatientDetails::new("Jane".into()))
            .unwrap();

        let script = "\
patient add Jane Doe
patient select 1
new
set date 2024-01-01
set complaint Headache
save
new
save
view
close
";
        let (session, output) = run_script(s, script);

        assert!(output.contains("Saved new record 1."));
        assert!(output.contains("Complaint: Headache"));
        assert!(output.contains("Cannot save an empty record."));
        assert_eq!(session.summaries().len(), 1);
        assert_eq!(session.counter(), "Record: 001 of 001");
        assert_eq!(session.mode(), Mode::View);
    }

    #[test]
    fn test_edit_and_navigation() {
        let dir = tempfile::tempdir().unwrap();
        let s = session(dir.path());
        s.create_patient_details(&PatientDetails::new("Jane".into()))
            .unwrap();

        let script = "\
new
set date 2024-01-01
save
new
set date 2024-02-01
save
up
edit
set diagnosis Migraine
save
down
up
up
close
";
        let (session, output) = run_script(s, script);

        assert!(output.contains("Updated record 1."));
        assert_eq!(session.counter(), "Record: 001 of 002");
        let record = session.current_record().unwrap().unwrap();
        assert_eq!(record.fields.diagnosis, "Migraine");
    }

    #[test]
    fn test_scrolling_while_editing_keeps_the_draft_on_its_record() {
        let dir = tempfile::tempdir().unwrap();
        let s = session(dir.path());
        s.create_patient_details(&PatientDetails::new("Jane".into()))
            .unwrap();

        let script = "\
new
set date 2024-01-01
set complaint Headache
save
new
set date 2024-02-01
set complaint Fever
save
up
edit
set diagnosis Migraine
down
save
close
";
        let (session, output) = run_script(s, script);

        assert!(output.contains("Finish editing first"));
        assert!(output.contains("Updated record 1."));
        let db = session.database();
        assert_eq!(db.get_record(1).unwrap().unwrap().fields.diagnosis, "Migraine");
        let second = db.get_record(2).unwrap().unwrap();
        assert_eq!(second.fields.complaint, "Fever");
        assert_eq!(second.fields.diagnosis, "");
    }

    #[test]
    fn test_errors_do_not_stop_the_loop() {
        let dir = tempfile::tempdir().unwrap();
        let s = session(dir.path());
        s.create_patient_details(&PatientDetails::new("Jane".into()))
            .unwrap();

        let script = "\
bogus
patient select 99
set date 2024-01-01
delete
import /definitely/not/here.csv
patients
";
        let (_, output) = run_script(s, script);

        assert!(output.contains("Unknown command: bogus"));
        assert!(output.contains("Error:"));
        assert!(output.contains("Not editing."));
        assert!(output.contains("No record selected."));
        assert!(output.contains("Failed to import"));
    }

    #[test]
    fn test_upload_requires_saved_record() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("scan.txt");
        std::fs::write(&source, b"scan").unwrap();

        let s = session(dir.path());
        s.create_patient_details(&PatientDetails::new("Jane".into()))
            .unwrap();

        let script = format!(
            "new\nupload {0}\nset date 2024-01-01\nsave\nedit\nupload {0}\ndocs\nclose\n",
            source.display()
        );
        let (session, output) = run_script(s, &script);

        assert!(output.contains("Upload needs edit mode on a saved record."));
        assert!(output.contains("Attached scan.txt (4 bytes)."));
        assert_eq!(session.current_documents().unwrap().len(), 1);
    }
}
