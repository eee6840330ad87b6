//! Document store: copies uploaded files next to the database and tracks them
//! per record.
//!
//! ```text
//! <root>/
//! └── <record_id>/
//!     ├── scan.pdf
//!     └── blood_panel.png
//! ```

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::db::{Database, DbError};
use crate::models::Document;

/// Document store errors.
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Source file not found: {0}")]
    SourceMissing(PathBuf),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Record not found: {0}")]
    RecordNotFound(i64),
}

pub type DocumentResult<T> = Result<T, DocumentError>;

/// File-system side of document association.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    root: PathBuf,
}

impl DocumentStore {
    /// Create a store rooted at `root`. The directory is created lazily.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Copy `source` into the store and attach it to `record_id`.
    ///
    /// Earlier attachments are kept; the record's `document_path` is pointed
    /// at the new copy.
    pub fn attach(&self, db: &Database, record_id: i64, source: &Path) -> DocumentResult<Document> {
        if db.get_record(record_id)?.is_none() {
            return Err(DocumentError::RecordNotFound(record_id));
        }
        if !source.is_file() {
            return Err(DocumentError::SourceMissing(source.to_path_buf()));
        }

        let file_name = source
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| DocumentError::InvalidPath(source.display().to_string()))?
            .to_string();

        let dest_dir = self.root.join(record_id.to_string());
        fs::create_dir_all(&dest_dir)?;
        let dest = dest_dir.join(&file_name);

        let size_bytes = copy_file(source, &dest)?;
        let sha256 = checksum(&dest)?;
        let stored_path = dest.to_string_lossy().into_owned();

        let document = db.upsert_document(record_id, &file_name, &stored_path, &sha256, size_bytes)?;
        db.set_document_path(record_id, Some(&stored_path))?;

        info!(record_id, file = %file_name, size_bytes, "Attached document");
        Ok(document)
    }

    /// Newest attached document path, or `None` if there is none or the file
    /// is gone from disk.
    pub fn fetch(&self, db: &Database, record_id: i64) -> DocumentResult<Option<PathBuf>> {
        let Some(record) = db.get_record(record_id)? else {
            return Ok(None);
        };

        match record.document_path.map(PathBuf::from) {
            Some(path) if path.is_file() => Ok(Some(path)),
            Some(path) => {
                warn!(record_id, path = %path.display(), "Attached document missing on disk");
                Ok(None)
            }
            None => Ok(None),
        }
    }

    /// All documents attached to a record.
    pub fn list(&self, db: &Database, record_id: i64) -> DocumentResult<Vec<Document>> {
        Ok(db.list_documents(record_id)?)
    }

    /// Re-hash a stored document and compare with the checksum taken at
    /// attach time. A missing file does not verify.
    pub fn verify(&self, document: &Document) -> DocumentResult<bool> {
        let path = Path::new(&document.stored_path);
        if !path.is_file() {
            return Ok(false);
        }
        Ok(checksum(path)? == document.sha256)
    }

    /// Copy the newest document of a record into `dest_dir`.
    ///
    /// Returns the written path, or `None` when nothing is attached or the
    /// stored file is missing.
    pub fn download(
        &self,
        db: &Database,
        record_id: i64,
        dest_dir: &Path,
    ) -> DocumentResult<Option<PathBuf>> {
        let Some(source) = self.fetch(db, record_id)? else {
            return Ok(None);
        };

        let file_name = source
            .file_name()
            .ok_or_else(|| DocumentError::InvalidPath(source.display().to_string()))?;

        fs::create_dir_all(dest_dir)?;
        let dest = dest_dir.join(file_name);
        copy_file(&source, &dest)?;

        info!(record_id, dest = %dest.display(), "Downloaded document");
        Ok(Some(dest))
    }

    /// Delete every stored file of a record. Missing files are skipped.
    ///
    /// Must run before the record row is deleted, since the document rows
    /// cascade away with it. Returns the number of files removed.
    pub fn remove_files_for(&self, db: &Database, record_id: i64) -> DocumentResult<usize> {
        let mut paths: Vec<PathBuf> = db
            .list_documents(record_id)?
            .into_iter()
            .map(|d| PathBuf::from(d.stored_path))
            .collect();

        if let Some(path) = db.get_record(record_id)?.and_then(|r| r.document_path) {
            let path = PathBuf::from(path);
            if path.starts_with(&self.root) && !paths.contains(&path) {
                paths.push(path);
            }
        }

        let mut removed = 0;
        for path in &paths {
            match fs::remove_file(path) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    debug!(path = %path.display(), "Document already gone");
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Could not delete document");
                }
            }
        }

        // Drop the per-record directory if it is now empty
        let _ = fs::remove_dir(self.root.join(record_id.to_string()));

        Ok(removed)
    }
}

/// Copy `source` to `dest`, leaving the file alone when both name the same
/// file on disk. Returns the size in bytes.
fn copy_file(source: &Path, dest: &Path) -> io::Result<u64> {
    if dest.exists() && fs::canonicalize(source)? == fs::canonicalize(dest)? {
        debug!(path = %dest.display(), "Source is already the stored copy");
        return Ok(fs::metadata(dest)?.len());
    }
    fs::copy(source, dest)
}

/// Hex SHA-256 of a file's contents.
pub fn checksum(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldSet;

    fn setup() -> (Database, i64, tempfile::TempDir, DocumentStore) {
        let db = Database::open_in_memory().unwrap();
        let mut fields = FieldSet::default();
        fields.date = "2024-01-01".into();
        let record_id = db.insert_record(None, &fields).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new(dir.path().join("uploaded_docs"));
        (db, record_id, dir, store)
    }

    fn write_file(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_attach_copies_and_records() {
        let (db, record_id, dir, store) = setup();
        let source = write_file(dir.path(), "scan.pdf", b"%PDF-1.4 scan");

        let doc = store.attach(&db, record_id, &source).unwrap();

        assert_eq!(doc.file_name, "scan.pdf");
        assert_eq!(doc.size_bytes, 13);
        assert!(Path::new(&doc.stored_path).is_file());
        assert!(Path::new(&doc.stored_path).starts_with(store.root()));
        assert_eq!(
            store.fetch(&db, record_id).unwrap(),
            Some(PathBuf::from(&doc.stored_path))
        );
        assert!(store.verify(&doc).unwrap());
    }

    #[test]
    fn test_second_attach_keeps_first() {
        let (db, record_id, dir, store) = setup();
        let first = write_file(dir.path(), "scan.pdf", b"one");
        let second = write_file(dir.path(), "xray.png", b"two");

        let first_doc = store.attach(&db, record_id, &first).unwrap();
        let second_doc = store.attach(&db, record_id, &second).unwrap();

        let docs = store.list(&db, record_id).unwrap();
        assert_eq!(docs.len(), 2);
        assert!(Path::new(&first_doc.stored_path).is_file());
        assert_eq!(
            store.fetch(&db, record_id).unwrap(),
            Some(PathBuf::from(&second_doc.stored_path))
        );
    }

    #[test]
    fn test_attach_errors() {
        let (db, record_id, dir, store) = setup();

        let missing = dir.path().join("nope.pdf");
        assert!(matches!(
            store.attach(&db, record_id, &missing),
            Err(DocumentError::SourceMissing(_))
        ));

        let source = write_file(dir.path(), "scan.pdf", b"data");
        assert!(matches!(
            store.attach(&db, record_id + 1, &source),
            Err(DocumentError::RecordNotFound(_))
        ));
    }

    #[test]
    fn test_reattach_stored_copy_keeps_contents() {
        let (db, record_id, dir, store) = setup();
        let source = write_file(dir.path(), "scan.pdf", b"%PDF-1.4 scan");
        let doc = store.attach(&db, record_id, &source).unwrap();

        let again = store
            .attach(&db, record_id, Path::new(&doc.stored_path))
            .unwrap();

        assert_eq!(again.stored_path, doc.stored_path);
        assert_eq!(again.size_bytes, 13);
        assert_eq!(again.sha256, doc.sha256);
        assert_eq!(fs::read(&doc.stored_path).unwrap(), b"%PDF-1.4 scan");
        assert!(store.verify(&again).unwrap());
        assert_eq!(store.list(&db, record_id).unwrap().len(), 1);
    }

    #[test]
    fn test_download_into_store_directory_keeps_contents() {
        let (db, record_id, dir, store) = setup();
        let source = write_file(dir.path(), "scan.pdf", b"data");
        let doc = store.attach(&db, record_id, &source).unwrap();

        let stored_dir = Path::new(&doc.stored_path).parent().unwrap();
        let written = store.download(&db, record_id, stored_dir).unwrap().unwrap();

        assert_eq!(fs::read(&written).unwrap(), b"data");
        assert!(store.verify(&doc).unwrap());
    }

    #[test]
    fn test_missing_file_treated_as_absent() {
        let (db, record_id, dir, store) = setup();
        let source = write_file(dir.path(), "scan.pdf", b"data");
        let doc = store.attach(&db, record_id, &source).unwrap();

        fs::remove_file(&doc.stored_path).unwrap();

        assert_eq!(store.fetch(&db, record_id).unwrap(), None);
        assert!(!store.verify(&doc).unwrap());
        let out = dir.path().join("out");
        assert_eq!(store.download(&db, record_id, &out).unwrap(), None);
    }

    #[test]
    fn test_download() {
        let (db, record_id, dir, store) = setup();
        let source = write_file(dir.path(), "scan.pdf", b"data");
        store.attach(&db, record_id, &source).unwrap();

        let out = dir.path().join("downloads");
        let written = store.download(&db, record_id, &out).unwrap().unwrap();

        assert_eq!(written, out.join("scan.pdf"));
        assert_eq!(fs::read(&written).unwrap(), b"data");
    }

    #[test]
    fn test_verify_detects_tampering() {
        let (db, record_id, dir, store) = setup();
        let source = write_file(dir.path(), "scan.pdf", b"original");
        let doc = store.attach(&db, record_id, &source).unwrap();

        fs::write(&doc.stored_path, b"changed").unwrap();
        assert!(!store.verify(&doc).unwrap());
    }

    #[test]
    fn test_remove_files_for_record() {
        let (db, record_id, dir, store) = setup();
        let a = store
            .attach(&db, record_id, &write_file(dir.path(), "a.pdf", b"a"))
            .unwrap();
        let b = store
            .attach(&db, record_id, &write_file(dir.path(), "b.pdf", b"b"))
            .unwrap();

        // One file already vanished: not an error
        fs::remove_file(&a.stored_path).unwrap();

        let removed = store.remove_files_for(&db, record_id).unwrap();
        assert_eq!(removed, 1);
        assert!(!Path::new(&b.stored_path).exists());
        assert!(!store.root().join(record_id.to_string()).exists());
    }

    #[test]
    fn test_checksum_known_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "empty.txt", b"");
        assert_eq!(
            checksum(&path).unwrap(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
