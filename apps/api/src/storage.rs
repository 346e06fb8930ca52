//! Flat-file JSON persistence. Each collection is a single JSON array, rewritten whole on
//! every append (read entire, append one, write entire). Append-only: no update or delete.
//!
//! Corrupt or non-array content is treated as an empty collection. The bad bytes are
//! copied to a fresh `<file>.corrupt-<timestamp>` before the next write replaces them.
//! A file that exists but cannot be read fails the append and is left in place.
//!
//! Appends on one collection are serialized, so concurrent sessions sharing a store never
//! lose each other's records.

use std::fs;
use std::io::{self, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::Utc;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::candidate::CandidateProfile;
use crate::models::summary::SessionSummary;

pub const CANDIDATES_FILE: &str = "candidates.json";
pub const SESSIONS_FILE: &str = "sessions.json";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl StorageError {
    fn io(path: &Path, source: io::Error) -> Self {
        StorageError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Where the dialogue controller sends records. Implementations must not be fatal to the
/// conversation; the controller logs any error and carries on.
pub trait SessionSink: Send + Sync {
    fn save_profile(&self, profile: &CandidateProfile) -> Result<(), StorageError>;
    fn save_summary(&self, summary: &SessionSummary) -> Result<(), StorageError>;
}

/// An append-only JSON array of `T` records at `path`.
pub struct JsonCollection<T> {
    path: PathBuf,
    /// Held across read-append-write.
    write_lock: Mutex<()>,
    _record: PhantomData<fn() -> T>,
}

impl<T: Serialize + DeserializeOwned> JsonCollection<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
            _record: PhantomData,
        }
    }

    /// Creates the parent directory and an empty `[]` collection if absent.
    pub fn init(&self) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.ensure_exists()
    }

    fn ensure_exists(&self) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
        }
        if !self.path.exists() {
            self.write_all(&[])?;
            info!("Initialized empty collection at {}", self.path.display());
        }
        Ok(())
    }

    /// Appends `record` and returns the new collection length.
    pub fn append(&self, record: &T) -> Result<usize, StorageError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.ensure_exists()?;
        let mut records = self.read_raw(true)?;
        records.push(serde_json::to_value(record)?);
        self.write_all(&records)?;
        debug!(
            "Appended record to {} ({} total)",
            self.path.display(),
            records.len()
        );
        Ok(records.len())
    }

    /// Every record that deserializes as `T`, in insertion order.
    pub fn load(&self) -> Vec<T> {
        let records = match self.read_raw(false) {
            Ok(records) => records,
            Err(e) => {
                warn!("Could not load collection, returning no records: {e}");
                return Vec::new();
            }
        };
        records
            .into_iter()
            .enumerate()
            .filter_map(|(i, value)| match serde_json::from_value(value) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(
                        "Skipping unreadable record {i} in {}: {e}",
                        self.path.display()
                    );
                    None
                }
            })
            .collect()
    }

    /// Raw array contents. Missing file → empty; corrupt file → empty (copied aside first
    /// when `backup_corrupt`, ahead of an overwrite); unreadable file → error.
    fn read_raw(&self, backup_corrupt: bool) -> Result<Vec<Value>, StorageError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::io(&self.path, e)),
        };

        Ok(match serde_json::from_slice::<Value>(&bytes) {
            Ok(Value::Array(records)) => records,
            Ok(_) => {
                warn!(
                    "{} does not hold a JSON array, treating as empty",
                    self.path.display()
                );
                if backup_corrupt {
                    self.preserve_corrupt();
                }
                Vec::new()
            }
            Err(e) => {
                warn!(
                    "{} is corrupt, treating as empty: {e}",
                    self.path.display()
                );
                if backup_corrupt {
                    self.preserve_corrupt();
                }
                Vec::new()
            }
        })
    }

    /// `<file>.corrupt-<timestamp>`, with a counter if that name is already taken.
    fn corrupt_path(&self) -> PathBuf {
        let mut base = self.path.as_os_str().to_os_string();
        base.push(format!(".corrupt-{}", Utc::now().format("%Y%m%dT%H%M%S%.3f")));
        let mut candidate = PathBuf::from(&base);
        let mut n = 1;
        while candidate.exists() {
            let mut name = base.clone();
            name.push(format!("-{n}"));
            candidate = PathBuf::from(name);
            n += 1;
        }
        candidate
    }

    fn preserve_corrupt(&self) {
        let backup = self.corrupt_path();
        match fs::copy(&self.path, &backup) {
            Ok(_) => info!("Preserved corrupt collection at {}", backup.display()),
            Err(e) => warn!("Could not preserve corrupt collection: {e}"),
        }
    }

    /// Writes through a temp file in the same directory, then renames over `path`.
    fn write_all(&self, records: &[Value]) -> Result<(), StorageError> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| StorageError::io(dir, e))?;
        serde_json::to_writer_pretty(&mut tmp, records)?;
        tmp.write_all(b"\n")
            .map_err(|e| StorageError::io(tmp.path(), e))?;
        tmp.persist(&self.path)
            .map_err(|e| StorageError::io(&self.path, e.error))?;
        Ok(())
    }
}

/// Candidate and session-summary collections under one data directory.
pub struct JsonStore {
    candidates: JsonCollection<CandidateProfile>,
    sessions: JsonCollection<SessionSummary>,
}

impl JsonStore {
    pub fn open(data_dir: &Path) -> Self {
        Self {
            candidates: JsonCollection::new(data_dir.join(CANDIDATES_FILE)),
            sessions: JsonCollection::new(data_dir.join(SESSIONS_FILE)),
        }
    }

    /// Creates both collections if absent.
    pub fn init(&self) -> Result<(), StorageError> {
        self.candidates.init()?;
        self.sessions.init()
    }

    pub fn candidates(&self) -> Vec<CandidateProfile> {
        self.candidates.load()
    }

    pub fn sessions(&self) -> Vec<SessionSummary> {
        self.sessions.load()
    }
}

impl SessionSink for JsonStore {
    fn save_profile(&self, profile: &CandidateProfile) -> Result<(), StorageError> {
        let total = self.candidates.append(profile)?;
        info!("Saved candidate profile for {} ({total} on file)", profile.email);
        Ok(())
    }

    fn save_summary(&self, summary: &SessionSummary) -> Result<(), StorageError> {
        self.sessions.append(summary)?;
        info!(
            "Saved {} session summary {}",
            summary.outcome, summary.session_id
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::models::candidate::ProfileForm;

    fn corrupt_backups(dir: &Path) -> Vec<PathBuf> {
        fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with("candidates.json.corrupt-"))
            })
            .collect()
    }

    fn profile(name: &str, email: &str) -> CandidateProfile {
        ProfileForm {
            name: name.to_string(),
            email: email.to_string(),
            phone: "555-0100".to_string(),
            experience: 4,
            position: "Backend Engineer".to_string(),
            location: "Lisbon".to_string(),
            tech_stack: "Python, Docker".to_string(),
        }
        .into_profile(Utc::now())
    }

    #[test]
    fn test_init_creates_empty_collection_and_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join(CANDIDATES_FILE);
        let collection: JsonCollection<CandidateProfile> = JsonCollection::new(&path);

        collection.init().unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert_eq!(serde_json::from_str::<Value>(&raw).unwrap(), Value::Array(vec![]));
        assert!(collection.load().is_empty());
    }

    #[test]
    fn test_two_saves_yield_two_records() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::open(dir.path());

        store.save_profile(&profile("Ana", "a@x.com")).unwrap();
        store.save_profile(&profile("Bo", "b@x.com")).unwrap();

        let records = store.candidates();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].email, "a@x.com");
        assert_eq!(records[1].email, "b@x.com");

        let raw: Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join(CANDIDATES_FILE)).unwrap())
                .unwrap();
        for record in raw.as_array().unwrap() {
            for key in [
                "name",
                "email",
                "phone",
                "experience",
                "position",
                "location",
                "tech_stack",
                "timestamp",
            ] {
                assert!(record.get(key).is_some(), "missing key {key}");
            }
        }
    }

    #[test]
    fn test_corrupt_collection_is_replaced_not_propagated() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CANDIDATES_FILE);
        fs::write(&path, "{ this is not json").unwrap();
        let store = JsonStore::open(dir.path());

        // reading alone leaves the file and makes no backup
        assert!(store.candidates().is_empty());
        assert!(corrupt_backups(dir.path()).is_empty());

        store.save_profile(&profile("Ana", "a@x.com")).unwrap();

        let records = store.candidates();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Ana");

        let backups = corrupt_backups(dir.path());
        assert_eq!(backups.len(), 1);
        assert_eq!(fs::read_to_string(&backups[0]).unwrap(), "{ this is not json");
    }

    #[test]
    fn test_each_corruption_gets_its_own_backup() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CANDIDATES_FILE);
        let store = JsonStore::open(dir.path());

        fs::write(&path, "first garbage").unwrap();
        store.save_profile(&profile("Ana", "a@x.com")).unwrap();
        fs::write(&path, "second garbage").unwrap();
        store.save_profile(&profile("Bo", "b@x.com")).unwrap();

        let mut contents: Vec<String> = corrupt_backups(dir.path())
            .iter()
            .map(|p| fs::read_to_string(p).unwrap())
            .collect();
        contents.sort();
        assert_eq!(contents, vec!["first garbage", "second garbage"]);
    }

    #[test]
    fn test_unreadable_collection_fails_append_and_is_left_alone() {
        let dir = TempDir::new().unwrap();
        // a directory where the file should be: exists, but cannot be read as bytes
        let path = dir.path().join(CANDIDATES_FILE);
        fs::create_dir(&path).unwrap();
        fs::write(path.join("keep.txt"), "data").unwrap();
        let store = JsonStore::open(dir.path());

        let err = store.save_profile(&profile("Ana", "a@x.com")).unwrap_err();

        assert!(matches!(err, StorageError::Io { .. }));
        assert_eq!(fs::read_to_string(path.join("keep.txt")).unwrap(), "data");
        assert!(store.candidates().is_empty());
    }

    #[test]
    fn test_concurrent_saves_keep_every_record() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::open(dir.path());
        store.init().unwrap();

        std::thread::scope(|scope| {
            for i in 0..24 {
                let store = &store;
                scope.spawn(move || {
                    store
                        .save_profile(&profile(&format!("C{i}"), &format!("c{i}@x.com")))
                        .unwrap();
                });
            }
        });

        let mut emails: Vec<String> = store.candidates().into_iter().map(|c| c.email).collect();
        emails.sort();
        emails.dedup();
        assert_eq!(emails.len(), 24);
    }

    #[test]
    fn test_non_array_document_is_treated_as_empty() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CANDIDATES_FILE), r#"{"name": "x"}"#).unwrap();
        let store = JsonStore::open(dir.path());

        store.save_profile(&profile("Ana", "a@x.com")).unwrap();

        assert_eq!(store.candidates().len(), 1);
    }

    #[test]
    fn test_foreign_records_are_kept_on_append() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CANDIDATES_FILE), r#"[{"legacy": true}]"#).unwrap();
        let collection: JsonCollection<CandidateProfile> =
            JsonCollection::new(dir.path().join(CANDIDATES_FILE));

        assert_eq!(collection.append(&profile("Ana", "a@x.com")).unwrap(), 2);
        // the legacy record survives on disk but is skipped when loading typed records
        assert_eq!(collection.load().len(), 1);
    }
}
