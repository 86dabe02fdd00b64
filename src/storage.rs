use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::domain::Activity;

const EMPTY_DOCUMENT: &str = "[]\n";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse activity document {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode activity document: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Full-document JSON persistence. Every read returns the whole collection and
/// every write replaces it.
#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
}

impl Store {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn ensure_initialized(&self) -> Result<bool, StorageError> {
        if self.path.exists() {
            return Ok(false);
        }

        self.create_parent_dir()?;
        fs::write(&self.path, EMPTY_DOCUMENT).map_err(|source| self.io_error(source))?;
        tracing::info!(path = %self.path.display(), "created empty activity document");
        Ok(true)
    }

    pub fn load(&self) -> Result<Vec<Activity>, StorageError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(self.io_error(err)),
        };

        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&raw).map_err(|source| StorageError::Decode {
            path: self.path.clone(),
            source,
        })
    }

    /// Console-facing load: failures are logged and treated as an empty
    /// collection so the session can keep going.
    pub fn load_or_empty(&self) -> Vec<Activity> {
        match self.load() {
            Ok(activities) => activities,
            Err(err) => {
                tracing::warn!(error = %err, "failed to load activities, continuing with none");
                Vec::new()
            }
        }
    }

    pub fn save(&self, activities: &[Activity]) -> Result<(), StorageError> {
        self.create_parent_dir()?;

        let mut body = serde_json::to_string_pretty(activities).map_err(StorageError::Encode)?;
        body.push('\n');

        let mut file = fs::File::create(&self.path).map_err(|source| self.io_error(source))?;
        file.write_all(body.as_bytes())
            .map_err(|source| self.io_error(source))?;

        tracing::debug!(path = %self.path.display(), count = activities.len(), "saved activities");
        Ok(())
    }

    /// Reloads the document, applies one change and writes the document back.
    ///
    /// An unreadable document counts as an empty collection, so the write
    /// replaces whatever was on disk. The document is only written when
    /// `apply` succeeds.
    pub fn update<T, E, F>(&self, apply: F) -> Result<T, E>
    where
        F: FnOnce(&mut Vec<Activity>) -> Result<T, E>,
        E: From<StorageError>,
    {
        let mut activities = match self.load() {
            Ok(activities) => activities,
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    path = %self.path.display(),
                    "activity document unreadable, rewriting it from an empty collection"
                );
                Vec::new()
            }
        };
        let value = apply(&mut activities)?;
        self.save(&activities)?;
        Ok(value)
    }

    fn create_parent_dir(&self) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| self.io_error(source))?;
            }
        }
        Ok(())
    }

    fn io_error(&self, source: std::io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use crate::domain::{Activity, Project};

    use super::{Store, StorageError};

    fn sample_activities() -> Vec<Activity> {
        let mut writing = Activity::new(0, "writing", "w");
        writing.hours = 3;
        writing.minutes = 42;
        let mut draft = Project::new("draft");
        draft.add_task("outline");
        writing.projects.push(draft);
        vec![writing, Activity::new(1, "reading", "r")]
    }

    #[test]
    fn initializes_empty_document_once() {
        let dir = TempDir::new().expect("temp dir");
        let store = Store::new(dir.path().join("data").join("data.json"));

        assert!(store.ensure_initialized().expect("first init"));
        assert!(!store.ensure_initialized().expect("second init"));
        assert_eq!(fs::read_to_string(store.path()).expect("read"), "[]\n");
        assert!(store.load().expect("load").is_empty());
    }

    #[test]
    fn reload_and_save_is_byte_stable() {
        let dir = TempDir::new().expect("temp dir");
        let store = Store::new(dir.path().join("data.json"));
        store.save(&sample_activities()).expect("save");
        let first = fs::read_to_string(store.path()).expect("read");

        let loaded = store.load().expect("load");
        assert_eq!(loaded, sample_activities());
        store.save(&loaded).expect("save again");
        let second = fs::read_to_string(store.path()).expect("read");

        assert_eq!(first, second);
        assert!(first.contains("\n  {\n    \"id\": 0,\n    \"activity\": \"writing\""));
    }

    #[test]
    fn reads_documents_written_by_older_revisions() {
        let dir = TempDir::new().expect("temp dir");
        let store = Store::new(dir.path().join("data.json"));
        fs::write(
            store.path(),
            r#"[{"id":0,"activity":"gym","short":"g","hours":1,"minutes":2,"projects":null,"function":"Default"},
               {"id":1,"activity":"piano","short":"p","hours":0,"minutes":0}]"#,
        )
        .expect("write");

        let loaded = store.load().expect("load");
        assert_eq!(loaded.len(), 2);
        assert!(loaded[0].projects.is_empty());
        assert!(loaded[1].projects.is_empty());
    }

    #[test]
    fn corrupt_document_is_a_decode_error_and_loads_empty_on_console_path() {
        let dir = TempDir::new().expect("temp dir");
        let store = Store::new(dir.path().join("data.json"));
        fs::write(store.path(), "{not json").expect("write");

        assert!(matches!(store.load(), Err(StorageError::Decode { .. })));
        assert!(store.load_or_empty().is_empty());
    }

    #[test]
    fn failed_update_leaves_document_untouched() {
        let dir = TempDir::new().expect("temp dir");
        let store = Store::new(dir.path().join("data.json"));
        store.save(&sample_activities()).expect("save");
        let before = fs::read_to_string(store.path()).expect("read");

        let result: Result<(), StorageError> = store.update(|activities| {
            activities.clear();
            Err(StorageError::Encode(serde_json::from_str::<u8>("x").unwrap_err()))
        });

        assert!(result.is_err());
        assert_eq!(fs::read_to_string(store.path()).expect("read"), before);
    }

    #[test]
    fn update_on_corrupt_document_starts_from_empty() {
        let dir = TempDir::new().expect("temp dir");
        let store = Store::new(dir.path().join("data.json"));
        fs::write(store.path(), "{not json").expect("write");

        let seen: Result<usize, StorageError> = store.update(|activities| {
            let seen = activities.len();
            activities.push(Activity::new(0, "writing", "w"));
            Ok(seen)
        });

        assert_eq!(seen.expect("update"), 0);
        assert_eq!(store.load().expect("load"), vec![Activity::new(0, "writing", "w")]);
    }

    #[test]
    fn unwritable_location_reports_io_error() {
        let dir = TempDir::new().expect("temp dir");
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "file, not a directory").expect("write");
        let store = Store::new(blocker.join("data.json"));

        assert!(matches!(store.save(&[]), Err(StorageError::Io { .. })));
    }
}
