use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::Mutex;

const DEFAULT_MEMORY_FILE: &str = "memory.json";

/// One entry of the notes log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
    pub time: String,
}

impl Note {
    pub fn new(kind: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            text: text.into(),
            time: now_iso8601(),
        }
    }

    pub fn execution(text: impl Into<String>) -> Self {
        Self::new("execution", text)
    }
}

/// UTC timestamp with millisecond precision, e.g. `2025-01-02T03:04:05.678Z`.
pub fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// A stored entry. Entries written by other tools in a different shape are
/// kept as raw JSON so a rewrite does not drop them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MemoryEntry {
    Note(Note),
    Other(Value),
}

impl MemoryEntry {
    pub fn as_note(&self) -> Option<&Note> {
        match self {
            MemoryEntry::Note(note) => Some(note),
            MemoryEntry::Other(_) => None,
        }
    }
}

impl From<Note> for MemoryEntry {
    fn from(note: Note) -> Self {
        MemoryEntry::Note(note)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryDocument {
    pub notes: Vec<MemoryEntry>,
}

#[derive(Error, Debug)]
pub enum MemoryError {
    #[error("failed to access memory file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse memory file {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// JSON notes log, rewritten whole on every append.
///
/// Appends within one process are serialized; concurrent writers in other
/// processes can still lose updates.
pub struct MemoryStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl MemoryStore {
    pub fn from_env() -> Self {
        match std::env::var("AGENTVERSE_MEMORY_PATH") {
            Ok(path) if !path.is_empty() => Self::new(PathBuf::from(path)),
            _ => Self::new(PathBuf::from(DEFAULT_MEMORY_FILE)),
        }
    }

    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the file with an empty notes list if it does not exist yet.
    pub async fn ensure_initialized(&self) -> Result<(), MemoryError> {
        let _guard = self.write_lock.lock().await;

        let exists = tokio::fs::try_exists(&self.path)
            .await
            .map_err(|source| self.io_error(source))?;

        if !exists {
            log::info!("initializing memory file {}", self.display_path());
            self.save(&MemoryDocument::default()).await?;
        }

        Ok(())
    }

    pub async fn load(&self) -> Result<MemoryDocument, MemoryError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                return Ok(MemoryDocument::default());
            }
            Err(error) => return Err(self.io_error(error)),
        };

        if contents.trim().is_empty() {
            return Ok(MemoryDocument::default());
        }

        let value: Value =
            serde_json::from_str(&contents).map_err(|source| self.json_error(source))?;

        match value.get("notes") {
            Some(notes @ Value::Array(_)) => {
                let notes = Vec::<MemoryEntry>::deserialize(notes)
                    .map_err(|source| self.json_error(source))?;
                Ok(MemoryDocument { notes })
            }
            _ => {
                log::warn!(
                    "memory file {} has no notes list; starting fresh",
                    self.display_path()
                );
                Ok(MemoryDocument::default())
            }
        }
    }

    pub async fn notes(&self) -> Result<Vec<MemoryEntry>, MemoryError> {
        Ok(self.load().await?.notes)
    }

    /// Append a note and return the number of notes now stored.
    pub async fn append(&self, note: Note) -> Result<usize, MemoryError> {
        let _guard = self.write_lock.lock().await;

        let mut document = self.load().await?;
        document.notes.push(note.into());
        self.save(&document).await?;

        log::debug!(
            "memory file {} now holds {} note(s)",
            self.display_path(),
            document.notes.len()
        );

        Ok(document.notes.len())
    }

    async fn save(&self, document: &MemoryDocument) -> Result<(), MemoryError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|source| self.io_error(source))?;
            }
        }

        let json =
            serde_json::to_string_pretty(document).map_err(|source| self.json_error(source))?;

        tokio::fs::write(&self.path, json)
            .await
            .map_err(|source| self.io_error(source))
    }

    fn io_error(&self, source: std::io::Error) -> MemoryError {
        MemoryError::Io {
            path: self.display_path(),
            source,
        }
    }

    fn json_error(&self, source: serde_json::Error) -> MemoryError {
        MemoryError::Json {
            path: self.display_path(),
            source,
        }
    }

    fn display_path(&self) -> String {
        self.path.as_os_str().to_string_lossy().into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn store_in(dir: &tempfile::TempDir) -> MemoryStore {
        MemoryStore::new(dir.path().join("memory.json"))
    }

    #[tokio::test]
    async fn load_returns_empty_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let document = store.load().await.expect("missing file should load as empty");
        assert!(document.notes.is_empty());
    }

    #[tokio::test]
    async fn ensure_initialized_writes_empty_notes_once() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        store.ensure_initialized().await.unwrap();
        let contents = std::fs::read_to_string(store.path()).unwrap();
        let value: Value = serde_json::from_str(&contents).unwrap();
        assert_eq!(value, serde_json::json!({"notes": []}));

        store.append(Note::execution("kept")).await.unwrap();
        store.ensure_initialized().await.unwrap();
        assert_eq!(store.notes().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn appends_accumulate_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        assert_eq!(store.append(Note::execution("first")).await.unwrap(), 1);
        assert_eq!(store.append(Note::execution("second")).await.unwrap(), 2);

        let notes = store.notes().await.unwrap();
        let notes: Vec<&Note> = notes.iter().filter_map(MemoryEntry::as_note).collect();
        let texts: Vec<_> = notes.iter().map(|note| note.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second"]);
        assert!(notes.iter().all(|note| note.kind == "execution"));
    }

    #[tokio::test]
    async fn note_serializes_type_field() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.append(Note::execution("done")).await.unwrap();

        let contents = std::fs::read_to_string(store.path()).unwrap();
        let value: Value = serde_json::from_str(&contents).unwrap();
        let note = &value["notes"][0];

        assert_eq!(note["type"], "execution");
        assert_eq!(note["text"], "done");
        assert!(note["time"].as_str().unwrap().ends_with('Z'));
    }

    #[tokio::test]
    async fn document_without_notes_is_repaired() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), r#"{"notes": "oops", "other": 1}"#).unwrap();

        assert!(store.load().await.unwrap().notes.is_empty());

        store.append(Note::execution("fresh")).await.unwrap();
        assert_eq!(store.notes().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn foreign_entries_survive_append() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let foreign = serde_json::json!({"note": "buy milk", "time": "2025-01-01T00:00:00.000Z"});
        std::fs::write(store.path(), serde_json::json!({"notes": [foreign]}).to_string())
            .unwrap();

        assert_eq!(store.append(Note::execution("done")).await.unwrap(), 2);

        let notes = store.notes().await.unwrap();
        assert_eq!(notes[0], MemoryEntry::Other(foreign));
        assert_eq!(notes[1].as_note().map(|note| note.text.as_str()), Some("done"));
    }

    #[tokio::test]
    async fn invalid_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), "{not json").unwrap();

        let result = store.load().await;
        assert!(matches!(result, Err(MemoryError::Json { .. })));
    }

    #[tokio::test]
    async fn blank_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), "   \n").unwrap();

        assert!(store.load().await.unwrap().notes.is_empty());
    }

    #[tokio::test]
    async fn concurrent_appends_are_not_lost() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(store_in(&dir));

        let mut handles = Vec::new();
        for index in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.append(Note::execution(format!("note {index}"))).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(store.notes().await.unwrap().len(), 8);
    }

    #[tokio::test]
    async fn creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::new(dir.path().join("nested/deeper/memory.json"));

        store.append(Note::execution("x")).await.unwrap();
        assert!(store.path().exists());
    }
}
