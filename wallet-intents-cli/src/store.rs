//! Session record persisted as a JSON file.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use wallet_intents::SessionError;
use wallet_intents::session::lifecycle::{SessionRecord, SessionStore};

/// [`SessionStore`] keeping the record in one JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileSessionStore {
    path: PathBuf,
}

impl JsonFileSessionStore {
    /// Creates a store at `path`. The file is created on first save.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn store_error(&self, action: &str, e: impl std::fmt::Display) -> SessionError {
        SessionError::Store(format!("cannot {action} {}: {e}", self.path.display()))
    }
}

impl SessionStore for JsonFileSessionStore {
    fn load(&self) -> Result<Option<SessionRecord>, SessionError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.store_error("read", e)),
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| self.store_error("parse", e))
    }

    fn save(&self, record: &SessionRecord) -> Result<(), SessionError> {
        let json = serde_json::to_string_pretty(record).map_err(|e| self.store_error("encode", e))?;
        std::fs::write(&self.path, json).map_err(|e| self.store_error("write", e))
    }

    fn clear(&self) -> Result<(), SessionError> {
        match std::fs::remove_file(&self.path) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(self.store_error("remove", e)),
            _ => Ok(()),
        }
    }
}
