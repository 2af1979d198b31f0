//! File-backed session persistence
//!
//! One JSON file per session identifier under the configured directory,
//! holding the ordered list of turn records for that session. `append` is a
//! read-modify-write of the whole record with no locking: concurrent writers
//! to the same session can race and the last writer wins. That limitation is
//! inherited from the system this library reproduces and is documented
//! rather than fixed; callers that need stronger guarantees must serialize
//! writes themselves.

use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use crate::error::{Result, SessionError};
use crate::types::{SessionId, TurnRecord};

/// Persists per-session conversation state as JSON files
///
/// Records are never pruned or expired; a session file only grows.
#[derive(Clone, Debug)]
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    /// Create a store rooted at `dir`
    ///
    /// The directory is created lazily on first append.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the record file for a session
    fn record_path(&self, id: SessionId) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    /// Load the ordered history of a session
    ///
    /// An unknown session identifier yields an empty sequence, not an error.
    ///
    /// # Errors
    /// Returns [`SessionError::Corrupt`] when the record file exists but is
    /// not valid JSON, and an I/O error when the file cannot be read.
    pub async fn load(&self, id: SessionId) -> Result<Vec<TurnRecord>> {
        let path = self.record_path(id);
        Self::read_record(&path).await
    }

    /// Append one entry to a session's history
    ///
    /// Read-modify-write of the full record; the session file on disk always
    /// contains the complete serialized history. No lock is taken, so two
    /// concurrent appends to the same session can lose one of the entries
    /// (last writer wins).
    ///
    /// # Errors
    /// Returns an error when the existing record is corrupt or the directory
    /// or file cannot be written.
    pub async fn append(&self, id: SessionId, entry: TurnRecord) -> Result<()> {
        fs::create_dir_all(&self.dir).await?;

        let path = self.record_path(id);
        let mut records = Self::read_record(&path).await?;
        records.push(entry);

        let serialized = serde_json::to_vec_pretty(&records)?;
        fs::write(&path, serialized).await?;

        debug!(session = %id, turns = records.len(), "session record written");
        Ok(())
    }

    async fn read_record(path: &Path) -> Result<Vec<TurnRecord>> {
        match fs::read(path).await {
            Ok(bytes) => {
                let records = serde_json::from_slice(&bytes).map_err(|e| {
                    SessionError::Corrupt {
                        path: path.to_path_buf(),
                        reason: e.to_string(),
                    }
                })?;
                Ok(records)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }
}
