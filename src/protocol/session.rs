// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Controller session state and durable session storage.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Name of the file holding the persisted session token.
pub const SESSION_FILE_NAME: &str = ".homebridge-zway-pump-outlet-token";

/// Lifecycle of the controller session.
///
/// ```text
/// NoSession -> Validating -> Valid
///     |            |
///     |            v
///     +------> LoggingIn -> Valid
///                  |
///                  v
///              NoSession   (login rejected)
/// ```
#[derive(Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No session token is held.
    #[default]
    NoSession,
    /// A persisted token is being checked against the controller.
    Validating,
    /// Credentials are being submitted.
    LoggingIn,
    /// A token accepted by the controller.
    Valid(String),
}

impl SessionState {
    /// Returns the token if the session is valid.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        match self {
            Self::Valid(token) => Some(token),
            _ => None,
        }
    }

    /// Returns `true` if a valid session is held.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }
}

// Tokens never reach logs in full.
impl fmt::Debug for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSession => f.write_str("NoSession"),
            Self::Validating => f.write_str("Validating"),
            Self::LoggingIn => f.write_str("LoggingIn"),
            Self::Valid(token) => write!(f, "Valid({})", redact(token)),
        }
    }
}

/// Shortens a session token to its first six characters followed by `...`.
///
/// This is also the form the controller expects when addressing a token in
/// the profile API.
#[must_use]
pub fn redact(token: &str) -> String {
    let prefix: String = token.chars().take(6).collect();
    format!("{prefix}...")
}

/// Durable storage for one session token.
///
/// Absent or unreadable data is reported as `None`, which makes the client
/// log in again.
pub trait SessionStore: Send + Sync {
    /// Loads the persisted token, if any.
    fn load(&self) -> Option<String>;

    /// Persists a token, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the token cannot be written.
    fn save(&self, token: &str) -> io::Result<()>;
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionFile {
    session: String,
}

/// Session store backed by a JSON file `{"session": "<token>"}`.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    /// Creates a store for the given file path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates a store using [`SESSION_FILE_NAME`] inside a directory.
    #[must_use]
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(SESSION_FILE_NAME))
    }

    /// Returns the file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Option<String> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "No persisted session");
                return None;
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to read session file");
                return None;
            }
        };

        match serde_json::from_str::<SessionFile>(&contents) {
            Ok(file) if !file.session.is_empty() => Some(file.session),
            Ok(_) => {
                tracing::warn!(path = %self.path.display(), "Persisted session is empty");
                None
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Persisted session is corrupt");
                None
            }
        }
    }

    fn save(&self, token: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string(&SessionFile {
            session: token.to_string(),
        })?;
        fs::write(&self.path, contents)?;

        tracing::debug!(path = %self.path.display(), "Saved session");
        Ok(())
    }
}

/// In-memory session store, useful when nothing should touch the disk.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    token: Mutex<Option<String>>,
}

impl MemorySessionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store already holding a token.
    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Option<String> {
        self.token.lock().clone()
    }

    fn save(&self, token: &str) -> io::Result<()> {
        *self.token.lock() = Some(token.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redact_keeps_six_chars() {
        assert_eq!(redact("0123456789abcdef"), "012345...");
        assert_eq!(redact("abc"), "abc...");
    }

    #[test]
    fn debug_hides_token() {
        let state = SessionState::Valid("0123456789abcdef".to_string());
        assert_eq!(format!("{state:?}"), "Valid(012345...)");
        assert_eq!(state.token(), Some("0123456789abcdef"));
    }

    #[test]
    fn file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::in_dir(dir.path());
        assert_eq!(store.load(), None);

        store.save("abcdef123456").unwrap();
        assert_eq!(store.load().as_deref(), Some("abcdef123456"));

        let raw = fs::read_to_string(store.path()).unwrap();
        assert_eq!(raw, r#"{"session":"abcdef123456"}"#);
    }

    #[test]
    fn corrupt_file_is_no_session() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::in_dir(dir.path());
        fs::write(store.path(), "not json").unwrap();
        assert_eq!(store.load(), None);

        fs::write(store.path(), r#"{"session": ""}"#).unwrap();
        assert_eq!(store.load(), None);
    }

    #[test]
    fn memory_store() {
        let store = MemorySessionStore::new();
        assert_eq!(store.load(), None);
        store.save("token").unwrap();
        assert_eq!(store.load().as_deref(), Some("token"));
    }
}
