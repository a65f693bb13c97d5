//! Persisted authentication session.
//!
//! The session file is written out-of-band (see `monarch-mcp import-token`)
//! and only read by the server. A missing or corrupt file is reported as
//! "not found", never as an error.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// On-disk representation of a session.
#[derive(Serialize, Deserialize)]
struct SessionFile {
    /// API token sent as `Authorization: Token <token>`.
    token: String,
    /// When the token was stored.
    created_at: DateTime<Utc>,
    /// Optional local expiry hint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expires_at: Option<DateTime<Utc>>,
}

/// An authenticated session restored from disk.
#[derive(Debug)]
pub(crate) struct Session {
    /// API token; never logged.
    token: SecretString,
    /// When the token was stored.
    created_at: DateTime<Utc>,
    /// Optional local expiry hint.
    expires_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Creates a session from a freshly obtained token.
    pub(crate) fn new(token: String, created_at: DateTime<Utc>) -> Self {
        Self {
            token: SecretString::new(token),
            created_at,
            expires_at: None,
        }
    }

    /// Returns the secret API token.
    pub(crate) const fn token(&self) -> &SecretString {
        &self.token
    }

    /// Returns when the session was stored.
    pub(crate) const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns `true` if the local expiry hint lies before `now`.
    pub(crate) fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }
}

/// Local validity of the stored session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum SessionStatus {
    /// A readable, unexpired session exists.
    Valid,
    /// A session exists but its expiry hint has passed.
    Expired,
    /// No readable session exists.
    Missing,
}

/// File-backed session storage at a fixed path.
#[derive(Debug, Clone)]
pub(crate) struct SessionStore {
    /// Session file location.
    path: PathBuf,
}

impl SessionStore {
    /// Creates a store reading from `path`.
    pub(crate) const fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Returns the session file location.
    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the session, returning `None` if it is missing or unreadable.
    pub(crate) fn load(&self) -> Option<Session> {
        let path = self.path.display();
        let data = match std::fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path, "session file not found");
                return None;
            }
            Err(err) => {
                warn!(path = %path, error = %err, "session file read failed");
                return None;
            }
        };

        match serde_json::from_str::<SessionFile>(&data) {
            Ok(file) if file.token.trim().is_empty() => {
                warn!(path = %path, "session file contains an empty token");
                None
            }
            Ok(file) => {
                debug!(path = %path, "session loaded");
                Some(Session {
                    token: SecretString::new(file.token),
                    created_at: file.created_at,
                    expires_at: file.expires_at,
                })
            }
            Err(err) => {
                warn!(path = %path, error = %err, "session file parse failed");
                None
            }
        }
    }

    /// Returns `true` if a readable session exists.
    pub(crate) fn exists(&self) -> bool {
        self.load().is_some()
    }

    /// Reports the local validity of the stored session.
    pub(crate) fn status(&self, now: DateTime<Utc>) -> SessionStatus {
        match self.load() {
            Some(session) if session.is_expired(now) => SessionStatus::Expired,
            Some(_) => SessionStatus::Valid,
            None => SessionStatus::Missing,
        }
    }

    /// Writes `session` to disk, creating parent directories.
    ///
    /// On Unix the file is restricted to mode `0600`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the directory or file cannot be written.
    pub(crate) fn save(&self, session: &Session) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = SessionFile {
            token: session.token.expose_secret().clone(),
            created_at: session.created_at,
            expires_at: session.expires_at,
        };
        let data = serde_json::to_string_pretty(&file)?;
        std::fs::write(&self.path, data)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))?;
        }

        info!(path = %self.path.display(), "session saved");
        Ok(())
    }
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::missing_docs_in_private_items,
    reason = "test code uses expect for readability"
)]
mod tests {
    use chrono::{DateTime, Duration, Utc};
    use secrecy::ExposeSecret;

    use super::{Session, SessionStatus, SessionStore};

    fn timestamp() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).expect("valid timestamp for test")
    }

    fn store_in(dir: &tempfile::TempDir) -> SessionStore {
        SessionStore::new(dir.path().join("nested").join("session.json"))
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(&dir);
        assert!(store.load().is_none());
        assert!(!store.exists());
        assert_eq!(store.status(timestamp()), SessionStatus::Missing);
    }

    #[test]
    fn save_then_load_restores_token() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(&dir);
        store
            .save(&Session::new("tok-123".to_owned(), timestamp()))
            .expect("save should succeed");

        let session = store.load().expect("session should load");
        assert_eq!(session.token().expose_secret(), "tok-123");
        assert_eq!(session.created_at(), timestamp());
        assert!(store.exists());
        assert_eq!(store.status(timestamp()), SessionStatus::Valid);
    }

    #[cfg(unix)]
    #[test]
    fn saved_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(&dir);
        store
            .save(&Session::new("tok".to_owned(), timestamp()))
            .expect("save should succeed");
        let mode = std::fs::metadata(store.path())
            .expect("metadata")
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn corrupt_file_is_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{not json").expect("write");
        let store = SessionStore::new(path);
        assert!(store.load().is_none());
    }

    #[test]
    fn empty_token_is_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("session.json");
        std::fs::write(
            &path,
            r#"{"token": "  ", "created_at": "2024-01-01T00:00:00Z"}"#,
        )
        .expect("write");
        assert!(SessionStore::new(path).load().is_none());
    }

    #[test]
    fn expired_session_reports_expired() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("session.json");
        std::fs::write(
            &path,
            r#"{
                "token": "tok",
                "created_at": "2023-11-14T22:13:20Z",
                "expires_at": "2023-11-14T23:13:20Z"
            }"#,
        )
        .expect("write");
        let store = SessionStore::new(path);

        assert_eq!(store.status(timestamp()), SessionStatus::Valid);
        assert_eq!(
            store.status(timestamp() + Duration::hours(2)),
            SessionStatus::Expired
        );
    }
}
