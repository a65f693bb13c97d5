//! Runtime configuration read from environment variables.

use core::time::Duration;
use std::path::PathBuf;

/// Default GraphQL API origin.
const DEFAULT_API_URL: &str = "https://api.monarch.com";

/// Default HTTP request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// File name of the persisted session inside the config directory.
const SESSION_FILE_NAME: &str = "session.json";

/// Errors produced while resolving configuration.
#[derive(Debug, thiserror::Error)]
pub(crate) enum ConfigError {
    /// No session path was given and no platform config directory exists.
    #[error("cannot determine a config directory; set MONARCH_SESSION_FILE")]
    NoConfigDir,
    /// `MONARCH_TIMEOUT_SECS` is not a positive integer.
    #[error("MONARCH_TIMEOUT_SECS must be a positive integer, got '{0}'")]
    InvalidTimeout(String),
}

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Config {
    /// Location of the persisted session file.
    pub(crate) session_path: PathBuf,
    /// Origin of the Monarch API, without the `/graphql` suffix.
    pub(crate) api_url: String,
    /// Per-request HTTP timeout.
    pub(crate) timeout: Duration,
    /// Account email shown by `check_auth_status`.
    pub(crate) email: Option<String>,
}

impl Config {
    /// Reads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// See [`Config::from_lookup`].
    pub(crate) fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoConfigDir`] when no session path can be
    /// resolved and [`ConfigError::InvalidTimeout`] for a malformed timeout.
    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let session_path = match get("MONARCH_SESSION_FILE") {
            Some(path) => PathBuf::from(path),
            None => default_session_path().ok_or(ConfigError::NoConfigDir)?,
        };

        let api_url = get("MONARCH_API_URL").map_or_else(
            || DEFAULT_API_URL.to_owned(),
            |url| url.trim_end_matches('/').to_owned(),
        );

        let timeout_secs = match get("MONARCH_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::InvalidTimeout(raw))?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            session_path,
            api_url,
            timeout: Duration::from_secs(timeout_secs),
            email: get("MONARCH_EMAIL"),
        })
    }
}

/// Well-known session location under the platform config directory.
fn default_session_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "monarch-mcp")
        .map(|dirs| dirs.config_dir().join(SESSION_FILE_NAME))
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::missing_docs_in_private_items,
    reason = "test code uses expect for readability"
)]
mod tests {
    use core::time::Duration;
    use std::collections::HashMap;
    use std::path::PathBuf;

    use super::{Config, ConfigError};

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|&(key, value)| (key.to_owned(), value.to_owned()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn explicit_values_win() {
        let config = Config::from_lookup(lookup_from(&[
            ("MONARCH_SESSION_FILE", "/tmp/monarch/session.json"),
            ("MONARCH_API_URL", "http://localhost:8080/"),
            ("MONARCH_TIMEOUT_SECS", "5"),
            ("MONARCH_EMAIL", "me@example.com"),
        ]))
        .expect("config should resolve");
        assert_eq!(
            config.session_path,
            PathBuf::from("/tmp/monarch/session.json")
        );
        assert_eq!(config.api_url, "http://localhost:8080");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.email.as_deref(), Some("me@example.com"));
    }

    #[test]
    fn defaults_apply_for_unset_and_empty_values() {
        let config = Config::from_lookup(lookup_from(&[
            ("MONARCH_SESSION_FILE", "/tmp/session.json"),
            ("MONARCH_API_URL", "  "),
        ]))
        .expect("config should resolve");
        assert_eq!(config.api_url, "https://api.monarch.com");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.email.is_none());
    }

    #[test]
    fn rejects_zero_timeout() {
        let result = Config::from_lookup(lookup_from(&[
            ("MONARCH_SESSION_FILE", "/tmp/session.json"),
            ("MONARCH_TIMEOUT_SECS", "0"),
        ]));
        assert!(matches!(result, Err(ConfigError::InvalidTimeout(raw)) if raw == "0"));
    }

    #[test]
    fn rejects_non_numeric_timeout() {
        let result = Config::from_lookup(lookup_from(&[
            ("MONARCH_SESSION_FILE", "/tmp/session.json"),
            ("MONARCH_TIMEOUT_SECS", "soon"),
        ]));
        assert!(matches!(result, Err(ConfigError::InvalidTimeout(_))));
    }
}
