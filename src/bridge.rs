//! Lazily authenticated, process-wide client handle.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::api::MonarchApi;
use crate::error::{ApiResult, ToolError};
use crate::session::{Session, SessionStore};

/// Constructs a client handle from a stored session.
///
/// Construction must not contact the remote service; a rejected session
/// surfaces on the first real call.
pub(crate) trait Connector: Send + Sync {
    /// Builds an authenticated client for `session`.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`](crate::error::ApiError) if the handle cannot
    /// be built.
    fn connect(&self, session: &Session) -> ApiResult<Arc<dyn MonarchApi>>;
}

/// Owns the single client handle of the process.
///
/// The first successful [`AuthBridge::client`] call builds the handle;
/// concurrent first calls wait for that one construction.
pub(crate) struct AuthBridge {
    /// Where the session is read from.
    store: SessionStore,
    /// Builds the handle from the session.
    connector: Box<dyn Connector>,
    /// The cached handle.
    client: OnceCell<Arc<dyn MonarchApi>>,
}

impl core::fmt::Debug for AuthBridge {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AuthBridge")
            .field("store", &self.store)
            .field("connected", &self.client.initialized())
            .finish_non_exhaustive()
    }
}

impl AuthBridge {
    /// Creates a bridge that has not yet connected.
    pub(crate) fn new(store: SessionStore, connector: Box<dyn Connector>) -> Self {
        Self {
            store,
            connector,
            client: OnceCell::new(),
        }
    }

    /// Returns the session store backing this bridge.
    pub(crate) const fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Returns the shared client, constructing it on first use.
    ///
    /// # Errors
    ///
    /// - [`ToolError::AuthenticationRequired`] if no session is stored.
    /// - [`ToolError::SessionExpired`] if the stored session is past its expiry.
    /// - [`ToolError::Remote`] if the connector fails.
    pub(crate) async fn client(&self) -> Result<Arc<dyn MonarchApi>, ToolError> {
        let client = self
            .client
            .get_or_try_init(|| async { self.connect() })
            .await?;
        Ok(Arc::clone(client))
    }

    /// Loads the session and builds a handle.
    fn connect(&self) -> Result<Arc<dyn MonarchApi>, ToolError> {
        let Some(session) = self.store.load() else {
            warn!(path = %self.store.path().display(), "no session available");
            return Err(ToolError::AuthenticationRequired);
        };
        if session.is_expired(Utc::now()) {
            warn!(path = %self.store.path().display(), "stored session has expired");
            return Err(ToolError::SessionExpired);
        }
        let client = self.connector.connect(&session)?;
        info!(created_at = %session.created_at(), "Monarch client created from stored session");
        Ok(client)
    }
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::missing_docs_in_private_items,
    reason = "test code uses expect for readability"
)]
mod tests {
    use core::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::{AuthBridge, Connector};
    use crate::api::MonarchApi;
    use crate::error::ApiResult;
    use crate::session::{Session, SessionStore};
    use crate::testing::{MockApi, write_session};

    struct CountingConnector {
        api: Arc<MockApi>,
        connects: Arc<AtomicUsize>,
    }

    impl Connector for CountingConnector {
        fn connect(&self, _session: &Session) -> ApiResult<Arc<dyn MonarchApi>> {
            let _previous = self.connects.fetch_add(1, Ordering::SeqCst);
            let api: Arc<dyn MonarchApi> = Arc::<MockApi>::clone(&self.api);
            Ok(api)
        }
    }

    fn bridge(store: SessionStore) -> (AuthBridge, Arc<AtomicUsize>) {
        let connects = Arc::new(AtomicUsize::new(0));
        let connector = CountingConnector {
            api: Arc::new(MockApi::new()),
            connects: Arc::clone(&connects),
        };
        (AuthBridge::new(store, Box::new(connector)), connects)
    }

    #[tokio::test]
    async fn missing_session_requires_authentication() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (bridge, connects) = bridge(SessionStore::new(dir.path().join("none.json")));

        let err = bridge.client().await.err().expect("should fail");
        assert_eq!(err.kind(), "authentication_required");
        assert_eq!(connects.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn expired_session_is_rejected_locally() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("session.json");
        std::fs::write(
            &path,
            r#"{"token": "tok", "created_at": "2020-01-01T00:00:00Z", "expires_at": "2020-01-02T00:00:00Z"}"#,
        )
        .expect("write");
        let (bridge, connects) = bridge(SessionStore::new(path));

        let err = bridge.client().await.err().expect("should fail");
        assert_eq!(err.kind(), "session_expired");
        assert_eq!(connects.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn sequential_calls_reuse_one_handle() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = write_session(&dir);
        let (bridge, connects) = bridge(store);

        let first = bridge.client().await.expect("first client");
        let second = bridge.client().await.expect("second client");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(connects.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_first_calls_connect_once() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = write_session(&dir);
        let (built, connects) = bridge(store);
        let shared = Arc::new(built);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let bridge = Arc::clone(&shared);
                tokio::spawn(async move { bridge.client().await.is_ok() })
            })
            .collect();
        for handle in handles {
            assert!(handle.await.expect("task should not panic"));
        }
        assert_eq!(connects.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_attempt_is_retried_after_login() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("session.json");
        let (bridge, connects) = bridge(SessionStore::new(path.clone()));

        assert!(bridge.client().await.is_err());
        SessionStore::new(path)
            .save(&Session::new("tok".to_owned(), chrono::Utc::now()))
            .expect("save");
        assert!(bridge.client().await.is_ok());
        assert_eq!(connects.load(Ordering::SeqCst), 1);
    }
}
