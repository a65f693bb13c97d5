//! Local authentication helpers. None of these contact the remote service.

use chrono::Utc;
use rmcp::model::CallToolResult;

use crate::adapter;
use crate::bridge::AuthBridge;
use crate::error::ToolError;
use crate::response::{AuthStatusResponse, SessionDebugResponse, SetupInstructions};

/// Explains how to create a session.
pub(crate) fn setup_authentication(bridge: &AuthBridge) -> CallToolResult {
    let instructions = SetupInstructions::new(bridge.store().path());
    adapter::render("setup_authentication", Ok::<_, ToolError>(instructions))
}

/// Reports the local session status.
pub(crate) fn check_auth_status(bridge: &AuthBridge, email: Option<String>) -> CallToolResult {
    let store = bridge.store();
    let status = AuthStatusResponse::new(store.status(Utc::now()), store.path(), email);
    adapter::render("check_auth_status", Ok::<_, ToolError>(status))
}

/// Reports whether the session file loads, without revealing the token.
pub(crate) fn debug_session_loading(bridge: &AuthBridge) -> CallToolResult {
    let store = bridge.store();
    let session = store.load();
    let report = SessionDebugResponse::new(store.path(), session.as_ref());
    adapter::render("debug_session_loading", Ok::<_, ToolError>(report))
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::missing_docs_in_private_items,
    reason = "test code uses expect and indexing for readability"
)]
mod tests {
    use std::sync::Arc;

    use super::{check_auth_status, debug_session_loading, setup_authentication};
    use crate::testing::{MockApi, authed_bridge, is_error, payload, text, unauthenticated_bridge};

    #[test]
    fn setup_names_the_session_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let api = Arc::new(MockApi::new());
        let bridge = unauthenticated_bridge(&dir, &api);

        let body = payload(&setup_authentication(&bridge));
        assert!(
            body["session_path"]
                .as_str()
                .expect("path")
                .ends_with("missing.json")
        );
        assert!(body["steps"][2].as_str().expect("step").contains("import-token"));
    }

    #[test]
    fn status_reports_missing_session() {
        let dir = tempfile::tempdir().expect("tempdir");
        let api = Arc::new(MockApi::new());
        let bridge = unauthenticated_bridge(&dir, &api);

        let result = check_auth_status(&bridge, None);
        assert!(!is_error(&result));
        let body = payload(&result);
        assert_eq!(body["authenticated"], false);
        assert_eq!(body["status"], "missing");
        assert!(body.get("email").is_none());
        assert!(api.calls().is_empty());
    }

    #[test]
    fn status_reports_valid_session_and_email() {
        let dir = tempfile::tempdir().expect("tempdir");
        let api = Arc::new(MockApi::new());
        let bridge = authed_bridge(&dir, &api);

        let body = payload(&check_auth_status(&bridge, Some("me@example.com".to_owned())));
        assert_eq!(body["authenticated"], true);
        assert_eq!(body["status"], "valid");
        assert_eq!(body["email"], "me@example.com");
    }

    #[test]
    fn debug_shows_token_length_only() {
        let dir = tempfile::tempdir().expect("tempdir");
        let api = Arc::new(MockApi::new());
        let bridge = authed_bridge(&dir, &api);

        let result = debug_session_loading(&bridge);
        assert!(!text(&result).contains("test-token"));
        let body = payload(&result);
        assert_eq!(body["loaded"], true);
        assert_eq!(body["file_exists"], true);
        assert_eq!(body["token_length"], 10);
    }

    #[test]
    fn debug_reports_corrupt_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("missing.json"), "not json").expect("write");
        let api = Arc::new(MockApi::new());
        let bridge = unauthenticated_bridge(&dir, &api);

        let body = payload(&debug_session_loading(&bridge));
        assert_eq!(body["file_exists"], true);
        assert_eq!(body["loaded"], false);
        assert!(body.get("token_length").is_none());
    }
}
