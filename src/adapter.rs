//! Bridges tool invocations to the remote client.
//!
//! [`invoke`] is the single place where a tool call meets the client handle.
//! It runs the remote future to completion inside the tool request and turns
//! every outcome into a [`CallToolResult`]; nothing escapes to the protocol
//! layer.

use core::future::Future;
use std::sync::Arc;

use rmcp::model::{CallToolResult, Content};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::api::MonarchApi;
use crate::bridge::AuthBridge;
use crate::error::ToolError;

/// Runs one authenticated tool call.
///
/// Steps, in order: a failed `args` is reported without touching the
/// session; the client is obtained from `bridge`; `call` is awaited; its
/// output is rendered as pretty JSON.
pub(crate) async fn invoke<A, T, F, Fut>(
    bridge: &AuthBridge,
    tool: &'static str,
    args: Result<A, ToolError>,
    call: F,
) -> CallToolResult
where
    F: FnOnce(Arc<dyn MonarchApi>, A) -> Fut,
    Fut: Future<Output = Result<T, ToolError>>,
    T: Serialize,
{
    let outcome = match args {
        Ok(parsed) => match bridge.client().await {
            Ok(api) => call(api, parsed).await,
            Err(err) => Err(err),
        },
        Err(err) => Err(err),
    };
    render(tool, outcome)
}

/// Renders a tool outcome as a success or error result.
pub(crate) fn render<T: Serialize>(
    tool: &'static str,
    outcome: Result<T, ToolError>,
) -> CallToolResult {
    match outcome.and_then(|value| to_json_text(&value)) {
        Ok(text) => {
            debug!(tool, "tool call succeeded");
            CallToolResult::success(vec![Content::text(text)])
        }
        Err(err) => failure(tool, &err),
    }
}

/// Serializes a value to a pretty-printed JSON string for tool output.
fn to_json_text<T: Serialize>(value: &T) -> Result<String, ToolError> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Builds the error result `{error, tool, kind, message}` for `err`.
fn failure(tool: &'static str, err: &ToolError) -> CallToolResult {
    warn!(tool, kind = err.kind(), error = %err, "tool call failed");
    let body = json!({
        "error": true,
        "tool": tool,
        "kind": err.kind(),
        "message": err.to_string(),
    });
    let text = serde_json::to_string_pretty(&body).unwrap_or_else(|_err| body.to_string());
    CallToolResult::error(vec![Content::text(text)])
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

    use serde_json::json;

    use super::{invoke, render};
    use crate::error::ToolError;
    use crate::testing::{MockApi, authed_bridge, is_error, payload, unauthenticated_bridge};

    #[tokio::test]
    async fn success_is_pretty_json() {
        let dir = tempfile::tempdir().expect("tempdir");
        let api = Arc::new(MockApi::new().with_response("get_accounts", json!({"accounts": []})));
        let bridge = authed_bridge(&dir, &api);

        let result = invoke(&bridge, "sample_tool", Ok(()), |api, ()| async move {
            api.get_accounts().await.map_err(ToolError::from)
        })
        .await;

        assert!(!is_error(&result));
        assert_eq!(payload(&result), json!({"accounts": []}));
    }

    #[tokio::test]
    async fn validation_error_skips_session_and_remote() {
        let dir = tempfile::tempdir().expect("tempdir");
        let api = Arc::new(MockApi::new());
        let bridge = unauthenticated_bridge(&dir, &api);

        let result = invoke(
            &bridge,
            "sample_tool",
            Err::<(), _>(ToolError::validation("bad input")),
            |api, ()| async move { api.get_accounts().await.map_err(ToolError::from) },
        )
        .await;

        assert!(is_error(&result));
        let body = payload(&result);
        assert_eq!(body["kind"], "validation_error");
        assert_eq!(body["message"], "bad input");
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn missing_session_is_reported_without_remote_call() {
        let dir = tempfile::tempdir().expect("tempdir");
        let api = Arc::new(MockApi::new());
        let bridge = unauthenticated_bridge(&dir, &api);

        let result = invoke(&bridge, "sample_tool", Ok(()), |api, ()| async move {
            api.get_accounts().await.map_err(ToolError::from)
        })
        .await;

        let body = payload(&result);
        assert_eq!(body["error"], true);
        assert_eq!(body["tool"], "sample_tool");
        assert_eq!(body["kind"], "authentication_required");
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn remote_failure_becomes_error_text() {
        let dir = tempfile::tempdir().expect("tempdir");
        let api = Arc::new(MockApi::new().with_failure("get_accounts"));
        let bridge = authed_bridge(&dir, &api);

        let result = invoke(&bridge, "sample_tool", Ok(()), |api, ()| async move {
            api.get_accounts().await.map_err(ToolError::from)
        })
        .await;

        assert!(is_error(&result));
        let body = payload(&result);
        assert_eq!(body["kind"], "remote_error");
        assert_eq!(
            body["message"],
            "remote call failed: GraphQL error: get_accounts failed"
        );
    }

    #[test]
    fn render_local_value() {
        let result = render("local", Ok::<_, ToolError>(json!({"status": "valid"})));
        assert!(!is_error(&result));
        assert_eq!(payload(&result)["status"], "valid");
    }
}
