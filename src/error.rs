//! Error types for the remote client and the tool boundary.

/// Errors raised by a [`MonarchApi`](crate::api::MonarchApi) implementation.
#[derive(Debug, thiserror::Error)]
pub(crate) enum ApiError {
    /// The remote service rejected the session token (HTTP 401/403).
    #[error("the Monarch API rejected the session token")]
    Unauthorized,
    /// The remote service answered with a non-success HTTP status.
    #[error("Monarch API returned HTTP {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly truncated.
        body: String,
    },
    /// The GraphQL response carried an `errors` array or no `data`.
    #[error("GraphQL error: {0}")]
    GraphQl(String),
    /// Transport-level failure (connect, timeout, TLS).
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    /// A response could not be decoded into the expected shape.
    #[error("unexpected response shape: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Convenience alias for remote client results.
pub(crate) type ApiResult<T> = Result<T, ApiError>;

/// Tagged error reported at the tool boundary.
#[derive(Debug, thiserror::Error)]
pub(crate) enum ToolError {
    /// No session is stored on disk.
    #[error("no valid Monarch session found; run `monarch-mcp import-token` to set up authentication")]
    AuthenticationRequired,
    /// A session exists but is expired or was rejected by the remote service.
    #[error(
        "the Monarch session has expired or was rejected; run `monarch-mcp import-token` to re-authenticate"
    )]
    SessionExpired,
    /// Tool parameters are malformed.
    #[error("{0}")]
    Validation(String),
    /// The remote call failed for any other reason.
    #[error("remote call failed: {0}")]
    Remote(#[source] ApiError),
}

impl ToolError {
    /// Builds a [`ToolError::Validation`] from any message.
    pub(crate) fn validation<M: Into<String>>(message: M) -> Self {
        Self::Validation(message.into())
    }

    /// Stable machine-readable tag for the error kind.
    pub(crate) const fn kind(&self) -> &'static str {
        match *self {
            Self::AuthenticationRequired => "authentication_required",
            Self::SessionExpired => "session_expired",
            Self::Validation(_) => "validation_error",
            Self::Remote(_) => "remote_error",
        }
    }
}

impl From<ApiError> for ToolError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Unauthorized => Self::SessionExpired,
            other @ (ApiError::Status { .. }
            | ApiError::GraphQl(_)
            | ApiError::Http(_)
            | ApiError::Decode(_)) => Self::Remote(other),
        }
    }
}

impl From<serde_json::Error> for ToolError {
    fn from(err: serde_json::Error) -> Self {
        Self::Remote(ApiError::Decode(err))
    }
}

#[cfg(test)]
#[allow(
    clippy::missing_docs_in_private_items,
    reason = "test code does not need docs"
)]
mod tests {
    use super::{ApiError, ToolError};

    #[test]
    fn unauthorized_maps_to_session_expired() {
        let err = ToolError::from(ApiError::Unauthorized);
        assert_eq!(err.kind(), "session_expired");
    }

    #[test]
    fn other_api_errors_map_to_remote() {
        let err = ToolError::from(ApiError::GraphQl("boom".to_owned()));
        assert_eq!(err.kind(), "remote_error");
        assert_eq!(err.to_string(), "remote call failed: GraphQL error: boom");
    }

    #[test]
    fn authentication_message_is_actionable() {
        let message = ToolError::AuthenticationRequired.to_string();
        assert!(message.contains("import-token"));
    }
}
