//! Tool implementations, grouped by API area.
//!
//! Every tool takes the shared [`AuthBridge`](crate::bridge::AuthBridge) and
//! its parameters and returns a finished
//! [`CallToolResult`](rmcp::model::CallToolResult); the server only routes.

pub(crate) mod accounts;
pub(crate) mod auth;
pub(crate) mod budgets;
pub(crate) mod categories;
pub(crate) mod financial;
pub(crate) mod rules;
pub(crate) mod splits;
pub(crate) mod summaries;
pub(crate) mod tags;
pub(crate) mod transactions;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ToolError;

/// Decodes a remote `data` object into a typed view.
fn decode<T: DeserializeOwned>(data: Value) -> Result<T, ToolError> {
    Ok(serde_json::from_value(data)?)
}

/// Decodes `data[key]`, yielding the default when it is absent or null.
fn decode_field<T: DeserializeOwned + Default>(data: &Value, key: &str) -> Result<T, ToolError> {
    data.get(key)
        .filter(|value| !value.is_null())
        .map_or_else(|| Ok(T::default()), |value| decode(value.clone()))
}
