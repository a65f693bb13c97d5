//! Shared fixtures for unit tests.

#![allow(
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::missing_docs_in_private_items,
    reason = "test fixtures use expect and indexing for readability"
)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rmcp::model::CallToolResult;
use serde::Serialize;
use serde_json::{Value, json};

use crate::api::{
    BudgetAmount, DateRange, MonarchApi, NewTransaction, RuleInput, SnapshotQuery, SplitPart,
    Timeframe, TransactionQuery, TransactionUpdate,
};
use crate::bridge::{AuthBridge, Connector};
use crate::error::{ApiError, ApiResult};
use crate::session::{Session, SessionStore};

/// A failure rule: fail `method`, optionally only for one transaction.
#[derive(Debug)]
struct Failure {
    method: &'static str,
    transaction_id: Option<String>,
    /// Reject as an invalid token rather than a GraphQL error.
    unauthorized: bool,
}

/// Recording [`MonarchApi`] returning canned responses.
#[derive(Debug, Default)]
pub(crate) struct MockApi {
    responses: HashMap<&'static str, Value>,
    failures: Vec<Failure>,
    calls: Mutex<Vec<(&'static str, Value)>>,
}

impl MockApi {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Returns `response` from every call to `method`.
    pub(crate) fn with_response(mut self, method: &'static str, response: Value) -> Self {
        let _previous = self.responses.insert(method, response);
        self
    }

    /// Fails every call to `method`.
    pub(crate) fn with_failure(mut self, method: &'static str) -> Self {
        self.failures.push(Failure {
            method,
            transaction_id: None,
            unauthorized: false,
        });
        self
    }

    /// Rejects every call to `method` as if the token were revoked.
    pub(crate) fn with_unauthorized(mut self, method: &'static str) -> Self {
        self.failures.push(Failure {
            method,
            transaction_id: None,
            unauthorized: true,
        });
        self
    }

    /// Fails calls to `method` whose `transactionId` argument is `id`.
    pub(crate) fn with_failure_for(mut self, method: &'static str, id: &str) -> Self {
        self.failures.push(Failure {
            method,
            transaction_id: Some(id.to_owned()),
            unauthorized: false,
        });
        self
    }

    /// Every recorded call as `(method, arguments)`.
    pub(crate) fn calls(&self) -> Vec<(&'static str, Value)> {
        self.calls.lock().expect("calls lock").clone()
    }

    /// Arguments of every call to `method`, in call order.
    pub(crate) fn calls_to(&self, method: &str) -> Vec<Value> {
        self.calls()
            .into_iter()
            .filter(|(name, _)| *name == method)
            .map(|(_, args)| args)
            .collect()
    }

    fn record<A: Serialize>(&self, method: &'static str, args: &A) -> ApiResult<Value> {
        let recorded = serde_json::to_value(args).expect("arguments serialize");
        self.calls
            .lock()
            .expect("calls lock")
            .push((method, recorded.clone()));

        let matched = self.failures.iter().find(|failure| {
            failure.method == method
                && failure.transaction_id.as_ref().is_none_or(|id| {
                    recorded.get("transactionId").and_then(Value::as_str) == Some(id.as_str())
                })
        });
        if let Some(failure) = matched {
            return Err(if failure.unauthorized {
                ApiError::Unauthorized
            } else {
                ApiError::GraphQl(format!("{method} failed"))
            });
        }
        Ok(self
            .responses
            .get(method)
            .cloned()
            .unwrap_or_else(|| json!({})))
    }
}

#[async_trait]
impl MonarchApi for MockApi {
    async fn get_accounts(&self) -> ApiResult<Value> {
        self.record("get_accounts", &json!({}))
    }

    async fn request_accounts_refresh(&self) -> ApiResult<Value> {
        self.record("request_accounts_refresh", &json!({}))
    }

    async fn get_account_holdings(&self, account_id: &str) -> ApiResult<Value> {
        self.record("get_account_holdings", &json!({ "accountId": account_id }))
    }

    async fn get_account_history(&self, account_id: &str) -> ApiResult<Value> {
        self.record("get_account_history", &json!({ "accountId": account_id }))
    }

    async fn get_transactions(&self, query: &TransactionQuery) -> ApiResult<Value> {
        self.record("get_transactions", query)
    }

    async fn get_transaction_details(&self, transaction_id: &str) -> ApiResult<Value> {
        self.record(
            "get_transaction_details",
            &json!({ "transactionId": transaction_id }),
        )
    }

    async fn create_transaction(&self, transaction: &NewTransaction) -> ApiResult<Value> {
        self.record("create_transaction", transaction)
    }

    async fn update_transaction(&self, update: &TransactionUpdate) -> ApiResult<Value> {
        self.record("update_transaction", update)
    }

    async fn delete_transaction(&self, transaction_id: &str) -> ApiResult<Value> {
        self.record(
            "delete_transaction",
            &json!({ "transactionId": transaction_id }),
        )
    }

    async fn get_recurring_transactions(&self, range: &DateRange) -> ApiResult<Value> {
        self.record("get_recurring_transactions", range)
    }

    async fn get_transactions_summary(&self) -> ApiResult<Value> {
        self.record("get_transactions_summary", &json!({}))
    }

    async fn get_cashflow_by_category(&self, range: &DateRange) -> ApiResult<Value> {
        self.record("get_cashflow_by_category", range)
    }

    async fn get_cashflow(&self, range: &DateRange) -> ApiResult<Value> {
        self.record("get_cashflow", range)
    }

    async fn get_transaction_splits(&self, transaction_id: &str) -> ApiResult<Value> {
        self.record(
            "get_transaction_splits",
            &json!({ "transactionId": transaction_id }),
        )
    }

    async fn update_transaction_splits(
        &self,
        transaction_id: &str,
        splits: &[SplitPart],
    ) -> ApiResult<Value> {
        self.record(
            "update_transaction_splits",
            &json!({ "transactionId": transaction_id, "splits": splits }),
        )
    }

    async fn get_transaction_tags(&self) -> ApiResult<Value> {
        self.record("get_transaction_tags", &json!({}))
    }

    async fn set_transaction_tags(
        &self,
        transaction_id: &str,
        tag_ids: &[String],
    ) -> ApiResult<Value> {
        self.record(
            "set_transaction_tags",
            &json!({ "transactionId": transaction_id, "tagIds": tag_ids }),
        )
    }

    async fn create_transaction_tag(&self, name: &str, color: &str) -> ApiResult<Value> {
        self.record(
            "create_transaction_tag",
            &json!({ "name": name, "color": color }),
        )
    }

    async fn get_transaction_rules(&self) -> ApiResult<Value> {
        self.record("get_transaction_rules", &json!({}))
    }

    async fn create_transaction_rule(&self, rule: &RuleInput) -> ApiResult<Value> {
        self.record("create_transaction_rule", rule)
    }

    async fn update_transaction_rule(&self, rule: &RuleInput) -> ApiResult<Value> {
        self.record("update_transaction_rule", rule)
    }

    async fn delete_transaction_rule(&self, rule_id: &str) -> ApiResult<Value> {
        self.record("delete_transaction_rule", &json!({ "ruleId": rule_id }))
    }

    async fn get_transaction_categories(&self) -> ApiResult<Value> {
        self.record("get_transaction_categories", &json!({}))
    }

    async fn get_transaction_category_groups(&self) -> ApiResult<Value> {
        self.record("get_transaction_category_groups", &json!({}))
    }

    async fn get_budgets(&self, range: &DateRange) -> ApiResult<Value> {
        self.record("get_budgets", range)
    }

    async fn set_budget_amount(&self, budget: &BudgetAmount) -> ApiResult<Value> {
        self.record("set_budget_amount", budget)
    }

    async fn get_aggregate_snapshots(&self, query: &SnapshotQuery) -> ApiResult<Value> {
        self.record("get_aggregate_snapshots", query)
    }

    async fn get_account_snapshots_by_type(
        &self,
        start_date: NaiveDate,
        timeframe: Timeframe,
    ) -> ApiResult<Value> {
        self.record(
            "get_account_snapshots_by_type",
            &json!({ "startDate": start_date, "timeframe": timeframe.as_str() }),
        )
    }
}

/// Hands out one shared [`MockApi`].
struct StaticConnector(Arc<MockApi>);

impl Connector for StaticConnector {
    fn connect(&self, _session: &Session) -> ApiResult<Arc<dyn MonarchApi>> {
        let api: Arc<dyn MonarchApi> = Arc::<MockApi>::clone(&self.0);
        Ok(api)
    }
}

/// Stores a valid session inside `dir`.
pub(crate) fn write_session(dir: &tempfile::TempDir) -> SessionStore {
    let store = SessionStore::new(dir.path().join("session.json"));
    store
        .save(&Session::new("test-token".to_owned(), Utc::now()))
        .expect("session should save");
    store
}

/// A bridge with a stored session, backed by `api`.
pub(crate) fn authed_bridge(dir: &tempfile::TempDir, api: &Arc<MockApi>) -> AuthBridge {
    AuthBridge::new(
        write_session(dir),
        Box::new(StaticConnector(Arc::clone(api))),
    )
}

/// A bridge with no stored session, backed by `api`.
pub(crate) fn unauthenticated_bridge(dir: &tempfile::TempDir, api: &Arc<MockApi>) -> AuthBridge {
    AuthBridge::new(
        SessionStore::new(dir.path().join("missing.json")),
        Box::new(StaticConnector(Arc::clone(api))),
    )
}

/// Serialized form of a tool result.
fn result_json(result: &CallToolResult) -> Value {
    serde_json::to_value(result).expect("tool result serializes")
}

/// Whether `result` is flagged as an error.
pub(crate) fn is_error(result: &CallToolResult) -> bool {
    result_json(result)
        .get("isError")
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

/// The first text block of `result`.
pub(crate) fn text(result: &CallToolResult) -> String {
    result_json(result)["content"][0]["text"]
        .as_str()
        .expect("result should carry text")
        .to_owned()
}

/// The first text block of `result`, parsed as JSON.
pub(crate) fn payload(result: &CallToolResult) -> Value {
    serde_json::from_str(&text(result)).expect("result text should be JSON")
}
