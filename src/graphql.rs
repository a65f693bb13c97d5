//! Minimal GraphQL-over-HTTP implementation of [`MonarchApi`].
//!
//! Each operation is one `POST {api_url}/graphql` carrying the stored token.
//! No login, retry or session refresh happens here.

mod queries;

use core::time::Duration;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Datelike, Local, Months, NaiveDate};
use reqwest::StatusCode;
use reqwest::header::AUTHORIZATION;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

use crate::api::{
    BudgetAmount, BudgetTarget, DateRange, MonarchApi, NewTransaction, RuleInput, SnapshotQuery,
    SplitPart, Timeframe, TransactionFilters, TransactionQuery, TransactionUpdate,
};
use crate::bridge::Connector;
use crate::config::Config;
use crate::error::{ApiError, ApiResult};
use crate::session::Session;

/// Longest error body kept in [`ApiError::Status`].
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Request envelope.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GraphqlRequest<'req, V> {
    /// Operation name, matching the document.
    operation_name: &'req str,
    /// GraphQL document.
    query: &'req str,
    /// Operation variables.
    variables: V,
}

/// Response envelope.
#[derive(Deserialize)]
struct GraphqlResponse {
    /// Operation result.
    #[serde(default)]
    data: Option<Value>,
    /// Reported errors, if any.
    #[serde(default)]
    errors: Option<Vec<GraphqlErrorMessage>>,
}

/// One entry of the GraphQL `errors` array.
#[derive(Deserialize)]
struct GraphqlErrorMessage {
    /// Human-readable message.
    message: String,
}

/// Authenticated GraphQL client.
pub(crate) struct GraphqlClient {
    /// Shared HTTP client.
    http: reqwest::Client,
    /// Full GraphQL endpoint URL.
    endpoint: String,
    /// Session token.
    token: SecretString,
}

impl core::fmt::Debug for GraphqlClient {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("GraphqlClient")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl GraphqlClient {
    /// Builds a client for `api_url` authenticating with `token`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Http`] if the HTTP client cannot be built.
    pub(crate) fn new(api_url: &str, token: SecretString, timeout: Duration) -> ApiResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("monarch-mcp/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            endpoint: format!("{}/graphql", api_url.trim_end_matches('/')),
            token,
        })
    }

    /// Executes one GraphQL operation and returns its `data` object.
    async fn execute<V: Serialize + Send + Sync>(
        &self,
        operation: &str,
        query: &str,
        variables: V,
    ) -> ApiResult<Value> {
        debug!(operation, "graphql request");
        let request = GraphqlRequest {
            operation_name: operation,
            query,
            variables,
        };
        let response = self
            .http
            .post(&self.endpoint)
            .header(AUTHORIZATION, format!("Token {}", self.token.expose_secret()))
            .header("Client-Platform", "web")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ApiError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        let envelope: GraphqlResponse = response.json().await?;
        if let Some(errors) = envelope.errors.filter(|errors| !errors.is_empty()) {
            let messages: Vec<String> = errors.into_iter().map(|err| err.message).collect();
            return Err(ApiError::GraphQl(messages.join("; ")));
        }
        match envelope.data {
            Some(Value::Null) | None => Err(ApiError::GraphQl(
                "response contained no data".to_owned(),
            )),
            Some(data) => Ok(data),
        }
    }
}

/// First day of the month containing `day`.
fn month_start(day: NaiveDate) -> NaiveDate {
    day.with_day(1).unwrap_or(day)
}

/// Last day of the month containing `day`.
fn month_end(day: NaiveDate) -> NaiveDate {
    month_start(day)
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(day)
}

/// Resolves an open budget window to last month through next month.
fn budget_window(range: &DateRange, today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = range.start_date.unwrap_or_else(|| {
        month_start(today)
            .checked_sub_months(Months::new(1))
            .unwrap_or(today)
    });
    let end = range.end_date.unwrap_or_else(|| {
        today
            .checked_add_months(Months::new(1))
            .map_or(today, month_end)
    });
    (start, end)
}

/// Resolves an open recurring window to the current month.
fn current_month_window(range: &DateRange, today: NaiveDate) -> (NaiveDate, NaiveDate) {
    (
        range.start_date.unwrap_or_else(|| month_start(today)),
        range.end_date.unwrap_or_else(|| month_end(today)),
    )
}

/// Collects account IDs from a `GetAccounts` response.
fn account_ids(accounts: &Value) -> Vec<String> {
    accounts
        .get("accounts")
        .and_then(Value::as_array)
        .map(|list| {
            list.iter()
                .filter_map(|account| account.get("id").and_then(Value::as_str))
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

#[async_trait]
impl MonarchApi for GraphqlClient {
    async fn get_accounts(&self) -> ApiResult<Value> {
        self.execute("GetAccounts", queries::GET_ACCOUNTS, json!({}))
            .await
    }

    async fn request_accounts_refresh(&self) -> ApiResult<Value> {
        let accounts = self.get_accounts().await?;
        let ids = account_ids(&accounts);
        debug!(count = ids.len(), "requesting account refresh");
        self.execute(
            "Common_ForceRefreshAccountsMutation",
            queries::FORCE_REFRESH_ACCOUNTS,
            json!({ "input": { "accountIds": ids } }),
        )
        .await
    }

    async fn get_account_holdings(&self, account_id: &str) -> ApiResult<Value> {
        let today = Local::now().date_naive();
        self.execute(
            "Web_GetHoldings",
            queries::GET_HOLDINGS,
            json!({
                "input": {
                    "accountIds": [account_id],
                    "startDate": today,
                    "endDate": today,
                    "includeHiddenHoldings": true,
                }
            }),
        )
        .await
    }

    async fn get_account_history(&self, account_id: &str) -> ApiResult<Value> {
        self.execute(
            "AccountDetails_getAccount",
            queries::GET_ACCOUNT_HISTORY,
            json!({ "id": account_id }),
        )
        .await
    }

    async fn get_transactions(&self, query: &TransactionQuery) -> ApiResult<Value> {
        self.execute(
            "GetTransactionsList",
            queries::GET_TRANSACTIONS,
            json!({
                "offset": query.offset,
                "limit": query.limit,
                "filters": query.filters,
                "orderBy": "date",
            }),
        )
        .await
    }

    async fn get_transaction_details(&self, transaction_id: &str) -> ApiResult<Value> {
        self.execute(
            "GetTransactionDrawer",
            queries::GET_TRANSACTION_DETAILS,
            json!({ "id": transaction_id, "redirectPosted": true }),
        )
        .await
    }

    async fn create_transaction(&self, transaction: &NewTransaction) -> ApiResult<Value> {
        self.execute(
            "Common_CreateTransactionMutation",
            queries::CREATE_TRANSACTION,
            json!({
                "input": {
                    "date": transaction.date,
                    "accountId": transaction.account_id,
                    "amount": transaction.amount,
                    "merchantName": transaction.merchant_name,
                    "categoryId": transaction.category_id,
                    "notes": transaction.notes,
                    "shouldUpdateBalance": false,
                }
            }),
        )
        .await
    }

    async fn update_transaction(&self, update: &TransactionUpdate) -> ApiResult<Value> {
        let mut input = serde_json::Map::new();
        let _previous = input.insert("id".to_owned(), json!(update.transaction_id));
        if let Some(amount) = update.amount {
            let _previous = input.insert("amount".to_owned(), json!(amount));
        }
        if let Some(name) = update.merchant_name.as_ref() {
            let _previous = input.insert("name".to_owned(), json!(name));
        }
        if let Some(category) = update.category_id.as_ref() {
            let _previous = input.insert("category".to_owned(), json!(category));
        }
        if let Some(date) = update.date {
            let _previous = input.insert("date".to_owned(), json!(date));
        }
        if let Some(notes) = update.notes.as_ref() {
            let _previous = input.insert("notes".to_owned(), json!(notes));
        }
        if let Some(needs_review) = update.needs_review {
            let _previous = input.insert("needsReview".to_owned(), json!(needs_review));
        }
        self.execute(
            "Web_TransactionDrawerUpdateTransaction",
            queries::UPDATE_TRANSACTION,
            json!({ "input": input }),
        )
        .await
    }

    async fn delete_transaction(&self, transaction_id: &str) -> ApiResult<Value> {
        self.execute(
            "Common_DeleteTransactionMutation",
            queries::DELETE_TRANSACTION,
            json!({ "input": { "transactionId": transaction_id } }),
        )
        .await
    }

    async fn get_recurring_transactions(&self, range: &DateRange) -> ApiResult<Value> {
        let (start, end) = current_month_window(range, Local::now().date_naive());
        self.execute(
            "Web_GetUpcomingRecurringTransactionItems",
            queries::GET_RECURRING_TRANSACTIONS,
            json!({ "startDate": start, "endDate": end, "filters": {} }),
        )
        .await
    }

    async fn get_transactions_summary(&self) -> ApiResult<Value> {
        self.execute(
            "GetTransactionsPage",
            queries::GET_TRANSACTIONS_SUMMARY,
            json!({ "filters": {} }),
        )
        .await
    }

    async fn get_cashflow_by_category(&self, range: &DateRange) -> ApiResult<Value> {
        let filters = TransactionFilters {
            range: *range,
            ..TransactionFilters::default()
        };
        self.execute(
            "Web_GetCashFlowByCategory",
            queries::GET_CASHFLOW_BY_CATEGORY,
            json!({ "filters": filters }),
        )
        .await
    }

    async fn get_cashflow(&self, range: &DateRange) -> ApiResult<Value> {
        let filters = TransactionFilters {
            range: *range,
            ..TransactionFilters::default()
        };
        self.execute(
            "Web_GetCashFlowPage",
            queries::GET_CASHFLOW,
            json!({ "filters": filters }),
        )
        .await
    }

    async fn get_transaction_splits(&self, transaction_id: &str) -> ApiResult<Value> {
        self.execute(
            "TransactionSplitQuery",
            queries::GET_TRANSACTION_SPLITS,
            json!({ "id": transaction_id }),
        )
        .await
    }

    async fn update_transaction_splits(
        &self,
        transaction_id: &str,
        splits: &[SplitPart],
    ) -> ApiResult<Value> {
        self.execute(
            "Common_SplitTransactionMutation",
            queries::UPDATE_TRANSACTION_SPLITS,
            json!({ "input": { "transactionId": transaction_id, "splitData": splits } }),
        )
        .await
    }

    async fn get_transaction_tags(&self) -> ApiResult<Value> {
        self.execute(
            "GetHouseholdTransactionTags",
            queries::GET_TAGS,
            json!({}),
        )
        .await
    }

    async fn set_transaction_tags(
        &self,
        transaction_id: &str,
        tag_ids: &[String],
    ) -> ApiResult<Value> {
        self.execute(
            "Web_SetTransactionTags",
            queries::SET_TRANSACTION_TAGS,
            json!({ "input": { "transactionId": transaction_id, "tagIds": tag_ids } }),
        )
        .await
    }

    async fn create_transaction_tag(&self, name: &str, color: &str) -> ApiResult<Value> {
        self.execute(
            "Common_CreateTransactionTag",
            queries::CREATE_TAG,
            json!({ "input": { "name": name, "color": color } }),
        )
        .await
    }

    async fn get_transaction_rules(&self) -> ApiResult<Value> {
        self.execute(
            "GetTransactionRules",
            queries::GET_TRANSACTION_RULES,
            json!({}),
        )
        .await
    }

    async fn create_transaction_rule(&self, rule: &RuleInput) -> ApiResult<Value> {
        self.execute(
            "Common_CreateTransactionRuleMutationV2",
            queries::CREATE_TRANSACTION_RULE,
            json!({ "input": rule }),
        )
        .await
    }

    async fn update_transaction_rule(&self, rule: &RuleInput) -> ApiResult<Value> {
        self.execute(
            "Common_UpdateTransactionRuleMutationV2",
            queries::UPDATE_TRANSACTION_RULE,
            json!({ "input": rule }),
        )
        .await
    }

    async fn delete_transaction_rule(&self, rule_id: &str) -> ApiResult<Value> {
        self.execute(
            "Common_DeleteTransactionRule",
            queries::DELETE_TRANSACTION_RULE,
            json!({ "id": rule_id }),
        )
        .await
    }

    async fn get_transaction_categories(&self) -> ApiResult<Value> {
        self.execute("GetCategories", queries::GET_CATEGORIES, json!({}))
            .await
    }

    async fn get_transaction_category_groups(&self) -> ApiResult<Value> {
        self.execute(
            "ManageGetCategoryGroups",
            queries::GET_CATEGORY_GROUPS,
            json!({}),
        )
        .await
    }

    async fn get_budgets(&self, range: &DateRange) -> ApiResult<Value> {
        let (start, end) = budget_window(range, Local::now().date_naive());
        self.execute(
            "GetJointPlanningData",
            queries::GET_BUDGETS,
            json!({ "startDate": start, "endDate": end }),
        )
        .await
    }

    async fn set_budget_amount(&self, budget: &BudgetAmount) -> ApiResult<Value> {
        let month = month_start(
            budget
                .start_date
                .unwrap_or_else(|| Local::now().date_naive()),
        );
        let (category_id, category_group_id) = match budget.target {
            BudgetTarget::CategoryId(ref id) => (Some(id), None),
            BudgetTarget::CategoryGroupId(ref id) => (None, Some(id)),
        };
        self.execute(
            "Common_UpdateBudgetItem",
            queries::SET_BUDGET_AMOUNT,
            json!({
                "input": {
                    "startDate": month,
                    "timeframe": "month",
                    "categoryId": category_id,
                    "categoryGroupId": category_group_id,
                    "amount": budget.amount,
                    "applyToFuture": budget.apply_to_future,
                }
            }),
        )
        .await
    }

    async fn get_aggregate_snapshots(&self, query: &SnapshotQuery) -> ApiResult<Value> {
        self.execute(
            "GetAggregateSnapshots",
            queries::GET_AGGREGATE_SNAPSHOTS,
            json!({ "filters": query }),
        )
        .await
    }

    async fn get_account_snapshots_by_type(
        &self,
        start_date: NaiveDate,
        timeframe: Timeframe,
    ) -> ApiResult<Value> {
        self.execute(
            "GetSnapshotsByAccountType",
            queries::GET_SNAPSHOTS_BY_ACCOUNT_TYPE,
            json!({ "startDate": start_date, "timeframe": timeframe.as_str() }),
        )
        .await
    }
}

/// Builds [`GraphqlClient`] handles from stored sessions.
#[derive(Debug, Clone)]
pub(crate) struct GraphqlConnector {
    /// API origin.
    api_url: String,
    /// Per-request timeout.
    timeout: Duration,
}

impl GraphqlConnector {
    /// Creates a connector from server configuration.
    pub(crate) fn from_config(config: &Config) -> Self {
        Self {
            api_url: config.api_url.clone(),
            timeout: config.timeout,
        }
    }
}

impl Connector for GraphqlConnector {
    fn connect(&self, session: &Session) -> ApiResult<Arc<dyn MonarchApi>> {
        let token = SecretString::new(session.token().expose_secret().clone());
        let client = GraphqlClient::new(&self.api_url, token, self.timeout)?;
        Ok(Arc::new(client))
    }
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::panic,
    clippy::missing_docs_in_private_items,
    reason = "test code uses expect and panic for readability"
)]
mod tests {
    use core::time::Duration;

    use chrono::NaiveDate;
    use secrecy::SecretString;
    use serde_json::json;

    use super::{GraphqlClient, budget_window, current_month_window, month_end};
    use crate::api::{DateRange, MonarchApi};
    use crate::error::ApiError;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
    }

    fn client_for(server: &mockito::Server) -> GraphqlClient {
        GraphqlClient::new(
            &server.url(),
            SecretString::new("tok-abc".to_owned()),
            Duration::from_secs(5),
        )
        .expect("client should build")
    }

    #[tokio::test]
    async fn sends_token_and_returns_data() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/graphql")
            .match_header("authorization", "Token tok-abc")
            .match_header("client-platform", "web")
            .match_body(mockito::Matcher::PartialJson(
                json!({"operationName": "GetAccounts"}),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({"data": {"accounts": [{"id": "acc_1"}]}}).to_string())
            .create_async()
            .await;

        let data = client_for(&server)
            .get_accounts()
            .await
            .expect("request should succeed");
        assert_eq!(data, json!({"accounts": [{"id": "acc_1"}]}));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn unauthorized_status_maps_to_unauthorized() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/graphql")
            .with_status(401)
            .with_body("unauthorized")
            .create_async()
            .await;

        let result = client_for(&server).get_transaction_tags().await;
        assert!(matches!(result, Err(ApiError::Unauthorized)));
    }

    #[tokio::test]
    async fn server_error_keeps_status_and_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/graphql")
            .with_status(502)
            .with_body("bad gateway")
            .create_async()
            .await;

        let result = client_for(&server).get_transaction_tags().await;
        match result {
            Err(ApiError::Status { status, body }) => {
                assert_eq!(status, 502);
                assert_eq!(body, "bad gateway");
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn graphql_errors_are_joined() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/graphql")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "data": null,
                    "errors": [{"message": "first"}, {"message": "second"}]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let result = client_for(&server).get_transaction_tags().await;
        match result {
            Err(ApiError::GraphQl(message)) => assert_eq!(message, "first; second"),
            other => panic!("expected graphql error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn refresh_sends_every_account_id() {
        let mut server = mockito::Server::new_async().await;
        let _accounts = server
            .mock("POST", "/graphql")
            .match_body(mockito::Matcher::PartialJson(
                json!({"operationName": "GetAccounts"}),
            ))
            .with_status(200)
            .with_body(json!({"data": {"accounts": [{"id": "a1"}, {"id": "a2"}]}}).to_string())
            .create_async()
            .await;
        let refresh = server
            .mock("POST", "/graphql")
            .match_body(mockito::Matcher::PartialJson(json!({
                "operationName": "Common_ForceRefreshAccountsMutation",
                "variables": {"input": {"accountIds": ["a1", "a2"]}}
            })))
            .with_status(200)
            .with_body(json!({"data": {"forceRefreshAccounts": {"success": true}}}).to_string())
            .create_async()
            .await;

        let data = client_for(&server)
            .request_accounts_refresh()
            .await
            .expect("refresh should succeed");
        assert_eq!(data, json!({"forceRefreshAccounts": {"success": true}}));
        refresh.assert_async().await;
    }

    #[test]
    fn month_end_handles_leap_february() {
        assert_eq!(month_end(date(2024, 2, 10)), date(2024, 2, 29));
        assert_eq!(month_end(date(2023, 12, 31)), date(2023, 12, 31));
    }

    #[test]
    fn budget_window_defaults_to_surrounding_months() {
        let (start, end) = budget_window(&DateRange::default(), date(2024, 1, 15));
        assert_eq!(start, date(2023, 12, 1));
        assert_eq!(end, date(2024, 2, 29));
    }

    #[test]
    fn recurring_window_keeps_explicit_bounds() {
        let range = DateRange {
            start_date: Some(date(2024, 3, 5)),
            end_date: None,
        };
        let (start, end) = current_month_window(&range, date(2024, 4, 20));
        assert_eq!(start, date(2024, 3, 5));
        assert_eq!(end, date(2024, 4, 30));
    }
}
