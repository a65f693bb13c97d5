//! MCP server exposing Monarch Money operations as tools.
//!
//! Uses `rmcp` macros to declare the tool set. Each method only unwraps its
//! parameters and routes to [`crate::tools`]; validation, remote calls and
//! error rendering happen there.

extern crate alloc;

use alloc::sync::Arc;

use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, ServerCapabilities, ServerInfo};
use rmcp::{ErrorData as McpError, ServerHandler, tool, tool_handler, tool_router};

use crate::bridge::AuthBridge;
use crate::params::{
    AccountIdParams, BulkCategorizeParams, CreateTagParams, CreateTransactionParams,
    DateRangeParams, GetTransactionsParams, NeedingReviewParams, NetWorthByTypeParams,
    NetWorthParams, RuleIdParams, RuleParams, SearchTransactionsParams, SetBudgetParams,
    SetCategoryParams, SetTagsParams, SpendingSummaryParams, SplitTransactionParams,
    TransactionIdParams, UpdateNotesParams, UpdateRuleParams, UpdateTransactionParams,
};
use crate::tools::{
    accounts, auth, budgets, categories, financial, rules, splits, summaries, tags, transactions,
};

/// MCP server wrapping the Monarch Money personal finance API.
#[derive(Clone)]
pub(crate) struct MonarchMcpServer {
    /// Session store and lazily built client (shared via Arc).
    bridge: Arc<AuthBridge>,
    /// Account email reported by `check_auth_status`.
    email: Option<String>,
    /// Tool router for dispatching MCP tool calls.
    tool_router: ToolRouter<Self>,
}

impl core::fmt::Debug for MonarchMcpServer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MonarchMcpServer")
            .field("bridge", &self.bridge)
            .finish_non_exhaustive()
    }
}

#[allow(
    clippy::unnecessary_wraps,
    reason = "rmcp routes tool results as Result<CallToolResult, ErrorData>"
)]
#[tool_router]
impl MonarchMcpServer {
    /// Creates a new MCP server around the given bridge.
    pub(crate) fn new(bridge: AuthBridge, email: Option<String>) -> Self {
        Self {
            bridge: Arc::new(bridge),
            email,
            tool_router: Self::tool_router(),
        }
    }

    // ── Authentication ──────────────────────────────────────────────

    /// Explains how to create a session.
    #[tool(description = "Explain how to authenticate with Monarch Money and where the session is stored")]
    fn setup_authentication(&self) -> Result<CallToolResult, McpError> {
        Ok(auth::setup_authentication(&self.bridge))
    }

    /// Reports whether a usable session exists.
    #[tool(description = "Check whether a valid Monarch Money session is stored, without contacting the service")]
    fn check_auth_status(&self) -> Result<CallToolResult, McpError> {
        Ok(auth::check_auth_status(&self.bridge, self.email.clone()))
    }

    /// Diagnoses session file loading.
    #[tool(description = "Diagnose session file loading: path, whether it exists and loads, token length")]
    fn debug_session_loading(&self) -> Result<CallToolResult, McpError> {
        Ok(auth::debug_session_loading(&self.bridge))
    }

    // ── Accounts ────────────────────────────────────────────────────

    /// Lists accounts.
    #[tool(description = "List all financial accounts with balance, type, institution and active flag")]
    async fn get_accounts(&self) -> Result<CallToolResult, McpError> {
        Ok(accounts::get_accounts(&self.bridge).await)
    }

    /// Refreshes accounts from their institutions.
    #[tool(description = "Request a refresh of all accounts from their financial institutions")]
    async fn refresh_accounts(&self) -> Result<CallToolResult, McpError> {
        Ok(accounts::refresh_accounts(&self.bridge).await)
    }

    /// Lists holdings of an investment account.
    #[tool(description = "Get the investment holdings of one account")]
    async fn get_account_holdings(
        &self,
        params: Parameters<AccountIdParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(accounts::get_account_holdings(&self.bridge, params.0).await)
    }

    /// Returns the balance history of an account.
    #[tool(
        description = "Get the daily balance history of one account (numeric account ID) with current, earliest, change, highest and lowest balance"
    )]
    async fn get_account_balance_history(
        &self,
        params: Parameters<AccountIdParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(accounts::get_account_balance_history(&self.bridge, params.0).await)
    }

    // ── Transactions ────────────────────────────────────────────────

    /// Lists transactions.
    #[tool(
        description = "List transactions, newest first, optionally filtered by date range and account"
    )]
    async fn get_transactions(
        &self,
        params: Parameters<GetTransactionsParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(transactions::get_transactions(&self.bridge, params.0).await)
    }

    /// Searches transactions.
    #[tool(
        description = "Search transactions by text, dates, categories, accounts, tags and flags (attachments, notes, hidden, split, recurring)"
    )]
    async fn search_transactions(
        &self,
        params: Parameters<SearchTransactionsParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(transactions::search_transactions(&self.bridge, params.0).await)
    }

    /// Returns one transaction in full.
    #[tool(description = "Get full details of one transaction, including attachments and splits")]
    async fn get_transaction_details(
        &self,
        params: Parameters<TransactionIdParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(transactions::get_transaction_details(&self.bridge, params.0).await)
    }

    /// Creates a manual transaction.
    #[tool(
        description = "Create a manual transaction. The description is stored as notes and used as merchant name unless merchant_name is given"
    )]
    async fn create_transaction(
        &self,
        params: Parameters<CreateTransactionParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(transactions::create_transaction(&self.bridge, params.0).await)
    }

    /// Updates a transaction.
    #[tool(
        description = "Update the amount, description (merchant name), category or date of a transaction"
    )]
    async fn update_transaction(
        &self,
        params: Parameters<UpdateTransactionParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(transactions::update_transaction(&self.bridge, params.0).await)
    }

    /// Categorizes a transaction.
    #[tool(description = "Set the category of a transaction, marking it reviewed by default")]
    async fn set_transaction_category(
        &self,
        params: Parameters<SetCategoryParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(transactions::set_transaction_category(&self.bridge, params.0).await)
    }

    /// Replaces transaction notes.
    #[tool(
        description = "Replace the notes of a transaction, optionally prefixed with a receipt URL"
    )]
    async fn update_transaction_notes(
        &self,
        params: Parameters<UpdateNotesParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(transactions::update_transaction_notes(&self.bridge, params.0).await)
    }

    /// Clears the needs-review flag.
    #[tool(description = "Mark a transaction as reviewed")]
    async fn mark_transaction_reviewed(
        &self,
        params: Parameters<TransactionIdParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(transactions::mark_transaction_reviewed(&self.bridge, params.0).await)
    }

    /// Categorizes many transactions.
    #[tool(
        description = "Assign one category to many transactions at once; reports per-transaction failures"
    )]
    async fn bulk_categorize_transactions(
        &self,
        params: Parameters<BulkCategorizeParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(transactions::bulk_categorize_transactions(&self.bridge, params.0).await)
    }

    /// Deletes a transaction.
    #[tool(description = "Delete a transaction")]
    async fn delete_transaction(
        &self,
        params: Parameters<TransactionIdParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(transactions::delete_transaction(&self.bridge, params.0).await)
    }

    /// Lists recurring transactions.
    #[tool(
        description = "List upcoming recurring transactions; defaults to the current month"
    )]
    async fn get_recurring_transactions(
        &self,
        params: Parameters<DateRangeParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(transactions::get_recurring_transactions(&self.bridge, params.0).await)
    }

    /// Lists transactions awaiting review.
    #[tool(
        description = "List transactions needing review, optionally limited to the last N days, uncategorized or note-less transactions, or one account"
    )]
    async fn get_transactions_needing_review(
        &self,
        params: Parameters<NeedingReviewParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(transactions::get_transactions_needing_review(&self.bridge, params.0).await)
    }

    // ── Summaries ───────────────────────────────────────────────────

    /// Returns aggregate transaction statistics.
    #[tool(description = "Get aggregate transaction statistics (counts, sums, averages)")]
    async fn get_transactions_summary(&self) -> Result<CallToolResult, McpError> {
        Ok(summaries::get_transactions_summary(&self.bridge).await)
    }

    /// Summarizes spending per category.
    #[tool(
        description = "Summarize income and expenses per category for a date range, largest first"
    )]
    async fn get_spending_summary(
        &self,
        params: Parameters<SpendingSummaryParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(summaries::get_spending_summary(&self.bridge, params.0).await)
    }

    // ── Splits ──────────────────────────────────────────────────────

    /// Returns the splits of a transaction.
    #[tool(description = "Get the split parts of a transaction")]
    async fn get_transaction_splits(
        &self,
        params: Parameters<TransactionIdParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(splits::get_transaction_splits(&self.bridge, params.0).await)
    }

    /// Splits a transaction.
    #[tool(
        description = "Split a transaction into parts whose amounts sum to the original; an empty list removes existing splits"
    )]
    async fn split_transaction(
        &self,
        params: Parameters<SplitTransactionParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(splits::split_transaction(&self.bridge, params.0).await)
    }

    // ── Tags ────────────────────────────────────────────────────────

    /// Lists tags.
    #[tool(description = "List all transaction tags with colour and usage count")]
    async fn get_tags(&self) -> Result<CallToolResult, McpError> {
        Ok(tags::get_tags(&self.bridge).await)
    }

    /// Replaces the tags of a transaction.
    #[tool(
        description = "Set the complete tag list of a transaction, replacing existing tags; an empty list removes all tags"
    )]
    async fn set_transaction_tags(
        &self,
        params: Parameters<SetTagsParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(tags::set_transaction_tags(&self.bridge, params.0).await)
    }

    /// Creates a tag.
    #[tool(description = "Create a transaction tag with a #RRGGBB colour")]
    async fn create_tag(
        &self,
        params: Parameters<CreateTagParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(tags::create_tag(&self.bridge, params.0).await)
    }

    // ── Rules ───────────────────────────────────────────────────────

    /// Lists rules.
    #[tool(description = "List transaction rules with their criteria and actions")]
    async fn get_transaction_rules(&self) -> Result<CallToolResult, McpError> {
        Ok(rules::get_transaction_rules(&self.bridge).await)
    }

    /// Creates a rule.
    #[tool(
        description = "Create a transaction rule from merchant and amount criteria and category, merchant, tag, hide or review actions"
    )]
    async fn create_transaction_rule(
        &self,
        params: Parameters<RuleParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(rules::create_transaction_rule(&self.bridge, params.0).await)
    }

    /// Updates a rule.
    #[tool(description = "Replace the criteria and actions of an existing transaction rule")]
    async fn update_transaction_rule(
        &self,
        params: Parameters<UpdateRuleParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(rules::update_transaction_rule(&self.bridge, params.0).await)
    }

    /// Deletes a rule.
    #[tool(description = "Delete a transaction rule")]
    async fn delete_transaction_rule(
        &self,
        params: Parameters<RuleIdParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(rules::delete_transaction_rule(&self.bridge, params.0).await)
    }

    // ── Categories ──────────────────────────────────────────────────

    /// Lists categories.
    #[tool(description = "List transaction categories with their group")]
    async fn get_categories(&self) -> Result<CallToolResult, McpError> {
        Ok(categories::get_categories(&self.bridge).await)
    }

    /// Lists category groups.
    #[tool(description = "List category groups with their categories and budgeting settings")]
    async fn get_category_groups(&self) -> Result<CallToolResult, McpError> {
        Ok(categories::get_category_groups(&self.bridge).await)
    }

    // ── Budgets ─────────────────────────────────────────────────────

    /// Returns budgets per month.
    #[tool(
        description = "Get budgets per month with per-category budgeted, spent, remaining and rollover amounts; defaults to last month through next month"
    )]
    async fn get_budgets(
        &self,
        params: Parameters<DateRangeParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(budgets::get_budgets(&self.bridge, params.0).await)
    }

    /// Sets a budget amount.
    #[tool(
        description = "Set the budget of a category or category group (exactly one), optionally for all future months; 0 clears it"
    )]
    async fn set_budget_amount(
        &self,
        params: Parameters<SetBudgetParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(budgets::set_budget_amount(&self.bridge, params.0).await)
    }

    // ── Financial ───────────────────────────────────────────────────

    /// Returns the cashflow breakdown.
    #[tool(description = "Get cashflow by category, category group and merchant for a date range")]
    async fn get_cashflow(
        &self,
        params: Parameters<DateRangeParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(financial::get_cashflow(&self.bridge, params.0).await)
    }

    /// Returns net worth history.
    #[tool(
        description = "Get daily net worth history with current, earliest, change, change percent, highest and lowest values"
    )]
    async fn get_net_worth(
        &self,
        params: Parameters<NetWorthParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(financial::get_net_worth(&self.bridge, params.0).await)
    }

    /// Returns balances per account type.
    #[tool(
        description = "Get monthly or yearly balances grouped by account type with the total net worth"
    )]
    async fn get_net_worth_by_account_type(
        &self,
        params: Parameters<NetWorthByTypeParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(financial::get_net_worth_by_account_type(&self.bridge, params.0).await)
    }
}

#[tool_handler]
impl ServerHandler for MonarchMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Monarch Money personal finance MCP server. \
                 Run check_auth_status first; if no session exists, follow \
                 setup_authentication. Then query accounts, transactions, \
                 budgets, cashflow and net worth, or manage categories, tags, \
                 splits and rules."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
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

    use rmcp::ServerHandler;
    use rmcp::handler::server::wrapper::Parameters;
    use serde::de::DeserializeOwned;
    use serde_json::{Value, json};

    use super::MonarchMcpServer;
    use crate::testing::{MockApi, authed_bridge, is_error, payload, unauthenticated_bridge};

    fn args<T: DeserializeOwned>(value: Value) -> Parameters<T> {
        Parameters(serde_json::from_value(value).expect("valid parameters"))
    }

    #[test]
    fn every_tool_is_registered() {
        let dir = tempfile::tempdir().expect("tempdir");
        let api = Arc::new(MockApi::new());
        let server = MonarchMcpServer::new(authed_bridge(&dir, &api), None);

        let names: Vec<String> = server
            .tool_router
            .list_all()
            .into_iter()
            .map(|tool| tool.name.into_owned())
            .collect();
        assert_eq!(names.len(), 37);
        for expected in [
            "setup_authentication",
            "get_accounts",
            "bulk_categorize_transactions",
            "get_transactions_needing_review",
            "split_transaction",
            "create_transaction_rule",
            "set_budget_amount",
            "get_net_worth_by_account_type",
        ] {
            assert!(names.iter().any(|name| name == expected), "{expected} missing");
        }
    }

    #[test]
    fn info_advertises_tools() {
        let dir = tempfile::tempdir().expect("tempdir");
        let api = Arc::new(MockApi::new());
        let server = MonarchMcpServer::new(authed_bridge(&dir, &api), None);

        let info = server.get_info();
        assert!(info.capabilities.tools.is_some());
        assert!(info.instructions.is_some_and(|text| text.contains("Monarch")));
    }

    #[tokio::test]
    async fn remote_tools_require_a_session() {
        let dir = tempfile::tempdir().expect("tempdir");
        let api = Arc::new(MockApi::new());
        let server = MonarchMcpServer::new(unauthenticated_bridge(&dir, &api), None);
        let tx = || json!({"transaction_id": "t1"});

        let results = vec![
            ("get_accounts", server.get_accounts().await),
            ("refresh_accounts", server.refresh_accounts().await),
            (
                "get_account_holdings",
                server.get_account_holdings(args(json!({"account_id": "123"}))).await,
            ),
            (
                "get_account_balance_history",
                server
                    .get_account_balance_history(args(json!({"account_id": "123"})))
                    .await,
            ),
            ("get_transactions", server.get_transactions(args(json!({}))).await),
            ("search_transactions", server.search_transactions(args(json!({}))).await),
            ("get_transaction_details", server.get_transaction_details(args(tx())).await),
            (
                "create_transaction",
                server
                    .create_transaction(args(json!({
                        "account_id": "a1",
                        "amount": -12.5,
                        "description": "Lunch",
                        "date": "2024-03-01"
                    })))
                    .await,
            ),
            (
                "update_transaction",
                server
                    .update_transaction(args(json!({"transaction_id": "t1", "amount": 3.0})))
                    .await,
            ),
            (
                "set_transaction_category",
                server
                    .set_transaction_category(args(
                        json!({"transaction_id": "t1", "category_id": "c1"}),
                    ))
                    .await,
            ),
            (
                "update_transaction_notes",
                server
                    .update_transaction_notes(args(json!({"transaction_id": "t1", "notes": "x"})))
                    .await,
            ),
            ("mark_transaction_reviewed", server.mark_transaction_reviewed(args(tx())).await),
            (
                "bulk_categorize_transactions",
                server
                    .bulk_categorize_transactions(args(
                        json!({"transaction_ids": ["t1", "t2"], "category_id": "c1"}),
                    ))
                    .await,
            ),
            ("delete_transaction", server.delete_transaction(args(tx())).await),
            (
                "get_recurring_transactions",
                server.get_recurring_transactions(args(json!({}))).await,
            ),
            (
                "get_transactions_needing_review",
                server.get_transactions_needing_review(args(json!({}))).await,
            ),
            ("get_transactions_summary", server.get_transactions_summary().await),
            ("get_spending_summary", server.get_spending_summary(args(json!({}))).await),
            ("get_transaction_splits", server.get_transaction_splits(args(tx())).await),
            (
                "split_transaction",
                server
                    .split_transaction(args(json!({"transaction_id": "t1", "splits": []})))
                    .await,
            ),
            ("get_tags", server.get_tags().await),
            (
                "set_transaction_tags",
                server
                    .set_transaction_tags(args(json!({"transaction_id": "t1", "tag_ids": []})))
                    .await,
            ),
            ("create_tag", server.create_tag(args(json!({"name": "Gifts"}))).await),
            ("get_transaction_rules", server.get_transaction_rules().await),
            (
                "create_transaction_rule",
                server
                    .create_transaction_rule(args(json!({"set_category_id": "c1"})))
                    .await,
            ),
            (
                "update_transaction_rule",
                server
                    .update_transaction_rule(args(
                        json!({"rule_id": "r1", "set_category_id": "c1"}),
                    ))
                    .await,
            ),
            (
                "delete_transaction_rule",
                server.delete_transaction_rule(args(json!({"rule_id": "r1"}))).await,
            ),
            ("get_categories", server.get_categories().await),
            ("get_category_groups", server.get_category_groups().await),
            ("get_budgets", server.get_budgets(args(json!({}))).await),
            (
                "set_budget_amount",
                server
                    .set_budget_amount(args(json!({"amount": 100.0, "category_id": "c1"})))
                    .await,
            ),
            ("get_cashflow", server.get_cashflow(args(json!({}))).await),
            ("get_net_worth", server.get_net_worth(args(json!({}))).await),
            (
                "get_net_worth_by_account_type",
                server
                    .get_net_worth_by_account_type(args(json!({"start_date": "2024-01-01"})))
                    .await,
            ),
        ];

        assert_eq!(results.len(), 34);
        for (tool, outcome) in results {
            let result = outcome.expect("tool errors are rendered, not raised");
            assert!(is_error(&result), "{tool} should fail");
            let body = payload(&result);
            assert_eq!(body["kind"], "authentication_required", "{tool}");
            assert_eq!(body["tool"], tool);
        }
        assert!(api.calls().is_empty());
    }

    #[test]
    fn auth_tools_work_without_a_session() {
        let dir = tempfile::tempdir().expect("tempdir");
        let api = Arc::new(MockApi::new());
        let server = MonarchMcpServer::new(
            unauthenticated_bridge(&dir, &api),
            Some("me@example.com".to_owned()),
        );

        for outcome in [
            server.setup_authentication(),
            server.check_auth_status(),
            server.debug_session_loading(),
        ] {
            let result = outcome.expect("tool errors are rendered, not raised");
            assert!(!is_error(&result));
        }
        let status = payload(&server.check_auth_status().expect("status"));
        assert_eq!(status["authenticated"], false);
        assert_eq!(status["email"], "me@example.com");
        assert!(api.calls().is_empty());
    }
}
