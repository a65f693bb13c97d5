//! Account tools.

use std::sync::Arc;

use rmcp::model::CallToolResult;

use super::decode;
use crate::adapter;
use crate::api::MonarchApi;
use crate::bridge::AuthBridge;
use crate::error::ToolError;
use crate::models::{AccountHistory, AccountsPage};
use crate::params::AccountIdParams;
use crate::response::{AccountResponse, BalanceHistoryResponse};

/// Lists accounts with balances.
pub(crate) async fn get_accounts(bridge: &AuthBridge) -> CallToolResult {
    adapter::invoke(bridge, "get_accounts", Ok(()), list_accounts).await
}

/// Fetches and shapes the account list.
async fn list_accounts(
    api: Arc<dyn MonarchApi>,
    (): (),
) -> Result<Vec<AccountResponse>, ToolError> {
    let page: AccountsPage = decode(api.get_accounts().await?)?;
    Ok(page.accounts.iter().map(AccountResponse::from_account).collect())
}

/// Requests a refresh of every account from its institution.
pub(crate) async fn refresh_accounts(bridge: &AuthBridge) -> CallToolResult {
    adapter::invoke(bridge, "refresh_accounts", Ok(()), |api, ()| async move {
        api.request_accounts_refresh().await.map_err(ToolError::from)
    })
    .await
}

/// Returns the investment holdings of one account.
pub(crate) async fn get_account_holdings(
    bridge: &AuthBridge,
    params: AccountIdParams,
) -> CallToolResult {
    adapter::invoke(
        bridge,
        "get_account_holdings",
        Ok(params.account_id),
        |api, account_id: String| async move {
            api.get_account_holdings(&account_id)
                .await
                .map_err(ToolError::from)
        },
    )
    .await
}

/// Returns the balance history of one account with summary statistics.
pub(crate) async fn get_account_balance_history(
    bridge: &AuthBridge,
    params: AccountIdParams,
) -> CallToolResult {
    adapter::invoke(
        bridge,
        "get_account_balance_history",
        params.numeric_id(),
        balance_history,
    )
    .await
}

/// Fetches and summarizes balance snapshots.
async fn balance_history(
    api: Arc<dyn MonarchApi>,
    account_id: String,
) -> Result<BalanceHistoryResponse, ToolError> {
    let history: AccountHistory = decode(api.get_account_history(&account_id).await?)?;
    Ok(BalanceHistoryResponse::from_snapshots(
        account_id,
        &history.snapshots,
    ))
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

    use super::{get_account_balance_history, get_account_holdings, get_accounts};
    use crate::params::AccountIdParams;
    use crate::testing::{MockApi, authed_bridge, is_error, payload, unauthenticated_bridge};

    #[tokio::test]
    async fn accounts_are_shaped() {
        let dir = tempfile::tempdir().expect("tempdir");
        let api = Arc::new(MockApi::new().with_response(
            "get_accounts",
            json!({"accounts": [{
                "id": "acc_1",
                "displayName": "Checking",
                "isActive": true,
                "currentBalance": 1520.5,
                "type": {"name": "depository"},
                "institution": {"name": "Chase"}
            }]}),
        ));
        let bridge = authed_bridge(&dir, &api);

        let result = get_accounts(&bridge).await;
        assert!(!is_error(&result));
        assert_eq!(
            payload(&result),
            json!([{
                "id": "acc_1",
                "name": "Checking",
                "type": "depository",
                "balance": 1520.5,
                "institution": "Chase",
                "is_active": true
            }])
        );
    }

    #[tokio::test]
    async fn no_session_means_no_remote_call() {
        let dir = tempfile::tempdir().expect("tempdir");
        let api = Arc::new(MockApi::new());
        let bridge = unauthenticated_bridge(&dir, &api);

        let result = get_accounts(&bridge).await;
        assert!(is_error(&result));
        assert_eq!(payload(&result)["kind"], "authentication_required");
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn rejected_token_reports_session_expired() {
        let dir = tempfile::tempdir().expect("tempdir");
        let api = Arc::new(MockApi::new().with_unauthorized("get_accounts"));
        let bridge = authed_bridge(&dir, &api);

        let result = get_accounts(&bridge).await;
        assert!(is_error(&result));
        let body = payload(&result);
        assert_eq!(body["kind"], "session_expired");
        assert_eq!(body["tool"], "get_accounts");
        assert_eq!(api.calls_to("get_accounts").len(), 1);
    }

    #[tokio::test]
    async fn holdings_pass_through() {
        let dir = tempfile::tempdir().expect("tempdir");
        let holdings = json!({"portfolio": {"aggregateHoldings": {"edges": []}}});
        let api = Arc::new(MockApi::new().with_response("get_account_holdings", holdings.clone()));
        let bridge = authed_bridge(&dir, &api);

        let params = AccountIdParams {
            account_id: "123".to_owned(),
        };
        let result = get_account_holdings(&bridge, params).await;
        assert_eq!(payload(&result), holdings);
        assert_eq!(
            api.calls_to("get_account_holdings"),
            vec![json!({"accountId": "123"})]
        );
    }

    #[tokio::test]
    async fn balance_history_rejects_non_numeric_id() {
        let dir = tempfile::tempdir().expect("tempdir");
        let api = Arc::new(MockApi::new());
        let bridge = authed_bridge(&dir, &api);

        let params = AccountIdParams {
            account_id: "acc_1".to_owned(),
        };
        let result = get_account_balance_history(&bridge, params).await;
        assert_eq!(payload(&result)["kind"], "validation_error");
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn balance_history_summarizes_snapshots() {
        let dir = tempfile::tempdir().expect("tempdir");
        let api = Arc::new(MockApi::new().with_response(
            "get_account_history",
            json!({"snapshots": [
                {"date": "2024-01-01", "signedBalance": 100.0},
                {"date": "2024-01-02", "signedBalance": 250.0},
                {"date": "2024-01-03", "signedBalance": 175.0}
            ]}),
        ));
        let bridge = authed_bridge(&dir, &api);

        let params = AccountIdParams {
            account_id: "42".to_owned(),
        };
        let body = payload(&get_account_balance_history(&bridge, params).await);
        assert_eq!(body["account_id"], "42");
        assert_eq!(body["snapshot_count"], 3);
        assert_eq!(body["current_balance"], 175.0);
        assert_eq!(body["earliest_balance"], 100.0);
        assert_eq!(body["change"], 75.0);
        assert_eq!(body["highest"], 250.0);
        assert_eq!(body["lowest"], 100.0);
        assert_eq!(body["snapshots"][1], json!({"date": "2024-01-02", "balance": 250.0}));
    }
}
