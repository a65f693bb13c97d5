//! Cashflow and net worth tools.

use rmcp::model::CallToolResult;

use super::decode;
use crate::adapter;
use crate::bridge::AuthBridge;
use crate::error::ToolError;
use crate::models::{AggregateSnapshots, SnapshotsByType};
use crate::params::{DateRangeParams, NetWorthByTypeParams, NetWorthParams};
use crate::response::{NetWorthByTypeResponse, NetWorthResponse};

/// Returns the remote cashflow breakdown unchanged.
pub(crate) async fn get_cashflow(bridge: &AuthBridge, params: DateRangeParams) -> CallToolResult {
    adapter::invoke(
        bridge,
        "get_cashflow",
        params.range(),
        |api, range| async move { api.get_cashflow(&range).await.map_err(ToolError::from) },
    )
    .await
}

/// Returns daily net worth with summary statistics.
pub(crate) async fn get_net_worth(bridge: &AuthBridge, params: NetWorthParams) -> CallToolResult {
    adapter::invoke(
        bridge,
        "get_net_worth",
        params.query(),
        |api, query| async move {
            let page: AggregateSnapshots = decode(api.get_aggregate_snapshots(&query).await?)?;
            Ok::<_, ToolError>(NetWorthResponse::from_snapshots(&page.aggregate_snapshots))
        },
    )
    .await
}

/// Returns balances per account type, monthly or yearly.
pub(crate) async fn get_net_worth_by_account_type(
    bridge: &AuthBridge,
    params: NetWorthByTypeParams,
) -> CallToolResult {
    let request = params.start().map(|start| (start, params));
    adapter::invoke(
        bridge,
        "get_net_worth_by_account_type",
        request,
        |api, (start, requested): (_, NetWorthByTypeParams)| async move {
            let timeframe = requested.timeframe;
            let page: SnapshotsByType =
                decode(api.get_account_snapshots_by_type(start, timeframe).await?)?;
            Ok::<_, ToolError>(NetWorthByTypeResponse::from_snapshots(
                timeframe.as_str(),
                requested.start_date,
                &page.snapshots_by_account_type,
            ))
        },
    )
    .await
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

    use super::{get_cashflow, get_net_worth, get_net_worth_by_account_type};
    use crate::params::{DateRangeParams, NetWorthByTypeParams, NetWorthParams};
    use crate::testing::{MockApi, authed_bridge, payload};

    #[tokio::test]
    async fn cashflow_passes_through() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cashflow = json!({"summary": [{"summary": {"sumIncome": 5000.0}}]});
        let api = Arc::new(MockApi::new().with_response("get_cashflow", cashflow.clone()));
        let bridge = authed_bridge(&dir, &api);

        let body = payload(&get_cashflow(&bridge, DateRangeParams::default()).await);
        assert_eq!(body, cashflow);
        assert_eq!(api.calls_to("get_cashflow"), vec![json!({})]);
    }

    #[tokio::test]
    async fn net_worth_summarizes_snapshots() {
        let dir = tempfile::tempdir().expect("tempdir");
        let api = Arc::new(MockApi::new().with_response(
            "get_aggregate_snapshots",
            json!({"aggregateSnapshots": [
                {"date": "2024-01-01", "balance": 10000.0},
                {"date": "2024-01-02", "balance": 9000.0},
                {"date": "2024-01-03", "balance": 12000.0}
            ]}),
        ));
        let bridge = authed_bridge(&dir, &api);

        let params: NetWorthParams = serde_json::from_value(json!({
            "start_date": "2024-01-01",
            "account_type": "brokerage"
        }))
        .expect("should deserialize");
        let body = payload(&get_net_worth(&bridge, params).await);
        assert_eq!(body["snapshot_count"], 3);
        assert_eq!(body["current_net_worth"], 12000.0);
        assert_eq!(body["change"], 2000.0);
        assert_eq!(body["change_percent"], 20.0);
        assert_eq!(body["lowest"], 9000.0);
        assert_eq!(
            api.calls_to("get_aggregate_snapshots"),
            vec![json!({"startDate": "2024-01-01", "accountType": "brokerage"})]
        );
    }

    #[tokio::test]
    async fn net_worth_by_type_groups_snapshots() {
        let dir = tempfile::tempdir().expect("tempdir");
        let api = Arc::new(MockApi::new().with_response(
            "get_account_snapshots_by_type",
            json!({"snapshotsByAccountType": [
                {"accountType": "depository", "month": "2024-01-01", "balance": 1000.0},
                {"accountType": "credit", "month": "2024-01-01", "balance": -300.0},
                {"accountType": "depository", "month": "2024-02-01", "balance": 1500.0}
            ]}),
        ));
        let bridge = authed_bridge(&dir, &api);

        let params: NetWorthByTypeParams =
            serde_json::from_value(json!({"start_date": "2024-01-01"}))
                .expect("should deserialize");
        let body = payload(&get_net_worth_by_account_type(&bridge, params).await);
        assert_eq!(body["timeframe"], "month");
        assert_eq!(body["start_date"], "2024-01-01");
        assert_eq!(body["account_types"][0]["type"], "depository");
        assert_eq!(body["account_types"][0]["current_balance"], 1500.0);
        assert_eq!(body["total_net_worth"], 1200.0);
        assert_eq!(
            api.calls_to("get_account_snapshots_by_type"),
            vec![json!({"startDate": "2024-01-01", "timeframe": "month"})]
        );
    }

    #[tokio::test]
    async fn malformed_start_date_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let api = Arc::new(MockApi::new());
        let bridge = authed_bridge(&dir, &api);

        let params: NetWorthByTypeParams =
            serde_json::from_value(json!({"start_date": "01/02/2024", "timeframe": "year"}))
                .expect("should deserialize");
        let body = payload(&get_net_worth_by_account_type(&bridge, params).await);
        assert_eq!(body["kind"], "validation_error");
        assert!(api.calls().is_empty());
    }
}
