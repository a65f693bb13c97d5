//! Transaction split tools.

use rmcp::model::CallToolResult;

use crate::adapter;
use crate::bridge::AuthBridge;
use crate::error::ToolError;
use crate::params::{SplitTransactionParams, TransactionIdParams};
use crate::response::SplitResponse;

/// Returns the splits of a transaction.
pub(crate) async fn get_transaction_splits(
    bridge: &AuthBridge,
    params: TransactionIdParams,
) -> CallToolResult {
    adapter::invoke(
        bridge,
        "get_transaction_splits",
        Ok(params.transaction_id),
        |api, id: String| async move {
            api.get_transaction_splits(&id)
                .await
                .map_err(ToolError::from)
        },
    )
    .await
}

/// Replaces the splits of a transaction; an empty list removes them.
pub(crate) async fn split_transaction(
    bridge: &AuthBridge,
    params: SplitTransactionParams,
) -> CallToolResult {
    let parts = params.parts();
    adapter::invoke(
        bridge,
        "split_transaction",
        Ok((params.transaction_id, parts)),
        |api, (id, requested): (String, Vec<_>)| async move {
            let splits = api.update_transaction_splits(&id, &requested).await?;
            Ok::<_, ToolError>(SplitResponse::new(requested.len(), splits))
        },
    )
    .await
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::missing_docs_in_private_items,
    reason = "test code uses expect for readability"
)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::{get_transaction_splits, split_transaction};
    use crate::params::{SplitTransactionParams, TransactionIdParams};
    use crate::testing::{MockApi, authed_bridge, payload};

    #[tokio::test]
    async fn splits_pass_through() {
        let dir = tempfile::tempdir().expect("tempdir");
        let splits = json!({"getTransaction": {"id": "t1", "splitTransactions": []}});
        let api = Arc::new(MockApi::new().with_response("get_transaction_splits", splits.clone()));
        let bridge = authed_bridge(&dir, &api);

        let params = TransactionIdParams {
            transaction_id: "t1".to_owned(),
        };
        assert_eq!(payload(&get_transaction_splits(&bridge, params).await), splits);
    }

    #[tokio::test]
    async fn split_reports_part_count() {
        let dir = tempfile::tempdir().expect("tempdir");
        let api = Arc::new(MockApi::new().with_response(
            "update_transaction_splits",
            json!({"updateTransactionSplit": {"errors": null}}),
        ));
        let bridge = authed_bridge(&dir, &api);

        let params: SplitTransactionParams = serde_json::from_value(json!({
            "transaction_id": "t1",
            "splits": [
                {"amount": -60.0, "category_id": "c_food"},
                {"amount": -40.0, "category_id": "c_home", "merchant_name": "Hardware"}
            ]
        }))
        .expect("should deserialize");
        let body = payload(&split_transaction(&bridge, params).await);
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "Transaction split into 2 parts");
        assert_eq!(
            api.calls_to("update_transaction_splits"),
            vec![json!({
                "transactionId": "t1",
                "splits": [
                    {"amount": -60.0, "categoryId": "c_food"},
                    {"amount": -40.0, "categoryId": "c_home", "merchantName": "Hardware"}
                ]
            })]
        );
    }

    #[tokio::test]
    async fn empty_split_list_removes_splits() {
        let dir = tempfile::tempdir().expect("tempdir");
        let api = Arc::new(MockApi::new());
        let bridge = authed_bridge(&dir, &api);

        let params = SplitTransactionParams {
            transaction_id: "t1".to_owned(),
            splits: Vec::new(),
        };
        let body = payload(&split_transaction(&bridge, params).await);
        assert_eq!(body["message"], "Splits removed from transaction");
    }
}
