//! Transaction tools: listing, search, edits, review workflow.

use std::sync::Arc;

use chrono::Local;
use futures::future::join_all;
use rmcp::model::CallToolResult;

use super::decode;
use crate::adapter;
use crate::api::{MonarchApi, TransactionQuery, TransactionUpdate};
use crate::bridge::AuthBridge;
use crate::error::ToolError;
use crate::models::{RecurringPage, TransactionsPage};
use crate::params::{
    BulkCategorizeParams, CreateTransactionParams, DateRangeParams, GetTransactionsParams,
    NeedingReviewParams, SearchTransactionsParams, SetCategoryParams, TransactionIdParams,
    UpdateNotesParams, UpdateTransactionParams,
};
use crate::response::{
    BulkCategorizeResponse, RecurringResponse, TransactionResponse, TransactionSummary,
};

/// Fetches one page of transactions.
async fn fetch(
    api: &dyn MonarchApi,
    query: &TransactionQuery,
) -> Result<TransactionsPage, ToolError> {
    decode(api.get_transactions(query).await?)
}

/// Lists transactions in compact form.
pub(crate) async fn get_transactions(
    bridge: &AuthBridge,
    params: GetTransactionsParams,
) -> CallToolResult {
    adapter::invoke(
        bridge,
        "get_transactions",
        params.query(),
        |api, query| async move {
            let page = fetch(api.as_ref(), &query).await?;
            let rows: Vec<_> = page
                .into_results()
                .iter()
                .map(TransactionSummary::from_transaction)
                .collect();
            Ok::<_, ToolError>(rows)
        },
    )
    .await
}

/// Searches transactions with server-side filters.
pub(crate) async fn search_transactions(
    bridge: &AuthBridge,
    params: SearchTransactionsParams,
) -> CallToolResult {
    adapter::invoke(
        bridge,
        "search_transactions",
        params.query(),
        |api, query| async move {
            let page = fetch(api.as_ref(), &query).await?;
            let rows: Vec<_> = page
                .into_results()
                .iter()
                .map(TransactionResponse::extended)
                .collect();
            Ok::<_, ToolError>(rows)
        },
    )
    .await
}

/// Returns one transaction with attachments and splits.
pub(crate) async fn get_transaction_details(
    bridge: &AuthBridge,
    params: TransactionIdParams,
) -> CallToolResult {
    adapter::invoke(
        bridge,
        "get_transaction_details",
        Ok(params.transaction_id),
        |api, id: String| async move {
            api.get_transaction_details(&id)
                .await
                .map_err(ToolError::from)
        },
    )
    .await
}

/// Creates a manual transaction.
pub(crate) async fn create_transaction(
    bridge: &AuthBridge,
    params: CreateTransactionParams,
) -> CallToolResult {
    adapter::invoke(
        bridge,
        "create_transaction",
        params.new_transaction(),
        |api, transaction| async move {
            api.create_transaction(&transaction)
                .await
                .map_err(ToolError::from)
        },
    )
    .await
}

/// Sends one transaction update and returns the remote response.
async fn send_update(
    api: Arc<dyn MonarchApi>,
    update: TransactionUpdate,
) -> Result<serde_json::Value, ToolError> {
    Ok(api.update_transaction(&update).await?)
}

/// Updates amount, description, category or date of a transaction.
pub(crate) async fn update_transaction(
    bridge: &AuthBridge,
    params: UpdateTransactionParams,
) -> CallToolResult {
    adapter::invoke(bridge, "update_transaction", params.update(), send_update).await
}

/// Assigns a category, by default also marking the transaction reviewed.
pub(crate) async fn set_transaction_category(
    bridge: &AuthBridge,
    params: SetCategoryParams,
) -> CallToolResult {
    adapter::invoke(
        bridge,
        "set_transaction_category",
        Ok(params.update()),
        send_update,
    )
    .await
}

/// Replaces the notes of a transaction.
pub(crate) async fn update_transaction_notes(
    bridge: &AuthBridge,
    params: UpdateNotesParams,
) -> CallToolResult {
    adapter::invoke(
        bridge,
        "update_transaction_notes",
        Ok(params.update()),
        send_update,
    )
    .await
}

/// Clears the needs-review flag.
pub(crate) async fn mark_transaction_reviewed(
    bridge: &AuthBridge,
    params: TransactionIdParams,
) -> CallToolResult {
    let update = TransactionUpdate {
        needs_review: Some(false),
        ..TransactionUpdate::new(params.transaction_id)
    };
    adapter::invoke(bridge, "mark_transaction_reviewed", Ok(update), send_update).await
}

/// Categorizes several transactions concurrently.
pub(crate) async fn bulk_categorize_transactions(
    bridge: &AuthBridge,
    params: BulkCategorizeParams,
) -> CallToolResult {
    adapter::invoke(
        bridge,
        "bulk_categorize_transactions",
        Ok(params.updates()),
        categorize_all,
    )
    .await
}

/// Runs every update and tallies the outcomes in input order.
async fn categorize_all(
    api: Arc<dyn MonarchApi>,
    updates: Vec<TransactionUpdate>,
) -> Result<BulkCategorizeResponse, ToolError> {
    let outcomes = join_all(updates.iter().map(|update| api.update_transaction(update))).await;
    Ok(BulkCategorizeResponse::from_outcomes(
        updates
            .into_iter()
            .zip(outcomes)
            .map(|(update, outcome)| (update.transaction_id, outcome.map(|_data| ()))),
    ))
}

/// Deletes a transaction.
pub(crate) async fn delete_transaction(
    bridge: &AuthBridge,
    params: TransactionIdParams,
) -> CallToolResult {
    adapter::invoke(
        bridge,
        "delete_transaction",
        Ok(params.transaction_id),
        |api, id: String| async move { api.delete_transaction(&id).await.map_err(ToolError::from) },
    )
    .await
}

/// Lists upcoming recurring transactions; defaults to the current month.
pub(crate) async fn get_recurring_transactions(
    bridge: &AuthBridge,
    params: DateRangeParams,
) -> CallToolResult {
    adapter::invoke(
        bridge,
        "get_recurring_transactions",
        params.range(),
        |api, range| async move {
            let page: RecurringPage = decode(api.get_recurring_transactions(&range).await?)?;
            let rows: Vec<_> = page
                .recurring_transaction_items
                .iter()
                .map(RecurringResponse::from_item)
                .collect();
            Ok::<_, ToolError>(rows)
        },
    )
    .await
}

/// Lists transactions awaiting review.
///
/// Date, account and notes filters run server-side; the review and
/// category filters run over the fetched page.
pub(crate) async fn get_transactions_needing_review(
    bridge: &AuthBridge,
    params: NeedingReviewParams,
) -> CallToolResult {
    let args = params
        .query(Local::now().date_naive())
        .map(|query| (query, params));
    adapter::invoke(
        bridge,
        "get_transactions_needing_review",
        args,
        |api, (query, filter)| async move {
            let page = fetch(api.as_ref(), &query).await?;
            let rows: Vec<_> = page
                .into_results()
                .iter()
                .filter(|tx| filter.keeps(tx))
                .map(TransactionResponse::from_transaction)
                .collect();
            Ok::<_, ToolError>(rows)
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

    use serde_json::{Value, json};

    use super::{
        bulk_categorize_transactions, create_transaction, get_recurring_transactions,
        get_transactions, get_transactions_needing_review, mark_transaction_reviewed,
        search_transactions, set_transaction_category, update_transaction,
        update_transaction_notes,
    };
    use crate::params::{
        BulkCategorizeParams, CreateTransactionParams, DateRangeParams, GetTransactionsParams,
        NeedingReviewParams, SearchTransactionsParams, SetCategoryParams, TransactionIdParams,
        UpdateNotesParams, UpdateTransactionParams,
    };
    use crate::testing::{MockApi, authed_bridge, is_error, payload, unauthenticated_bridge};

    fn transactions_page() -> Value {
        json!({"allTransactions": {"results": [
            {
                "id": "t1",
                "date": "2024-03-01",
                "amount": -42.5,
                "plaidName": "AMZN MKTP US",
                "pending": true,
                "needsReview": true,
                "category": null,
                "merchant": {"id": "m1", "name": "Amazon"},
                "account": {"id": "a1", "displayName": "Checking"},
                "isRecurring": true,
                "attachments": []
            },
            {
                "id": "t2",
                "date": "2024-03-02",
                "amount": 2000.0,
                "originalName": "PAYROLL",
                "needsReview": false,
                "category": {"id": "c_pay", "name": "Paycheck"},
                "account": {"id": "a1", "displayName": "Checking"},
                "notes": "March"
            }
        ]}})
    }

    fn from_json<T: serde::de::DeserializeOwned>(value: Value) -> T {
        serde_json::from_value(value).expect("params should deserialize")
    }

    #[tokio::test]
    async fn get_transactions_returns_compact_rows() {
        let dir = tempfile::tempdir().expect("tempdir");
        let api =
            Arc::new(MockApi::new().with_response("get_transactions", transactions_page()));
        let bridge = authed_bridge(&dir, &api);

        let params: GetTransactionsParams =
            from_json(json!({"limit": 2, "account_id": "a1", "start_date": "2024-03-01"}));
        let body = payload(&get_transactions(&bridge, params).await);
        assert_eq!(
            body[0],
            json!({
                "id": "t1",
                "date": "2024-03-01",
                "amount": -42.5,
                "description": "AMZN MKTP US",
                "category": null,
                "account": "Checking",
                "merchant": "Amazon",
                "is_pending": true
            })
        );
        assert_eq!(body[1]["description"], "PAYROLL");
        assert_eq!(
            api.calls_to("get_transactions"),
            vec![json!({
                "limit": 2,
                "offset": 0,
                "filters": {"startDate": "2024-03-01", "accounts": ["a1"]}
            })]
        );
    }

    #[tokio::test]
    async fn invalid_date_makes_no_calls() {
        let dir = tempfile::tempdir().expect("tempdir");
        let api = Arc::new(MockApi::new());
        let bridge = authed_bridge(&dir, &api);

        let params: GetTransactionsParams = from_json(json!({"start_date": "03/01/2024"}));
        let result = get_transactions(&bridge, params).await;
        assert!(is_error(&result));
        let body = payload(&result);
        assert_eq!(body["kind"], "validation_error");
        assert_eq!(
            body["message"],
            "invalid date '03/01/2024' for start_date, use YYYY-MM-DD"
        );
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn search_adds_extended_flags() {
        let dir = tempfile::tempdir().expect("tempdir");
        let api =
            Arc::new(MockApi::new().with_response("get_transactions", transactions_page()));
        let bridge = authed_bridge(&dir, &api);

        let params: SearchTransactionsParams =
            from_json(json!({"search": "amazon", "is_recurring": true}));
        let body = payload(&search_transactions(&bridge, params).await);
        assert_eq!(body[0]["is_recurring"], true);
        assert_eq!(body[0]["has_attachments"], false);
        assert_eq!(body[0]["merchant"], "Amazon");
        assert_eq!(body[1]["category_id"], "c_pay");
        assert_eq!(
            api.calls_to("get_transactions")[0]["filters"],
            json!({"search": "amazon", "isRecurring": true})
        );
    }

    #[tokio::test]
    async fn create_forwards_description_as_notes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let created = json!({"createTransaction": {"transaction": {"id": "t9"}}});
        let api = Arc::new(MockApi::new().with_response("create_transaction", created.clone()));
        let bridge = authed_bridge(&dir, &api);

        let params: CreateTransactionParams = from_json(json!({
            "account_id": "a1",
            "amount": -9.99,
            "description": "Streaming",
            "date": "2024-04-01",
            "category_id": "c_ent"
        }));
        let result = create_transaction(&bridge, params).await;
        assert_eq!(payload(&result), created);
        assert_eq!(
            api.calls_to("create_transaction"),
            vec![json!({
                "accountId": "a1",
                "amount": -9.99,
                "date": "2024-04-01",
                "merchantName": "Streaming",
                "categoryId": "c_ent",
                "notes": "Streaming"
            })]
        );
    }

    #[tokio::test]
    async fn update_sends_only_given_fields() {
        let dir = tempfile::tempdir().expect("tempdir");
        let api = Arc::new(MockApi::new());
        let bridge = authed_bridge(&dir, &api);

        let params: UpdateTransactionParams =
            from_json(json!({"transaction_id": "t1", "description": "Amazon Prime"}));
        let result = update_transaction(&bridge, params).await;
        assert!(!is_error(&result));
        assert_eq!(
            api.calls_to("update_transaction"),
            vec![json!({"transactionId": "t1", "merchantName": "Amazon Prime"})]
        );
    }

    #[tokio::test]
    async fn set_category_marks_reviewed() {
        let dir = tempfile::tempdir().expect("tempdir");
        let api = Arc::new(MockApi::new());
        let bridge = authed_bridge(&dir, &api);

        let params: SetCategoryParams =
            from_json(json!({"transaction_id": "t1", "category_id": "c_shop"}));
        let _result = set_transaction_category(&bridge, params).await;
        assert_eq!(
            api.calls_to("update_transaction"),
            vec![json!({"transactionId": "t1", "categoryId": "c_shop", "needsReview": false})]
        );
    }

    #[tokio::test]
    async fn notes_and_review_updates() {
        let dir = tempfile::tempdir().expect("tempdir");
        let api = Arc::new(MockApi::new());
        let bridge = authed_bridge(&dir, &api);

        let notes: UpdateNotesParams = from_json(json!({
            "transaction_id": "t1",
            "notes": "Dinner",
            "receipt_url": "https://r.example/7"
        }));
        let _notes = update_transaction_notes(&bridge, notes).await;
        let reviewed: TransactionIdParams = from_json(json!({"transaction_id": "t2"}));
        let _reviewed = mark_transaction_reviewed(&bridge, reviewed).await;

        assert_eq!(
            api.calls_to("update_transaction"),
            vec![
                json!({"transactionId": "t1", "notes": "[Receipt: https://r.example/7] Dinner"}),
                json!({"transactionId": "t2", "needsReview": false}),
            ]
        );
    }

    #[tokio::test]
    async fn bulk_categorize_counts_outcomes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let api = Arc::new(MockApi::new());
        let bridge = authed_bridge(&dir, &api);

        let params: BulkCategorizeParams = from_json(json!({
            "transaction_ids": ["t1", "t2", "t3"],
            "category_id": "c_groceries"
        }));
        let body = payload(&bulk_categorize_transactions(&bridge, params).await);
        assert_eq!(
            body,
            json!({"total": 3, "successful": 3, "failed": 0, "errors": []})
        );
        assert_eq!(api.calls_to("update_transaction").len(), 3);
    }

    #[tokio::test]
    async fn bulk_categorize_reports_failures_in_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        let api = Arc::new(MockApi::new().with_failure_for("update_transaction", "t2"));
        let bridge = authed_bridge(&dir, &api);

        let params: BulkCategorizeParams = from_json(json!({
            "transaction_ids": ["t1", "t2", "t3"],
            "category_id": "c_groceries",
            "mark_reviewed": false
        }));
        let result = bulk_categorize_transactions(&bridge, params).await;
        assert!(!is_error(&result));
        assert_eq!(
            payload(&result),
            json!({
                "total": 3,
                "successful": 2,
                "failed": 1,
                "errors": [{"transaction_id": "t2", "error": "GraphQL error: update_transaction failed"}]
            })
        );
        assert!(
            api.calls_to("update_transaction")
                .iter()
                .all(|args| args.get("needsReview").is_none())
        );
    }

    #[tokio::test]
    async fn remote_failure_is_reported_as_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let api = Arc::new(MockApi::new().with_failure("get_recurring_transactions"));
        let bridge = authed_bridge(&dir, &api);

        let result = get_recurring_transactions(&bridge, DateRangeParams::default()).await;
        assert!(is_error(&result));
        let body = payload(&result);
        assert_eq!(body["tool"], "get_recurring_transactions");
        assert_eq!(body["kind"], "remote_error");
        assert!(
            body["message"]
                .as_str()
                .expect("message")
                .contains("get_recurring_transactions failed")
        );
    }

    #[tokio::test]
    async fn recurring_items_are_shaped() {
        let dir = tempfile::tempdir().expect("tempdir");
        let api = Arc::new(MockApi::new().with_response(
            "get_recurring_transactions",
            json!({"recurringTransactionItems": [{
                "date": "2024-03-15",
                "amount": -15.99,
                "isPast": false,
                "transactionId": null,
                "stream": {"id": "s1", "frequency": "monthly", "amount": -15.99,
                           "isApproximate": false, "merchant": {"name": "Netflix"}},
                "category": {"name": "Entertainment"},
                "account": {"displayName": "Credit Card"}
            }]}),
        ));
        let bridge = authed_bridge(&dir, &api);

        let params: DateRangeParams =
            from_json(json!({"start_date": "2024-03-01", "end_date": "2024-03-31"}));
        let body = payload(&get_recurring_transactions(&bridge, params).await);
        assert_eq!(body[0]["stream"]["merchant"], "Netflix");
        assert_eq!(body[0]["category"], "Entertainment");
        assert_eq!(body[0]["account"], "Credit Card");
        assert_eq!(
            api.calls_to("get_recurring_transactions"),
            vec![json!({"startDate": "2024-03-01", "endDate": "2024-03-31"})]
        );
    }

    #[tokio::test]
    async fn needing_review_filters_locally() {
        let dir = tempfile::tempdir().expect("tempdir");
        let api =
            Arc::new(MockApi::new().with_response("get_transactions", transactions_page()));
        let bridge = authed_bridge(&dir, &api);

        let params: NeedingReviewParams = from_json(json!({"account_id": "a1"}));
        let body = payload(&get_transactions_needing_review(&bridge, params).await);
        let rows = body.as_array().expect("array");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["id"], "t1");
        assert_eq!(rows[0]["needs_review"], true);
        assert_eq!(
            api.calls_to("get_transactions")[0]["filters"],
            json!({"accounts": ["a1"]})
        );
    }

    #[tokio::test]
    async fn needing_review_requires_session() {
        let dir = tempfile::tempdir().expect("tempdir");
        let api = Arc::new(MockApi::new());
        let bridge = unauthenticated_bridge(&dir, &api);

        let params: NeedingReviewParams = from_json(json!({"days": 7}));
        let body = payload(&get_transactions_needing_review(&bridge, params).await);
        assert_eq!(body["kind"], "authentication_required");
        assert!(api.calls().is_empty());
    }
}
