//! Aggregate summaries.

use std::sync::Arc;

use rmcp::model::CallToolResult;

use super::decode;
use crate::adapter;
use crate::api::{DateRange, MonarchApi};
use crate::bridge::AuthBridge;
use crate::error::ToolError;
use crate::models::CategoryAggregates;
use crate::params::{SpendingSummaryParams, date_range};
use crate::response::SpendingSummaryResponse;

/// Returns the remote transaction statistics unchanged.
pub(crate) async fn get_transactions_summary(bridge: &AuthBridge) -> CallToolResult {
    adapter::invoke(bridge, "get_transactions_summary", Ok(()), |api, ()| async move {
        api.get_transactions_summary().await.map_err(ToolError::from)
    })
    .await
}

/// Validated spending summary request.
#[derive(Debug)]
struct SpendingRequest {
    /// Parsed window sent to the remote service.
    range: DateRange,
    /// Parameters as given, echoed in the response.
    params: SpendingSummaryParams,
}

/// Summarizes spending and income per category.
pub(crate) async fn get_spending_summary(
    bridge: &AuthBridge,
    params: SpendingSummaryParams,
) -> CallToolResult {
    let request = date_range(params.start_date.as_deref(), params.end_date.as_deref())
        .map(|range| SpendingRequest { range, params });
    adapter::invoke(bridge, "get_spending_summary", request, summarize).await
}

/// Fetches per-category cashflow and builds the summary.
async fn summarize(
    api: Arc<dyn MonarchApi>,
    request: SpendingRequest,
) -> Result<SpendingSummaryResponse, ToolError> {
    let aggregates: CategoryAggregates =
        decode(api.get_cashflow_by_category(&request.range).await?)?;
    let SpendingSummaryParams {
        start_date,
        end_date,
        limit,
    } = request.params;
    Ok(SpendingSummaryResponse::from_aggregates(
        start_date,
        end_date,
        &aggregates.by_category,
        limit,
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

    use super::{get_spending_summary, get_transactions_summary};
    use crate::params::SpendingSummaryParams;
    use crate::testing::{MockApi, authed_bridge, payload};

    #[tokio::test]
    async fn transactions_summary_passes_through() {
        let dir = tempfile::tempdir().expect("tempdir");
        let summary = json!({"aggregates": [{"summary": {"count": 12, "sumExpense": -800.0}}]});
        let api =
            Arc::new(MockApi::new().with_response("get_transactions_summary", summary.clone()));
        let bridge = authed_bridge(&dir, &api);

        assert_eq!(payload(&get_transactions_summary(&bridge).await), summary);
    }

    #[tokio::test]
    async fn spending_summary_totals_and_truncates() {
        let dir = tempfile::tempdir().expect("tempdir");
        let api = Arc::new(MockApi::new().with_response(
            "get_cashflow_by_category",
            json!({"byCategory": [
                {"groupBy": {"category": {"id": "c1", "name": "Rent", "group": {"name": "Housing"}}},
                 "summary": {"sum": -1500.0, "avg": -1500.0, "count": 1}},
                {"groupBy": {"category": {"id": "c2", "name": "Coffee"}},
                 "summary": {"sum": -45.0, "avg": -4.5, "count": 10}},
                {"groupBy": {"category": {"id": "c3", "name": "Salary"}},
                 "summary": {"sum": 4000.0, "avg": 2000.0, "count": 2}}
            ]}),
        ));
        let bridge = authed_bridge(&dir, &api);

        let params: SpendingSummaryParams = serde_json::from_value(json!({
            "start_date": "2024-01-01",
            "end_date": "2024-01-31",
            "limit": 2
        }))
        .expect("should deserialize");
        let body = payload(&get_spending_summary(&bridge, params).await);

        assert_eq!(
            body["period"],
            json!({"start_date": "2024-01-01", "end_date": "2024-01-31"})
        );
        assert_eq!(body["total_income"], 4000.0);
        assert_eq!(body["total_expenses"], 1545.0);
        assert_eq!(body["net"], 2455.0);
        let categories = body["by_category"].as_array().expect("array");
        assert_eq!(categories.len(), 2);
        assert_eq!(categories[0]["category"], "Salary");
        assert_eq!(categories[1]["category"], "Rent");
        assert_eq!(categories[1]["group"], "Housing");
        assert_eq!(
            api.calls_to("get_cashflow_by_category"),
            vec![json!({"startDate": "2024-01-01", "endDate": "2024-01-31"})]
        );
    }

    #[tokio::test]
    async fn inverted_range_is_rejected_locally() {
        let dir = tempfile::tempdir().expect("tempdir");
        let api = Arc::new(MockApi::new());
        let bridge = authed_bridge(&dir, &api);

        let params: SpendingSummaryParams = serde_json::from_value(json!({
            "start_date": "2024-02-01",
            "end_date": "2024-01-01"
        }))
        .expect("should deserialize");
        let body = payload(&get_spending_summary(&bridge, params).await);
        assert_eq!(body["kind"], "validation_error");
        assert!(api.calls().is_empty());
    }
}
