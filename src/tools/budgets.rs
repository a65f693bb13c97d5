//! Budget tools.

use std::sync::Arc;

use rmcp::model::CallToolResult;

use super::decode;
use crate::adapter;
use crate::api::{BudgetAmount, MonarchApi};
use crate::bridge::AuthBridge;
use crate::error::ToolError;
use crate::models::BudgetPage;
use crate::params::{DateRangeParams, SetBudgetParams};
use crate::response::{BudgetMonthResponse, BudgetUpdateResponse};

/// Returns budgets per month with category names resolved.
pub(crate) async fn get_budgets(bridge: &AuthBridge, params: DateRangeParams) -> CallToolResult {
    adapter::invoke(
        bridge,
        "get_budgets",
        params.range(),
        |api, range| async move {
            let page: BudgetPage = decode(api.get_budgets(&range).await?)?;
            Ok::<_, ToolError>(BudgetMonthResponse::from_page(&page))
        },
    )
    .await
}

/// Sets the budget of a category or category group.
pub(crate) async fn set_budget_amount(
    bridge: &AuthBridge,
    params: SetBudgetParams,
) -> CallToolResult {
    adapter::invoke(bridge, "set_budget_amount", params.budget(), set_amount).await
}

/// Sends the budget amount and describes the change.
async fn set_amount(
    api: Arc<dyn MonarchApi>,
    budget: BudgetAmount,
) -> Result<BudgetUpdateResponse, ToolError> {
    let result = api.set_budget_amount(&budget).await?;
    Ok(BudgetUpdateResponse::new(
        budget.amount,
        budget.apply_to_future,
        result,
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

    use super::{get_budgets, set_budget_amount};
    use crate::params::{DateRangeParams, SetBudgetParams};
    use crate::testing::{MockApi, authed_bridge, payload};

    #[tokio::test]
    async fn budgets_are_grouped_by_month() {
        let dir = tempfile::tempdir().expect("tempdir");
        let api = Arc::new(MockApi::new().with_response(
            "get_budgets",
            json!({
                "budgetData": {
                    "totalsByMonth": [{
                        "month": "2024-01-01",
                        "totalExpenses": {"plannedAmount": 500.0, "actualAmount": 420.0}
                    }],
                    "monthlyAmountsByCategory": [{
                        "category": {"id": "c1"},
                        "monthlyAmounts": [{
                            "month": "2024-01-01",
                            "plannedCashFlowAmount": 500.0,
                            "actualAmount": 420.0,
                            "remainingAmount": 80.0,
                            "previousMonthRolloverAmount": 0.0
                        }]
                    }]
                },
                "categoryGroups": [{
                    "id": "g1",
                    "name": "Food",
                    "categories": [{"id": "c1", "name": "Groceries", "icon": "🍎"}]
                }]
            }),
        ));
        let bridge = authed_bridge(&dir, &api);

        let params = DateRangeParams {
            start_date: Some("2024-01-01".to_owned()),
            end_date: Some("2024-01-31".to_owned()),
        };
        let body = payload(&get_budgets(&bridge, params).await);
        assert_eq!(body[0]["month"], "2024-01-01");
        assert_eq!(body[0]["total_budgeted"], 500.0);
        let category = &body[0]["categories"][0];
        assert_eq!(category["category_name"], "Groceries");
        assert_eq!(category["group"], "Food");
        assert_eq!(category["remaining"], 80.0);
        assert_eq!(
            api.calls_to("get_budgets"),
            vec![json!({"startDate": "2024-01-01", "endDate": "2024-01-31"})]
        );
    }

    #[tokio::test]
    async fn set_budget_describes_the_change() {
        let dir = tempfile::tempdir().expect("tempdir");
        let api = Arc::new(MockApi::new().with_response(
            "set_budget_amount",
            json!({"updateOrCreateBudgetItem": {"budgetItem": {"id": "b1"}}}),
        ));
        let bridge = authed_bridge(&dir, &api);

        let params: SetBudgetParams = serde_json::from_value(json!({
            "amount": 250.0,
            "category_id": "c1",
            "apply_to_future": true
        }))
        .expect("should deserialize");
        let body = payload(&set_budget_amount(&bridge, params).await);
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "Budget set to $250.00 for all future months");
        assert_eq!(api.calls_to("set_budget_amount").len(), 1);
    }

    #[tokio::test]
    async fn two_targets_are_rejected_locally() {
        let dir = tempfile::tempdir().expect("tempdir");
        let api = Arc::new(MockApi::new());
        let bridge = authed_bridge(&dir, &api);

        let params: SetBudgetParams = serde_json::from_value(json!({
            "amount": 250.0,
            "category_id": "c1",
            "category_group_id": "g1"
        }))
        .expect("should deserialize");
        let body = payload(&set_budget_amount(&bridge, params).await);
        assert_eq!(body["kind"], "validation_error");
        assert!(api.calls().is_empty());
    }
}
