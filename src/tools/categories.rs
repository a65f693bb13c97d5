//! Category tools.

use rmcp::model::CallToolResult;

use super::decode;
use crate::adapter;
use crate::bridge::AuthBridge;
use crate::error::ToolError;
use crate::models::{CategoriesPage, CategoryGroupsPage};
use crate::response::{CategoryGroupResponse, CategoryResponse};

/// Lists transaction categories.
pub(crate) async fn get_categories(bridge: &AuthBridge) -> CallToolResult {
    adapter::invoke(bridge, "get_categories", Ok(()), |api, ()| async move {
        let page: CategoriesPage = decode(api.get_transaction_categories().await?)?;
        let categories: Vec<_> = page
            .categories
            .iter()
            .map(CategoryResponse::from_category)
            .collect();
        Ok::<_, ToolError>(categories)
    })
    .await
}

/// Lists category groups with their member categories.
pub(crate) async fn get_category_groups(bridge: &AuthBridge) -> CallToolResult {
    adapter::invoke(bridge, "get_category_groups", Ok(()), |api, ()| async move {
        let page: CategoryGroupsPage = decode(api.get_transaction_category_groups().await?)?;
        let groups: Vec<_> = page
            .category_groups
            .iter()
            .map(CategoryGroupResponse::from_group)
            .collect();
        Ok::<_, ToolError>(groups)
    })
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

    use super::{get_categories, get_category_groups};
    use crate::testing::{MockApi, authed_bridge, is_error, payload};

    #[tokio::test]
    async fn categories_flatten_their_group() {
        let dir = tempfile::tempdir().expect("tempdir");
        let api = Arc::new(MockApi::new().with_response(
            "get_transaction_categories",
            json!({"categories": [{
                "id": "c1",
                "name": "Groceries",
                "icon": "🍎",
                "isSystemCategory": true,
                "isDisabled": false,
                "group": {"id": "g1", "name": "Food", "type": "expense"}
            }]}),
        ));
        let bridge = authed_bridge(&dir, &api);

        assert_eq!(
            payload(&get_categories(&bridge).await),
            json!([{
                "id": "c1",
                "name": "Groceries",
                "icon": "🍎",
                "group": "Food",
                "group_id": "g1",
                "group_type": "expense",
                "is_system_category": true,
                "is_disabled": false
            }])
        );
    }

    #[tokio::test]
    async fn groups_list_members() {
        let dir = tempfile::tempdir().expect("tempdir");
        let api = Arc::new(MockApi::new().with_response(
            "get_transaction_category_groups",
            json!({"categoryGroups": [{
                "id": "g1",
                "name": "Food",
                "type": "expense",
                "budgetVariability": "flexible",
                "groupLevelBudgetingEnabled": false,
                "categories": [{"id": "c1", "name": "Groceries", "icon": "🍎"}]
            }]}),
        ));
        let bridge = authed_bridge(&dir, &api);

        let body = payload(&get_category_groups(&bridge).await);
        assert_eq!(body[0]["type"], "expense");
        assert_eq!(body[0]["budget_variability"], "flexible");
        assert_eq!(body[0]["categories"][0]["name"], "Groceries");
    }

    #[tokio::test]
    async fn remote_failure_is_an_error_result() {
        let dir = tempfile::tempdir().expect("tempdir");
        let api = Arc::new(MockApi::new().with_failure("get_transaction_categories"));
        let bridge = authed_bridge(&dir, &api);

        let result = get_categories(&bridge).await;
        assert!(is_error(&result));
        assert_eq!(payload(&result)["kind"], "remote_error");
    }
}
