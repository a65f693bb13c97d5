//! Tag tools.

use rmcp::model::CallToolResult;

use super::decode;
use crate::adapter;
use crate::bridge::AuthBridge;
use crate::error::ToolError;
use crate::models::TagsPage;
use crate::params::{CreateTagParams, SetTagsParams};
use crate::response::TagResponse;

/// Lists the household's tags.
pub(crate) async fn get_tags(bridge: &AuthBridge) -> CallToolResult {
    adapter::invoke(bridge, "get_tags", Ok(()), |api, ()| async move {
        let page: TagsPage = decode(api.get_transaction_tags().await?)?;
        let tags: Vec<_> = page
            .household_transaction_tags
            .iter()
            .map(TagResponse::from_tag)
            .collect();
        Ok::<_, ToolError>(tags)
    })
    .await
}

/// Replaces every tag of a transaction.
pub(crate) async fn set_transaction_tags(
    bridge: &AuthBridge,
    params: SetTagsParams,
) -> CallToolResult {
    adapter::invoke(
        bridge,
        "set_transaction_tags",
        Ok(params),
        |api, SetTagsParams { transaction_id, tag_ids }| async move {
            api.set_transaction_tags(&transaction_id, &tag_ids)
                .await
                .map_err(ToolError::from)
        },
    )
    .await
}

/// Creates a tag.
pub(crate) async fn create_tag(bridge: &AuthBridge, params: CreateTagParams) -> CallToolResult {
    adapter::invoke(
        bridge,
        "create_tag",
        params.validate(),
        |api, CreateTagParams { name, color }| async move {
            api.create_transaction_tag(&name, &color)
                .await
                .map_err(ToolError::from)
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

    use super::{create_tag, get_tags, set_transaction_tags};
    use crate::params::{CreateTagParams, SetTagsParams};
    use crate::testing::{MockApi, authed_bridge, payload};

    #[tokio::test]
    async fn tags_are_shaped() {
        let dir = tempfile::tempdir().expect("tempdir");
        let api = Arc::new(MockApi::new().with_response(
            "get_transaction_tags",
            json!({"householdTransactionTags": [
                {"id": "tag_1", "name": "Vacation", "color": "#FF0000", "order": 1, "transactionCount": 7},
                {"id": "tag_2", "name": "Work", "color": "#00FF00", "order": null, "transactionCount": null}
            ]}),
        ));
        let bridge = authed_bridge(&dir, &api);

        let body = payload(&get_tags(&bridge).await);
        assert_eq!(
            body[0],
            json!({"id": "tag_1", "name": "Vacation", "color": "#FF0000", "order": 1, "transaction_count": 7})
        );
        assert_eq!(body[1]["transaction_count"], 0);
        assert!(body[1]["order"].is_null());
    }

    #[tokio::test]
    async fn set_tags_replaces_the_list() {
        let dir = tempfile::tempdir().expect("tempdir");
        let api = Arc::new(MockApi::new());
        let bridge = authed_bridge(&dir, &api);

        let params = SetTagsParams {
            transaction_id: "t1".to_owned(),
            tag_ids: vec!["tag_1".to_owned(), "tag_2".to_owned()],
        };
        let _result = set_transaction_tags(&bridge, params).await;
        assert_eq!(
            api.calls_to("set_transaction_tags"),
            vec![json!({"transactionId": "t1", "tagIds": ["tag_1", "tag_2"]})]
        );
    }

    #[tokio::test]
    async fn create_tag_uses_default_color() {
        let dir = tempfile::tempdir().expect("tempdir");
        let created = json!({"createTransactionTag": {"tag": {"id": "tag_9"}, "errors": null}});
        let api = Arc::new(MockApi::new().with_response("create_transaction_tag", created.clone()));
        let bridge = authed_bridge(&dir, &api);

        let params: CreateTagParams =
            serde_json::from_value(json!({"name": "Gifts"})).expect("should deserialize");
        assert_eq!(payload(&create_tag(&bridge, params).await), created);
        assert_eq!(
            api.calls_to("create_transaction_tag"),
            vec![json!({"name": "Gifts", "color": "#19D2A5"})]
        );
    }

    #[tokio::test]
    async fn bad_color_makes_no_calls() {
        let dir = tempfile::tempdir().expect("tempdir");
        let api = Arc::new(MockApi::new());
        let bridge = authed_bridge(&dir, &api);

        let params = CreateTagParams {
            name: "Gifts".to_owned(),
            color: "red".to_owned(),
        };
        let body = payload(&create_tag(&bridge, params).await);
        assert_eq!(body["kind"], "validation_error");
        assert!(api.calls().is_empty());
    }
}
