//! Transaction rule tools.
//!
//! Rule mutations report validation problems inside the payload rather than
//! as GraphQL errors, so each result is inspected before it is rendered.

use std::sync::Arc;

use rmcp::model::CallToolResult;
use serde_json::Value;

use super::{decode, decode_field};
use crate::adapter;
use crate::api::{MonarchApi, RuleInput};
use crate::bridge::AuthBridge;
use crate::error::ToolError;
use crate::models::{RuleDeletion, RuleMutation, RulesPage};
use crate::params::{RuleIdParams, RuleParams, UpdateRuleParams};
use crate::response::{MutationOutcome, RuleResponse};

/// Lists transaction rules.
pub(crate) async fn get_transaction_rules(bridge: &AuthBridge) -> CallToolResult {
    adapter::invoke(bridge, "get_transaction_rules", Ok(()), |api, ()| async move {
        let page: RulesPage = decode(api.get_transaction_rules().await?)?;
        let rules: Vec<_> = page
            .transaction_rules
            .iter()
            .map(RuleResponse::from_rule)
            .collect();
        Ok::<_, ToolError>(rules)
    })
    .await
}

/// Creates a rule from the supplied conditions and actions.
pub(crate) async fn create_transaction_rule(
    bridge: &AuthBridge,
    params: RuleParams,
) -> CallToolResult {
    adapter::invoke(
        bridge,
        "create_transaction_rule",
        params.input(None),
        create_rule,
    )
    .await
}

/// Sends a new rule and interprets the mutation payload.
async fn create_rule(
    api: Arc<dyn MonarchApi>,
    rule: RuleInput,
) -> Result<MutationOutcome, ToolError> {
    let data = api.create_transaction_rule(&rule).await?;
    let mutation: RuleMutation = decode_field(&data, "createTransactionRuleV2")?;
    Ok(outcome(&mutation, "Rule created successfully", data))
}

/// Replaces the conditions and actions of an existing rule.
pub(crate) async fn update_transaction_rule(
    bridge: &AuthBridge,
    params: UpdateRuleParams,
) -> CallToolResult {
    let UpdateRuleParams { rule_id, rule } = params;
    adapter::invoke(
        bridge,
        "update_transaction_rule",
        rule.input(Some(rule_id)),
        update_rule,
    )
    .await
}

/// Sends a rule update and interprets the mutation payload.
async fn update_rule(
    api: Arc<dyn MonarchApi>,
    rule: RuleInput,
) -> Result<MutationOutcome, ToolError> {
    let data = api.update_transaction_rule(&rule).await?;
    let mutation: RuleMutation = decode_field(&data, "updateTransactionRuleV2")?;
    Ok(outcome(&mutation, "Rule updated successfully", data))
}

/// Maps a create or update payload to its outcome.
fn outcome(mutation: &RuleMutation, message: &str, data: Value) -> MutationOutcome {
    match mutation.reported_errors() {
        Some(errors) => MutationOutcome::rejected(errors.clone()),
        None => MutationOutcome::succeeded(message, data),
    }
}

/// Deletes a rule.
pub(crate) async fn delete_transaction_rule(
    bridge: &AuthBridge,
    params: RuleIdParams,
) -> CallToolResult {
    adapter::invoke(
        bridge,
        "delete_transaction_rule",
        Ok(params.rule_id),
        |api, rule_id: String| async move {
            let data = api.delete_transaction_rule(&rule_id).await?;
            let deletion: RuleDeletion = decode_field(&data, "deleteTransactionRule")?;
            let result = if deletion.deleted {
                MutationOutcome::succeeded("Rule deleted successfully", data)
            } else if let Some(errors) = deletion.reported_errors() {
                MutationOutcome::rejected(errors.clone())
            } else {
                MutationOutcome::unknown()
            };
            Ok::<_, ToolError>(result)
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

    use super::{
        create_transaction_rule, delete_transaction_rule, get_transaction_rules,
        update_transaction_rule,
    };
    use crate::params::{RuleIdParams, RuleParams, UpdateRuleParams};
    use crate::testing::{MockApi, authed_bridge, is_error, payload};

    #[tokio::test]
    async fn rules_are_shaped() {
        let dir = tempfile::tempdir().expect("tempdir");
        let api = Arc::new(MockApi::new().with_response(
            "get_transaction_rules",
            json!({"transactionRules": [{
                "id": "rule_1",
                "order": 0,
                "merchantCriteriaUseOriginalStatement": false,
                "merchantNameCriteria": [{"operator": "contains", "value": "amazon"}],
                "setCategoryAction": {"id": "cat_shopping", "name": "Shopping", "icon": "x"},
                "addTagsAction": [],
                "recentApplicationCount": 4
            }]}),
        ));
        let bridge = authed_bridge(&dir, &api);

        let body = payload(&get_transaction_rules(&bridge).await);
        let rule = &body[0];
        assert_eq!(rule["id"], "rule_1");
        assert_eq!(
            rule["set_category_action"],
            json!({"id": "cat_shopping", "name": "Shopping"})
        );
        assert!(rule["add_tags_action"].is_null());
        assert_eq!(rule["recent_application_count"], 4);
    }

    #[tokio::test]
    async fn create_forwards_only_supplied_fields() {
        let dir = tempfile::tempdir().expect("tempdir");
        let api = Arc::new(MockApi::new().with_response(
            "create_transaction_rule",
            json!({"createTransactionRuleV2": {"errors": null}}),
        ));
        let bridge = authed_bridge(&dir, &api);

        let params: RuleParams = serde_json::from_value(json!({
            "merchant_criteria_operator": "contains",
            "merchant_criteria_value": "amazon",
            "set_category_id": "cat_shopping"
        }))
        .expect("should deserialize");
        let body = payload(&create_transaction_rule(&bridge, params).await);

        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "Rule created successfully");
        assert_eq!(
            api.calls_to("create_transaction_rule"),
            vec![json!({
                "applyToExistingTransactions": false,
                "merchantNameCriteria": [{"operator": "contains", "value": "amazon"}],
                "setCategoryAction": "cat_shopping"
            })]
        );
    }

    #[tokio::test]
    async fn payload_errors_mean_failure() {
        let dir = tempfile::tempdir().expect("tempdir");
        let errors = json!({"message": "Invalid criteria", "fieldErrors": []});
        let api = Arc::new(MockApi::new().with_response(
            "create_transaction_rule",
            json!({"createTransactionRuleV2": {"errors": errors.clone()}}),
        ));
        let bridge = authed_bridge(&dir, &api);

        let params = RuleParams {
            set_merchant_name: Some("Amazon".to_owned()),
            ..RuleParams::default()
        };
        let result = create_transaction_rule(&bridge, params).await;
        assert!(!is_error(&result));
        assert_eq!(payload(&result), json!({"success": false, "errors": errors}));
    }

    #[tokio::test]
    async fn incomplete_criterion_is_rejected_locally() {
        let dir = tempfile::tempdir().expect("tempdir");
        let api = Arc::new(MockApi::new());
        let bridge = authed_bridge(&dir, &api);

        let params: RuleParams = serde_json::from_value(json!({"amount_operator": "gt"}))
            .expect("should deserialize");
        let body = payload(&create_transaction_rule(&bridge, params).await);
        assert_eq!(body["kind"], "validation_error");
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn update_carries_rule_id() {
        let dir = tempfile::tempdir().expect("tempdir");
        let api = Arc::new(MockApi::new().with_response(
            "update_transaction_rule",
            json!({"updateTransactionRuleV2": {"errors": []}}),
        ));
        let bridge = authed_bridge(&dir, &api);

        let params: UpdateRuleParams = serde_json::from_value(json!({
            "rule_id": "rule_1",
            "hide_from_reports": true,
            "apply_to_existing": true
        }))
        .expect("should deserialize");
        let body = payload(&update_transaction_rule(&bridge, params).await);

        assert_eq!(body["message"], "Rule updated successfully");
        assert_eq!(
            api.calls_to("update_transaction_rule"),
            vec![json!({
                "id": "rule_1",
                "applyToExistingTransactions": true,
                "setHideFromReportsAction": true
            })]
        );
    }

    #[tokio::test]
    async fn delete_reports_each_outcome() {
        let cases = [
            (
                json!({"deleteTransactionRule": {"deleted": true, "errors": null}}),
                json!(true),
                json!("Rule deleted successfully"),
            ),
            (
                json!({"deleteTransactionRule": {"deleted": false, "errors": ["not found"]}}),
                json!(false),
                json!(null),
            ),
            (
                json!({"deleteTransactionRule": {"deleted": false, "errors": null}}),
                json!(false),
                json!("Unknown error"),
            ),
        ];
        for (response, success, message) in cases {
            let dir = tempfile::tempdir().expect("tempdir");
            let api = Arc::new(MockApi::new().with_response("delete_transaction_rule", response));
            let bridge = authed_bridge(&dir, &api);

            let params = RuleIdParams {
                rule_id: "rule_1".to_owned(),
            };
            let body = payload(&delete_transaction_rule(&bridge, params).await);
            assert_eq!(body["success"], success);
            assert_eq!(body.get("message").cloned().unwrap_or_default(), message);
        }
    }
}
