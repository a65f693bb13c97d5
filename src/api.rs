//! Abstract Monarch Money client and the request types it accepts.
//!
//! Every method returns the remote `data` object as a [`Value`] so that
//! responses reach tools without reinterpretation. Request types serialize
//! to the camelCase shapes the remote API expects.

use async_trait::async_trait;
use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiResult;

/// Inclusive date window. Either bound may be left open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DateRange {
    /// First day of the window.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) start_date: Option<NaiveDate>,
    /// Last day of the window.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) end_date: Option<NaiveDate>,
}

/// Server-side transaction filters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TransactionFilters {
    /// Free-text search over merchant and description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) search: Option<String>,
    /// Date window.
    #[serde(flatten)]
    pub(crate) range: DateRange,
    /// Category IDs.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub(crate) categories: Vec<String>,
    /// Account IDs.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub(crate) accounts: Vec<String>,
    /// Tag IDs.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub(crate) tags: Vec<String>,
    /// With or without attachments.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) has_attachments: Option<bool>,
    /// With or without notes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) has_notes: Option<bool>,
    /// Hidden from or shown in reports.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) hide_from_reports: Option<bool>,
    /// Split or unsplit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) is_split: Option<bool>,
    /// Recurring or one-off.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) is_recurring: Option<bool>,
}

/// A page of transactions matching some filters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TransactionQuery {
    /// Maximum number of results.
    pub(crate) limit: u32,
    /// Number of results to skip.
    pub(crate) offset: u32,
    /// Filters applied server-side.
    pub(crate) filters: TransactionFilters,
}

/// A manually entered transaction.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NewTransaction {
    /// Target account.
    pub(crate) account_id: String,
    /// Signed amount; negative for expenses.
    pub(crate) amount: f64,
    /// Transaction date.
    pub(crate) date: NaiveDate,
    /// Merchant display name.
    pub(crate) merchant_name: String,
    /// Category to assign.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) category_id: Option<String>,
    /// Free-form notes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) notes: Option<String>,
}

/// Partial update of an existing transaction. Unset fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TransactionUpdate {
    /// Transaction to update.
    pub(crate) transaction_id: String,
    /// New signed amount.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) amount: Option<f64>,
    /// New merchant display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) merchant_name: Option<String>,
    /// New category.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) category_id: Option<String>,
    /// New date.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) date: Option<NaiveDate>,
    /// New notes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) notes: Option<String>,
    /// New review flag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) needs_review: Option<bool>,
}

impl TransactionUpdate {
    /// Starts an empty update for `transaction_id`.
    pub(crate) fn new(transaction_id: String) -> Self {
        Self {
            transaction_id,
            ..Self::default()
        }
    }
}

/// One part of a split transaction.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SplitPart {
    /// Amount of this part.
    pub(crate) amount: f64,
    /// Category of this part.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) category_id: Option<String>,
    /// Merchant of this part.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) merchant_name: Option<String>,
}

/// Merchant matching operator for rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub(crate) enum MerchantOperator {
    /// Exact match.
    Eq,
    /// Substring match.
    Contains,
}

/// Amount comparison operator for rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub(crate) enum AmountOperator {
    /// Greater than.
    Gt,
    /// Less than.
    Lt,
    /// Equal to.
    Eq,
    /// Within an inclusive range.
    Between,
}

/// A single merchant-name condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct MerchantCriterion {
    /// How to compare.
    pub(crate) operator: MerchantOperator,
    /// Name or pattern to compare with.
    pub(crate) value: String,
}

/// Inclusive amount range used with [`AmountOperator::Between`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub(crate) struct AmountRange {
    /// Lower bound.
    pub(crate) lower: f64,
    /// Upper bound.
    pub(crate) upper: f64,
}

/// Amount condition of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AmountCriterion {
    /// How to compare.
    pub(crate) operator: AmountOperator,
    /// Whether the amount is an expense.
    pub(crate) is_expense: bool,
    /// Threshold, unset for ranges.
    pub(crate) value: Option<f64>,
    /// Range, set only for [`AmountOperator::Between`].
    pub(crate) value_range: Option<AmountRange>,
}

/// Input for creating or updating a transaction rule.
///
/// Only supplied conditions and actions are serialized.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RuleInput {
    /// Rule to update; unset when creating.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) id: Option<String>,
    /// Whether to re-run the rule over existing transactions.
    pub(crate) apply_to_existing_transactions: bool,
    /// Merchant-name conditions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) merchant_name_criteria: Option<Vec<MerchantCriterion>>,
    /// Amount condition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) amount_criteria: Option<AmountCriterion>,
    /// Accounts the rule applies to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) account_ids: Option<Vec<String>>,
    /// Category to assign.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) set_category_action: Option<String>,
    /// Merchant name to assign.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) set_merchant_action: Option<String>,
    /// Tags to add.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) add_tags_action: Option<Vec<String>>,
    /// Hide matching transactions from reports.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) set_hide_from_reports_action: Option<bool>,
    /// Review status to set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) review_status_action: Option<String>,
}

/// What a budget amount applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) enum BudgetTarget {
    /// A single category.
    CategoryId(String),
    /// A whole category group.
    CategoryGroupId(String),
}

/// Budget amount for one month, optionally repeated for future months.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BudgetAmount {
    /// Amount to budget; zero clears the budget.
    pub(crate) amount: f64,
    /// Category or group.
    pub(crate) target: BudgetTarget,
    /// Month to set, given as any day in it. Defaults to the current month.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) start_date: Option<NaiveDate>,
    /// Repeat for all following months.
    pub(crate) apply_to_future: bool,
}

/// Net worth snapshot filters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SnapshotQuery {
    /// Date window.
    #[serde(flatten)]
    pub(crate) range: DateRange,
    /// Restrict to one account type, e.g. `brokerage`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) account_type: Option<String>,
}

/// Snapshot granularity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Timeframe {
    /// One snapshot per month.
    #[default]
    Month,
    /// One snapshot per year.
    Year,
}

impl Timeframe {
    /// Wire label.
    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Self::Month => "month",
            Self::Year => "year",
        }
    }
}

/// Asynchronous Monarch Money operations consumed by the tools.
#[async_trait]
pub(crate) trait MonarchApi: Send + Sync {
    /// Lists all accounts.
    async fn get_accounts(&self) -> ApiResult<Value>;

    /// Asks the service to refresh every account from its institution.
    async fn request_accounts_refresh(&self) -> ApiResult<Value>;

    /// Lists investment holdings of one account.
    async fn get_account_holdings(&self, account_id: &str) -> ApiResult<Value>;

    /// Returns balance snapshots of one account under `snapshots`.
    async fn get_account_history(&self, account_id: &str) -> ApiResult<Value>;

    /// Lists transactions under `allTransactions.results`.
    async fn get_transactions(&self, query: &TransactionQuery) -> ApiResult<Value>;

    /// Returns one transaction with attachments and splits.
    async fn get_transaction_details(&self, transaction_id: &str) -> ApiResult<Value>;

    /// Creates a manual transaction.
    async fn create_transaction(&self, transaction: &NewTransaction) -> ApiResult<Value>;

    /// Updates fields of a transaction.
    async fn update_transaction(&self, update: &TransactionUpdate) -> ApiResult<Value>;

    /// Deletes a transaction.
    async fn delete_transaction(&self, transaction_id: &str) -> ApiResult<Value>;

    /// Lists recurring items under `recurringTransactionItems`.
    async fn get_recurring_transactions(&self, range: &DateRange) -> ApiResult<Value>;

    /// Returns aggregate transaction statistics.
    async fn get_transactions_summary(&self) -> ApiResult<Value>;

    /// Returns per-category cashflow under `byCategory`.
    async fn get_cashflow_by_category(&self, range: &DateRange) -> ApiResult<Value>;

    /// Returns the full cashflow breakdown.
    async fn get_cashflow(&self, range: &DateRange) -> ApiResult<Value>;

    /// Returns the splits of a transaction.
    async fn get_transaction_splits(&self, transaction_id: &str) -> ApiResult<Value>;

    /// Replaces the splits of a transaction; empty removes them.
    async fn update_transaction_splits(
        &self,
        transaction_id: &str,
        splits: &[SplitPart],
    ) -> ApiResult<Value>;

    /// Lists tags under `householdTransactionTags`.
    async fn get_transaction_tags(&self) -> ApiResult<Value>;

    /// Replaces the tags of a transaction.
    async fn set_transaction_tags(&self, transaction_id: &str, tag_ids: &[String])
    -> ApiResult<Value>;

    /// Creates a tag.
    async fn create_transaction_tag(&self, name: &str, color: &str) -> ApiResult<Value>;

    /// Lists rules under `transactionRules`.
    async fn get_transaction_rules(&self) -> ApiResult<Value>;

    /// Creates a rule; mutation errors appear under `createTransactionRuleV2.errors`.
    async fn create_transaction_rule(&self, rule: &RuleInput) -> ApiResult<Value>;

    /// Updates a rule; mutation errors appear under `updateTransactionRuleV2.errors`.
    async fn update_transaction_rule(&self, rule: &RuleInput) -> ApiResult<Value>;

    /// Deletes a rule; outcome under `deleteTransactionRule`.
    async fn delete_transaction_rule(&self, rule_id: &str) -> ApiResult<Value>;

    /// Lists categories under `categories`.
    async fn get_transaction_categories(&self) -> ApiResult<Value>;

    /// Lists category groups under `categoryGroups`.
    async fn get_transaction_category_groups(&self) -> ApiResult<Value>;

    /// Returns budget data under `budgetData` plus `categoryGroups`.
    async fn get_budgets(&self, range: &DateRange) -> ApiResult<Value>;

    /// Sets a budget amount.
    async fn set_budget_amount(&self, budget: &BudgetAmount) -> ApiResult<Value>;

    /// Returns daily net worth under `aggregateSnapshots`.
    async fn get_aggregate_snapshots(&self, query: &SnapshotQuery) -> ApiResult<Value>;

    /// Returns per-type balances under `snapshotsByAccountType`.
    async fn get_account_snapshots_by_type(
        &self,
        start_date: NaiveDate,
        timeframe: Timeframe,
    ) -> ApiResult<Value>;
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::missing_docs_in_private_items,
    reason = "test code uses expect for readability"
)]
mod tests {
    use chrono::NaiveDate;
    use serde_json::json;

    use super::{
        AmountCriterion, AmountOperator, BudgetAmount, BudgetTarget, DateRange, RuleInput,
        TransactionFilters,
    };

    #[test]
    fn filters_skip_unset_fields() {
        let filters = TransactionFilters {
            range: DateRange {
                start_date: NaiveDate::from_ymd_opt(2024, 1, 1),
                end_date: None,
            },
            accounts: vec!["acc_1".to_owned()],
            has_notes: Some(false),
            ..TransactionFilters::default()
        };
        let value = serde_json::to_value(&filters).expect("serialize");
        assert_eq!(
            value,
            json!({"startDate": "2024-01-01", "accounts": ["acc_1"], "hasNotes": false})
        );
    }

    #[test]
    fn amount_criteria_keeps_explicit_nulls() {
        let rule = RuleInput {
            amount_criteria: Some(AmountCriterion {
                operator: AmountOperator::Gt,
                is_expense: true,
                value: Some(50.0),
                value_range: None,
            }),
            ..RuleInput::default()
        };
        let value = serde_json::to_value(&rule).expect("serialize");
        assert_eq!(
            value,
            json!({
                "applyToExistingTransactions": false,
                "amountCriteria": {
                    "operator": "gt",
                    "isExpense": true,
                    "value": 50.0,
                    "valueRange": null
                }
            })
        );
    }

    #[test]
    fn budget_target_is_tagged_by_field_name() {
        let budget = BudgetAmount {
            amount: 600.0,
            target: BudgetTarget::CategoryGroupId("grp_1".to_owned()),
            start_date: None,
            apply_to_future: true,
        };
        let value = serde_json::to_value(&budget).expect("serialize");
        assert_eq!(
            value,
            json!({
                "amount": 600.0,
                "target": {"categoryGroupId": "grp_1"},
                "applyToFuture": true
            })
        );
    }
}
