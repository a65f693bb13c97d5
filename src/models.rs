//! Typed views of the remote GraphQL responses the tools reshape.
//!
//! Every field is optional or defaulted: the remote API omits and nulls
//! fields freely, and a missing field must never fail a tool call.
//! Dates stay strings so they pass through exactly as provided.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Deserializes `null` as the type's default.
fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Reference to a named entity (category, merchant, tag, group).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NamedRef {
    /// Entity ID.
    pub(crate) id: Option<String>,
    /// Display name.
    pub(crate) name: Option<String>,
    /// Icon, when the entity has one.
    pub(crate) icon: Option<String>,
}

/// Reference to an account inside another entity.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AccountRef {
    /// Account ID.
    pub(crate) id: Option<String>,
    /// Account display name.
    pub(crate) display_name: Option<String>,
}

/// Category group reference with its kind.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GroupRef {
    /// Group ID.
    pub(crate) id: Option<String>,
    /// Group name.
    pub(crate) name: Option<String>,
    /// `income`, `expense` or `transfer`.
    #[serde(rename = "type")]
    pub(crate) kind: Option<String>,
}

// ── Accounts ────────────────────────────────────────────────────────

/// `GetAccounts` payload.
#[derive(Debug, Deserialize)]
pub(crate) struct AccountsPage {
    /// All accounts.
    #[serde(default, deserialize_with = "null_default")]
    pub(crate) accounts: Vec<Account>,
}

/// A financial account.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Account {
    /// Account ID.
    pub(crate) id: Option<String>,
    /// Name shown in the UI.
    pub(crate) display_name: Option<String>,
    /// Fallback name.
    pub(crate) name: Option<String>,
    /// Explicit activity flag.
    pub(crate) is_active: Option<bool>,
    /// Set once the account has been deactivated.
    pub(crate) deactivated_at: Option<String>,
    /// Current balance.
    pub(crate) current_balance: Option<f64>,
    /// Account type.
    #[serde(rename = "type")]
    pub(crate) kind: Option<NamedRef>,
    /// Linked institution.
    pub(crate) institution: Option<NamedRef>,
}

/// `AccountDetails_getAccount` payload.
#[derive(Debug, Deserialize)]
pub(crate) struct AccountHistory {
    /// Balance snapshots, oldest first.
    #[serde(default, deserialize_with = "null_default")]
    pub(crate) snapshots: Vec<BalanceSnapshot>,
}

/// One balance snapshot of an account.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BalanceSnapshot {
    /// Snapshot date.
    pub(crate) date: Option<String>,
    /// Balance, negative for liabilities.
    pub(crate) signed_balance: Option<f64>,
}

// ── Transactions ────────────────────────────────────────────────────

/// `GetTransactionsList` payload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TransactionsPage {
    /// The matching transactions.
    pub(crate) all_transactions: Option<TransactionList>,
}

impl TransactionsPage {
    /// Consumes the page, yielding its transactions.
    pub(crate) fn into_results(self) -> Vec<Transaction> {
        self.all_transactions
            .map(|list| list.results)
            .unwrap_or_default()
    }
}

/// A page of transactions.
#[derive(Debug, Deserialize)]
pub(crate) struct TransactionList {
    /// Transactions on this page.
    #[serde(default, deserialize_with = "null_default")]
    pub(crate) results: Vec<Transaction>,
}

/// A transaction as listed.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Transaction {
    /// Transaction ID.
    pub(crate) id: Option<String>,
    /// Posting date.
    pub(crate) date: Option<String>,
    /// Signed amount.
    pub(crate) amount: Option<f64>,
    /// Statement description from the data provider.
    pub(crate) plaid_name: Option<String>,
    /// Original statement description.
    pub(crate) original_name: Option<String>,
    /// User notes.
    pub(crate) notes: Option<String>,
    /// Review flag.
    #[serde(default, deserialize_with = "null_default")]
    pub(crate) needs_review: bool,
    /// Pending flag.
    #[serde(default, deserialize_with = "null_default")]
    pub(crate) pending: bool,
    /// Hidden from reports.
    #[serde(default, deserialize_with = "null_default")]
    pub(crate) hide_from_reports: bool,
    /// Split flag.
    #[serde(default, deserialize_with = "null_default")]
    pub(crate) is_split_transaction: bool,
    /// Recurring flag.
    #[serde(default, deserialize_with = "null_default")]
    pub(crate) is_recurring: bool,
    /// Attached files.
    #[serde(default, deserialize_with = "null_default")]
    pub(crate) attachments: Vec<Value>,
    /// Assigned category.
    pub(crate) category: Option<NamedRef>,
    /// Merchant.
    pub(crate) merchant: Option<NamedRef>,
    /// Owning account.
    pub(crate) account: Option<AccountRef>,
    /// Applied tags.
    #[serde(default, deserialize_with = "null_default")]
    pub(crate) tags: Vec<NamedRef>,
}

impl Transaction {
    /// Whether a category with an ID is assigned.
    pub(crate) fn is_categorized(&self) -> bool {
        self.category
            .as_ref()
            .and_then(|category| category.id.as_deref())
            .is_some_and(|id| !id.is_empty())
    }
}

/// `Web_GetUpcomingRecurringTransactionItems` payload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RecurringPage {
    /// Upcoming and past recurring items.
    #[serde(default, deserialize_with = "null_default")]
    pub(crate) recurring_transaction_items: Vec<RecurringItem>,
}

/// One occurrence of a recurring stream.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RecurringItem {
    /// Expected date.
    pub(crate) date: Option<String>,
    /// Expected amount.
    pub(crate) amount: Option<f64>,
    /// Whether the date has passed.
    #[serde(default, deserialize_with = "null_default")]
    pub(crate) is_past: bool,
    /// Matched transaction, once posted.
    pub(crate) transaction_id: Option<String>,
    /// Stream the item belongs to.
    pub(crate) stream: Option<RecurringStream>,
    /// Category.
    pub(crate) category: Option<NamedRef>,
    /// Account.
    pub(crate) account: Option<AccountRef>,
}

/// A recurring transaction stream.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RecurringStream {
    /// Stream ID.
    pub(crate) id: Option<String>,
    /// Frequency label, e.g. `monthly`.
    pub(crate) frequency: Option<String>,
    /// Typical amount.
    pub(crate) amount: Option<f64>,
    /// Whether the amount varies.
    #[serde(default, deserialize_with = "null_default")]
    pub(crate) is_approximate: bool,
    /// Merchant.
    pub(crate) merchant: Option<NamedRef>,
}

// ── Summaries ───────────────────────────────────────────────────────

/// `Web_GetCashFlowByCategory` payload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CategoryAggregates {
    /// One entry per category.
    #[serde(default, deserialize_with = "null_default")]
    pub(crate) by_category: Vec<CategoryAggregate>,
}

/// Aggregate of one category.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CategoryAggregate {
    /// Grouping key.
    pub(crate) group_by: Option<CategoryGrouping>,
    /// Totals.
    pub(crate) summary: Option<AggregateSummary>,
}

/// Grouping key of a category aggregate.
#[derive(Debug, Deserialize)]
pub(crate) struct CategoryGrouping {
    /// The category; absent for uncategorized transactions.
    pub(crate) category: Option<CategoryWithGroup>,
}

/// A category with its group.
#[derive(Debug, Deserialize)]
pub(crate) struct CategoryWithGroup {
    /// Category ID.
    pub(crate) id: Option<String>,
    /// Category name.
    pub(crate) name: Option<String>,
    /// Owning group.
    pub(crate) group: Option<GroupRef>,
}

/// Aggregated totals.
#[derive(Debug, Deserialize)]
pub(crate) struct AggregateSummary {
    /// Sum of amounts.
    pub(crate) sum: Option<f64>,
    /// Average amount.
    pub(crate) avg: Option<f64>,
    /// Number of transactions.
    pub(crate) count: Option<u64>,
}

// ── Tags ────────────────────────────────────────────────────────────

/// `GetHouseholdTransactionTags` payload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TagsPage {
    /// All tags.
    #[serde(default, deserialize_with = "null_default")]
    pub(crate) household_transaction_tags: Vec<Tag>,
}

/// A transaction tag.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Tag {
    /// Tag ID.
    pub(crate) id: Option<String>,
    /// Tag name.
    pub(crate) name: Option<String>,
    /// Hex colour.
    pub(crate) color: Option<String>,
    /// Sort order.
    pub(crate) order: Option<i64>,
    /// Number of tagged transactions.
    #[serde(default, deserialize_with = "null_default")]
    pub(crate) transaction_count: u64,
}

// ── Rules ───────────────────────────────────────────────────────────

/// `GetTransactionRules` payload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RulesPage {
    /// All rules in evaluation order.
    #[serde(default, deserialize_with = "null_default")]
    pub(crate) transaction_rules: Vec<Rule>,
}

/// A transaction rule. Criteria are passed through unchanged.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Rule {
    /// Rule ID.
    pub(crate) id: Option<String>,
    /// Evaluation order.
    pub(crate) order: Option<i64>,
    /// Match merchant criteria against the original statement.
    pub(crate) merchant_criteria_use_original_statement: Option<bool>,
    /// Merchant criteria.
    pub(crate) merchant_criteria: Option<Value>,
    /// Merchant-name criteria.
    pub(crate) merchant_name_criteria: Option<Value>,
    /// Original statement criteria.
    pub(crate) original_statement_criteria: Option<Value>,
    /// Amount criteria.
    pub(crate) amount_criteria: Option<Value>,
    /// Category IDs the rule matches.
    pub(crate) category_ids: Option<Value>,
    /// Account IDs the rule matches.
    pub(crate) account_ids: Option<Value>,
    /// Merchant assigned by the rule.
    pub(crate) set_merchant_action: Option<NamedRef>,
    /// Category assigned by the rule.
    pub(crate) set_category_action: Option<NamedRef>,
    /// Tags added by the rule.
    pub(crate) add_tags_action: Option<Vec<NamedRef>>,
    /// Goal linked by the rule.
    pub(crate) link_goal_action: Option<Value>,
    /// Hide-from-reports action.
    pub(crate) set_hide_from_reports_action: Option<bool>,
    /// Review status action.
    pub(crate) review_status_action: Option<String>,
    /// Recent application count.
    pub(crate) recent_application_count: Option<u64>,
    /// Last application time.
    pub(crate) last_applied_at: Option<String>,
}

/// Payload of a rule create or update mutation.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct RuleMutation {
    /// Mutation errors, if any.
    pub(crate) errors: Option<Value>,
}

impl RuleMutation {
    /// Returns the reported errors when they are non-empty.
    pub(crate) fn reported_errors(&self) -> Option<&Value> {
        non_empty_errors(self.errors.as_ref())
    }
}

/// Keeps `errors` unless it is null or an empty list or object.
fn non_empty_errors(errors: Option<&Value>) -> Option<&Value> {
    errors.filter(|value| match **value {
        Value::Null => false,
        Value::Array(ref list) => !list.is_empty(),
        Value::Object(ref map) => !map.is_empty(),
        Value::Bool(_) | Value::Number(_) | Value::String(_) => true,
    })
}

/// Payload of `deleteTransactionRule`.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct RuleDeletion {
    /// Whether the rule was deleted.
    #[serde(default, deserialize_with = "null_default")]
    pub(crate) deleted: bool,
    /// Mutation errors, if any.
    pub(crate) errors: Option<Value>,
}

impl RuleDeletion {
    /// Returns the reported errors when they are non-empty.
    pub(crate) fn reported_errors(&self) -> Option<&Value> {
        non_empty_errors(self.errors.as_ref())
    }
}

// ── Categories ──────────────────────────────────────────────────────

/// `GetCategories` payload.
#[derive(Debug, Deserialize)]
pub(crate) struct CategoriesPage {
    /// All categories.
    #[serde(default, deserialize_with = "null_default")]
    pub(crate) categories: Vec<Category>,
}

/// A transaction category.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Category {
    /// Category ID.
    pub(crate) id: Option<String>,
    /// Category name.
    pub(crate) name: Option<String>,
    /// Emoji icon.
    pub(crate) icon: Option<String>,
    /// Owning group.
    pub(crate) group: Option<GroupRef>,
    /// Built-in category.
    #[serde(default, deserialize_with = "null_default")]
    pub(crate) is_system_category: bool,
    /// Disabled category.
    #[serde(default, deserialize_with = "null_default")]
    pub(crate) is_disabled: bool,
}

/// `ManageGetCategoryGroups` payload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CategoryGroupsPage {
    /// All category groups.
    #[serde(default, deserialize_with = "null_default")]
    pub(crate) category_groups: Vec<CategoryGroup>,
}

/// A category group with its categories.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CategoryGroup {
    /// Group ID.
    pub(crate) id: Option<String>,
    /// Group name.
    pub(crate) name: Option<String>,
    /// `income`, `expense` or `transfer`.
    #[serde(rename = "type")]
    pub(crate) kind: Option<String>,
    /// Budget variability label.
    pub(crate) budget_variability: Option<String>,
    /// Whether the group is budgeted as a whole.
    #[serde(default, deserialize_with = "null_default")]
    pub(crate) group_level_budgeting_enabled: bool,
    /// Categories in the group.
    #[serde(default, deserialize_with = "null_default")]
    pub(crate) categories: Vec<NamedRef>,
}

// ── Budgets ─────────────────────────────────────────────────────────

/// `GetJointPlanningData` payload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BudgetPage {
    /// Budget amounts.
    pub(crate) budget_data: Option<BudgetData>,
    /// Category groups, used to name budgeted categories.
    #[serde(default, deserialize_with = "null_default")]
    pub(crate) category_groups: Vec<CategoryGroup>,
}

/// Budget amounts by category and month.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BudgetData {
    /// Per-category monthly amounts.
    #[serde(default, deserialize_with = "null_default")]
    pub(crate) monthly_amounts_by_category: Vec<CategoryMonthlyAmounts>,
    /// Totals per month.
    #[serde(default, deserialize_with = "null_default")]
    pub(crate) totals_by_month: Vec<MonthTotals>,
}

/// Monthly amounts of one category.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CategoryMonthlyAmounts {
    /// The category.
    pub(crate) category: Option<NamedRef>,
    /// One entry per month.
    #[serde(default, deserialize_with = "null_default")]
    pub(crate) monthly_amounts: Vec<MonthlyAmount>,
}

/// Budgeted and actual amounts of one category in one month.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MonthlyAmount {
    /// First day of the month.
    pub(crate) month: Option<String>,
    /// Budgeted amount.
    pub(crate) planned_cash_flow_amount: Option<f64>,
    /// Actual amount.
    pub(crate) actual_amount: Option<f64>,
    /// Remaining amount.
    pub(crate) remaining_amount: Option<f64>,
    /// Amount rolled over from the previous month.
    pub(crate) previous_month_rollover_amount: Option<f64>,
}

/// Budget totals of one month.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MonthTotals {
    /// First day of the month.
    pub(crate) month: Option<String>,
    /// Expense totals.
    pub(crate) total_expenses: Option<BudgetTotals>,
}

/// Planned and actual totals.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BudgetTotals {
    /// Budgeted amount.
    pub(crate) planned_amount: Option<f64>,
    /// Actual amount.
    pub(crate) actual_amount: Option<f64>,
}

// ── Net worth ───────────────────────────────────────────────────────

/// `GetAggregateSnapshots` payload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AggregateSnapshots {
    /// Daily net worth, oldest first.
    #[serde(default, deserialize_with = "null_default")]
    pub(crate) aggregate_snapshots: Vec<NetWorthSnapshot>,
}

/// Net worth on one day.
#[derive(Debug, Deserialize)]
pub(crate) struct NetWorthSnapshot {
    /// Snapshot date.
    pub(crate) date: Option<String>,
    /// Net worth.
    pub(crate) balance: Option<f64>,
}

/// `GetSnapshotsByAccountType` payload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SnapshotsByType {
    /// Flat list of per-type balances.
    #[serde(default, deserialize_with = "null_default")]
    pub(crate) snapshots_by_account_type: Vec<TypeSnapshot>,
}

/// Balance of one account type in one period.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TypeSnapshot {
    /// Account type, e.g. `depository`.
    pub(crate) account_type: Option<String>,
    /// First day of the period.
    pub(crate) month: Option<String>,
    /// Balance.
    pub(crate) balance: Option<f64>,
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::missing_docs_in_private_items,
    reason = "test code uses expect for readability"
)]
mod tests {
    use serde_json::json;

    use super::{AccountsPage, RuleMutation, TransactionsPage};

    #[test]
    fn nulls_and_missing_fields_are_tolerated() {
        let page: TransactionsPage = serde_json::from_value(json!({
            "allTransactions": {
                "results": [{
                    "id": "t1",
                    "needsReview": null,
                    "tags": null,
                    "category": null
                }]
            }
        }))
        .expect("should deserialize");
        let results = page.into_results();
        assert_eq!(results.len(), 1);
        let first = results.first().expect("one transaction");
        assert!(!first.needs_review);
        assert!(first.tags.is_empty());
        assert!(!first.is_categorized());
    }

    #[test]
    fn missing_collection_is_empty() {
        let page: AccountsPage = serde_json::from_value(json!({})).expect("should deserialize");
        assert!(page.accounts.is_empty());
        let page: TransactionsPage =
            serde_json::from_value(json!({"allTransactions": null})).expect("should deserialize");
        assert!(page.into_results().is_empty());
    }

    #[test]
    fn empty_rule_errors_are_not_reported() {
        let empty: RuleMutation =
            serde_json::from_value(json!({"errors": null})).expect("should deserialize");
        assert!(empty.reported_errors().is_none());
        let listed: RuleMutation =
            serde_json::from_value(json!({"errors": []})).expect("should deserialize");
        assert!(listed.reported_errors().is_none());
        let failed: RuleMutation = serde_json::from_value(json!({
            "errors": {"message": "Invalid merchant", "code": "BAD_INPUT"}
        }))
        .expect("should deserialize");
        assert!(failed.reported_errors().is_some());
    }
}
