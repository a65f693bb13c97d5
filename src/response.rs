//! Response structs for MCP tool outputs.
//!
//! Remote shapes from [`crate::models`] are flattened into snake_case
//! structs that are easier for LLM assistants to read. Amounts and dates are
//! copied as provided; only aggregates (totals, changes, extremes) are
//! computed here.

use std::collections::HashMap;
use std::path::Path;

use secrecy::ExposeSecret;
use serde::Serialize;
use serde_json::Value;

use crate::models::{
    Account, BalanceSnapshot, BudgetPage, Category, CategoryAggregate, CategoryGroup,
    NetWorthSnapshot, RecurringItem, Rule, Tag, Transaction, TypeSnapshot,
};
use crate::session::{Session, SessionStatus};

/// Number of net worth snapshots returned by `get_net_worth`.
const NET_WORTH_SNAPSHOT_LIMIT: usize = 365;

/// Returns the name of an optional named reference.
fn name_of(reference: Option<&crate::models::NamedRef>) -> Option<String> {
    reference.and_then(|named| named.name.clone())
}

// ── Accounts ────────────────────────────────────────────────────────

/// Account summary.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct AccountResponse {
    /// Account ID.
    id: Option<String>,
    /// Display name, falling back to the raw name.
    name: Option<String>,
    /// Account type name.
    #[serde(rename = "type")]
    kind: Option<String>,
    /// Current balance.
    balance: Option<f64>,
    /// Institution name.
    institution: Option<String>,
    /// Whether the account is active.
    is_active: bool,
}

impl AccountResponse {
    /// Creates an account summary from a raw account.
    pub(crate) fn from_account(account: &Account) -> Self {
        Self {
            id: account.id.clone(),
            name: account
                .display_name
                .clone()
                .filter(|name| !name.is_empty())
                .or_else(|| account.name.clone()),
            kind: name_of(account.kind.as_ref()),
            balance: account.current_balance,
            institution: name_of(account.institution.as_ref()),
            is_active: account
                .is_active
                .unwrap_or_else(|| account.deactivated_at.is_none()),
        }
    }
}

/// First, last and extreme values of a series.
#[derive(Debug, Clone, Copy, PartialEq)]
struct SeriesStats {
    /// Oldest value.
    first: f64,
    /// Newest value.
    last: f64,
    /// Largest value.
    highest: f64,
    /// Smallest value.
    lowest: f64,
}

impl SeriesStats {
    /// Computes statistics over `values`, or `None` if there are none.
    fn of<I: IntoIterator<Item = f64>>(values: I) -> Option<Self> {
        let mut iter = values.into_iter();
        let first = iter.next()?;
        Some(iter.fold(
            Self {
                first,
                last: first,
                highest: first,
                lowest: first,
            },
            |stats, value| Self {
                first: stats.first,
                last: value,
                highest: stats.highest.max(value),
                lowest: stats.lowest.min(value),
            },
        ))
    }

    /// Difference between the newest and oldest value.
    fn change(self) -> f64 {
        self.last - self.first
    }

    /// Change relative to the oldest value, in percent; zero from a zero base.
    fn change_percent(self) -> f64 {
        if self.first.abs() > f64::EPSILON {
            self.change() / self.first * 100.0
        } else {
            0.0
        }
    }
}

/// Balance statistics of an account.
#[derive(Debug, Clone, Serialize)]
struct BalanceStats {
    /// Newest balance.
    current_balance: f64,
    /// Oldest balance.
    earliest_balance: f64,
    /// Newest minus oldest.
    change: f64,
    /// Highest balance.
    highest: f64,
    /// Lowest balance.
    lowest: f64,
}

/// One point of an account's balance history.
#[derive(Debug, Clone, Serialize)]
struct BalancePoint {
    /// Snapshot date.
    date: Option<String>,
    /// Balance.
    balance: Option<f64>,
}

/// Balance history of one account.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct BalanceHistoryResponse {
    /// Account ID as requested.
    account_id: String,
    /// Number of snapshots.
    snapshot_count: usize,
    /// Statistics, present when any balance is known.
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    stats: Option<BalanceStats>,
    /// All snapshots, oldest first.
    snapshots: Vec<BalancePoint>,
}

impl BalanceHistoryResponse {
    /// Creates a history response from raw snapshots.
    pub(crate) fn from_snapshots(account_id: String, snapshots: &[BalanceSnapshot]) -> Self {
        let stats = SeriesStats::of(snapshots.iter().filter_map(|s| s.signed_balance)).map(
            |stats| BalanceStats {
                current_balance: stats.last,
                earliest_balance: stats.first,
                change: stats.change(),
                highest: stats.highest,
                lowest: stats.lowest,
            },
        );
        Self {
            account_id,
            snapshot_count: snapshots.len(),
            stats,
            snapshots: snapshots
                .iter()
                .map(|snapshot| BalancePoint {
                    date: snapshot.date.clone(),
                    balance: snapshot.signed_balance,
                })
                .collect(),
        }
    }
}

// ── Transactions ────────────────────────────────────────────────────

/// Compact transaction returned by `get_transactions`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct TransactionSummary {
    /// Transaction ID.
    id: Option<String>,
    /// Posting date.
    date: Option<String>,
    /// Signed amount.
    amount: Option<f64>,
    /// Statement description.
    description: Option<String>,
    /// Category name.
    category: Option<String>,
    /// Account display name.
    account: Option<String>,
    /// Merchant name.
    merchant: Option<String>,
    /// Pending flag.
    is_pending: bool,
}

impl TransactionSummary {
    /// Creates a compact transaction from a raw transaction.
    pub(crate) fn from_transaction(tx: &Transaction) -> Self {
        Self {
            id: tx.id.clone(),
            date: tx.date.clone(),
            amount: tx.amount,
            description: statement_name(tx),
            category: name_of(tx.category.as_ref()),
            account: tx
                .account
                .as_ref()
                .and_then(|account| account.display_name.clone()),
            merchant: name_of(tx.merchant.as_ref()),
            is_pending: tx.pending,
        }
    }
}

/// Statement description, preferring the data provider's name.
fn statement_name(tx: &Transaction) -> Option<String> {
    tx.plaid_name
        .clone()
        .filter(|name| !name.is_empty())
        .or_else(|| tx.original_name.clone())
}

/// Tag reference inside a transaction.
#[derive(Debug, Clone, Serialize)]
struct TagRef {
    /// Tag ID.
    id: Option<String>,
    /// Tag name.
    name: Option<String>,
}

/// Extra flags returned by `search_transactions`.
#[derive(Debug, Clone, Serialize)]
struct TransactionFlags {
    /// Split flag.
    is_split: bool,
    /// Recurring flag.
    is_recurring: bool,
    /// Whether any file is attached.
    has_attachments: bool,
}

/// Detailed transaction for search and review tools.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct TransactionResponse {
    /// Transaction ID.
    id: Option<String>,
    /// Posting date.
    date: Option<String>,
    /// Signed amount.
    amount: Option<f64>,
    /// Merchant name.
    merchant: Option<String>,
    /// Statement description.
    original_name: Option<String>,
    /// Category name.
    category: Option<String>,
    /// Category ID.
    category_id: Option<String>,
    /// Account display name.
    account: Option<String>,
    /// Account ID.
    account_id: Option<String>,
    /// User notes.
    notes: Option<String>,
    /// Review flag.
    needs_review: bool,
    /// Pending flag.
    is_pending: bool,
    /// Hidden from reports.
    hide_from_reports: bool,
    /// Applied tags.
    tags: Vec<TagRef>,
    /// Extended flags, only for search results.
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    flags: Option<TransactionFlags>,
}

impl TransactionResponse {
    /// Creates a detailed transaction without extended flags.
    pub(crate) fn from_transaction(tx: &Transaction) -> Self {
        Self {
            id: tx.id.clone(),
            date: tx.date.clone(),
            amount: tx.amount,
            merchant: name_of(tx.merchant.as_ref()),
            original_name: statement_name(tx),
            category: name_of(tx.category.as_ref()),
            category_id: tx.category.as_ref().and_then(|category| category.id.clone()),
            account: tx
                .account
                .as_ref()
                .and_then(|account| account.display_name.clone()),
            account_id: tx.account.as_ref().and_then(|account| account.id.clone()),
            notes: tx.notes.clone(),
            needs_review: tx.needs_review,
            is_pending: tx.pending,
            hide_from_reports: tx.hide_from_reports,
            tags: tx
                .tags
                .iter()
                .map(|tag| TagRef {
                    id: tag.id.clone(),
                    name: tag.name.clone(),
                })
                .collect(),
            flags: None,
        }
    }

    /// Creates a detailed transaction including split, recurring and
    /// attachment flags.
    pub(crate) fn extended(tx: &Transaction) -> Self {
        Self {
            flags: Some(TransactionFlags {
                is_split: tx.is_split_transaction,
                is_recurring: tx.is_recurring,
                has_attachments: !tx.attachments.is_empty(),
            }),
            ..Self::from_transaction(tx)
        }
    }
}

/// Stream of a recurring item.
#[derive(Debug, Clone, Serialize)]
struct StreamResponse {
    /// Stream ID.
    id: Option<String>,
    /// Frequency label.
    frequency: Option<String>,
    /// Typical amount.
    amount: Option<f64>,
    /// Whether the amount varies.
    is_approximate: bool,
    /// Merchant name.
    merchant: Option<String>,
}

/// One recurring transaction occurrence.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct RecurringResponse {
    /// Expected date.
    date: Option<String>,
    /// Expected amount.
    amount: Option<f64>,
    /// Whether the date has passed.
    is_past: bool,
    /// Matched transaction.
    transaction_id: Option<String>,
    /// Owning stream.
    stream: Option<StreamResponse>,
    /// Category name.
    category: Option<String>,
    /// Account display name.
    account: Option<String>,
}

impl RecurringResponse {
    /// Creates a recurring item response from a raw item.
    pub(crate) fn from_item(item: &RecurringItem) -> Self {
        Self {
            date: item.date.clone(),
            amount: item.amount,
            is_past: item.is_past,
            transaction_id: item.transaction_id.clone(),
            stream: item.stream.as_ref().map(|stream| StreamResponse {
                id: stream.id.clone(),
                frequency: stream.frequency.clone(),
                amount: stream.amount,
                is_approximate: stream.is_approximate,
                merchant: name_of(stream.merchant.as_ref()),
            }),
            category: name_of(item.category.as_ref()),
            account: item
                .account
                .as_ref()
                .and_then(|account| account.display_name.clone()),
        }
    }
}

/// Failure of one update in a bulk operation.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct BulkError {
    /// Transaction that failed.
    transaction_id: String,
    /// Error message.
    error: String,
}

/// Outcome of `bulk_categorize_transactions`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct BulkCategorizeResponse {
    /// Number of requested updates.
    total: usize,
    /// Number of successful updates.
    successful: usize,
    /// Number of failed updates.
    failed: usize,
    /// Failures in input order.
    errors: Vec<BulkError>,
}

impl BulkCategorizeResponse {
    /// Tallies per-transaction outcomes, preserving input order.
    pub(crate) fn from_outcomes<I, E>(outcomes: I) -> Self
    where
        I: IntoIterator<Item = (String, Result<(), E>)>,
        E: core::fmt::Display,
    {
        let mut response = Self {
            total: 0,
            successful: 0,
            failed: 0,
            errors: Vec::new(),
        };
        for (transaction_id, outcome) in outcomes {
            response.total += 1;
            match outcome {
                Ok(()) => response.successful += 1,
                Err(err) => {
                    response.failed += 1;
                    response.errors.push(BulkError {
                        transaction_id,
                        error: err.to_string(),
                    });
                }
            }
        }
        response
    }
}

// ── Summaries ───────────────────────────────────────────────────────

/// Requested period of a summary.
#[derive(Debug, Clone, Serialize)]
struct Period {
    /// Start date as given.
    start_date: Option<String>,
    /// End date as given.
    end_date: Option<String>,
}

/// Spending of one category.
#[derive(Debug, Clone, Serialize)]
struct CategorySpending {
    /// Category name.
    category: String,
    /// Category ID.
    category_id: Option<String>,
    /// Group name.
    group: Option<String>,
    /// Sum of amounts.
    sum: f64,
    /// Average amount.
    avg: f64,
    /// Number of transactions.
    count: u64,
}

/// Outcome of `get_spending_summary`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct SpendingSummaryResponse {
    /// Requested period.
    period: Period,
    /// Sum of positive category totals.
    total_income: f64,
    /// Sum of absolute negative category totals.
    total_expenses: f64,
    /// Income minus expenses.
    net: f64,
    /// Categories by descending absolute sum.
    by_category: Vec<CategorySpending>,
}

impl SpendingSummaryResponse {
    /// Builds the summary, keeping the `limit` largest categories.
    ///
    /// Totals cover every category, including those cut by `limit`.
    pub(crate) fn from_aggregates(
        start_date: Option<String>,
        end_date: Option<String>,
        aggregates: &[CategoryAggregate],
        limit: usize,
    ) -> Self {
        let mut by_category: Vec<CategorySpending> = aggregates
            .iter()
            .map(|aggregate| {
                let category = aggregate
                    .group_by
                    .as_ref()
                    .and_then(|group_by| group_by.category.as_ref());
                let summary = aggregate.summary.as_ref();
                CategorySpending {
                    category: category
                        .and_then(|category| category.name.clone())
                        .unwrap_or_else(|| "Uncategorized".to_owned()),
                    category_id: category.and_then(|category| category.id.clone()),
                    group: category
                        .and_then(|category| category.group.as_ref())
                        .and_then(|group| group.name.clone()),
                    sum: summary.and_then(|s| s.sum).unwrap_or_default(),
                    avg: summary.and_then(|s| s.avg).unwrap_or_default(),
                    count: summary.and_then(|s| s.count).unwrap_or_default(),
                }
            })
            .collect();

        let total_income: f64 = by_category
            .iter()
            .map(|item| item.sum)
            .filter(|sum| *sum > 0.0)
            .sum();
        let total_expenses: f64 = by_category
            .iter()
            .map(|item| item.sum)
            .filter(|sum| *sum <= 0.0)
            .map(f64::abs)
            .sum();

        by_category.sort_by(|a, b| b.sum.abs().total_cmp(&a.sum.abs()));
        by_category.truncate(limit);

        Self {
            period: Period {
                start_date,
                end_date,
            },
            total_income,
            total_expenses,
            net: total_income - total_expenses,
            by_category,
        }
    }
}

// ── Splits ──────────────────────────────────────────────────────────

/// Outcome of `split_transaction`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct SplitResponse {
    /// Always `true`; failures are reported as tool errors.
    success: bool,
    /// Human-readable summary.
    message: String,
    /// Remote response with the resulting splits.
    splits: Value,
}

impl SplitResponse {
    /// Describes a split into `part_count` parts; zero means removal.
    pub(crate) fn new(part_count: usize, splits: Value) -> Self {
        let message = if part_count == 0 {
            "Splits removed from transaction".to_owned()
        } else {
            format!("Transaction split into {part_count} parts")
        };
        Self {
            success: true,
            message,
            splits,
        }
    }
}

// ── Tags ────────────────────────────────────────────────────────────

/// Tag summary.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct TagResponse {
    /// Tag ID.
    id: Option<String>,
    /// Tag name.
    name: Option<String>,
    /// Hex colour.
    color: Option<String>,
    /// Sort order.
    order: Option<i64>,
    /// Number of tagged transactions.
    transaction_count: u64,
}

impl TagResponse {
    /// Creates a tag summary from a raw tag.
    pub(crate) fn from_tag(tag: &Tag) -> Self {
        Self {
            id: tag.id.clone(),
            name: tag.name.clone(),
            color: tag.color.clone(),
            order: tag.order,
            transaction_count: tag.transaction_count,
        }
    }
}

// ── Rules ───────────────────────────────────────────────────────────

/// ID and name of an entity set by a rule action.
#[derive(Debug, Clone, Serialize)]
struct ActionTarget {
    /// Entity ID.
    id: Option<String>,
    /// Entity name.
    name: Option<String>,
}

impl ActionTarget {
    /// Copies the ID and name of a named reference.
    fn from_ref(named: &crate::models::NamedRef) -> Self {
        Self {
            id: named.id.clone(),
            name: named.name.clone(),
        }
    }
}

/// Transaction rule summary.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct RuleResponse {
    /// Rule ID.
    id: Option<String>,
    /// Evaluation order.
    order: Option<i64>,
    /// Merchant criteria.
    merchant_criteria: Option<Value>,
    /// Merchant-name criteria.
    merchant_name_criteria: Option<Value>,
    /// Original statement criteria.
    original_statement_criteria: Option<Value>,
    /// Amount criteria.
    amount_criteria: Option<Value>,
    /// Matched category IDs.
    category_ids: Option<Value>,
    /// Matched account IDs.
    account_ids: Option<Value>,
    /// Match against the original statement.
    use_original_statement: Option<bool>,
    /// Category set by the rule.
    set_category_action: Option<ActionTarget>,
    /// Merchant set by the rule.
    set_merchant_action: Option<ActionTarget>,
    /// Tags added by the rule.
    add_tags_action: Option<Vec<ActionTarget>>,
    /// Goal linked by the rule.
    link_goal_action: Option<Value>,
    /// Hide-from-reports action.
    hide_from_reports_action: Option<bool>,
    /// Review status action.
    review_status_action: Option<String>,
    /// Recent application count.
    recent_application_count: Option<u64>,
    /// Last application time.
    last_applied_at: Option<String>,
}

impl RuleResponse {
    /// Creates a rule summary from a raw rule.
    pub(crate) fn from_rule(rule: &Rule) -> Self {
        Self {
            id: rule.id.clone(),
            order: rule.order,
            merchant_criteria: rule.merchant_criteria.clone(),
            merchant_name_criteria: rule.merchant_name_criteria.clone(),
            original_statement_criteria: rule.original_statement_criteria.clone(),
            amount_criteria: rule.amount_criteria.clone(),
            category_ids: rule.category_ids.clone(),
            account_ids: rule.account_ids.clone(),
            use_original_statement: rule.merchant_criteria_use_original_statement,
            set_category_action: rule.set_category_action.as_ref().map(ActionTarget::from_ref),
            set_merchant_action: rule.set_merchant_action.as_ref().map(ActionTarget::from_ref),
            add_tags_action: rule
                .add_tags_action
                .as_ref()
                .filter(|tags| !tags.is_empty())
                .map(|tags| tags.iter().map(ActionTarget::from_ref).collect()),
            link_goal_action: rule.link_goal_action.clone(),
            hide_from_reports_action: rule.set_hide_from_reports_action,
            review_status_action: rule.review_status_action.clone(),
            recent_application_count: rule.recent_application_count,
            last_applied_at: rule.last_applied_at.clone(),
        }
    }
}

/// Outcome of a mutation that reports errors in its payload.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct MutationOutcome {
    /// Whether the mutation succeeded.
    success: bool,
    /// Human-readable summary.
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    /// Raw remote response.
    #[serde(skip_serializing_if = "Option::is_none")]
    response: Option<Value>,
    /// Errors reported by the remote service.
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<Value>,
}

impl MutationOutcome {
    /// A successful mutation and its raw response.
    pub(crate) fn succeeded<M: Into<String>>(message: M, response: Value) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            response: Some(response),
            errors: None,
        }
    }

    /// A mutation rejected with `errors`.
    pub(crate) const fn rejected(errors: Value) -> Self {
        Self {
            success: false,
            message: None,
            response: None,
            errors: Some(errors),
        }
    }

    /// A mutation that neither succeeded nor reported errors.
    pub(crate) fn unknown() -> Self {
        Self {
            success: false,
            message: Some("Unknown error".to_owned()),
            response: None,
            errors: None,
        }
    }
}

// ── Categories ──────────────────────────────────────────────────────

/// Category summary.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct CategoryResponse {
    /// Category ID.
    id: Option<String>,
    /// Category name.
    name: Option<String>,
    /// Emoji icon.
    icon: Option<String>,
    /// Group name.
    group: Option<String>,
    /// Group ID.
    group_id: Option<String>,
    /// Group kind: `income`, `expense` or `transfer`.
    group_type: Option<String>,
    /// Built-in category.
    is_system_category: bool,
    /// Disabled category.
    is_disabled: bool,
}

impl CategoryResponse {
    /// Creates a category summary from a raw category.
    pub(crate) fn from_category(category: &Category) -> Self {
        Self {
            id: category.id.clone(),
            name: category.name.clone(),
            icon: category.icon.clone(),
            group: category.group.as_ref().and_then(|group| group.name.clone()),
            group_id: category.group.as_ref().and_then(|group| group.id.clone()),
            group_type: category.group.as_ref().and_then(|group| group.kind.clone()),
            is_system_category: category.is_system_category,
            is_disabled: category.is_disabled,
        }
    }
}

/// Category inside a group summary.
#[derive(Debug, Clone, Serialize)]
struct GroupMember {
    /// Category ID.
    id: Option<String>,
    /// Category name.
    name: Option<String>,
    /// Emoji icon.
    icon: Option<String>,
}

/// Category group summary.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct CategoryGroupResponse {
    /// Group ID.
    id: Option<String>,
    /// Group name.
    name: Option<String>,
    /// Group kind.
    #[serde(rename = "type")]
    kind: Option<String>,
    /// Budget variability label.
    budget_variability: Option<String>,
    /// Whether the group is budgeted as a whole.
    group_level_budgeting_enabled: bool,
    /// Member categories.
    categories: Vec<GroupMember>,
}

impl CategoryGroupResponse {
    /// Creates a group summary from a raw group.
    pub(crate) fn from_group(group: &CategoryGroup) -> Self {
        Self {
            id: group.id.clone(),
            name: group.name.clone(),
            kind: group.kind.clone(),
            budget_variability: group.budget_variability.clone(),
            group_level_budgeting_enabled: group.group_level_budgeting_enabled,
            categories: group
                .categories
                .iter()
                .map(|category| GroupMember {
                    id: category.id.clone(),
                    name: category.name.clone(),
                    icon: category.icon.clone(),
                })
                .collect(),
        }
    }
}

// ── Budgets ─────────────────────────────────────────────────────────

/// Name, icon and group of a category.
#[derive(Debug, Clone, Default)]
struct CategoryInfo {
    /// Category name.
    name: Option<String>,
    /// Emoji icon.
    icon: Option<String>,
    /// Group name.
    group: Option<String>,
}

/// Category ID → display information, built from category groups.
#[derive(Debug, Default)]
struct CategoryLookup {
    /// Known categories.
    categories: HashMap<String, CategoryInfo>,
}

impl CategoryLookup {
    /// Indexes every category of `groups`.
    fn from_groups(groups: &[CategoryGroup]) -> Self {
        let mut lookup = Self::default();
        for group in groups {
            for category in &group.categories {
                if let Some(id) = category.id.as_ref() {
                    let _existed = lookup.categories.insert(
                        id.clone(),
                        CategoryInfo {
                            name: category.name.clone(),
                            icon: category.icon.clone(),
                            group: group.name.clone(),
                        },
                    );
                }
            }
        }
        lookup
    }

    /// Resolves a category ID, yielding empty information when unknown.
    fn get(&self, id: Option<&str>) -> CategoryInfo {
        id.and_then(|id| self.categories.get(id))
            .cloned()
            .unwrap_or_default()
    }
}

/// Budget of one category in one month.
#[derive(Debug, Clone, Serialize)]
struct BudgetCategoryResponse {
    /// Category ID.
    category_id: Option<String>,
    /// Category name.
    category_name: Option<String>,
    /// Emoji icon.
    category_icon: Option<String>,
    /// Group name.
    group: Option<String>,
    /// Budgeted amount.
    budgeted: Option<f64>,
    /// Actual amount.
    spent: Option<f64>,
    /// Remaining amount.
    remaining: Option<f64>,
    /// Amount rolled over from the previous month.
    rollover: Option<f64>,
}

/// Budget of one month.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct BudgetMonthResponse {
    /// First day of the month.
    month: String,
    /// Total budgeted expenses.
    total_budgeted: Option<f64>,
    /// Total actual expenses.
    total_spent: Option<f64>,
    /// Per-category budgets.
    categories: Vec<BudgetCategoryResponse>,
}

impl BudgetMonthResponse {
    /// Reshapes budget data into one entry per month.
    ///
    /// Months follow the remote totals order; months that only appear in
    /// category amounts are appended in first-seen order.
    pub(crate) fn from_page(page: &BudgetPage) -> Vec<Self> {
        let lookup = CategoryLookup::from_groups(&page.category_groups);
        let Some(data) = page.budget_data.as_ref() else {
            return Vec::new();
        };

        let mut months: Vec<Self> = data
            .totals_by_month
            .iter()
            .filter_map(|totals| {
                let month = totals.month.clone()?;
                let expenses = totals.total_expenses.as_ref();
                Some(Self {
                    month,
                    total_budgeted: expenses.and_then(|e| e.planned_amount),
                    total_spent: expenses.and_then(|e| e.actual_amount),
                    categories: Vec::new(),
                })
            })
            .collect();

        for entry in &data.monthly_amounts_by_category {
            let category_id = entry.category.as_ref().and_then(|c| c.id.clone());
            let info = lookup.get(category_id.as_deref());
            for amount in &entry.monthly_amounts {
                let Some(month) = amount.month.as_ref() else {
                    continue;
                };
                let index = match months.iter().position(|m| &m.month == month) {
                    Some(index) => index,
                    None => {
                        months.push(Self {
                            month: month.clone(),
                            total_budgeted: None,
                            total_spent: None,
                            categories: Vec::new(),
                        });
                        months.len() - 1
                    }
                };
                if let Some(target) = months.get_mut(index) {
                    target.categories.push(BudgetCategoryResponse {
                        category_id: category_id.clone(),
                        category_name: info.name.clone(),
                        category_icon: info.icon.clone(),
                        group: info.group.clone(),
                        budgeted: amount.planned_cash_flow_amount,
                        spent: amount.actual_amount,
                        remaining: amount.remaining_amount,
                        rollover: amount.previous_month_rollover_amount,
                    });
                }
            }
        }
        months
    }
}

/// Outcome of `set_budget_amount`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct BudgetUpdateResponse {
    /// Always `true`; failures are reported as tool errors.
    success: bool,
    /// Human-readable summary.
    message: String,
    /// Remote response.
    result: Value,
}

impl BudgetUpdateResponse {
    /// Describes a budget of `amount`, optionally repeated for future months.
    pub(crate) fn new(amount: f64, apply_to_future: bool, result: Value) -> Self {
        let scope = if apply_to_future {
            " for all future months"
        } else {
            ""
        };
        Self {
            success: true,
            message: format!("Budget set to ${amount:.2}{scope}"),
            result,
        }
    }
}

// ── Net worth ───────────────────────────────────────────────────────

/// Net worth statistics.
#[derive(Debug, Clone, Serialize)]
struct NetWorthStats {
    /// Newest net worth.
    current_net_worth: f64,
    /// Oldest net worth.
    earliest_net_worth: f64,
    /// Newest minus oldest.
    change: f64,
    /// Change relative to the oldest value, in percent.
    change_percent: f64,
    /// Highest net worth.
    highest: f64,
    /// Lowest net worth.
    lowest: f64,
}

/// Net worth on one day.
#[derive(Debug, Clone, Serialize)]
struct NetWorthPoint {
    /// Snapshot date.
    date: Option<String>,
    /// Net worth.
    net_worth: Option<f64>,
}

/// Outcome of `get_net_worth`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct NetWorthResponse {
    /// Number of snapshots received.
    snapshot_count: usize,
    /// Statistics over every snapshot.
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    stats: Option<NetWorthStats>,
    /// The most recent snapshots, oldest first.
    snapshots: Vec<NetWorthPoint>,
}

impl NetWorthResponse {
    /// Builds the response from daily snapshots.
    pub(crate) fn from_snapshots(snapshots: &[NetWorthSnapshot]) -> Self {
        let stats =
            SeriesStats::of(snapshots.iter().filter_map(|s| s.balance)).map(|stats| NetWorthStats {
                current_net_worth: stats.last,
                earliest_net_worth: stats.first,
                change: stats.change(),
                change_percent: stats.change_percent(),
                highest: stats.highest,
                lowest: stats.lowest,
            });
        let recent = snapshots
            .get(snapshots.len().saturating_sub(NET_WORTH_SNAPSHOT_LIMIT)..)
            .unwrap_or_default();
        Self {
            snapshot_count: snapshots.len(),
            stats,
            snapshots: recent
                .iter()
                .map(|snapshot| NetWorthPoint {
                    date: snapshot.date.clone(),
                    net_worth: snapshot.balance,
                })
                .collect(),
        }
    }
}

/// Balance of an account type in one period.
#[derive(Debug, Clone, Serialize)]
struct TypePoint {
    /// First day of the period.
    month: Option<String>,
    /// Balance.
    balance: Option<f64>,
}

/// History of one account type.
#[derive(Debug, Clone, Serialize)]
struct AccountTypeResponse {
    /// Account type.
    #[serde(rename = "type")]
    kind: Option<String>,
    /// Balances, oldest first.
    snapshots: Vec<TypePoint>,
    /// Balance of the newest period.
    #[serde(skip_serializing_if = "Option::is_none")]
    current_balance: Option<f64>,
}

/// Outcome of `get_net_worth_by_account_type`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct NetWorthByTypeResponse {
    /// `month` or `year`.
    timeframe: &'static str,
    /// Start date as given.
    start_date: String,
    /// One entry per account type, in first-seen order.
    account_types: Vec<AccountTypeResponse>,
    /// Sum of the current balances.
    total_net_worth: f64,
}

impl NetWorthByTypeResponse {
    /// Groups a flat snapshot list by account type.
    pub(crate) fn from_snapshots(
        timeframe: &'static str,
        start_date: String,
        snapshots: &[TypeSnapshot],
    ) -> Self {
        let mut account_types: Vec<AccountTypeResponse> = Vec::new();
        for snapshot in snapshots {
            let point = TypePoint {
                month: snapshot.month.clone(),
                balance: snapshot.balance,
            };
            match account_types
                .iter_mut()
                .find(|entry| entry.kind == snapshot.account_type)
            {
                Some(entry) => entry.snapshots.push(point),
                None => account_types.push(AccountTypeResponse {
                    kind: snapshot.account_type.clone(),
                    snapshots: vec![point],
                    current_balance: None,
                }),
            }
        }
        for entry in &mut account_types {
            entry.current_balance = entry.snapshots.last().and_then(|point| point.balance);
        }
        let total_net_worth = account_types
            .iter()
            .filter_map(|entry| entry.current_balance)
            .sum();
        Self {
            timeframe,
            start_date,
            account_types,
            total_net_worth,
        }
    }
}

// ── Authentication ──────────────────────────────────────────────────

/// Outcome of `setup_authentication`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct SetupInstructions {
    /// Where the server looks for the session.
    session_path: String,
    /// Steps to create a session.
    steps: [&'static str; 4],
}

impl SetupInstructions {
    /// Instructions for a session stored at `session_path`.
    pub(crate) fn new(session_path: &Path) -> Self {
        Self {
            session_path: session_path.display().to_string(),
            steps: [
                "Sign in to app.monarch.com in a browser.",
                "Copy the session token from the browser's developer tools (the `Authorization: Token ...` request header).",
                "Run `monarch-mcp import-token` in a terminal and paste the token on standard input.",
                "Call check_auth_status, then get_accounts to test the connection.",
            ],
        }
    }
}

/// Outcome of `check_auth_status`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct AuthStatusResponse {
    /// Whether a usable session is stored.
    authenticated: bool,
    /// Local session status.
    status: SessionStatus,
    /// Where the server looks for the session.
    session_path: String,
    /// Account email from `MONARCH_EMAIL`.
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    /// Suggested next step.
    hint: &'static str,
}

impl AuthStatusResponse {
    /// Describes `status` of the session at `session_path`.
    pub(crate) fn new(status: SessionStatus, session_path: &Path, email: Option<String>) -> Self {
        let hint = match status {
            SessionStatus::Valid => "Try get_accounts to test the connection.",
            SessionStatus::Expired => {
                "The session has expired; run `monarch-mcp import-token` to store a fresh one."
            }
            SessionStatus::Missing => "Run `monarch-mcp import-token` to store a session.",
        };
        Self {
            authenticated: status == SessionStatus::Valid,
            status,
            session_path: session_path.display().to_string(),
            email,
            hint,
        }
    }
}

/// Outcome of `debug_session_loading`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct SessionDebugResponse {
    /// Where the server looks for the session.
    session_path: String,
    /// Whether the session file exists.
    file_exists: bool,
    /// Whether the session file parsed into a session.
    loaded: bool,
    /// Length of the stored token; the token itself is never shown.
    #[serde(skip_serializing_if = "Option::is_none")]
    token_length: Option<usize>,
    /// Creation time of the loaded session.
    #[serde(skip_serializing_if = "Option::is_none")]
    created_at: Option<String>,
    /// Human-readable summary.
    message: &'static str,
}

impl SessionDebugResponse {
    /// Describes the result of loading the session at `session_path`.
    pub(crate) fn new(session_path: &Path, session: Option<&Session>) -> Self {
        let file_exists = session_path.exists();
        let message = match (file_exists, session) {
            (_, Some(_)) => "Session loaded successfully.",
            (true, None) => {
                "Session file exists but could not be parsed; run `monarch-mcp import-token` again."
            }
            (false, None) => "No session file found; run `monarch-mcp import-token`.",
        };
        Self {
            session_path: session_path.display().to_string(),
            file_exists,
            loaded: session.is_some(),
            token_length: session.map(|s| s.token().expose_secret().len()),
            created_at: session.map(|s| s.created_at().to_rfc3339()),
            message,
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::float_cmp,
    clippy::indexing_slicing,
    clippy::missing_docs_in_private_items,
    reason = "test code compares exact fixture values"
)]
mod tests {
    use serde_json::json;

    use super::{
        AccountResponse, BudgetMonthResponse, BulkCategorizeResponse, NetWorthByTypeResponse,
        NetWorthResponse, SeriesStats, SpendingSummaryResponse, TransactionResponse,
    };
    use crate::models::{
        Account, AggregateSnapshots, BudgetPage, CategoryAggregates, SnapshotsByType, Transaction,
    };

    #[test]
    fn account_prefers_display_name_and_infers_activity() {
        let account: Account = serde_json::from_value(json!({
            "id": "acc_1",
            "displayName": "Checking",
            "name": "CHK 1234",
            "deactivatedAt": "2024-01-01",
            "currentBalance": 1520.5,
            "type": {"name": "depository"},
            "institution": {"name": "Chase"}
        }))
        .expect("should deserialize");
        let value = serde_json::to_value(AccountResponse::from_account(&account)).expect("json");
        assert_eq!(
            value,
            json!({
                "id": "acc_1",
                "name": "Checking",
                "type": "depository",
                "balance": 1520.5,
                "institution": "Chase",
                "is_active": false
            })
        );
    }

    #[test]
    fn extended_transaction_adds_flags() {
        let tx: Transaction = serde_json::from_value(json!({
            "id": "t1",
            "plaidName": "",
            "originalName": "AMZN MKTP",
            "isSplitTransaction": true,
            "attachments": [{"id": "a1"}],
            "tags": [{"id": "tag_1", "name": "Gift", "color": "#fff"}]
        }))
        .expect("should deserialize");
        let plain = serde_json::to_value(TransactionResponse::from_transaction(&tx)).expect("json");
        assert!(plain.get("is_split").is_none());
        assert_eq!(plain["original_name"], "AMZN MKTP");
        assert_eq!(plain["tags"], json!([{"id": "tag_1", "name": "Gift"}]));

        let extended = serde_json::to_value(TransactionResponse::extended(&tx)).expect("json");
        assert_eq!(extended["is_split"], true);
        assert_eq!(extended["is_recurring"], false);
        assert_eq!(extended["has_attachments"], true);
    }

    #[test]
    fn series_stats_track_extremes() {
        let stats = SeriesStats::of([100.0, 80.0, 150.0, 120.0]).expect("non-empty");
        assert_eq!(stats.first, 100.0);
        assert_eq!(stats.last, 120.0);
        assert_eq!(stats.highest, 150.0);
        assert_eq!(stats.lowest, 80.0);
        assert_eq!(stats.change_percent(), 20.0);
        assert!(SeriesStats::of(Vec::new()).is_none());
    }

    #[test]
    fn change_percent_from_zero_base_is_zero() {
        let stats = SeriesStats::of([0.0, 50.0]).expect("non-empty");
        assert_eq!(stats.change(), 50.0);
        assert_eq!(stats.change_percent(), 0.0);
    }

    #[test]
    fn spending_summary_totals_and_orders() {
        let page: CategoryAggregates = serde_json::from_value(json!({
            "byCategory": [
                {"groupBy": {"category": {"id": "c1", "name": "Groceries", "group": {"name": "Food"}}},
                 "summary": {"sum": -300.0, "avg": -30.0, "count": 10}},
                {"groupBy": {"category": {"id": "c2", "name": "Paycheck"}},
                 "summary": {"sum": 2000.0, "avg": 1000.0, "count": 2}},
                {"groupBy": {"category": null},
                 "summary": {"sum": -50.0, "avg": -50.0, "count": 1}}
            ]
        }))
        .expect("should deserialize");

        let summary = SpendingSummaryResponse::from_aggregates(
            Some("2024-01-01".to_owned()),
            None,
            &page.by_category,
            2,
        );
        let value = serde_json::to_value(&summary).expect("json");
        assert_eq!(value["total_income"], 2000.0);
        assert_eq!(value["total_expenses"], 350.0);
        assert_eq!(value["net"], 1650.0);
        assert_eq!(value["period"]["start_date"], "2024-01-01");
        let categories = value["by_category"].as_array().expect("array");
        assert_eq!(categories.len(), 2);
        assert_eq!(categories[0]["category"], "Paycheck");
        assert_eq!(categories[1]["category"], "Groceries");
        assert_eq!(categories[1]["group"], "Food");
    }

    #[test]
    fn budgets_are_grouped_by_month_with_names() {
        let page: BudgetPage = serde_json::from_value(json!({
            "budgetData": {
                "monthlyAmountsByCategory": [{
                    "category": {"id": "c1"},
                    "monthlyAmounts": [
                        {"month": "2024-01-01", "plannedCashFlowAmount": 600.0,
                         "actualAmount": 420.0, "remainingAmount": 180.0,
                         "previousMonthRolloverAmount": 0.0},
                        {"month": "2024-02-01", "plannedCashFlowAmount": 600.0,
                         "actualAmount": 0.0, "remainingAmount": 600.0,
                         "previousMonthRolloverAmount": null}
                    ]
                }],
                "totalsByMonth": [
                    {"month": "2024-01-01",
                     "totalExpenses": {"plannedAmount": 2500.0, "actualAmount": 1800.0}}
                ]
            },
            "categoryGroups": [{
                "id": "g1",
                "name": "Food",
                "categories": [{"id": "c1", "name": "Groceries", "icon": "🥦"}]
            }]
        }))
        .expect("should deserialize");

        let value = serde_json::to_value(BudgetMonthResponse::from_page(&page)).expect("json");
        let months = value.as_array().expect("array");
        assert_eq!(months.len(), 2);
        assert_eq!(months[0]["month"], "2024-01-01");
        assert_eq!(months[0]["total_budgeted"], 2500.0);
        assert_eq!(months[0]["categories"][0]["category_name"], "Groceries");
        assert_eq!(months[0]["categories"][0]["group"], "Food");
        assert_eq!(months[0]["categories"][0]["spent"], 420.0);
        assert_eq!(months[1]["month"], "2024-02-01");
        assert!(months[1]["total_budgeted"].is_null());
        assert_eq!(months[1]["categories"][0]["remaining"], 600.0);
    }

    #[test]
    fn net_worth_keeps_recent_snapshots_and_full_stats() {
        let snapshots: Vec<_> = (0..400)
            .map(|day| json!({"date": format!("day-{day}"), "balance": f64::from(day) + 100.0}))
            .collect();
        let page: AggregateSnapshots =
            serde_json::from_value(json!({ "aggregateSnapshots": snapshots }))
                .expect("should deserialize");

        let value =
            serde_json::to_value(NetWorthResponse::from_snapshots(&page.aggregate_snapshots))
                .expect("json");
        assert_eq!(value["snapshot_count"], 400);
        assert_eq!(value["snapshots"].as_array().expect("array").len(), 365);
        assert_eq!(value["snapshots"][0]["date"], "day-35");
        assert_eq!(value["earliest_net_worth"], 100.0);
        assert_eq!(value["current_net_worth"], 499.0);
        assert_eq!(value["change"], 399.0);
        assert_eq!(value["change_percent"], 399.0);
    }

    #[test]
    fn empty_net_worth_has_no_stats() {
        let value = serde_json::to_value(NetWorthResponse::from_snapshots(&[])).expect("json");
        assert_eq!(value, json!({"snapshot_count": 0, "snapshots": []}));
    }

    #[test]
    fn snapshots_are_grouped_by_type() {
        let page: SnapshotsByType = serde_json::from_value(json!({
            "snapshotsByAccountType": [
                {"accountType": "depository", "month": "2024-01-01", "balance": 1000.0},
                {"accountType": "credit", "month": "2024-01-01", "balance": -200.0},
                {"accountType": "depository", "month": "2024-02-01", "balance": 1500.0}
            ]
        }))
        .expect("should deserialize");

        let value = serde_json::to_value(NetWorthByTypeResponse::from_snapshots(
            "month",
            "2024-01-01".to_owned(),
            &page.snapshots_by_account_type,
        ))
        .expect("json");
        assert_eq!(value["account_types"][0]["type"], "depository");
        assert_eq!(value["account_types"][0]["current_balance"], 1500.0);
        assert_eq!(
            value["account_types"][0]["snapshots"]
                .as_array()
                .expect("array")
                .len(),
            2
        );
        assert_eq!(value["account_types"][1]["type"], "credit");
        assert_eq!(value["total_net_worth"], 1300.0);
    }

    #[test]
    fn bulk_outcomes_keep_input_order() {
        let outcomes = vec![
            ("t1".to_owned(), Ok(())),
            ("t2".to_owned(), Err("boom")),
            ("t3".to_owned(), Err("bang")),
        ];
        let value =
            serde_json::to_value(BulkCategorizeResponse::from_outcomes(outcomes)).expect("json");
        assert_eq!(
            value,
            json!({
                "total": 3,
                "successful": 1,
                "failed": 2,
                "errors": [
                    {"transaction_id": "t2", "error": "boom"},
                    {"transaction_id": "t3", "error": "bang"}
                ]
            })
        );
    }
}
