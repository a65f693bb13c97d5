//! Parameter structs for MCP tool inputs.
//!
//! Each struct derives [`serde::Deserialize`] and [`schemars::JsonSchema`]
//! so that `rmcp` can auto-generate JSON schemas for tool parameters.
//! Conversion methods validate the input and build the request types of
//! [`crate::api`]; they run before any session or network access.

use chrono::{Days, NaiveDate};
use schemars::JsonSchema;
use serde::Deserialize;

use crate::api::{
    AmountCriterion, AmountOperator, AmountRange, BudgetAmount, BudgetTarget, DateRange,
    MerchantCriterion, MerchantOperator, NewTransaction, RuleInput, SnapshotQuery, SplitPart,
    Timeframe, TransactionFilters, TransactionQuery, TransactionUpdate,
};
use crate::error::ToolError;
use crate::models::Transaction;

/// Default page size for transaction listings.
const fn default_limit() -> u32 {
    100
}

/// Default number of categories in a spending summary.
const fn default_summary_limit() -> usize {
    100
}

/// Serde default for flags that are on unless disabled.
const fn default_true() -> bool {
    true
}

/// Default colour for new tags.
fn default_tag_color() -> String {
    "#19D2A5".to_owned()
}

/// Treats an empty string as absent.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.is_empty())
}

/// Treats an empty list as absent.
fn non_empty_list(value: Option<Vec<String>>) -> Option<Vec<String>> {
    value.filter(|list| !list.is_empty())
}

/// Parses a `YYYY-MM-DD` date supplied as `field`.
///
/// # Errors
///
/// Returns [`ToolError::Validation`] naming the field and the bad value.
pub(crate) fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, ToolError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_err| {
        ToolError::validation(format!("invalid date '{value}' for {field}, use YYYY-MM-DD"))
    })
}

/// Parses an optional date; empty strings count as absent.
fn optional_date(field: &'static str, value: Option<&str>) -> Result<Option<NaiveDate>, ToolError> {
    value
        .filter(|text| !text.is_empty())
        .map(|text| parse_date(field, text))
        .transpose()
}

/// Parses an optional `start_date`/`end_date` pair.
///
/// # Errors
///
/// Returns [`ToolError::Validation`] for malformed dates or a start after
/// the end.
pub(crate) fn date_range(start: Option<&str>, end: Option<&str>) -> Result<DateRange, ToolError> {
    let range = DateRange {
        start_date: optional_date("start_date", start)?,
        end_date: optional_date("end_date", end)?,
    };
    if let (Some(first), Some(last)) = (range.start_date, range.end_date)
        && first > last
    {
        return Err(ToolError::validation(format!(
            "start_date {first} is after end_date {last}"
        )));
    }
    Ok(range)
}

// ── Accounts ────────────────────────────────────────────────────────

/// Parameters for tools addressing one account.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub(crate) struct AccountIdParams {
    /// Account ID (use `get_accounts` to find IDs).
    pub(crate) account_id: String,
}

impl AccountIdParams {
    /// Returns the account ID, which must be numeric.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::Validation`] for a non-numeric ID.
    pub(crate) fn numeric_id(self) -> Result<String, ToolError> {
        if !self.account_id.is_empty() && self.account_id.bytes().all(|b| b.is_ascii_digit()) {
            Ok(self.account_id)
        } else {
            Err(ToolError::validation(format!(
                "account_id must be numeric, got '{}'",
                self.account_id
            )))
        }
    }
}

// ── Transactions ────────────────────────────────────────────────────

/// Parameters for tools addressing one transaction.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub(crate) struct TransactionIdParams {
    /// Transaction ID.
    pub(crate) transaction_id: String,
}

/// Parameters for the `get_transactions` tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub(crate) struct GetTransactionsParams {
    /// Maximum number of transactions to return.
    #[serde(default = "default_limit")]
    pub(crate) limit: u32,
    /// Number of transactions to skip.
    #[serde(default)]
    pub(crate) offset: u32,
    /// Start date (inclusive), format `YYYY-MM-DD`.
    pub(crate) start_date: Option<String>,
    /// End date (inclusive), format `YYYY-MM-DD`.
    pub(crate) end_date: Option<String>,
    /// Restrict to one account.
    pub(crate) account_id: Option<String>,
}

impl GetTransactionsParams {
    /// Builds the remote query.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::Validation`] for malformed dates.
    pub(crate) fn query(self) -> Result<TransactionQuery, ToolError> {
        Ok(TransactionQuery {
            limit: self.limit,
            offset: self.offset,
            filters: TransactionFilters {
                range: date_range(self.start_date.as_deref(), self.end_date.as_deref())?,
                accounts: non_empty(self.account_id).into_iter().collect(),
                ..TransactionFilters::default()
            },
        })
    }
}

/// Parameters for the `search_transactions` tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub(crate) struct SearchTransactionsParams {
    /// Free-text search over merchant names and descriptions.
    pub(crate) search: Option<String>,
    /// Maximum number of transactions to return.
    #[serde(default = "default_limit")]
    pub(crate) limit: u32,
    /// Number of transactions to skip.
    #[serde(default)]
    pub(crate) offset: u32,
    /// Start date (inclusive), format `YYYY-MM-DD`.
    pub(crate) start_date: Option<String>,
    /// End date (inclusive), format `YYYY-MM-DD`.
    pub(crate) end_date: Option<String>,
    /// Category IDs to match.
    pub(crate) category_ids: Option<Vec<String>>,
    /// Account IDs to match.
    pub(crate) account_ids: Option<Vec<String>>,
    /// Tag IDs to match.
    pub(crate) tag_ids: Option<Vec<String>>,
    /// Only transactions with (`true`) or without (`false`) attachments.
    pub(crate) has_attachments: Option<bool>,
    /// Only transactions with (`true`) or without (`false`) notes.
    pub(crate) has_notes: Option<bool>,
    /// Only hidden (`true`) or visible (`false`) transactions.
    pub(crate) hidden_from_reports: Option<bool>,
    /// Only split (`true`) or unsplit (`false`) transactions.
    pub(crate) is_split: Option<bool>,
    /// Only recurring (`true`) or one-off (`false`) transactions.
    pub(crate) is_recurring: Option<bool>,
}

impl SearchTransactionsParams {
    /// Builds the remote query.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::Validation`] for malformed dates.
    pub(crate) fn query(self) -> Result<TransactionQuery, ToolError> {
        Ok(TransactionQuery {
            limit: self.limit,
            offset: self.offset,
            filters: TransactionFilters {
                search: non_empty(self.search),
                range: date_range(self.start_date.as_deref(), self.end_date.as_deref())?,
                categories: self.category_ids.unwrap_or_default(),
                accounts: self.account_ids.unwrap_or_default(),
                tags: self.tag_ids.unwrap_or_default(),
                has_attachments: self.has_attachments,
                has_notes: self.has_notes,
                hide_from_reports: self.hidden_from_reports,
                is_split: self.is_split,
                is_recurring: self.is_recurring,
            },
        })
    }
}

/// Parameters for the `create_transaction` tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub(crate) struct CreateTransactionParams {
    /// Account to add the transaction to.
    pub(crate) account_id: String,
    /// Amount; positive for income, negative for expenses.
    pub(crate) amount: f64,
    /// Description, stored as the transaction notes.
    pub(crate) description: String,
    /// Transaction date, format `YYYY-MM-DD`.
    pub(crate) date: String,
    /// Category ID.
    pub(crate) category_id: Option<String>,
    /// Merchant name; defaults to the description.
    pub(crate) merchant_name: Option<String>,
}

impl CreateTransactionParams {
    /// Builds the new transaction.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::Validation`] for a malformed date.
    pub(crate) fn new_transaction(self) -> Result<NewTransaction, ToolError> {
        let date = parse_date("date", &self.date)?;
        Ok(NewTransaction {
            account_id: self.account_id,
            amount: self.amount,
            date,
            merchant_name: non_empty(self.merchant_name)
                .unwrap_or_else(|| self.description.clone()),
            category_id: non_empty(self.category_id),
            notes: Some(self.description),
        })
    }
}

/// Parameters for the `update_transaction` tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub(crate) struct UpdateTransactionParams {
    /// Transaction to update.
    pub(crate) transaction_id: String,
    /// New amount.
    pub(crate) amount: Option<f64>,
    /// New description, shown as the merchant name.
    pub(crate) description: Option<String>,
    /// New category ID.
    pub(crate) category_id: Option<String>,
    /// New date, format `YYYY-MM-DD`.
    pub(crate) date: Option<String>,
}

impl UpdateTransactionParams {
    /// Builds the partial update.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::Validation`] for a malformed date.
    pub(crate) fn update(self) -> Result<TransactionUpdate, ToolError> {
        Ok(TransactionUpdate {
            amount: self.amount,
            merchant_name: self.description,
            category_id: self.category_id,
            date: optional_date("date", self.date.as_deref())?,
            ..TransactionUpdate::new(self.transaction_id)
        })
    }
}

/// Parameters for the `set_transaction_category` tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub(crate) struct SetCategoryParams {
    /// Transaction to categorize.
    pub(crate) transaction_id: String,
    /// Category to assign (use `get_categories` to find IDs).
    pub(crate) category_id: String,
    /// Also clear the needs-review flag.
    #[serde(default = "default_true")]
    pub(crate) mark_reviewed: bool,
}

impl SetCategoryParams {
    /// Builds the category update.
    pub(crate) fn update(self) -> TransactionUpdate {
        categorize(self.transaction_id, self.category_id, self.mark_reviewed)
    }
}

/// Assigns `category_id`, clearing the review flag when `mark_reviewed`.
fn categorize(transaction_id: String, category_id: String, mark_reviewed: bool) -> TransactionUpdate {
    TransactionUpdate {
        category_id: Some(category_id),
        needs_review: mark_reviewed.then_some(false),
        ..TransactionUpdate::new(transaction_id)
    }
}

/// Parameters for the `update_transaction_notes` tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub(crate) struct UpdateNotesParams {
    /// Transaction to update.
    pub(crate) transaction_id: String,
    /// Note text.
    pub(crate) notes: String,
    /// Receipt URL, prepended as `[Receipt: URL]`.
    pub(crate) receipt_url: Option<String>,
}

impl UpdateNotesParams {
    /// Builds the notes update.
    pub(crate) fn update(self) -> TransactionUpdate {
        let notes = match non_empty(self.receipt_url) {
            Some(url) => format!("[Receipt: {url}] {}", self.notes),
            None => self.notes,
        };
        TransactionUpdate {
            notes: Some(notes),
            ..TransactionUpdate::new(self.transaction_id)
        }
    }
}

/// Parameters for the `bulk_categorize_transactions` tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub(crate) struct BulkCategorizeParams {
    /// Transactions to categorize.
    pub(crate) transaction_ids: Vec<String>,
    /// Category to assign to all of them.
    pub(crate) category_id: String,
    /// Also clear the needs-review flags.
    #[serde(default = "default_true")]
    pub(crate) mark_reviewed: bool,
}

impl BulkCategorizeParams {
    /// Builds one update per transaction, in input order.
    pub(crate) fn updates(self) -> Vec<TransactionUpdate> {
        let Self {
            transaction_ids,
            category_id,
            mark_reviewed,
        } = self;
        transaction_ids
            .into_iter()
            .map(|id| categorize(id, category_id.clone(), mark_reviewed))
            .collect()
    }
}

/// Parameters for tools taking an optional date window.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub(crate) struct DateRangeParams {
    /// Start date (inclusive), format `YYYY-MM-DD`.
    pub(crate) start_date: Option<String>,
    /// End date (inclusive), format `YYYY-MM-DD`.
    pub(crate) end_date: Option<String>,
}

impl DateRangeParams {
    /// Parses the window.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::Validation`] for malformed or inverted dates.
    pub(crate) fn range(&self) -> Result<DateRange, ToolError> {
        date_range(self.start_date.as_deref(), self.end_date.as_deref())
    }
}

/// Parameters for the `get_transactions_needing_review` tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub(crate) struct NeedingReviewParams {
    /// Only transactions flagged as needing review.
    #[serde(default = "default_true")]
    pub(crate) needs_review: bool,
    /// Only transactions from the last N days.
    pub(crate) days: Option<u32>,
    /// Only transactions without a category.
    #[serde(default)]
    pub(crate) uncategorized_only: bool,
    /// Only transactions without notes.
    #[serde(default)]
    pub(crate) without_notes_only: bool,
    /// Maximum number of transactions to fetch.
    #[serde(default = "default_limit")]
    pub(crate) limit: u32,
    /// Restrict to one account.
    pub(crate) account_id: Option<String>,
}

impl NeedingReviewParams {
    /// Builds the remote query; `days` counts back from `today`.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::Validation`] when `days` reaches before the
    /// supported calendar.
    pub(crate) fn query(&self, today: NaiveDate) -> Result<TransactionQuery, ToolError> {
        let range = match self.days.filter(|days| *days > 0) {
            Some(days) => DateRange {
                start_date: Some(
                    today
                        .checked_sub_days(Days::new(days.into()))
                        .ok_or_else(|| ToolError::validation(format!("days {days} is too large")))?,
                ),
                end_date: Some(today),
            },
            None => DateRange::default(),
        };
        Ok(TransactionQuery {
            limit: self.limit,
            offset: 0,
            filters: TransactionFilters {
                range,
                accounts: non_empty(self.account_id.clone()).into_iter().collect(),
                has_notes: self.without_notes_only.then_some(false),
                ..TransactionFilters::default()
            },
        })
    }

    /// Whether `tx` passes the filters applied after fetching.
    pub(crate) fn keeps(&self, tx: &Transaction) -> bool {
        (!self.needs_review || tx.needs_review) && (!self.uncategorized_only || !tx.is_categorized())
    }
}

// ── Summaries ───────────────────────────────────────────────────────

/// Parameters for the `get_spending_summary` tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub(crate) struct SpendingSummaryParams {
    /// Start date (inclusive), format `YYYY-MM-DD`.
    pub(crate) start_date: Option<String>,
    /// End date (inclusive), format `YYYY-MM-DD`.
    pub(crate) end_date: Option<String>,
    /// Maximum number of categories to return.
    #[serde(default = "default_summary_limit")]
    pub(crate) limit: usize,
}

// ── Splits ──────────────────────────────────────────────────────────

/// One requested split part.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub(crate) struct SplitInput {
    /// Amount of this part; negative for expenses.
    pub(crate) amount: f64,
    /// Category of this part.
    #[serde(alias = "categoryId")]
    pub(crate) category_id: Option<String>,
    /// Merchant of this part.
    #[serde(alias = "merchantName")]
    pub(crate) merchant_name: Option<String>,
}

/// Parameters for the `split_transaction` tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub(crate) struct SplitTransactionParams {
    /// Transaction to split.
    pub(crate) transaction_id: String,
    /// Parts whose amounts sum to the original amount; empty removes splits.
    pub(crate) splits: Vec<SplitInput>,
}

impl SplitTransactionParams {
    /// Converts the requested parts.
    pub(crate) fn parts(&self) -> Vec<SplitPart> {
        self.splits
            .iter()
            .map(|split| SplitPart {
                amount: split.amount,
                category_id: non_empty(split.category_id.clone()),
                merchant_name: non_empty(split.merchant_name.clone()),
            })
            .collect()
    }
}

// ── Tags ────────────────────────────────────────────────────────────

/// Parameters for the `set_transaction_tags` tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub(crate) struct SetTagsParams {
    /// Transaction to tag.
    pub(crate) transaction_id: String,
    /// Complete tag list; replaces existing tags. Empty removes all tags.
    pub(crate) tag_ids: Vec<String>,
}

/// Parameters for the `create_tag` tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub(crate) struct CreateTagParams {
    /// Tag name.
    pub(crate) name: String,
    /// Hex colour, format `#RRGGBB`.
    #[serde(default = "default_tag_color")]
    pub(crate) color: String,
}

impl CreateTagParams {
    /// Validates the colour.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::Validation`] unless the colour is `#RRGGBB`.
    pub(crate) fn validate(self) -> Result<Self, ToolError> {
        let valid = self.color.len() == 7
            && self
                .color
                .strip_prefix('#')
                .is_some_and(|hex| hex.bytes().all(|b| b.is_ascii_hexdigit()));
        if valid {
            Ok(self)
        } else {
            Err(ToolError::validation(format!(
                "invalid color '{}', use #RRGGBB",
                self.color
            )))
        }
    }
}

// ── Rules ───────────────────────────────────────────────────────────

/// Conditions and actions of a transaction rule.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub(crate) struct RuleParams {
    /// How to match the merchant: `eq` or `contains`.
    pub(crate) merchant_criteria_operator: Option<MerchantOperator>,
    /// Merchant name or pattern to match.
    pub(crate) merchant_criteria_value: Option<String>,
    /// Amount comparison: `gt`, `lt`, `eq` or `between`.
    pub(crate) amount_operator: Option<AmountOperator>,
    /// Amount threshold, or lower bound for `between`.
    pub(crate) amount_value: Option<f64>,
    /// Upper bound for `between`.
    pub(crate) amount_upper: Option<f64>,
    /// Whether the amount is an expense.
    #[serde(default = "default_true")]
    pub(crate) amount_is_expense: bool,
    /// Category to assign (use `get_categories` to find IDs).
    pub(crate) set_category_id: Option<String>,
    /// Merchant name to assign.
    pub(crate) set_merchant_name: Option<String>,
    /// Tags to add (use `get_tags` to find IDs).
    pub(crate) add_tag_ids: Option<Vec<String>>,
    /// Hide matching transactions from reports.
    pub(crate) hide_from_reports: Option<bool>,
    /// Review status to set, e.g. `needs_review`.
    pub(crate) review_status: Option<String>,
    /// Limit the rule to these accounts.
    pub(crate) account_ids: Option<Vec<String>>,
    /// Apply the rule to existing transactions.
    #[serde(default)]
    pub(crate) apply_to_existing: bool,
}

impl RuleParams {
    /// Builds the rule input; `id` is set when updating.
    ///
    /// Only supplied conditions and actions are forwarded.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::Validation`] when an operator lacks its value
    /// or a value lacks its operator, or when `between` lacks its bounds.
    pub(crate) fn input(self, id: Option<String>) -> Result<RuleInput, ToolError> {
        let merchant = match (
            self.merchant_criteria_operator,
            non_empty(self.merchant_criteria_value),
        ) {
            (Some(operator), Some(value)) => Some(vec![MerchantCriterion { operator, value }]),
            (None, None) => None,
            (Some(_), None) | (None, Some(_)) => {
                return Err(ToolError::validation(
                    "merchant_criteria_operator and merchant_criteria_value must be given together",
                ));
            }
        };
        let amount = amount_criterion(
            self.amount_operator,
            self.amount_value,
            self.amount_upper,
            self.amount_is_expense,
        )?;
        Ok(RuleInput {
            id,
            apply_to_existing_transactions: self.apply_to_existing,
            merchant_name_criteria: merchant,
            amount_criteria: amount,
            account_ids: non_empty_list(self.account_ids),
            set_category_action: non_empty(self.set_category_id),
            set_merchant_action: non_empty(self.set_merchant_name),
            add_tags_action: non_empty_list(self.add_tag_ids),
            set_hide_from_reports_action: self.hide_from_reports,
            review_status_action: non_empty(self.review_status),
        })
    }
}

/// Builds the amount condition of a rule.
fn amount_criterion(
    requested_operator: Option<AmountOperator>,
    requested_value: Option<f64>,
    requested_upper: Option<f64>,
    is_expense: bool,
) -> Result<Option<AmountCriterion>, ToolError> {
    match (requested_operator, requested_value, requested_upper) {
        (None, None, None) => Ok(None),
        (Some(AmountOperator::Between), Some(lower), Some(upper)) => {
            if upper < lower {
                return Err(ToolError::validation(
                    "amount_upper must not be less than amount_value",
                ));
            }
            Ok(Some(AmountCriterion {
                operator: AmountOperator::Between,
                is_expense,
                value: None,
                value_range: Some(AmountRange { lower, upper }),
            }))
        }
        (Some(AmountOperator::Between), Some(_), None) => Err(ToolError::validation(
            "amount_operator 'between' requires amount_upper",
        )),
        (Some(operator), Some(value), None) => Ok(Some(AmountCriterion {
            operator,
            is_expense,
            value: Some(value),
            value_range: None,
        })),
        (Some(_), Some(_), Some(_)) | (None, None, Some(_)) => Err(ToolError::validation(
            "amount_upper is only used with amount_operator 'between'",
        )),
        (Some(_), None, _) | (None, Some(_), _) => Err(ToolError::validation(
            "amount_operator and amount_value must be given together",
        )),
    }
}

/// Parameters for the `update_transaction_rule` tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub(crate) struct UpdateRuleParams {
    /// Rule to update (use `get_transaction_rules` to find IDs).
    pub(crate) rule_id: String,
    /// New conditions and actions.
    #[serde(flatten)]
    pub(crate) rule: RuleParams,
}

/// Parameters for the `delete_transaction_rule` tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub(crate) struct RuleIdParams {
    /// Rule to delete.
    pub(crate) rule_id: String,
}

// ── Budgets ─────────────────────────────────────────────────────────

/// Parameters for the `set_budget_amount` tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub(crate) struct SetBudgetParams {
    /// Amount to budget; 0 clears the budget.
    pub(crate) amount: f64,
    /// Category to budget. Give this or `category_group_id`.
    pub(crate) category_id: Option<String>,
    /// Category group to budget. Give this or `category_id`.
    pub(crate) category_group_id: Option<String>,
    /// Any day of the month to set, format `YYYY-MM-DD`; defaults to the
    /// current month.
    pub(crate) start_date: Option<String>,
    /// Repeat the amount for all future months.
    #[serde(default)]
    pub(crate) apply_to_future: bool,
}

impl SetBudgetParams {
    /// Builds the budget amount.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::Validation`] unless exactly one target is given,
    /// or for a malformed date.
    pub(crate) fn budget(self) -> Result<BudgetAmount, ToolError> {
        let target = match (non_empty(self.category_id), non_empty(self.category_group_id)) {
            (Some(id), None) => BudgetTarget::CategoryId(id),
            (None, Some(id)) => BudgetTarget::CategoryGroupId(id),
            (Some(_), Some(_)) => {
                return Err(ToolError::validation(
                    "cannot specify both category_id and category_group_id; choose one",
                ));
            }
            (None, None) => {
                return Err(ToolError::validation(
                    "must specify either category_id or category_group_id",
                ));
            }
        };
        Ok(BudgetAmount {
            amount: self.amount,
            target,
            start_date: optional_date("start_date", self.start_date.as_deref())?,
            apply_to_future: self.apply_to_future,
        })
    }
}

// ── Financial ───────────────────────────────────────────────────────

/// Parameters for the `get_net_worth` tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub(crate) struct NetWorthParams {
    /// Start date (inclusive), format `YYYY-MM-DD`.
    pub(crate) start_date: Option<String>,
    /// End date (inclusive), format `YYYY-MM-DD`.
    pub(crate) end_date: Option<String>,
    /// Restrict to one account type, e.g. `brokerage`.
    pub(crate) account_type: Option<String>,
}

impl NetWorthParams {
    /// Builds the snapshot query.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::Validation`] for malformed or inverted dates.
    pub(crate) fn query(self) -> Result<SnapshotQuery, ToolError> {
        Ok(SnapshotQuery {
            range: date_range(self.start_date.as_deref(), self.end_date.as_deref())?,
            account_type: non_empty(self.account_type),
        })
    }
}

/// Parameters for the `get_net_worth_by_account_type` tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub(crate) struct NetWorthByTypeParams {
    /// Start date, format `YYYY-MM-DD`.
    pub(crate) start_date: String,
    /// Granularity: `month` or `year`.
    #[serde(default)]
    pub(crate) timeframe: Timeframe,
}

impl NetWorthByTypeParams {
    /// Parses the start date.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::Validation`] for a malformed date.
    pub(crate) fn start(&self) -> Result<NaiveDate, ToolError> {
        parse_date("start_date", &self.start_date)
    }
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::missing_docs_in_private_items,
    reason = "test code uses expect and indexing for readability"
)]
mod tests {
    use chrono::NaiveDate;
    use serde_json::json;

    use super::{
        AccountIdParams, BulkCategorizeParams, CreateTagParams, CreateTransactionParams,
        DateRangeParams, GetTransactionsParams, NeedingReviewParams, NetWorthByTypeParams,
        RuleParams, SearchTransactionsParams, SetBudgetParams, SetCategoryParams,
        SpendingSummaryParams, SplitTransactionParams, UpdateNotesParams, UpdateRuleParams,
        date_range,
    };
    use crate::api::{AmountOperator, BudgetTarget, MerchantOperator, Timeframe};
    use crate::models::Transaction;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn get_transactions_defaults() {
        let json = r#"{}"#;
        let params: GetTransactionsParams =
            serde_json::from_str(json).expect("should deserialize empty object");
        assert_eq!(params.limit, 100);
        assert_eq!(params.offset, 0);
        let query = params.query().expect("valid query");
        assert!(query.filters.accounts.is_empty());
        assert!(query.filters.range.start_date.is_none());
    }

    #[test]
    fn get_transactions_with_account_and_dates() {
        let json = r#"{"limit": 10, "start_date": "2024-01-01", "end_date": "2024-01-31", "account_id": "acc_1"}"#;
        let params: GetTransactionsParams =
            serde_json::from_str(json).expect("should deserialize");
        let query = params.query().expect("valid query");
        assert_eq!(query.limit, 10);
        assert_eq!(query.filters.accounts, vec!["acc_1".to_owned()]);
        assert_eq!(query.filters.range.start_date, Some(date(2024, 1, 1)));
        assert_eq!(query.filters.range.end_date, Some(date(2024, 1, 31)));
    }

    #[test]
    fn malformed_date_names_the_field() {
        let err = date_range(Some("2024-13-01"), None).expect_err("should reject");
        assert_eq!(err.kind(), "validation_error");
        assert_eq!(
            err.to_string(),
            "invalid date '2024-13-01' for start_date, use YYYY-MM-DD"
        );
    }

    #[test]
    fn inverted_range_is_rejected() {
        let err = date_range(Some("2024-02-01"), Some("2024-01-01")).expect_err("should reject");
        assert_eq!(
            err.to_string(),
            "start_date 2024-02-01 is after end_date 2024-01-01"
        );
    }

    #[test]
    fn empty_dates_count_as_absent() {
        let params = DateRangeParams {
            start_date: Some(String::new()),
            end_date: None,
        };
        assert!(params.range().expect("valid").start_date.is_none());
    }

    #[test]
    fn search_maps_every_filter() {
        let json = r#"{
            "search": "coffee",
            "category_ids": ["c1"],
            "account_ids": ["a1", "a2"],
            "tag_ids": ["t1"],
            "has_attachments": true,
            "has_notes": false,
            "hidden_from_reports": false,
            "is_split": true,
            "is_recurring": false
        }"#;
        let params: SearchTransactionsParams =
            serde_json::from_str(json).expect("should deserialize");
        let filters = params.query().expect("valid query").filters;
        assert_eq!(filters.search.as_deref(), Some("coffee"));
        assert_eq!(filters.categories, vec!["c1".to_owned()]);
        assert_eq!(filters.accounts.len(), 2);
        assert_eq!(filters.tags, vec!["t1".to_owned()]);
        assert_eq!(filters.has_attachments, Some(true));
        assert_eq!(filters.has_notes, Some(false));
        assert_eq!(filters.hide_from_reports, Some(false));
        assert_eq!(filters.is_split, Some(true));
        assert_eq!(filters.is_recurring, Some(false));
    }

    #[test]
    fn create_transaction_uses_description_for_notes_and_merchant() {
        let json = r#"{"account_id": "acc_1", "amount": -12.5, "description": "Lunch", "date": "2024-03-02"}"#;
        let params: CreateTransactionParams =
            serde_json::from_str(json).expect("should deserialize");
        let tx = params.new_transaction().expect("valid");
        assert_eq!(tx.merchant_name, "Lunch");
        assert_eq!(tx.notes.as_deref(), Some("Lunch"));
        assert_eq!(tx.date, date(2024, 3, 2));
        assert!(tx.category_id.is_none());
    }

    #[test]
    fn create_transaction_keeps_explicit_merchant() {
        let json = r#"{"account_id": "acc_1", "amount": 5.0, "description": "Refund", "date": "2024-03-02", "merchant_name": "Shop"}"#;
        let params: CreateTransactionParams =
            serde_json::from_str(json).expect("should deserialize");
        assert_eq!(params.new_transaction().expect("valid").merchant_name, "Shop");
    }

    #[test]
    fn set_category_marks_reviewed_by_default() {
        let json = r#"{"transaction_id": "t1", "category_id": "c1"}"#;
        let params: SetCategoryParams = serde_json::from_str(json).expect("should deserialize");
        let update = params.update();
        assert_eq!(update.category_id.as_deref(), Some("c1"));
        assert_eq!(update.needs_review, Some(false));
    }

    #[test]
    fn set_category_can_leave_review_flag() {
        let json = r#"{"transaction_id": "t1", "category_id": "c1", "mark_reviewed": false}"#;
        let params: SetCategoryParams = serde_json::from_str(json).expect("should deserialize");
        assert!(params.update().needs_review.is_none());
    }

    #[test]
    fn receipt_url_is_prepended_to_notes() {
        let params = UpdateNotesParams {
            transaction_id: "t1".to_owned(),
            notes: "Team lunch".to_owned(),
            receipt_url: Some("https://r.example/1".to_owned()),
        };
        assert_eq!(
            params.update().notes.as_deref(),
            Some("[Receipt: https://r.example/1] Team lunch")
        );
    }

    #[test]
    fn bulk_updates_follow_input_order() {
        let json = r#"{"transaction_ids": ["t1", "t2", "t3"], "category_id": "c9"}"#;
        let params: BulkCategorizeParams = serde_json::from_str(json).expect("should deserialize");
        let ids: Vec<_> = params
            .updates()
            .into_iter()
            .map(|update| update.transaction_id)
            .collect();
        assert_eq!(ids, vec!["t1", "t2", "t3"]);
    }

    #[test]
    fn needing_review_days_window() {
        let json = r#"{"days": 7, "without_notes_only": true}"#;
        let params: NeedingReviewParams = serde_json::from_str(json).expect("should deserialize");
        let query = params.query(date(2024, 3, 10)).expect("valid");
        assert_eq!(query.filters.range.start_date, Some(date(2024, 3, 3)));
        assert_eq!(query.filters.range.end_date, Some(date(2024, 3, 10)));
        assert_eq!(query.filters.has_notes, Some(false));
        assert_eq!(query.limit, 100);
    }

    #[test]
    fn needing_review_local_filters() {
        let json = r#"{"uncategorized_only": true}"#;
        let params: NeedingReviewParams = serde_json::from_str(json).expect("should deserialize");
        let flagged: Transaction =
            serde_json::from_value(json!({"needsReview": true, "category": null}))
                .expect("should deserialize");
        let categorized: Transaction =
            serde_json::from_value(json!({"needsReview": true, "category": {"id": "c1"}}))
                .expect("should deserialize");
        let reviewed = Transaction::default();
        assert!(params.keeps(&flagged));
        assert!(!params.keeps(&categorized));
        assert!(!params.keeps(&reviewed));
    }

    #[test]
    fn spending_summary_default_limit() {
        let params: SpendingSummaryParams =
            serde_json::from_str("{}").expect("should deserialize");
        assert_eq!(params.limit, 100);
    }

    #[test]
    fn split_parts_accept_camel_case_keys() {
        let json = r#"{"transaction_id": "t1", "splits": [
            {"amount": -30.0, "categoryId": "c1"},
            {"amount": -20.0, "merchant_name": "Cafe"}
        ]}"#;
        let params: SplitTransactionParams =
            serde_json::from_str(json).expect("should deserialize");
        let parts = params.parts();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].category_id.as_deref(), Some("c1"));
        assert_eq!(parts[1].merchant_name.as_deref(), Some("Cafe"));
    }

    #[test]
    fn tag_color_defaults_and_validates() {
        let params: CreateTagParams =
            serde_json::from_str(r#"{"name": "Travel"}"#).expect("should deserialize");
        assert_eq!(params.color, "#19D2A5");
        assert!(params.validate().is_ok());

        for bad in ["19D2A5", "#19D2A", "#19D2AZ", "#19D2A55"] {
            let params = CreateTagParams {
                name: "x".to_owned(),
                color: bad.to_owned(),
            };
            assert!(params.validate().is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn balance_history_requires_numeric_account() {
        let ok = AccountIdParams {
            account_id: "12345".to_owned(),
        };
        assert_eq!(ok.numeric_id().expect("numeric"), "12345");
        let bad = AccountIdParams {
            account_id: "acc_1".to_owned(),
        };
        let err = bad.numeric_id().expect_err("should reject");
        assert_eq!(err.to_string(), "account_id must be numeric, got 'acc_1'");
    }

    #[test]
    fn rule_forwards_only_supplied_fields() {
        let json = r#"{"merchant_criteria_operator": "contains", "merchant_criteria_value": "amazon", "set_category_id": "cat_shopping"}"#;
        let params: RuleParams = serde_json::from_str(json).expect("should deserialize");
        let input = params.input(None).expect("valid rule");
        assert_eq!(
            serde_json::to_value(&input).expect("serialize"),
            json!({
                "applyToExistingTransactions": false,
                "merchantNameCriteria": [{"operator": "contains", "value": "amazon"}],
                "setCategoryAction": "cat_shopping"
            })
        );
    }

    #[test]
    fn merchant_operator_without_value_is_rejected() {
        let params = RuleParams {
            merchant_criteria_operator: Some(MerchantOperator::Eq),
            ..RuleParams::default()
        };
        let err = params.input(None).expect_err("should reject");
        assert_eq!(err.kind(), "validation_error");
    }

    #[test]
    fn amount_value_without_operator_is_rejected() {
        let params = RuleParams {
            amount_value: Some(50.0),
            ..RuleParams::default()
        };
        assert!(params.input(None).is_err());
    }

    #[test]
    fn between_requires_upper_bound() {
        let params = RuleParams {
            amount_operator: Some(AmountOperator::Between),
            amount_value: Some(10.0),
            ..RuleParams::default()
        };
        let err = params.input(None).expect_err("should reject");
        assert!(err.to_string().contains("amount_upper"));

        let params = RuleParams {
            amount_operator: Some(AmountOperator::Between),
            amount_value: Some(10.0),
            amount_upper: Some(25.0),
            amount_is_expense: true,
            ..RuleParams::default()
        };
        let input = params.input(None).expect("valid rule");
        let value = serde_json::to_value(&input).expect("serialize");
        assert_eq!(
            value["amountCriteria"],
            json!({
                "operator": "between",
                "isExpense": true,
                "value": null,
                "valueRange": {"lower": 10.0, "upper": 25.0}
            })
        );
    }

    #[test]
    fn update_rule_flattens_conditions() {
        let json = r#"{"rule_id": "r1", "hide_from_reports": true, "apply_to_existing": true}"#;
        let params: UpdateRuleParams = serde_json::from_str(json).expect("should deserialize");
        let input = params
            .rule
            .input(Some(params.rule_id.clone()))
            .expect("valid rule");
        assert_eq!(
            serde_json::to_value(&input).expect("serialize"),
            json!({
                "id": "r1",
                "applyToExistingTransactions": true,
                "setHideFromReportsAction": true
            })
        );
    }

    #[test]
    fn budget_requires_exactly_one_target() {
        let both = SetBudgetParams {
            amount: 100.0,
            category_id: Some("c1".to_owned()),
            category_group_id: Some("g1".to_owned()),
            start_date: None,
            apply_to_future: false,
        };
        assert!(both.budget().is_err());

        let json = r#"{"amount": 100.0}"#;
        let neither: SetBudgetParams = serde_json::from_str(json).expect("should deserialize");
        assert!(neither.budget().is_err());

        let json = r#"{"amount": 250.0, "category_group_id": "g1", "start_date": "2024-05-01"}"#;
        let group: SetBudgetParams = serde_json::from_str(json).expect("should deserialize");
        let budget = group.budget().expect("valid budget");
        assert_eq!(budget.target, BudgetTarget::CategoryGroupId("g1".to_owned()));
        assert_eq!(budget.start_date, Some(date(2024, 5, 1)));
        assert!(!budget.apply_to_future);
    }

    #[test]
    fn net_worth_by_type_defaults_to_month() {
        let json = r#"{"start_date": "2024-01-01"}"#;
        let params: NetWorthByTypeParams = serde_json::from_str(json).expect("should deserialize");
        assert_eq!(params.timeframe, Timeframe::Month);
        assert_eq!(params.start().expect("valid"), date(2024, 1, 1));
    }

    #[test]
    fn unknown_timeframe_fails_to_deserialize() {
        let json = r#"{"start_date": "2024-01-01", "timeframe": "week"}"#;
        assert!(serde_json::from_str::<NetWorthByTypeParams>(json).is_err());
    }
}
