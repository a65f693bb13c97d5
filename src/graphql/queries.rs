//! GraphQL documents sent to the Monarch API.

#![allow(
    clippy::missing_docs_in_private_items,
    reason = "document names mirror the remote operation names"
)]

/// Shared error payload selection for mutations.
macro_rules! payload_errors {
    () => {
        "errors { fieldErrors { field messages __typename } message code __typename }"
    };
}

/// Transaction fields selected by list and detail queries.
macro_rules! transaction_fields {
    () => {
        "id amount pending date hideFromReports plaidName notes isRecurring reviewStatus \
         needsReview isSplitTransaction createdAt updatedAt \
         attachments { id __typename } \
         category { id name __typename } \
         merchant { id name transactionsCount __typename } \
         account { id displayName __typename } \
         tags { id name color order __typename } \
         __typename"
    };
}

pub(crate) const GET_ACCOUNTS: &str = "
query GetAccounts {
  accounts {
    id
    displayName
    name
    isActive
    deactivatedAt
    currentBalance
    displayBalance
    includeInNetWorth
    isHidden
    isAsset
    isManual
    mask
    updatedAt
    type { name display __typename }
    subtype { name display __typename }
    institution { id name __typename }
    __typename
  }
}
";

pub(crate) const FORCE_REFRESH_ACCOUNTS: &str = concat!(
    "mutation Common_ForceRefreshAccountsMutation($input: ForceRefreshAccountsInput!) {\n",
    "  forceRefreshAccounts(input: $input) { success ",
    payload_errors!(),
    " __typename }\n}\n"
);

pub(crate) const GET_HOLDINGS: &str = "
query Web_GetHoldings($input: PortfolioInput) {
  portfolio(input: $input) {
    aggregateHoldings {
      edges {
        node {
          id
          quantity
          basis
          totalValue
          securityPriceChangeDollars
          securityPriceChangePercent
          lastSyncedAt
          holdings { id type typeDisplay name ticker closingPrice isManual closingPriceUpdatedAt __typename }
          security { id name type ticker typeDisplay currentPrice currentPriceUpdatedAt closingPrice oneDayChangePercent oneDayChangeDollars __typename }
          __typename
        }
        __typename
      }
      __typename
    }
    __typename
  }
}
";

pub(crate) const GET_ACCOUNT_HISTORY: &str = "
query AccountDetails_getAccount($id: UUID!) {
  account(id: $id) { id displayName __typename }
  snapshots: snapshotsForAccount(accountId: $id) { date signedBalance __typename }
}
";

pub(crate) const GET_TRANSACTIONS: &str = concat!(
    "query GetTransactionsList($offset: Int, $limit: Int, $filters: TransactionFilterInput, ",
    "$orderBy: TransactionOrdering) {\n",
    "  allTransactions(filters: $filters) {\n",
    "    totalCount\n",
    "    results(offset: $offset, limit: $limit, orderBy: $orderBy) { ",
    transaction_fields!(),
    " }\n",
    "    __typename\n",
    "  }\n",
    "}\n"
);

pub(crate) const GET_TRANSACTION_DETAILS: &str = concat!(
    "query GetTransactionDrawer($id: UUID!, $redirectPosted: Boolean) {\n",
    "  getTransaction(id: $id, redirectPosted: $redirectPosted) { ",
    "originalDate reviewedAt dataProviderDescription ",
    "splitTransactions { id amount notes merchant { id name __typename } ",
    "category { id name __typename } __typename } ",
    transaction_fields!(),
    " }\n",
    "}\n"
);

pub(crate) const CREATE_TRANSACTION: &str = concat!(
    "mutation Common_CreateTransactionMutation($input: CreateTransactionMutationInput!) {\n",
    "  createTransaction(input: $input) { ",
    payload_errors!(),
    " transaction { id __typename } __typename }\n",
    "}\n"
);

pub(crate) const UPDATE_TRANSACTION: &str = concat!(
    "mutation Web_TransactionDrawerUpdateTransaction($input: UpdateTransactionMutationInput!) {\n",
    "  updateTransaction(input: $input) { transaction { ",
    transaction_fields!(),
    " } ",
    payload_errors!(),
    " __typename }\n",
    "}\n"
);

pub(crate) const DELETE_TRANSACTION: &str = concat!(
    "mutation Common_DeleteTransactionMutation($input: DeleteTransactionMutationInput!) {\n",
    "  deleteTransaction(input: $input) { deleted ",
    payload_errors!(),
    " __typename }\n",
    "}\n"
);

pub(crate) const GET_RECURRING_TRANSACTIONS: &str = "
query Web_GetUpcomingRecurringTransactionItems($startDate: Date!, $endDate: Date!, $filters: RecurringTransactionFilter) {
  recurringTransactionItems(startDate: $startDate, endDate: $endDate, filters: $filters) {
    stream {
      id
      frequency
      amount
      isApproximate
      merchant { id name logoUrl __typename }
      __typename
    }
    date
    isPast
    transactionId
    amount
    amountDiff
    category { id name __typename }
    account { id displayName logoUrl __typename }
    __typename
  }
}
";

pub(crate) const GET_TRANSACTIONS_SUMMARY: &str = "
query GetTransactionsPage($filters: TransactionFilterInput) {
  aggregates(filters: $filters) {
    summary {
      avg
      count
      max
      maxExpense
      sum
      sumIncome
      sumExpense
      first
      last
      __typename
    }
    __typename
  }
}
";

pub(crate) const GET_CASHFLOW_BY_CATEGORY: &str = r#"
query Web_GetCashFlowByCategory($filters: TransactionFilterInput) {
  byCategory: aggregates(filters: $filters, groupBy: ["category"]) {
    groupBy {
      category {
        id
        name
        group { id name type __typename }
        __typename
      }
      __typename
    }
    summary { sum avg count __typename }
    __typename
  }
}
"#;

pub(crate) const GET_CASHFLOW: &str = r#"
query Web_GetCashFlowPage($filters: TransactionFilterInput) {
  byCategory: aggregates(filters: $filters, groupBy: ["category"]) {
    groupBy { category { id name group { id type __typename } __typename } __typename }
    summary { sum __typename }
    __typename
  }
  byCategoryGroup: aggregates(filters: $filters, groupBy: ["categoryGroup"]) {
    groupBy { categoryGroup { id name type __typename } __typename }
    summary { sum __typename }
    __typename
  }
  byMerchant: aggregates(filters: $filters, groupBy: ["merchant"]) {
    groupBy { merchant { id name logoUrl __typename } __typename }
    summary { sumIncome sumExpense __typename }
    __typename
  }
  summary: aggregates(filters: $filters, fillEmptyValues: true) {
    summary { sumIncome sumExpense savings savingsRate __typename }
    __typename
  }
}
"#;

pub(crate) const GET_TRANSACTION_SPLITS: &str = "
query TransactionSplitQuery($id: UUID!) {
  getTransaction(id: $id) {
    id
    amount
    category { id name __typename }
    merchant { id name __typename }
    splitTransactions {
      id
      amount
      notes
      merchant { id name __typename }
      category { id name __typename }
      __typename
    }
    __typename
  }
}
";

pub(crate) const UPDATE_TRANSACTION_SPLITS: &str = concat!(
    "mutation Common_SplitTransactionMutation($input: UpdateTransactionSplitMutationInput!) {\n",
    "  updateTransactionSplit(input: $input) { ",
    payload_errors!(),
    " transaction { id hasSplitTransactions splitTransactions { id amount notes ",
    "merchant { id name __typename } category { id name __typename } __typename } ",
    "__typename } __typename }\n",
    "}\n"
);

pub(crate) const GET_TAGS: &str = "
query GetHouseholdTransactionTags($search: String, $limit: Int) {
  householdTransactionTags(search: $search, limit: $limit) {
    id
    name
    color
    order
    transactionCount
    __typename
  }
}
";

pub(crate) const SET_TRANSACTION_TAGS: &str = concat!(
    "mutation Web_SetTransactionTags($input: SetTransactionTagsInput!) {\n",
    "  setTransactionTags(input: $input) { ",
    payload_errors!(),
    " transaction { id tags { id name __typename } __typename } __typename }\n",
    "}\n"
);

pub(crate) const CREATE_TAG: &str = concat!(
    "mutation Common_CreateTransactionTag($input: CreateTransactionTagInput!) {\n",
    "  createTransactionTag(input: $input) { ",
    "tag { id name color order transactionCount __typename } ",
    payload_errors!(),
    " __typename }\n",
    "}\n"
);

pub(crate) const GET_TRANSACTION_RULES: &str = "
query GetTransactionRules {
  transactionRules {
    id
    order
    merchantCriteriaUseOriginalStatement
    merchantCriteria { operator value __typename }
    originalStatementCriteria { operator value __typename }
    merchantNameCriteria { operator value __typename }
    amountCriteria {
      operator
      isExpense
      value
      valueRange { lower upper __typename }
      __typename
    }
    categoryIds
    accountIds
    categories { id name icon __typename }
    accounts { id displayName __typename }
    setMerchantAction { id name __typename }
    setCategoryAction { id name icon __typename }
    addTagsAction { id name color __typename }
    linkGoalAction { id name __typename }
    setHideFromReportsAction
    reviewStatusAction
    recentApplicationCount
    lastAppliedAt
    __typename
  }
}
";

pub(crate) const CREATE_TRANSACTION_RULE: &str = concat!(
    "mutation Common_CreateTransactionRuleMutationV2($input: CreateTransactionRuleInput!) {\n",
    "  createTransactionRuleV2(input: $input) { ",
    payload_errors!(),
    " __typename }\n",
    "}\n"
);

pub(crate) const UPDATE_TRANSACTION_RULE: &str = concat!(
    "mutation Common_UpdateTransactionRuleMutationV2($input: UpdateTransactionRuleInput!) {\n",
    "  updateTransactionRuleV2(input: $input) { ",
    payload_errors!(),
    " __typename }\n",
    "}\n"
);

pub(crate) const DELETE_TRANSACTION_RULE: &str = concat!(
    "mutation Common_DeleteTransactionRule($id: ID!) {\n",
    "  deleteTransactionRule(id: $id) { deleted ",
    payload_errors!(),
    " __typename }\n",
    "}\n"
);

pub(crate) const GET_CATEGORIES: &str = "
query GetCategories {
  categories {
    id
    order
    name
    icon
    isSystemCategory
    isDisabled
    group { id name type __typename }
    __typename
  }
}
";

pub(crate) const GET_CATEGORY_GROUPS: &str = "
query ManageGetCategoryGroups {
  categoryGroups {
    id
    name
    order
    type
    budgetVariability
    groupLevelBudgetingEnabled
    categories { id name icon __typename }
    __typename
  }
}
";

pub(crate) const GET_BUDGETS: &str = "
query GetJointPlanningData($startDate: Date!, $endDate: Date!) {
  budgetData(startMonth: $startDate, endMonth: $endDate) {
    monthlyAmountsByCategory {
      category { id __typename }
      monthlyAmounts {
        month
        plannedCashFlowAmount
        actualAmount
        remainingAmount
        previousMonthRolloverAmount
        rolloverType
        __typename
      }
      __typename
    }
    totalsByMonth {
      month
      totalExpenses { plannedAmount actualAmount remainingAmount __typename }
      totalIncome { plannedAmount actualAmount remainingAmount __typename }
      __typename
    }
    __typename
  }
  categoryGroups {
    id
    name
    type
    categories { id name icon __typename }
    __typename
  }
}
";

pub(crate) const SET_BUDGET_AMOUNT: &str = "
mutation Common_UpdateBudgetItem($input: UpdateOrCreateBudgetItemMutationInput!) {
  updateOrCreateBudgetItem(input: $input) {
    budgetItem { id budgetAmount __typename }
    __typename
  }
}
";

pub(crate) const GET_AGGREGATE_SNAPSHOTS: &str = "
query GetAggregateSnapshots($filters: AggregateSnapshotFilters) {
  aggregateSnapshots(filters: $filters) {
    date
    balance
    __typename
  }
}
";

pub(crate) const GET_SNAPSHOTS_BY_ACCOUNT_TYPE: &str = "
query GetSnapshotsByAccountType($startDate: Date!, $timeframe: Timeframe!) {
  snapshotsByAccountType(startDate: $startDate, timeframe: $timeframe) {
    accountType
    month
    balance
    __typename
  }
}
";
