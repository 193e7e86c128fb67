//! The data model shared by the gateway and the budget-analysis engine.
//!
//! Nothing here is persisted by this crate: budgets arrive from the budget
//! persistence service, transactions from the transaction service, and the
//! derived types are recomputed on every request and discarded once the
//! response is serialized.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Identifies a user across the backend services.
pub type UserId = i64;

/// Identifies a budget owned by the budget persistence service.
pub type BudgetId = i64;

/// A user-defined spending ceiling for a category over a time window.
///
/// Budgets are owned by the caller's persistence layer; the engine reads them
/// but never stores or mutates them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    /// The budget's ID in the persistence layer.
    pub id: BudgetId,
    /// The user the budget belongs to.
    pub user_id: UserId,
    /// The display name for the budget.
    pub name: String,
    /// The transaction category the budget applies to, matched
    /// case-insensitively.
    pub category: String,
    /// The budget ceiling.
    pub amount: f64,
    /// How often the budget resets. Informational only, the engine does not
    /// check it against the start and end dates.
    pub period: BudgetPeriod,
    /// The start of the budget window.
    #[serde(with = "time::serde::rfc3339")]
    pub start_date: OffsetDateTime,
    /// The end of the budget window.
    ///
    /// May precede `start_date`; an inverted window yields zero days
    /// remaining rather than an error.
    #[serde(with = "time::serde::rfc3339")]
    pub end_date: OffsetDateTime,
}

/// How often a budget resets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetPeriod {
    /// The budget covers a week.
    Weekly,
    /// The budget covers a month.
    Monthly,
    /// The budget covers a year.
    Yearly,
}

/// A spend record as returned by the transaction service.
///
/// The amount is summed as-is with no sign convention, and missing fields
/// default rather than fail so the engine tolerates partial records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The transaction amount.
    #[serde(default)]
    pub amount: f64,
    /// The free-text category label.
    #[serde(default)]
    pub category: String,
}

/// The derived spend summary for a single budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetAnalysis {
    /// The budget the analysis was computed for.
    pub budget_id: BudgetId,
    /// The budget's display name.
    pub budget_name: String,
    /// The budget ceiling.
    pub budget_amount: f64,
    /// The sum of matching transaction amounts over the budget window.
    pub spent_amount: f64,
    /// `budget_amount - spent_amount`. Goes negative when overspent.
    pub remaining_amount: f64,
    /// `spent_amount / budget_amount * 100`, or zero for a non-positive
    /// ceiling. Not capped at 100.
    pub percentage_used: f64,
    /// Whole days from now until the end of the window, floored at zero.
    pub days_remaining: i64,
    /// Where the spending sits relative to the ceiling.
    pub status: BudgetStatus,
}

/// Where a budget's spending sits relative to its ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetStatus {
    /// Less than 80% of the ceiling has been spent.
    OnTrack,
    /// At least 80% but less than 100% of the ceiling has been spent.
    AtRisk,
    /// The ceiling has been reached or exceeded.
    OverBudget,
}

/// The result of analysing a single budget.
///
/// A failed transaction fetch is reported per budget instead of being
/// conflated with zero spend, so the caller can tell an idle budget apart
/// from an unreachable transaction service. One budget's failure never
/// affects its siblings.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BudgetOutcome {
    /// The fetch succeeded and the budget was analysed.
    Analysed(BudgetAnalysis),
    /// The transaction fetch for this budget's window failed.
    Unavailable {
        /// The budget whose fetch failed.
        budget_id: BudgetId,
        /// The reason the transaction service was unavailable.
        error: String,
    },
}

/// Aggregate spending for one category over the insight window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpendingInsight {
    /// The category label exactly as the transaction service returned it.
    pub category: String,
    /// The sum of amounts in the category, rounded to two decimal places.
    pub total_spent: f64,
    /// How many transactions fell in the category.
    pub transaction_count: usize,
    /// `total_spent / transaction_count`, rounded to two decimal places.
    pub average_transaction: f64,
    /// The direction spending is moving in.
    pub trend: Trend,
}

/// The direction a category's spending is moving in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    /// Spending is going up.
    Increasing,
    /// Spending is going down.
    Decreasing,
    /// No movement detected. Currently the only variant the engine emits:
    /// computing a real trend needs a historical baseline that is not fetched
    /// yet, so this doubles as the explicit placeholder.
    Stable,
}
