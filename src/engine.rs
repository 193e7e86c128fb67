//! The budget-analysis engine.
//!
//! All derivation math lives in pure functions that take their inputs,
//! including the current time, as arguments. The async operations only
//! orchestrate fetches against a [TransactionSource], so the math can be
//! tested with fixtures and no I/O.

use std::cmp::Ordering;

use futures_util::future::join_all;
use time::{Duration, OffsetDateTime};

use crate::{
    Error,
    models::{
        Budget, BudgetAnalysis, BudgetOutcome, BudgetStatus, SpendingInsight, Transaction, Trend,
        UserId,
    },
    transaction_source::TransactionSource,
};

/// The trailing window used for spending insights when the caller does not
/// supply one, in days.
pub const DEFAULT_INSIGHT_WINDOW_DAYS: u32 = 30;

/// The percentage of the ceiling at which a budget becomes at risk.
const AT_RISK_THRESHOLD: f64 = 80.0;
/// The percentage of the ceiling at which a budget is over budget.
const OVER_BUDGET_THRESHOLD: f64 = 100.0;

/// Analyse each of `budgets` against the transactions recorded for `user_id`
/// over the budget's window.
///
/// Fetches for different budgets run concurrently, but the output always
/// preserves the input order. A fetch failure yields an
/// [unavailable](BudgetOutcome::Unavailable) outcome for that budget only;
/// sibling budgets are analysed regardless.
pub async fn analyze<S>(source: &S, user_id: UserId, budgets: &[Budget]) -> Vec<BudgetOutcome>
where
    S: TransactionSource + Sync,
{
    let fetches = budgets
        .iter()
        .map(|budget| source.fetch(user_id, budget.start_date, budget.end_date));
    let results = join_all(fetches).await;
    let now = OffsetDateTime::now_utc();

    budgets
        .iter()
        .zip(results)
        .map(|(budget, result)| match result {
            Ok(transactions) => {
                BudgetOutcome::Analysed(analyse_budget(budget, &transactions, now))
            }
            Err(error) => {
                tracing::warn!("Could not fetch transactions for budget {}: {}", budget.id, error);
                BudgetOutcome::Unavailable {
                    budget_id: budget.id,
                    error: error.to_string(),
                }
            }
        })
        .collect()
}

/// Aggregate the spending of `user_id` by category over the trailing
/// `window_days` days.
///
/// `window_days` must be positive; the HTTP adapter rejects zero before the
/// engine is invoked. Unlike [analyze] there is no per-item fallback here: a
/// failed fetch for the whole window propagates so the caller never mistakes
/// an unreachable transaction service for a quiet month.
pub async fn spending_insights<S>(
    source: &S,
    user_id: UserId,
    window_days: u32,
) -> Result<Vec<SpendingInsight>, Error>
where
    S: TransactionSource + Sync,
{
    let end = OffsetDateTime::now_utc();
    let start = end - Duration::days(i64::from(window_days));

    let transactions = source.fetch(user_id, start, end).await?;

    Ok(insights_for(&transactions))
}

/// Derive the spend summary for a single budget from the transactions
/// fetched for its window.
///
/// Transactions count towards the budget when their category matches the
/// budget's case-insensitively. The percentage is zero for a non-positive
/// ceiling, and `days_remaining` is floored at zero however far in the past
/// `end_date` is.
pub fn analyse_budget(
    budget: &Budget,
    transactions: &[Transaction],
    now: OffsetDateTime,
) -> BudgetAnalysis {
    let category = budget.category.to_lowercase();
    let spent_amount: f64 = transactions
        .iter()
        .filter(|transaction| transaction.category.to_lowercase() == category)
        .map(|transaction| transaction.amount)
        .sum();

    let remaining_amount = budget.amount - spent_amount;
    let percentage_used = if budget.amount > 0.0 {
        spent_amount / budget.amount * 100.0
    } else {
        0.0
    };
    let days_remaining = (budget.end_date - now).whole_days().max(0);

    let status = if percentage_used >= OVER_BUDGET_THRESHOLD {
        BudgetStatus::OverBudget
    } else if percentage_used >= AT_RISK_THRESHOLD {
        BudgetStatus::AtRisk
    } else {
        BudgetStatus::OnTrack
    };

    BudgetAnalysis {
        budget_id: budget.id,
        budget_name: budget.name.clone(),
        budget_amount: budget.amount,
        spent_amount,
        remaining_amount,
        percentage_used,
        days_remaining,
        status,
    }
}

/// Group `transactions` by their exact category label and summarize each
/// group.
///
/// Categories are grouped exactly as the transaction service returned them,
/// without case folding. This is deliberately different from
/// [analyse_budget], which folds case when matching against a budget.
/// Groups keep their first-seen order, and the result is stably sorted by
/// total spent, descending.
pub fn insights_for(transactions: &[Transaction]) -> Vec<SpendingInsight> {
    let mut groups: Vec<(&str, f64, usize)> = Vec::new();

    for transaction in transactions {
        match groups
            .iter_mut()
            .find(|(category, _, _)| *category == transaction.category)
        {
            Some((_, total, count)) => {
                *total += transaction.amount;
                *count += 1;
            }
            None => groups.push((&transaction.category, transaction.amount, 1)),
        }
    }

    let mut insights: Vec<SpendingInsight> = groups
        .into_iter()
        .map(|(category, total, count)| SpendingInsight {
            category: category.to_string(),
            total_spent: round_to_cents(total),
            transaction_count: count,
            average_transaction: round_to_cents(total / count as f64),
            trend: Trend::Stable,
        })
        .collect();

    insights.sort_by(|a, b| {
        b.total_spent
            .partial_cmp(&a.total_spent)
            .unwrap_or(Ordering::Equal)
    });

    insights
}

fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}



#[cfg(test)]
mod analyze_tests {
    use time::{Duration, OffsetDateTime, macros::datetime};

    use crate::{
        Error,
        models::{Budget, BudgetOutcome, BudgetPeriod, Transaction, UserId},
        transaction_source::TransactionSource,
    };

    use super::analyze;

    const NOW: OffsetDateTime = datetime!(2025-06-01 00:00 UTC);

    /// A source that fails fetches for one specific window start and answers
    /// every other window with a fixed transaction list.
    #[derive(Clone)]
    struct FlakyWindowSource {
        transactions: Vec<Transaction>,
        failing_start: OffsetDateTime,
    }

    impl TransactionSource for FlakyWindowSource {
        async fn fetch(
            &self,
            _user_id: UserId,
            start: OffsetDateTime,
            _end: OffsetDateTime,
        ) -> Result<Vec<Transaction>, Error> {
            if start == self.failing_start {
                Err(Error::UpstreamUnavailable {
                    service: "transactions".to_string(),
                    reason: "connection refused".to_string(),
                })
            } else {
                Ok(self.transactions.clone())
            }
        }
    }

    fn budget(id: i64, start: OffsetDateTime) -> Budget {
        Budget {
            id,
            user_id: 7,
            name: format!("Budget {id}"),
            category: "dining".to_string(),
            amount: 100.0,
            period: BudgetPeriod::Monthly,
            start_date: start,
            end_date: start + Duration::days(30),
        }
    }

    #[tokio::test]
    async fn one_failed_fetch_does_not_abort_sibling_budgets() {
        let failing_start = NOW - Duration::days(60);
        let source = FlakyWindowSource {
            transactions: vec![Transaction {
                amount: 40.0,
                category: "dining".to_string(),
            }],
            failing_start,
        };
        let budgets = vec![budget(1, NOW), budget(2, failing_start), budget(3, NOW)];

        let outcomes = analyze(&source, 7, &budgets).await;

        assert_eq!(outcomes.len(), 3);
        assert!(matches!(&outcomes[0], BudgetOutcome::Analysed(analysis) if analysis.budget_id == 1));
        assert!(matches!(
            &outcomes[1],
            BudgetOutcome::Unavailable { budget_id: 2, .. }
        ));
        assert!(matches!(&outcomes[2], BudgetOutcome::Analysed(analysis) if analysis.budget_id == 3));
    }

    #[tokio::test]
    async fn output_preserves_input_order() {
        let source = FlakyWindowSource {
            transactions: vec![],
            failing_start: NOW - Duration::days(999),
        };
        let budgets = vec![budget(5, NOW), budget(2, NOW), budget(9, NOW)];

        let outcomes = analyze(&source, 7, &budgets).await;

        let ids: Vec<i64> = outcomes
            .iter()
            .map(|outcome| match outcome {
                BudgetOutcome::Analysed(analysis) => analysis.budget_id,
                BudgetOutcome::Unavailable { budget_id, .. } => *budget_id,
            })
            .collect();
        assert_eq!(ids, vec![5, 2, 9]);
    }

    #[tokio::test]
    async fn no_budgets_yields_no_outcomes() {
        let source = FlakyWindowSource {
            transactions: vec![],
            failing_start: NOW,
        };

        let outcomes = analyze(&source, 7, &[]).await;

        assert!(outcomes.is_empty());
    }
}

#[cfg(test)]
mod spending_insights_tests {
    use time::OffsetDateTime;

    use crate::{
        Error,
        models::{Transaction, UserId},
        transaction_source::TransactionSource,
    };

    use super::spending_insights;

    #[derive(Clone)]
    struct FixtureSource {
        result: Result<Vec<Transaction>, Error>,
    }

    impl TransactionSource for FixtureSource {
        async fn fetch(
            &self,
            _user_id: UserId,
            _start: OffsetDateTime,
            _end: OffsetDateTime,
        ) -> Result<Vec<Transaction>, Error> {
            self.result.clone()
        }
    }

    #[tokio::test]
    async fn empty_window_is_ok_and_empty() {
        let source = FixtureSource {
            result: Ok(vec![]),
        };

        let insights = spending_insights(&source, 7, 30).await.unwrap();

        assert!(insights.is_empty());
    }

    #[tokio::test]
    async fn fetch_failure_propagates() {
        let source = FixtureSource {
            result: Err(Error::UpstreamUnavailable {
                service: "transactions".to_string(),
                reason: "timed out".to_string(),
            }),
        };

        let result = spending_insights(&source, 7, 30).await;

        assert!(matches!(result, Err(Error::UpstreamUnavailable { .. })));
    }
}
