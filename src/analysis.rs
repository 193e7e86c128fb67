//! The HTTP transport adapter for the budget-analysis engine.
//!
//! Handlers here only marshal requests and responses. All derivation logic
//! lives in [crate::engine], and the caller (the budget persistence layer,
//! which owns the budgets) supplies the budgets to analyse.

use axum::{
    Json,
    Router,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
    Error,
    endpoints,
    engine::{self, DEFAULT_INSIGHT_WINDOW_DAYS},
    models::{Budget, BudgetOutcome, UserId},
    state::AnalysisState,
    transaction_source::TransactionSource,
};

/// Return a router with all the budget-analysis service's routes.
pub fn build_router<S>(state: AnalysisState<S>) -> Router
where
    S: TransactionSource + Clone + Send + Sync + 'static,
{
    Router::new()
        .route(endpoints::ROOT, get(get_service_banner))
        .route(endpoints::HEALTH, get(get_health))
        .route(endpoints::ANALYSIS, post(analyze_budgets::<S>))
        .route(endpoints::SPENDING_INSIGHTS, get(get_spending_insights::<S>))
        .with_state(state)
}

async fn get_service_banner() -> Json<Value> {
    Json(json!({"service": "ledgerhub budget analysis", "status": "running"}))
}

async fn get_health() -> Json<Value> {
    Json(json!({"status": "healthy"}))
}

/// A route handler for analysing a user's budgets.
///
/// The request body is the user's full budget list, already loaded by the
/// persistence layer. The response holds one outcome per budget in the same
/// order: an analysis, or an unavailable record when that budget's
/// transaction fetch failed.
async fn analyze_budgets<S>(
    State(state): State<AnalysisState<S>>,
    Path(user_id): Path<UserId>,
    Json(budgets): Json<Vec<Budget>>,
) -> Json<Vec<BudgetOutcome>>
where
    S: TransactionSource + Clone + Send + Sync,
{
    Json(engine::analyze(&state.transaction_source, user_id, &budgets).await)
}

#[derive(Debug, Deserialize)]
struct InsightParams {
    days: Option<u32>,
}

/// A route handler for category spending insights over a trailing window.
///
/// `days` defaults to 30 and must be positive; a window of zero days is
/// rejected before the engine runs.
async fn get_spending_insights<S>(
    State(state): State<AnalysisState<S>>,
    Path(user_id): Path<UserId>,
    Query(params): Query<InsightParams>,
) -> Response
where
    S: TransactionSource + Clone + Send + Sync,
{
    let window_days = params.days.unwrap_or(DEFAULT_INSIGHT_WINDOW_DAYS);
    if window_days == 0 {
        return Error::InvalidWindow.into_response();
    }

    match engine::spending_insights(&state.transaction_source, user_id, window_days).await {
        Ok(insights) => Json(insights).into_response(),
        Err(error) => error.into_response(),
    }
}

#[cfg(test)]
mod analysis_route_tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::{Value, json};
    use time::OffsetDateTime;

    use crate::{
        Error,
        models::{Transaction, UserId},
        state::AnalysisState,
        transaction_source::TransactionSource,
    };

    use super::build_router;

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

    fn server_with(result: Result<Vec<Transaction>, Error>) -> TestServer {
        let state = AnalysisState::new(FixtureSource { result });

        TestServer::new(build_router(state)).expect("Could not create test server.")
    }

    fn dining_budget() -> Value {
        json!({
            "id": 3,
            "user_id": 7,
            "name": "Eating out",
            "category": "dining",
            "amount": 500.0,
            "period": "monthly",
            "start_date": "2025-06-01T00:00:00Z",
            "end_date": "2025-07-01T00:00:00Z",
        })
    }

    #[tokio::test]
    async fn health_reports_healthy() {
        let server = server_with(Ok(vec![]));

        let response = server.get("/health").await;

        response.assert_status_ok();
        response.assert_json(&json!({"status": "healthy"}));
    }

    #[tokio::test]
    async fn analysis_returns_one_outcome_per_budget() {
        let server = server_with(Ok(vec![
            Transaction {
                amount: 120.0,
                category: "Dining".to_string(),
            },
            Transaction {
                amount: 80.0,
                category: "transport".to_string(),
            },
        ]));

        let response = server
            .post("/analysis/7")
            .json(&json!([dining_budget()]))
            .await;

        response.assert_status_ok();
        let outcomes = response.json::<Value>();
        let analysis = &outcomes[0];
        assert_eq!(analysis["budget_id"], 3);
        assert_eq!(analysis["spent_amount"], 120.0);
        assert_eq!(analysis["remaining_amount"], 380.0);
        assert_eq!(analysis["percentage_used"], 24.0);
        assert_eq!(analysis["status"], "on_track");
    }

    #[tokio::test]
    async fn failed_fetch_is_reported_per_budget_not_as_zero_spend() {
        let server = server_with(Err(Error::UpstreamUnavailable {
            service: "transactions".to_string(),
            reason: "timed out".to_string(),
        }));

        let response = server
            .post("/analysis/7")
            .json(&json!([dining_budget()]))
            .await;

        response.assert_status_ok();
        let outcomes = response.json::<Value>();
        assert_eq!(outcomes[0]["budget_id"], 3);
        assert!(outcomes[0].get("spent_amount").is_none());
        assert_eq!(
            outcomes[0]["error"],
            "transactions is unavailable: timed out"
        );
    }

    #[tokio::test]
    async fn insights_sorted_by_total_descending() {
        let server = server_with(Ok(vec![
            Transaction {
                amount: 5.0,
                category: "coffee".to_string(),
            },
            Transaction {
                amount: 50.0,
                category: "rent".to_string(),
            },
        ]));

        let response = server.get("/insights/7/spending").await;

        response.assert_status_ok();
        let insights = response.json::<Value>();
        assert_eq!(insights[0]["category"], "rent");
        assert_eq!(insights[1]["category"], "coffee");
        assert_eq!(insights[0]["trend"], "stable");
    }

    #[tokio::test]
    async fn insights_with_no_transactions_is_an_empty_list() {
        let server = server_with(Ok(vec![]));

        let response = server.get("/insights/7/spending?days=14").await;

        response.assert_status_ok();
        response.assert_json(&json!([]));
    }

    #[tokio::test]
    async fn zero_day_window_is_rejected() {
        let server = server_with(Ok(vec![]));

        let response = server.get("/insights/7/spending?days=0").await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unavailable_source_yields_503_for_insights() {
        let server = server_with(Err(Error::UpstreamUnavailable {
            service: "transactions".to_string(),
            reason: "connection refused".to_string(),
        }));

        let response = server.get("/insights/7/spending").await;

        response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    }
}
