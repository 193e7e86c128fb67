//! The API gateway: path-based dispatch and transparent proxying of inbound
//! requests to the backend services.
//!
//! Dispatch is stateless. Each request flows linearly through
//! route → build → forward → relay, with no retries and no shared mutable
//! state, so a slow or dead backend only ever affects the requests that
//! target it.

use axum::{
    Json,
    Router,
    body::to_bytes,
    extract::{Path, Request, State},
    http::{HeaderMap, Method, header},
    response::{IntoResponse, Response},
    routing::{any, get, post},
};
use serde_json::{Value, json};

use crate::{Error, endpoints, state::GatewayState};

/// The backend service a request is forwarded to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Backend {
    Transactions,
    Accounts,
    Notifications,
    Budget,
}

impl Backend {
    /// The service name used in error messages.
    fn name(self) -> &'static str {
        match self {
            Backend::Transactions => "transactions",
            Backend::Accounts => "accounts",
            Backend::Notifications => "notifications",
            Backend::Budget => "budget",
        }
    }

    fn base_url(self, state: &GatewayState) -> &str {
        match self {
            Backend::Transactions => &state.services.transactions,
            Backend::Accounts => &state.services.accounts,
            Backend::Notifications => &state.services.notifications,
            Backend::Budget => &state.services.budget,
        }
    }
}

/// Return a router with all the gateway's routes.
pub fn build_router(state: GatewayState) -> Router {
    Router::new()
        .route(endpoints::ROOT, get(get_service_index))
        .route(endpoints::HEALTH, get(get_health))
        .route(endpoints::TRANSACTIONS, any(proxy_transactions))
        .route(endpoints::USERS, any(proxy_users))
        .route(endpoints::ACCOUNTS, any(proxy_accounts))
        .route(endpoints::NOTIFICATIONS, any(proxy_notifications))
        .route(endpoints::PREFERENCES, any(proxy_preferences))
        .route(endpoints::BUDGETS, any(proxy_budgets))
        .route(endpoints::INSIGHTS, any(proxy_insights))
        .route(endpoints::AUTH_REGISTER, post(register))
        .route(endpoints::AUTH_LOGIN, post(log_in))
        .route(endpoints::AUTH_ME, get(get_current_user))
        .with_state(state)
}

/// List the configured backends and where to check their health.
async fn get_service_index(State(state): State<GatewayState>) -> Json<Value> {
    Json(json!({
        "service": "ledgerhub gateway",
        "status": "running",
        "services": {
            "transactions": format!("{}/health", state.services.transactions),
            "accounts": format!("{}/health", state.services.accounts),
            "notifications": format!("{}/health", state.services.notifications),
            "budget": format!("{}/health", state.services.budget),
        },
    }))
}

/// The gateway's own liveness probe. Never contacts a backend.
async fn get_health() -> Json<Value> {
    Json(json!({"status": "healthy"}))
}

async fn proxy_transactions(
    State(state): State<GatewayState>,
    Path(rest): Path<String>,
    request: Request,
) -> Response {
    // The transaction service is the one backend mounted at its root, so the
    // whole prefix is stripped.
    proxy(&state, Backend::Transactions, format!("/{rest}"), request).await
}

async fn proxy_users(
    State(state): State<GatewayState>,
    Path(rest): Path<String>,
    request: Request,
) -> Response {
    proxy(&state, Backend::Accounts, format!("/users/{rest}"), request).await
}

async fn proxy_accounts(
    State(state): State<GatewayState>,
    Path(rest): Path<String>,
    request: Request,
) -> Response {
    proxy(&state, Backend::Accounts, format!("/accounts/{rest}"), request).await
}

async fn proxy_notifications(
    State(state): State<GatewayState>,
    Path(rest): Path<String>,
    request: Request,
) -> Response {
    proxy(
        &state,
        Backend::Notifications,
        format!("/notifications/{rest}"),
        request,
    )
    .await
}

async fn proxy_preferences(
    State(state): State<GatewayState>,
    Path(rest): Path<String>,
    request: Request,
) -> Response {
    proxy(
        &state,
        Backend::Notifications,
        format!("/preferences/{rest}"),
        request,
    )
    .await
}

async fn proxy_budgets(
    State(state): State<GatewayState>,
    Path(rest): Path<String>,
    request: Request,
) -> Response {
    proxy(&state, Backend::Budget, format!("/budgets/{rest}"), request).await
}

async fn proxy_insights(
    State(state): State<GatewayState>,
    Path(rest): Path<String>,
    request: Request,
) -> Response {
    proxy(&state, Backend::Budget, format!("/insights/{rest}"), request).await
}

async fn register(State(state): State<GatewayState>, request: Request) -> Response {
    proxy(&state, Backend::Accounts, "/users/register".to_string(), request).await
}

async fn log_in(State(state): State<GatewayState>, request: Request) -> Response {
    proxy(&state, Backend::Accounts, "/users/login".to_string(), request).await
}

async fn get_current_user(State(state): State<GatewayState>, request: Request) -> Response {
    proxy(&state, Backend::Accounts, "/users/me".to_string(), request).await
}

/// Forward `request` to `backend` at `path` and relay whatever comes back.
async fn proxy(state: &GatewayState, backend: Backend, path: String, request: Request) -> Response {
    match forward(state, backend, path, request).await {
        Ok(response) => response,
        Err(error) => error.into_response(),
    }
}

async fn forward(
    state: &GatewayState,
    backend: Backend,
    path: String,
    request: Request,
) -> Result<Response, Error> {
    let method = request.method().clone();
    if !is_forwardable(&method) {
        return Err(Error::UnsupportedMethod(method.to_string()));
    }

    let mut url = format!("{}{}", backend.base_url(state), path);
    if let Some(query) = request.uri().query() {
        url = format!("{url}?{query}");
    }

    let headers = forwarded_headers(request.headers());
    let mut outbound = state.client.request(method.clone(), &url).headers(headers);

    if method == Method::POST || method == Method::PUT {
        let body = to_bytes(request.into_body(), usize::MAX)
            .await
            .map_err(|e| Error::RequestBody(e.to_string()))?;
        outbound = outbound.body(body);
    }

    let response = outbound
        .send()
        .await
        .map_err(|e| Error::UpstreamUnavailable {
            service: backend.name().to_string(),
            reason: e.to_string(),
        })?;

    relay(backend, response).await
}

/// The methods the gateway forwards. Anything else is rejected with a 405
/// before any outbound call is made.
fn is_forwardable(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::POST | Method::PUT | Method::DELETE
    )
}

/// Copy the inbound headers for the outbound request.
///
/// The `Host` header is dropped so it cannot conflict with the backend's own
/// host; the client sets the correct one from the target URL.
fn forwarded_headers(inbound: &HeaderMap) -> HeaderMap {
    let mut headers = inbound.clone();
    headers.remove(header::HOST);
    headers
}

/// Relay the backend's status and body to the caller.
///
/// JSON bodies are parsed and re-emitted as JSON; everything else is relayed
/// byte for byte with the backend's content type. A body labelled JSON that
/// does not parse is relayed untouched.
async fn relay(backend: Backend, response: reqwest::Response) -> Result<Response, Error> {
    let status = response.status();
    let content_type = response.headers().get(header::CONTENT_TYPE).cloned();
    let body = response
        .bytes()
        .await
        .map_err(|e| Error::UpstreamUnavailable {
            service: backend.name().to_string(),
            reason: e.to_string(),
        })?;

    let is_json = content_type
        .as_ref()
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"));

    if is_json {
        if let Ok(value) = serde_json::from_slice::<Value>(&body) {
            return Ok((status, Json(value)).into_response());
        }
    }

    let mut relayed = (status, body).into_response();
    if let Some(content_type) = content_type {
        relayed
            .headers_mut()
            .insert(header::CONTENT_TYPE, content_type);
    }

    Ok(relayed)
}
