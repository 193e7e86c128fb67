//! Ledgerhub is the cross-service core of a personal-finance platform.
//!
//! The platform is split into independently deployed CRUD services
//! (transactions, accounts, notifications, budgets) that this crate does not
//! implement. What lives here is the glue between them:
//!
//! - The **gateway** ([gateway]): path-based dispatch of all inbound HTTP
//!   traffic to the right backend service, forwarding requests transparently
//!   and relaying responses (or a translated failure) back to the caller.
//! - The **budget-analysis engine** ([engine]): aggregation of transactions
//!   fetched from the transaction service into per-budget spend summaries and
//!   category-level spending insights, exposed over HTTP by a thin adapter
//!   ([analysis]).

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

pub mod analysis;
pub mod config;
pub mod endpoints;
pub mod engine;
pub mod gateway;
pub mod models;
pub mod state;
pub mod transaction_source;

pub use state::{AnalysisState, GatewayState};
pub use transaction_source::{HttpTransactionSource, TransactionSource};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum Error {
    /// A backend service or the transaction service could not be reached,
    /// timed out, or answered with a non-success status.
    ///
    /// This is deliberately distinct from an empty result: a budget with no
    /// matching transactions is zero spend, a budget whose fetch failed is
    /// reported with this error so the caller can tell the two apart.
    #[error("{service} is unavailable: {reason}")]
    UpstreamUnavailable {
        /// The name of the service that could not be reached.
        service: String,
        /// The underlying transport or status error.
        reason: String,
    },

    /// The inbound request used an HTTP method the gateway does not forward.
    ///
    /// Rejected before any outbound call is attempted.
    #[error("method {0} is not allowed")]
    UnsupportedMethod(String),

    /// The spending-insights window was not a positive number of days.
    #[error("days must be a positive integer")]
    InvalidWindow,

    /// The inbound request body could not be read.
    #[error("could not read the request body: {0}")]
    RequestBody(String),

    /// A timestamp could not be formatted for an outbound query.
    #[error("could not format timestamp: {0}")]
    InvalidTimestamp(String),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match self {
            Error::UpstreamUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Error::UnsupportedMethod(_) => StatusCode::METHOD_NOT_ALLOWED,
            Error::InvalidWindow | Error::RequestBody(_) => StatusCode::BAD_REQUEST,
            Error::InvalidTimestamp(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!("{self}");
        }

        let body = Json(json!({
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}
