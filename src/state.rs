//! Implements the structs that hold the state of each service.
//!
//! Both states are read-only after initialization: requests share nothing
//! mutable, so any number of them can be served concurrently.

use reqwest::Client;

use crate::{config::ServiceUrls, transaction_source::TransactionSource};

/// The state of the gateway: the routing table and a pooled outbound client.
#[derive(Debug, Clone)]
pub struct GatewayState {
    /// The client used for all outbound calls. Its timeout bounds every
    /// forwarded request.
    pub client: Client,
    /// The base URLs of the backend services.
    pub services: ServiceUrls,
}

impl GatewayState {
    /// Create a new [GatewayState].
    pub fn new(services: ServiceUrls, client: Client) -> Self {
        Self { client, services }
    }
}

/// The state of the budget-analysis service.
#[derive(Debug, Clone)]
pub struct AnalysisState<S>
where
    S: TransactionSource + Send + Sync,
{
    /// The source the engine fetches transactions from.
    pub transaction_source: S,
}

impl<S> AnalysisState<S>
where
    S: TransactionSource + Send + Sync,
{
    /// Create a new [AnalysisState].
    pub fn new(transaction_source: S) -> Self {
        Self { transaction_source }
    }
}
