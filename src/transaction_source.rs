//! Defines the transaction source trait and its HTTP implementation.

use std::future::Future;

use reqwest::Client;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::{
    Error,
    models::{Transaction, UserId},
};

/// The name reported in errors when the transaction service is unreachable.
pub const TRANSACTION_SERVICE: &str = "transactions";

/// Supplies the raw spend records the engine aggregates.
///
/// The engine only ever reads transactions through this seam, so tests can
/// inject fixtures instead of standing up the transaction service.
pub trait TransactionSource {
    /// Fetch the transactions recorded for `user_id` within `[start, end]`.
    ///
    /// # Errors
    /// Returns [Error::UpstreamUnavailable] when the transaction service
    /// cannot be reached, times out, or answers with a non-success status.
    /// A window with no transactions is `Ok` with an empty list, never an
    /// error.
    fn fetch(
        &self,
        user_id: UserId,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> impl Future<Output = Result<Vec<Transaction>, Error>> + Send;
}

/// Fetches transactions from the transaction service over HTTP.
#[derive(Debug, Clone)]
pub struct HttpTransactionSource {
    client: Client,
    base_url: String,
}

impl HttpTransactionSource {
    /// Create a source that queries the transaction service at `base_url`
    /// using `client`. The client's timeout bounds every fetch.
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn unavailable(reason: String) -> Error {
        Error::UpstreamUnavailable {
            service: TRANSACTION_SERVICE.to_string(),
            reason,
        }
    }
}

impl TransactionSource for HttpTransactionSource {
    async fn fetch(
        &self,
        user_id: UserId,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Result<Vec<Transaction>, Error> {
        let url = format!("{}/transactions/{}", self.base_url, user_id);
        let start_date = start
            .format(&Rfc3339)
            .map_err(|e| Error::InvalidTimestamp(e.to_string()))?;
        let end_date = end
            .format(&Rfc3339)
            .map_err(|e| Error::InvalidTimestamp(e.to_string()))?;

        let response = self
            .client
            .get(&url)
            .query(&[("start_date", start_date), ("end_date", end_date)])
            .send()
            .await
            .map_err(|e| Self::unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::unavailable(format!(
                "unexpected status {} from {}",
                response.status(),
                url
            )));
        }

        response
            .json()
            .await
            .map_err(|e| Self::unavailable(format!("could not parse response: {e}")))
    }
}
