//! Resolves the locations of the backend services from the environment.
//!
//! All configuration is read once at process start and is immutable
//! afterwards; nothing in this crate mutates shared state across requests.

use std::{env, env::VarError, time::Duration};

/// How long an outbound call may wait before it is reported as
/// [unavailable](crate::Error::UpstreamUnavailable), unless overridden by
/// `OUTBOUND_TIMEOUT_SECONDS`.
pub const DEFAULT_OUTBOUND_TIMEOUT: Duration = Duration::from_secs(10);

/// The base URLs of the backend services the gateway forwards to.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceUrls {
    /// The transaction service.
    pub transactions: String,
    /// The account management service (users, accounts, auth).
    pub accounts: String,
    /// The notification service (notifications, preferences).
    pub notifications: String,
    /// The budget-analysis service (budgets, insights).
    pub budget: String,
}

impl ServiceUrls {
    /// Read the backend base URLs from the environment, falling back to the
    /// conventional localhost ports for any that are unset.
    pub fn from_env() -> Self {
        Self {
            transactions: url_or_default("TRANSACTION_SERVICE_URL", "http://localhost:8001"),
            accounts: url_or_default("ACCOUNT_SERVICE_URL", "http://localhost:8002"),
            notifications: url_or_default("NOTIFICATION_SERVICE_URL", "http://localhost:8003"),
            budget: url_or_default("BUDGET_SERVICE_URL", "http://localhost:8004"),
        }
    }
}

/// Get a base URL from the environment variable `env_key` if set, otherwise
/// return `default_url`. Trailing slashes are trimmed so the URL can be
/// joined with a path.
///
/// # Panics
/// This function panics if the environment variable `env_key` is set but is
/// not valid unicode.
fn url_or_default(env_key: &str, default_url: &str) -> String {
    match env::var(env_key) {
        Ok(url) => url.trim_end_matches('/').to_string(),
        Err(VarError::NotPresent) => {
            tracing::debug!(
                "The environment variable '{}' was not set, using the default URL {}.",
                env_key,
                default_url
            );
            default_url.to_string()
        }
        Err(e) => {
            tracing::error!(
                "An error occurred retrieving the environment variable '{}': {}",
                env_key,
                e
            );
            panic!();
        }
    }
}

/// Get the outbound call timeout from `OUTBOUND_TIMEOUT_SECONDS` if set,
/// otherwise return [DEFAULT_OUTBOUND_TIMEOUT].
///
/// # Panics
/// This function panics if the environment variable is set but cannot be
/// parsed as an integer number of seconds.
pub fn outbound_timeout() -> Duration {
    let seconds_string = match env::var("OUTBOUND_TIMEOUT_SECONDS") {
        Ok(string) => string,
        Err(VarError::NotPresent) => return DEFAULT_OUTBOUND_TIMEOUT,
        Err(e) => {
            tracing::error!(
                "An error occurred retrieving the environment variable 'OUTBOUND_TIMEOUT_SECONDS': {}",
                e
            );
            panic!();
        }
    };

    match seconds_string.parse() {
        Ok(seconds) => Duration::from_secs(seconds),
        Err(e) => {
            tracing::error!(
                "An error occurred parsing the timeout '{}' from the environment variable 'OUTBOUND_TIMEOUT_SECONDS': {}",
                seconds_string,
                e
            );
            panic!();
        }
    }
}
