//! The inbound route URIs for the gateway and the budget-analysis service.

/// The gateway's service index listing the configured backends.
pub const ROOT: &str = "/";
/// Liveness probe, answered locally without contacting any backend.
pub const HEALTH: &str = "/health";

/// Proxied to the transaction service with the prefix stripped.
pub const TRANSACTIONS: &str = "/api/v1/transactions/{*rest}";
/// Proxied to the account service at `/users/{rest}`.
pub const USERS: &str = "/api/v1/users/{*rest}";
/// Proxied to the account service at `/accounts/{rest}`.
pub const ACCOUNTS: &str = "/api/v1/accounts/{*rest}";
/// Proxied to the notification service with the path preserved.
pub const NOTIFICATIONS: &str = "/api/v1/notifications/{*rest}";
/// Proxied to the notification service with the path preserved.
pub const PREFERENCES: &str = "/api/v1/preferences/{*rest}";
/// Proxied to the budget-analysis service with the path preserved.
pub const BUDGETS: &str = "/api/v1/budgets/{*rest}";
/// Proxied to the budget-analysis service with the path preserved.
pub const INSIGHTS: &str = "/api/v1/insights/{*rest}";

/// Registration alias, forwarded to the account service at `/users/register`.
pub const AUTH_REGISTER: &str = "/api/v1/auth/register";
/// Log-in alias, forwarded to the account service at `/users/login`.
pub const AUTH_LOGIN: &str = "/api/v1/auth/login";
/// Current-user alias, forwarded to the account service at `/users/me`.
pub const AUTH_ME: &str = "/api/v1/auth/me";

/// Per-budget analysis for a user (budget-analysis service).
pub const ANALYSIS: &str = "/analysis/{user_id}";
/// Category spending insights over a trailing window (budget-analysis service).
pub const SPENDING_INSIGHTS: &str = "/insights/{user_id}/spending";
