//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/accounts/{account_id}', use [format_endpoint].

/// The root route which redirects to the visitor's landing page or the log in page.
pub const ROOT: &str = "/";
/// The account selection page, the landing page for regular users.
pub const ACCOUNTS_VIEW: &str = "/accounts";
/// The page for creating a new account.
pub const NEW_ACCOUNT_VIEW: &str = "/accounts/new";
/// The page for editing an existing account.
pub const EDIT_ACCOUNT_VIEW: &str = "/accounts/{account_id}/edit";
/// The overview of the selected account and its transactions.
pub const DASHBOARD_VIEW: &str = "/dashboard";
/// The admin panel, the landing page for staff users.
pub const ADMIN_VIEW: &str = "/admin";
/// The route for getting the registration page.
pub const REGISTER_VIEW: &str = "/register";
/// The route for getting the log in page.
pub const LOG_IN_VIEW: &str = "/log_in";
/// The route for logging out via a link.
pub const LOG_OUT: &str = "/log_out";
/// The page to display when an internal server error occurs.
pub const INTERNAL_ERROR_VIEW: &str = "/error";

/// The route for logging in a user from the log-in form.
pub const LOG_IN_API: &str = "/api/log_in";
/// The route to register users.
pub const USERS: &str = "/api/users";
/// The route to create accounts.
pub const ACCOUNTS_API: &str = "/api/accounts";
/// The route to update or delete a single account.
pub const ACCOUNT: &str = "/api/accounts/{account_id}";
/// The route to choose the account shown on the dashboard.
pub const SELECT_ACCOUNT: &str = "/api/accounts/{account_id}/select";
/// The route to create transactions.
pub const TRANSACTIONS_API: &str = "/api/transactions";
/// The route to delete a single transaction.
pub const TRANSACTION: &str = "/api/transactions/{transaction_id}";
/// The route for staff to delete a user.
pub const ADMIN_USER: &str = "/api/admin/users/{user_id}";
/// The route for staff to grant or revoke staff access.
pub const ADMIN_USER_STAFF: &str = "/api/admin/users/{user_id}/staff";
/// The route for staff to delete any account.
pub const ADMIN_ACCOUNT: &str = "/api/admin/accounts/{account_id}";

/// The JSON route for logging in.
pub const AUTH_LOG_IN: &str = "/api/auth/login";
/// The JSON route for exchanging a refresh token for a new access token.
pub const AUTH_REFRESH: &str = "/api/auth/refresh";
/// The JSON route for logging out.
pub const AUTH_LOG_OUT: &str = "/api/auth/logout";
/// The JSON route describing the current user.
pub const AUTH_ME: &str = "/api/auth/me";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/users/{user_id}', '{user_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_owned();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map(|offset| param_start + offset + 1)
        .unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
