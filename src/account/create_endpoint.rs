//! Defines the endpoint for creating a new account.

use axum::{
    Extension, Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;

use crate::{
    Error,
    account::{
        AccountState,
        core::{AccountForm, create_account},
    },
    auth::CurrentUser,
    endpoints,
};

/// A route handler for creating a new account, redirects to the accounts view on success.
///
/// A user that already owns the maximum number of accounts gets an alert explaining the limit.
pub async fn create_account_endpoint(
    State(state): State<AccountState>,
    Extension(user): Extension<CurrentUser>,
    Form(form): Form<AccountForm>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("Could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match create_account(user.id, &form, &connection) {
        Ok(account) => {
            tracing::info!("User {} created account {}", user.id, account.id);

            (
                HxRedirect(endpoints::ACCOUNTS_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(
            error @ (Error::AccountLimitReached
            | Error::EmptyAccountName
            | Error::InvalidAmount
            | Error::InvalidCurrency
            | Error::InvalidAccountType),
        ) => {
            tracing::debug!("Rejected new account for user {}: {error}", user.id);
            error.into_alert_response()
        }
        Err(error) => {
            tracing::error!("An unexpected error occurred while creating an account: {error}");
            error.into_alert_response()
        }
    }
}
