//! Defines the endpoint for updating an existing account.

use axum::{
    Extension, Form,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;

use crate::{
    Error,
    account::{
        AccountState,
        core::{AccountForm, AccountId, update_account},
    },
    auth::CurrentUser,
    endpoints,
};

/// A route handler for updating the name, balance, currency and type of an account.
pub async fn edit_account_endpoint(
    State(state): State<AccountState>,
    Extension(user): Extension<CurrentUser>,
    Path(account_id): Path<AccountId>,
    Form(form): Form<AccountForm>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("Could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match update_account(account_id, user.id, &form, &connection) {
        Ok(_) => (
            HxRedirect(endpoints::ACCOUNTS_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(
            error @ (Error::UpdateMissingAccount
            | Error::EmptyAccountName
            | Error::InvalidAmount
            | Error::InvalidCurrency
            | Error::InvalidAccountType),
        ) => error.into_alert_response(),
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while updating account {account_id}: {error}"
            );
            error.into_alert_response()
        }
    }
}
