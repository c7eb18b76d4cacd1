//! Account deletion endpoint.

use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use axum_htmx::HxRedirect;

use crate::{
    Error,
    account::{
        AccountState,
        core::{AccountId, delete_account},
    },
    auth::{CurrentUser, clear_selected_account_cookie, get_selected_account_id},
    endpoints,
};

/// Delete one of the current user's accounts along with its transactions.
///
/// If the account was the selected account, the selection is cleared as well.
pub async fn delete_account_endpoint(
    State(state): State<AccountState>,
    Extension(user): Extension<CurrentUser>,
    Path(account_id): Path<AccountId>,
    jar: CookieJar,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("Could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_account(account_id, user.id, &connection) {
        Ok(()) => {
            tracing::info!("User {} deleted account {account_id}", user.id);

            let jar = if get_selected_account_id(&jar) == Some(account_id) {
                clear_selected_account_cookie(jar)
            } else {
                jar
            };

            (
                jar,
                HxRedirect(endpoints::ACCOUNTS_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(Error::DeleteMissingAccount) => Error::DeleteMissingAccount.into_alert_response(),
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while deleting account {account_id}: {error}"
            );
            error.into_alert_response()
        }
    }
}
