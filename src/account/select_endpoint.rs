//! Choosing which account the dashboard shows.

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
        core::{AccountId, get_account},
    },
    auth::{CurrentUser, set_selected_account_cookie},
    endpoints,
};

/// Remember the account with `account_id` as the selected account and send the client to the
/// dashboard.
///
/// Only accounts owned by the current user can be selected.
pub async fn select_account_endpoint(
    State(state): State<AccountState>,
    Extension(user): Extension<CurrentUser>,
    Path(account_id): Path<AccountId>,
    jar: CookieJar,
) -> Response {
    let result = match state.db_connection.lock() {
        Ok(connection) => get_account(account_id, user.id, &connection),
        Err(_) => Err(Error::DatabaseLockError),
    };

    match result {
        Ok(account) => {
            tracing::debug!("User {} selected account {}", user.id, account.id);

            (
                set_selected_account_cookie(jar, account.id),
                HxRedirect(endpoints::DASHBOARD_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) => error.into_alert_response(),
    }
}

#[cfg(test)]
mod select_account_endpoint_tests {
    use axum::{
        Extension,
        extract::{FromRef, Path, State},
        http::StatusCode,
    };
    use axum_extra::extract::{CookieJar, cookie::Cookie};

    use crate::{
        account::{AccountState, create_account, test_account_form},
        auth::SELECTED_ACCOUNT_COOKIE,
        endpoints,
        test_utils::{as_current_user, assert_hx_redirect, create_test_user, get_test_app_state},
    };

    use super::select_account_endpoint;

    #[tokio::test]
    async fn sets_cookie_and_redirects_to_dashboard() {
        let state = get_test_app_state();
        let (user, account) = {
            let connection = state.db_connection.lock().unwrap();
            let user = create_test_user("jane", false, &connection);
            let account =
                create_account(user.id, &test_account_form("Everyday"), &connection).unwrap();
            (user, account)
        };

        let response = select_account_endpoint(
            State(AccountState::from_ref(&state)),
            Extension(as_current_user(&user)),
            Path(account.id),
            CookieJar::new(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::DASHBOARD_VIEW);

        let cookie = response
            .headers()
            .get_all("set-cookie")
            .iter()
            .filter_map(|header| Cookie::parse(header.to_str().ok()?.to_owned()).ok())
            .find(|cookie| cookie.name() == SELECTED_ACCOUNT_COOKIE)
            .expect("selected account cookie not set");
        assert_eq!(cookie.value(), account.id.to_string());
    }

    #[tokio::test]
    async fn cannot_select_other_users_account() {
        let state = get_test_app_state();
        let (intruder, account) = {
            let connection = state.db_connection.lock().unwrap();
            let owner = create_test_user("jane", false, &connection);
            let intruder = create_test_user("john", false, &connection);
            let account =
                create_account(owner.id, &test_account_form("Everyday"), &connection).unwrap();
            (intruder, account)
        };

        let response = select_account_endpoint(
            State(AccountState::from_ref(&state)),
            Extension(as_current_user(&intruder)),
            Path(account.id),
            CookieJar::new(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().get("set-cookie").is_none());
    }
}
