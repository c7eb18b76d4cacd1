//! The HTMX endpoints behind the admin panel's buttons.

use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;

use crate::{
    Error, UserID,
    account::{AccountId, delete_any_account},
    admin::AdminState,
    alert::{Alert, render_alert},
    auth::CurrentUser,
    endpoints,
    user::{delete_user, get_user_by_id, set_staff},
};

fn redirect_to_admin() -> Response {
    (
        HxRedirect(endpoints::ADMIN_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}

/// Grant or revoke a user's staff access.
pub async fn toggle_staff_endpoint(
    State(state): State<AdminState>,
    Extension(staff): Extension<CurrentUser>,
    Path(user_id): Path<i64>,
) -> Response {
    let user_id = UserID::new(user_id);

    if user_id == staff.id {
        tracing::warn!("Staff user {} tried to change their own staff access", staff.id);
        return Error::SelfModification.into_alert_response();
    }

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("Could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let result = get_user_by_id(user_id, &connection)
        .and_then(|user| set_staff(user.id, !user.is_staff, &connection).map(|_| !user.is_staff));

    match result {
        Ok(is_staff) => {
            tracing::info!(
                "Staff user {} set is_staff={is_staff} for user {user_id}",
                staff.id
            );
            redirect_to_admin()
        }
        Err(Error::NotFound) => Error::UpdateMissingUser.into_alert_response(),
        Err(error) => error.into_alert_response(),
    }
}

/// Delete a user along with their sessions, accounts and transactions.
pub async fn delete_user_endpoint(
    State(state): State<AdminState>,
    Extension(staff): Extension<CurrentUser>,
    Path(user_id): Path<i64>,
) -> Response {
    let user_id = UserID::new(user_id);

    if user_id == staff.id {
        tracing::warn!("Staff user {} tried to delete themselves", staff.id);
        return Error::SelfModification.into_alert_response();
    }

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("Could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_user(user_id, &connection) {
        Ok(()) => {
            tracing::info!("Staff user {} deleted user {user_id}", staff.id);
            redirect_to_admin()
        }
        Err(error) => error.into_alert_response(),
    }
}

/// Delete any user's account. The row is removed from the admin table by HTMX on success.
pub async fn delete_account_as_staff_endpoint(
    State(state): State<AdminState>,
    Extension(staff): Extension<CurrentUser>,
    Path(account_id): Path<AccountId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("Could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_any_account(account_id, &connection) {
        Ok(()) => {
            tracing::info!("Staff user {} deleted account {account_id}", staff.id);
            render_alert(StatusCode::OK, Alert::success("Account deleted", ""))
        }
        Err(error) => error.into_alert_response(),
    }
}

#[cfg(test)]
mod admin_action_tests {
    use axum::{
        Extension,
        extract::{FromRef, Path, State},
        http::StatusCode,
    };

    use crate::{
        AppState, Error, User,
        account::{create_account, get_all_accounts, test_account_form},
        admin::AdminState,
        endpoints,
        test_utils::{as_current_user, assert_hx_redirect, create_test_user, get_test_app_state},
        user::get_user_by_id,
    };

    use super::{delete_account_as_staff_endpoint, delete_user_endpoint, toggle_staff_endpoint};

    fn admin_and_member(state: &AppState) -> (User, User) {
        let connection = state.db_connection.lock().unwrap();
        (
            create_test_user("admin", true, &connection),
            create_test_user("jane", false, &connection),
        )
    }

    #[tokio::test]
    async fn toggles_staff_both_ways() {
        let state = get_test_app_state();
        let (admin, jane) = admin_and_member(&state);

        for want_staff in [true, false] {
            let response = toggle_staff_endpoint(
                State(AdminState::from_ref(&state)),
                Extension(as_current_user(&admin)),
                Path(jane.id.as_i64()),
            )
            .await;

            assert_eq!(response.status(), StatusCode::SEE_OTHER);
            assert_hx_redirect(&response, endpoints::ADMIN_VIEW);
            let user = get_user_by_id(jane.id, &state.db_connection.lock().unwrap()).unwrap();
            assert_eq!(user.is_staff, want_staff);
        }
    }

    #[tokio::test]
    async fn cannot_demote_self() {
        let state = get_test_app_state();
        let (admin, _) = admin_and_member(&state);

        let response = toggle_staff_endpoint(
            State(AdminState::from_ref(&state)),
            Extension(as_current_user(&admin)),
            Path(admin.id.as_i64()),
        )
        .await;

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let user = get_user_by_id(admin.id, &state.db_connection.lock().unwrap()).unwrap();
        assert!(user.is_staff);
    }

    #[tokio::test]
    async fn toggle_missing_user_is_not_found() {
        let state = get_test_app_state();
        let (admin, _) = admin_and_member(&state);

        let response = toggle_staff_endpoint(
            State(AdminState::from_ref(&state)),
            Extension(as_current_user(&admin)),
            Path(9999),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn deletes_user_and_their_accounts() {
        let state = get_test_app_state();
        let (admin, jane) = admin_and_member(&state);
        create_account(
            jane.id,
            &test_account_form("Everyday"),
            &state.db_connection.lock().unwrap(),
        )
        .unwrap();

        let response = delete_user_endpoint(
            State(AdminState::from_ref(&state)),
            Extension(as_current_user(&admin)),
            Path(jane.id.as_i64()),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::ADMIN_VIEW);
        let connection = state.db_connection.lock().unwrap();
        assert_eq!(get_user_by_id(jane.id, &connection), Err(Error::NotFound));
        assert!(get_all_accounts(&connection).unwrap().is_empty());
    }

    #[tokio::test]
    async fn cannot_delete_self() {
        let state = get_test_app_state();
        let (admin, _) = admin_and_member(&state);

        let response = delete_user_endpoint(
            State(AdminState::from_ref(&state)),
            Extension(as_current_user(&admin)),
            Path(admin.id.as_i64()),
        )
        .await;

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(get_user_by_id(admin.id, &state.db_connection.lock().unwrap()).is_ok());
    }

    #[tokio::test]
    async fn deletes_any_account() {
        let state = get_test_app_state();
        let (admin, jane) = admin_and_member(&state);
        let account = create_account(
            jane.id,
            &test_account_form("Everyday"),
            &state.db_connection.lock().unwrap(),
        )
        .unwrap();

        let response = delete_account_as_staff_endpoint(
            State(AdminState::from_ref(&state)),
            Extension(as_current_user(&admin)),
            Path(account.id),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(
            get_all_accounts(&state.db_connection.lock().unwrap())
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn deleting_missing_account_is_not_found() {
        let state = get_test_app_state();
        let (admin, _) = admin_and_member(&state);

        let response = delete_account_as_staff_endpoint(
            State(AdminState::from_ref(&state)),
            Extension(as_current_user(&admin)),
            Path(42),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
