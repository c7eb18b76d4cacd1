//! Defines the endpoint for adding a transaction to the selected account.

use axum::{
    Extension,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{CookieJar, Form};
use axum_htmx::HxRedirect;
use serde::Deserialize;
use time::Date;

use crate::{
    Error,
    auth::{CurrentUser, get_selected_account_id},
    category::CategoryId,
    endpoints,
    transaction::{
        TransactionState,
        core::{Frequency, NewTransaction, create_transaction},
    },
};

/// The form data for creating a transaction.
#[derive(Debug, Deserialize)]
pub struct TransactionForm {
    /// Positive for income, negative for expenses.
    pub amount: f64,
    /// Left empty for uncategorised transactions.
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    pub date: Date,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub frequency: Frequency,
}

impl From<TransactionForm> for NewTransaction {
    fn from(form: TransactionForm) -> Self {
        NewTransaction {
            amount: form.amount,
            category_id: form.category_id,
            date: form.date,
            description: form.description,
            frequency: form.frequency,
        }
    }
}

/// A route handler for creating a transaction on the selected account, redirects to the
/// dashboard on success.
pub async fn create_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user): Extension<CurrentUser>,
    jar: CookieJar,
    Form(form): Form<TransactionForm>,
) -> Response {
    let Some(account_id) = get_selected_account_id(&jar) else {
        return Error::NoAccountSelected.into_alert_response();
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match create_transaction(account_id, user.id, &form.into(), &connection) {
        Ok(transaction) => {
            tracing::debug!(
                "User {} added transaction {} to account {account_id}",
                user.id,
                transaction.id
            );

            (
                HxRedirect(endpoints::DASHBOARD_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        // The selection cookie refers to an account that is gone or belongs to someone else.
        Err(Error::NotFound) => Error::NoAccountSelected.into_alert_response(),
        Err(error @ (Error::InvalidCategory | Error::InvalidAmount)) => error.into_alert_response(),
        Err(error) => {
            tracing::error!("could not create transaction: {error}");
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod create_transaction_endpoint_tests {
    use axum::{Router, extract::FromRef, http::StatusCode, middleware, routing::post};
    use axum_extra::extract::cookie::Cookie;
    use axum_test::TestServer;

    use crate::{
        AppState, User,
        account::{AccountId, create_account, get_account, test_account_form},
        auth::{ACCESS_COOKIE, AuthState, SELECTED_ACCOUNT_COOKIE, member_guard_hx},
        endpoints,
        test_utils::{create_test_user, get_test_app_state, issue_session},
        transaction::{Frequency, TransactionState, core::get_transactions},
    };

    use super::create_transaction_endpoint;

    fn get_test_server(state: &AppState) -> TestServer {
        let app = Router::new()
            .route(endpoints::TRANSACTIONS_API, post(create_transaction_endpoint))
            .with_state(TransactionState::from_ref(state))
            .layer(middleware::from_fn_with_state(
                AuthState::from_ref(state),
                member_guard_hx,
            ));

        TestServer::try_new(app).expect("Could not create test server.")
    }

    fn user_with_account(state: &AppState) -> (User, AccountId) {
        let connection = state.db_connection.lock().unwrap();
        let user = create_test_user("jane", false, &connection);
        let account = create_account(user.id, &test_account_form("Everyday"), &connection).unwrap();
        (user, account.id)
    }

    #[tokio::test]
    async fn creates_transaction_on_selected_account() {
        let state = get_test_app_state();
        let (user, account_id) = user_with_account(&state);
        let tokens = issue_session(&state, &user);
        let server = get_test_server(&state);

        let response = server
            .post(endpoints::TRANSACTIONS_API)
            .add_cookie(Cookie::new(ACCESS_COOKIE, tokens.access.token))
            .add_cookie(Cookie::new(SELECTED_ACCOUNT_COOKIE, account_id.to_string()))
            .form(&[
                ("amount", "-19.99"),
                ("category_id", "4"),
                ("date", "2025-01-31"),
                ("description", "Groceries"),
                ("frequency", "monthly"),
            ])
            .await;

        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(response.header("hx-redirect"), endpoints::DASHBOARD_VIEW);

        let connection = state.db_connection.lock().unwrap();
        let transactions = get_transactions(account_id, user.id, &connection).unwrap();
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].frequency, Frequency::Monthly);
        assert_eq!(
            transactions[0].next_due_date,
            Some(time::macros::date!(2025 - 02 - 28))
        );
        assert_eq!(
            get_account(account_id, user.id, &connection).unwrap().balance,
            80.01
        );
    }

    #[tokio::test]
    async fn empty_category_is_uncategorised() {
        let state = get_test_app_state();
        let (user, account_id) = user_with_account(&state);
        let tokens = issue_session(&state, &user);
        let server = get_test_server(&state);

        let response = server
            .post(endpoints::TRANSACTIONS_API)
            .add_cookie(Cookie::new(ACCESS_COOKIE, tokens.access.token))
            .add_cookie(Cookie::new(SELECTED_ACCOUNT_COOKIE, account_id.to_string()))
            .form(&[
                ("amount", "5"),
                ("category_id", ""),
                ("date", "2025-01-31"),
                ("description", ""),
                ("frequency", "none"),
            ])
            .await;

        response.assert_status(StatusCode::SEE_OTHER);
        let transactions =
            get_transactions(account_id, user.id, &state.db_connection.lock().unwrap()).unwrap();
        assert_eq!(transactions[0].category_id, None);
        assert_eq!(transactions[0].next_due_date, None);
    }

    #[tokio::test]
    async fn requires_selected_account() {
        let state = get_test_app_state();
        let (user, _) = user_with_account(&state);
        let tokens = issue_session(&state, &user);
        let server = get_test_server(&state);

        let response = server
            .post(endpoints::TRANSACTIONS_API)
            .add_cookie(Cookie::new(ACCESS_COOKIE, tokens.access.token))
            .form(&[("amount", "5"), ("date", "2025-01-31")])
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert!(response.text().contains("No account selected"));
    }

    #[tokio::test]
    async fn foreign_selected_account_is_rejected() {
        let state = get_test_app_state();
        let (_, account_id) = user_with_account(&state);
        let intruder = create_test_user("john", false, &state.db_connection.lock().unwrap());
        let tokens = issue_session(&state, &intruder);
        let server = get_test_server(&state);

        let response = server
            .post(endpoints::TRANSACTIONS_API)
            .add_cookie(Cookie::new(ACCESS_COOKIE, tokens.access.token))
            .add_cookie(Cookie::new(SELECTED_ACCOUNT_COOKIE, account_id.to_string()))
            .form(&[("amount", "5"), ("date", "2025-01-31")])
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }
}
