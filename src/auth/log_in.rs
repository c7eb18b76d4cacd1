//! The log-in page and the form handler that starts a session.

use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use serde::Deserialize;

use crate::{
    Error,
    auth::{
        cookie::set_auth_cookies,
        guard::landing_page,
        middleware::AuthState,
        redirect::parse_redirect_url,
        refresh_session::{delete_expired_refresh_sessions, insert_refresh_session},
        session::CurrentUser,
        token::{TokenPair, create_token_pair},
    },
    endpoints,
    html::{base, link, log_in_register, password_input, submit_button, username_input},
    internal_server_error::get_internal_server_error_redirect,
    user::{get_user_by_id, get_user_by_username},
};

pub const INVALID_CREDENTIALS_ERROR_MSG: &str = "Incorrect username or password.";

fn log_in_form(username: &str, error_message: Option<&str>, redirect_url: Option<&str>) -> Markup {
    html! {
        form
            hx-post=(endpoints::LOG_IN_API)
            hx-indicator="#indicator"
            hx-disabled-elt="#username, #password, #submit-button"
            class="space-y-4 md:space-y-6"
        {
            @if let Some(redirect_url) = redirect_url {
                input type="hidden" name="redirect_url" value=(redirect_url);
            }

            (username_input(username, None))
            (password_input("", 0, error_message))
            (submit_button("Log in"))

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Don't have an account? "
                (link(endpoints::REGISTER_VIEW, "Register here"))
            }
        }
    }
}

#[derive(Deserialize)]
pub struct RedirectQuery {
    pub redirect_url: Option<String>,
}

/// Display the log-in page.
pub async fn get_log_in_page(Query(query): Query<RedirectQuery>) -> Response {
    let redirect_url = parse_redirect_url(query.redirect_url.as_deref(), "log-in query");
    let log_in_form = log_in_form("", None, redirect_url.as_deref());
    let content = log_in_register("Log in to your account", &log_in_form);

    base("Log In", &content).into_response()
}

/// Check a username and password and start a new session for the user.
///
/// The password is verified without holding the database lock. Once it checks out, the
/// refresh session is recorded and the user's identity is read again so the caller sees the
/// latest staff flag.
///
/// # Errors
///
/// Returns [Error::InvalidCredentials] if the username is unknown or the password is wrong,
/// whichever it is.
pub(super) fn start_session(
    state: &AuthState,
    username: &str,
    password: &str,
) -> Result<(CurrentUser, TokenPair), Error> {
    let user = {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        match get_user_by_username(username, &connection) {
            Ok(user) => user,
            Err(Error::NotFound) => return Err(Error::InvalidCredentials),
            Err(error) => return Err(error),
        }
    };

    let is_password_valid = user
        .password_hash
        .verify(password)
        .map_err(|error| Error::HashingError(error.to_string()))?;

    if !is_password_valid {
        return Err(Error::InvalidCredentials);
    }

    let tokens = create_token_pair(user.id, &state.token_config, &state.jwt_keys)?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    match delete_expired_refresh_sessions(&connection) {
        Ok(0) => {}
        Ok(count) => tracing::debug!("Deleted {count} expired refresh sessions."),
        Err(error) => tracing::warn!("Could not delete expired refresh sessions: {error}"),
    }

    insert_refresh_session(&tokens.refresh.claims, &connection)?;

    let user = get_user_by_id(user.id, &connection)?;
    let current_user = CurrentUser {
        id: user.id,
        username: user.username.to_string(),
        is_staff: user.is_staff,
    };

    Ok((current_user, tokens))
}

/// The raw data entered by the user in the log-in form.
///
/// There is no need for validation here since the username and password are compared against
/// the database, which only holds validated values.
#[derive(Clone, Deserialize)]
pub struct LogInData {
    pub username: String,
    pub password: String,
    /// Optional URL to redirect to after logging in.
    pub redirect_url: Option<String>,
}

/// Handler for log-in requests via the POST method.
///
/// On success the session cookies are set and the client is redirected to `redirect_url`, or
/// to the landing page for the user's role. Otherwise, the form is returned with an error
/// message explaining the problem.
pub async fn post_log_in(
    State(state): State<AuthState>,
    jar: CookieJar,
    Form(user_data): Form<LogInData>,
) -> Response {
    let redirect_url = parse_redirect_url(user_data.redirect_url.as_deref(), "log-in form");

    let (user, tokens) = match start_session(&state, &user_data.username, &user_data.password) {
        Ok(session) => session,
        Err(Error::InvalidCredentials) => {
            return log_in_form(
                &user_data.username,
                Some(INVALID_CREDENTIALS_ERROR_MSG),
                redirect_url.as_deref(),
            )
            .into_response();
        }
        Err(error) => {
            tracing::error!("Unhandled error while logging in: {error}");
            return get_internal_server_error_redirect();
        }
    };

    tracing::info!("User {} logged in.", user.id);

    let redirect_url = redirect_url.unwrap_or_else(|| landing_page(user.role()).to_owned());

    (
        StatusCode::SEE_OTHER,
        HxRedirect(redirect_url),
        set_auth_cookies(jar, &tokens),
    )
        .into_response()
}


#[cfg(test)]
mod log_in_tests {
    use axum::{Router, extract::FromRef, http::StatusCode, routing::post};
    use axum_test::TestServer;
    use scraper::Selector;
    use time::OffsetDateTime;

    use crate::{
        AppState,
        auth::{
            cookie::{ACCESS_COOKIE, REFRESH_COOKIE},
            middleware::AuthState,
            refresh_session::is_refresh_session_active,
            token::{TokenKind, decode_token},
        },
        endpoints,
        test_utils::{TEST_PASSWORD, create_test_user, get_test_app_state},
        user::set_staff,
    };

    use super::{INVALID_CREDENTIALS_ERROR_MSG, post_log_in};

    fn get_test_server(state: &AppState) -> TestServer {
        let app = Router::new()
            .route(endpoints::LOG_IN_API, post(post_log_in))
            .with_state(AuthState::from_ref(state));

        TestServer::try_new(app).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn member_is_redirected_to_accounts() {
        let state = get_test_app_state();
        create_test_user("jane", false, &state.db_connection.lock().unwrap());
        let server = get_test_server(&state);

        let response = server
            .post(endpoints::LOG_IN_API)
            .form(&[("username", "jane"), ("password", TEST_PASSWORD)])
            .await;

        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(response.header("hx-redirect"), endpoints::ACCOUNTS_VIEW);
    }

    #[tokio::test]
    async fn staff_is_redirected_to_admin() {
        let state = get_test_app_state();
        create_test_user("admin", true, &state.db_connection.lock().unwrap());
        let server = get_test_server(&state);

        let response = server
            .post(endpoints::LOG_IN_API)
            .form(&[("username", "admin"), ("password", TEST_PASSWORD)])
            .await;

        assert_eq!(response.header("hx-redirect"), endpoints::ADMIN_VIEW);
    }

    #[tokio::test]
    async fn landing_page_uses_latest_staff_flag() {
        let state = get_test_app_state();
        let user = create_test_user("jane", false, &state.db_connection.lock().unwrap());
        set_staff(user.id, true, &state.db_connection.lock().unwrap()).unwrap();
        let server = get_test_server(&state);

        let response = server
            .post(endpoints::LOG_IN_API)
            .form(&[("username", "jane"), ("password", TEST_PASSWORD)])
            .await;

        assert_eq!(response.header("hx-redirect"), endpoints::ADMIN_VIEW);
    }

    #[tokio::test]
    async fn redirects_to_requested_url() {
        let state = get_test_app_state();
        create_test_user("jane", false, &state.db_connection.lock().unwrap());
        let server = get_test_server(&state);

        let response = server
            .post(endpoints::LOG_IN_API)
            .form(&[
                ("username", "jane"),
                ("password", TEST_PASSWORD),
                ("redirect_url", "/dashboard"),
            ])
            .await;

        assert_eq!(response.header("hx-redirect"), endpoints::DASHBOARD_VIEW);
    }

    #[tokio::test]
    async fn falls_back_on_invalid_redirect_url() {
        let state = get_test_app_state();
        create_test_user("jane", false, &state.db_connection.lock().unwrap());
        let server = get_test_server(&state);

        let response = server
            .post(endpoints::LOG_IN_API)
            .form(&[
                ("username", "jane"),
                ("password", TEST_PASSWORD),
                ("redirect_url", "https://example.com"),
            ])
            .await;

        assert_eq!(response.header("hx-redirect"), endpoints::ACCOUNTS_VIEW);
    }

    #[tokio::test]
    async fn sets_session_cookies_and_records_refresh_session() {
        let state = get_test_app_state();
        create_test_user("jane", false, &state.db_connection.lock().unwrap());
        let server = get_test_server(&state);

        let response = server
            .post(endpoints::LOG_IN_API)
            .form(&[("username", "jane"), ("password", TEST_PASSWORD)])
            .await;

        let access = response.cookie(ACCESS_COOKIE);
        let refresh = response.cookie(REFRESH_COOKIE);
        assert!(access.expires_datetime() > Some(OffsetDateTime::now_utc()));
        assert_eq!(access.http_only(), Some(true));

        let claims = decode_token(refresh.value(), TokenKind::Refresh, &state.jwt_keys).unwrap();
        assert!(
            is_refresh_session_active(&claims, &state.db_connection.lock().unwrap()).unwrap()
        );
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_show_same_error() {
        let state = get_test_app_state();
        create_test_user("jane", false, &state.db_connection.lock().unwrap());
        let server = get_test_server(&state);

        for (username, password) in [("jane", "wrongpassword"), ("nobody", TEST_PASSWORD)] {
            let response = server
                .post(endpoints::LOG_IN_API)
                .form(&[("username", username), ("password", password)])
                .await;

            response.assert_status_ok();
            let html = scraper::Html::parse_fragment(&response.text());
            let error = html
                .select(&Selector::parse("p.text-red-500").unwrap())
                .next()
                .expect("expected error message paragraph");
            assert_eq!(
                error.text().collect::<String>().trim(),
                INVALID_CREDENTIALS_ERROR_MSG
            );
        }
    }

    #[tokio::test]
    async fn missing_fields_are_rejected() {
        let state = get_test_app_state();
        let server = get_test_server(&state);

        server
            .post(endpoints::LOG_IN_API)
            .content_type("application/x-www-form-urlencoded")
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }
}
