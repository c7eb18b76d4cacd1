//! Guards that resolve the session for each request, refresh an expired access token once,
//! and turn visitors without the right role away.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Request, State},
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::{
    extract::CookieJar,
    headers::{Authorization as AuthorizationHeader, HeaderMapExt, authorization::Bearer},
};
use axum_htmx::{HxRedirect, HxRefresh};
use maud::html;
use rusqlite::Connection;
use serde_json::json;

use crate::{
    AppState, Error,
    auth::{
        cookie::{ACCESS_COOKIE, REFRESH_COOKIE, invalidate_auth_cookies, set_access_cookie},
        guard::{Authorization, Role, authorize, landing_page},
        redirect::build_log_in_redirect_url,
        session::{Resolution, resolve_session},
        token::{JwtKeys, TokenConfig},
    },
    html::{base, loading_spinner},
    internal_server_error::{InternalServerError, get_internal_server_error_redirect},
};

/// The state needed for the auth middleware
#[derive(Debug, Clone)]
pub struct AuthState {
    pub jwt_keys: JwtKeys,
    pub token_config: TokenConfig,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            jwt_keys: state.jwt_keys.clone(),
            token_config: state.token_config,
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The access token from the access cookie, or failing that an `Authorization: Bearer` header.
fn access_token_from_headers(headers: &HeaderMap, jar: &CookieJar) -> Option<String> {
    jar.get(ACCESS_COOKIE)
        .map(|cookie| cookie.value().to_owned())
        .filter(|token| !token.is_empty())
        .or_else(|| {
            headers
                .typed_get::<AuthorizationHeader<Bearer>>()
                .map(|header| header.token().to_owned())
        })
}

/// Resolve the session for the tokens sent with `headers`.
///
/// The database lock is released before this returns, so callers may await afterwards.
pub(super) fn resolve_request_session(
    state: &AuthState,
    headers: &HeaderMap,
) -> Result<Resolution, Error> {
    let jar = CookieJar::from_headers(headers);
    let access_token = access_token_from_headers(headers, &jar);
    let refresh_token = jar
        .get(REFRESH_COOKIE)
        .map(|cookie| cookie.value().to_owned())
        .filter(|token| !token.is_empty());

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    Ok(resolve_session(
        access_token.as_deref(),
        refresh_token.as_deref(),
        &state.jwt_keys,
        &state.token_config,
        &connection,
    ))
}

/// Copy the refreshed access cookie, if there is one, onto `response`.
pub(super) fn replay_refreshed_token(resolution: &Resolution, mut response: Response) -> Response {
    if let Resolution::Refreshed(_, access_token) = resolution {
        let cookies = set_access_cookie(CookieJar::new(), access_token).into_response();

        for value in cookies.headers().get_all(SET_COOKIE) {
            response.headers_mut().append(SET_COOKIE, value.to_owned());
        }
    }

    response
}

/// Why a request was not let through.
enum Denial {
    /// The visitor must log in, then return to the URL given.
    LogIn(String),
    /// The visitor has the wrong role and belongs on this page instead.
    WrongRole(&'static str),
    /// The session is still being resolved.
    Pending,
    /// The session could not be checked.
    Unavailable,
}

async fn guard_internal(
    state: AuthState,
    mut request: Request,
    next: Next,
    required: Option<Role>,
    deny: fn(Denial) -> Response,
) -> Response {
    let resolution = match resolve_request_session(&state, request.headers()) {
        Ok(resolution) => resolution,
        Err(error) => {
            tracing::error!("Could not resolve session: {error}");
            return deny(Denial::Unavailable);
        }
    };

    match authorize(&resolution.state(), required) {
        Authorization::Granted => {}
        Authorization::Pending => return deny(Denial::Pending),
        Authorization::LogIn => {
            tracing::debug!("No valid session for {}, redirecting to log in.", request.uri());
            let log_in_url = build_log_in_redirect_url(&request);
            let response = deny(Denial::LogIn(log_in_url));

            return (invalidate_auth_cookies(CookieJar::new()), response).into_response();
        }
        Authorization::Redirect(landing_page) => {
            tracing::debug!(
                "User does not have the role for {}, redirecting to {landing_page}.",
                request.uri()
            );
            let response = deny(Denial::WrongRole(landing_page));

            return replay_refreshed_token(&resolution, response);
        }
    }

    if let Some(user) = resolution.user() {
        request.extensions_mut().insert(user.clone());
    }

    let response = next.run(request).await;

    replay_refreshed_token(&resolution, response)
}

fn loading_page() -> Response {
    let content = html! {
        meta http-equiv="refresh" content="1";

        div class="flex items-center justify-center min-h-screen text-gray-900 dark:text-white"
        {
            (loading_spinner())
            "Loading..."
        }
    };

    base("Loading", &content).into_response()
}

fn deny_page(denial: Denial) -> Response {
    match denial {
        Denial::LogIn(url) => Redirect::to(&url).into_response(),
        Denial::WrongRole(url) => Redirect::to(url).into_response(),
        Denial::Pending => loading_page(),
        Denial::Unavailable => InternalServerError::default().into_response(),
    }
}

fn deny_hx(denial: Denial) -> Response {
    match denial {
        Denial::LogIn(url) => (HxRedirect(url), StatusCode::OK).into_response(),
        Denial::WrongRole(url) => (HxRedirect(url.to_owned()), StatusCode::OK).into_response(),
        Denial::Pending => (HxRefresh(true), StatusCode::OK).into_response(),
        Denial::Unavailable => get_internal_server_error_redirect(),
    }
}

fn deny_api(denial: Denial) -> Response {
    match denial {
        Denial::LogIn(_) | Denial::Pending => (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Authentication credentials were not provided or are invalid."})),
        )
            .into_response(),
        Denial::WrongRole(_) => (
            StatusCode::FORBIDDEN,
            Json(json!({"detail": "You do not have permission to perform this action."})),
        )
            .into_response(),
        Denial::Unavailable => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"detail": "An unexpected error occurred."})),
        )
            .into_response(),
    }
}

/// Let regular users through to a page, and redirect anyone else.
///
/// Anonymous visitors are sent to the log-in page with a `redirect_url` back to this page and
/// staff are sent to the admin panel.
///
/// **Note**: Route handlers can use the function argument `Extension(user): Extension<CurrentUser>`
/// to receive the user.
pub async fn member_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    guard_internal(state, request, next, Some(Role::Member), deny_page).await
}

/// Let staff through to a page, and redirect anyone else.
pub async fn staff_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    guard_internal(state, request, next, Some(Role::Staff), deny_page).await
}

/// Same as [member_guard], but redirects with the `HX-Redirect` header for htmx requests.
pub async fn member_guard_hx(
    State(state): State<AuthState>,
    request: Request,
    next: Next,
) -> Response {
    guard_internal(state, request, next, Some(Role::Member), deny_hx).await
}

/// Same as [staff_guard], but redirects with the `HX-Redirect` header for htmx requests.
pub async fn staff_guard_hx(
    State(state): State<AuthState>,
    request: Request,
    next: Next,
) -> Response {
    guard_internal(state, request, next, Some(Role::Staff), deny_hx).await
}

/// Let any logged in user through to a JSON route, answering `401` otherwise.
pub async fn api_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    guard_internal(state, request, next, None, deny_api).await
}

/// Send logged in users away from public pages, such as the log-in page, to their landing page.
///
/// Anonymous visitors are always let through, so this can never loop with the other guards.
pub async fn redirect_authenticated(
    State(state): State<AuthState>,
    request: Request,
    next: Next,
) -> Response {
    let resolution = match resolve_request_session(&state, request.headers()) {
        Ok(resolution) => resolution,
        Err(error) => {
            tracing::error!("Could not resolve session: {error}");
            return next.run(request).await;
        }
    };

    match resolution.user() {
        Some(user) => {
            let landing_page = landing_page(user.role());
            tracing::debug!(
                "User {} is already logged in, redirecting to {landing_page}.",
                user.id
            );
            replay_refreshed_token(&resolution, Redirect::to(landing_page).into_response())
        }
        None => next.run(request).await,
    }
}

#[cfg(test)]
mod guard_tests {
    use axum::{
        Extension, Json, Router,
        extract::FromRef,
        middleware,
        routing::{get, post},
    };
    use axum_extra::extract::cookie::Cookie;
    use axum_test::TestServer;
    use time::Duration;

    use crate::{
        AppState,
        auth::{
            CurrentUser,
            cookie::{ACCESS_COOKIE, REFRESH_COOKIE},
            token::{TokenKind, create_token},
        },
        endpoints,
        test_utils::{create_test_user, get_test_app_state, issue_session},
    };

    use super::{
        AuthState, api_guard, member_guard, member_guard_hx, redirect_authenticated, staff_guard,
    };

    const MEMBER_ROUTE: &str = "/member";
    const STAFF_ROUTE: &str = "/staff";
    const HX_ROUTE: &str = "/api/member";
    const API_ROUTE: &str = "/api/me";
    const PUBLIC_ROUTE: &str = "/public";

    async fn whoami(Extension(user): Extension<CurrentUser>) -> Json<CurrentUser> {
        Json(user)
    }

    async fn public() -> &'static str {
        "public"
    }

    fn get_test_server(state: AppState) -> TestServer {
        let auth_state = AuthState::from_ref(&state);

        let app = Router::new()
            .route(MEMBER_ROUTE, get(whoami))
            .route_layer(middleware::from_fn_with_state(
                auth_state.clone(),
                member_guard,
            ))
            .merge(Router::new().route(STAFF_ROUTE, get(whoami)).route_layer(
                middleware::from_fn_with_state(auth_state.clone(), staff_guard),
            ))
            .merge(Router::new().route(HX_ROUTE, post(whoami)).route_layer(
                middleware::from_fn_with_state(auth_state.clone(), member_guard_hx),
            ))
            .merge(Router::new().route(API_ROUTE, get(whoami)).route_layer(
                middleware::from_fn_with_state(auth_state.clone(), api_guard),
            ))
            .merge(Router::new().route(PUBLIC_ROUTE, get(public)).route_layer(
                middleware::from_fn_with_state(auth_state, redirect_authenticated),
            ));

        TestServer::try_new(app).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn anonymous_page_request_redirects_to_log_in() {
        let server = get_test_server(get_test_app_state());

        let response = server.get(MEMBER_ROUTE).await;

        response.assert_status_see_other();
        assert_eq!(response.header("location"), "/log_in?redirect_url=%2Fmember");
    }

    #[tokio::test]
    async fn valid_access_cookie_is_granted() {
        let state = get_test_app_state();
        let user = create_test_user("jane", false, &state.db_connection.lock().unwrap());
        let tokens = issue_session(&state, &user);
        let server = get_test_server(state);

        let response = server
            .get(MEMBER_ROUTE)
            .add_cookie(Cookie::new(ACCESS_COOKIE, tokens.access.token))
            .await;

        response.assert_status_ok();
        let current_user = response.json::<serde_json::Value>();
        assert_eq!(current_user["username"], "jane");
        assert_eq!(current_user["is_staff"], false);
    }

    #[tokio::test]
    async fn bearer_header_is_accepted() {
        let state = get_test_app_state();
        let user = create_test_user("jane", false, &state.db_connection.lock().unwrap());
        let tokens = issue_session(&state, &user);
        let server = get_test_server(state);

        server
            .get(API_ROUTE)
            .authorization_bearer(tokens.access.token)
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn expired_access_token_is_refreshed_and_replayed() {
        let state = get_test_app_state();
        let user = create_test_user("jane", false, &state.db_connection.lock().unwrap());
        let tokens = issue_session(&state, &user);
        let expired = create_token(
            user.id,
            TokenKind::Access,
            Duration::seconds(-1),
            &state.jwt_keys,
        )
        .unwrap();
        let server = get_test_server(state);

        let response = server
            .get(MEMBER_ROUTE)
            .add_cookie(Cookie::new(ACCESS_COOKIE, expired.token.clone()))
            .add_cookie(Cookie::new(REFRESH_COOKIE, tokens.refresh.token))
            .await;

        response.assert_status_ok();
        let new_access = response.cookie(ACCESS_COOKIE);
        assert_ne!(new_access.value(), expired.token);
        assert_eq!(new_access.http_only(), Some(true));
    }

    #[tokio::test]
    async fn failed_refresh_redirects_to_log_in_and_clears_cookies() {
        let state = get_test_app_state();
        let server = get_test_server(state);

        let response = server
            .get(MEMBER_ROUTE)
            .add_cookie(Cookie::new(ACCESS_COOKIE, "garbage"))
            .add_cookie(Cookie::new(REFRESH_COOKIE, "more-garbage"))
            .await;

        response.assert_status_see_other();
        assert_eq!(response.cookie(ACCESS_COOKIE).value(), "");
        assert_eq!(response.cookie(REFRESH_COOKIE).value(), "");
    }

    #[tokio::test]
    async fn member_is_redirected_away_from_staff_page() {
        let state = get_test_app_state();
        let user = create_test_user("jane", false, &state.db_connection.lock().unwrap());
        let tokens = issue_session(&state, &user);
        let server = get_test_server(state);

        let response = server
            .get(STAFF_ROUTE)
            .add_cookie(Cookie::new(ACCESS_COOKIE, tokens.access.token))
            .await;

        response.assert_status_see_other();
        assert_eq!(response.header("location"), endpoints::ACCOUNTS_VIEW);
    }

    #[tokio::test]
    async fn staff_is_redirected_away_from_member_page() {
        let state = get_test_app_state();
        let user = create_test_user("admin", true, &state.db_connection.lock().unwrap());
        let tokens = issue_session(&state, &user);
        let server = get_test_server(state);

        let response = server
            .get(MEMBER_ROUTE)
            .add_cookie(Cookie::new(ACCESS_COOKIE, tokens.access.token))
            .await;

        response.assert_status_see_other();
        assert_eq!(response.header("location"), endpoints::ADMIN_VIEW);
    }

    #[tokio::test]
    async fn hx_request_uses_hx_current_url_for_redirect() {
        let server = get_test_server(get_test_app_state());

        let response = server
            .post(HX_ROUTE)
            .add_header("HX-Request", "true")
            .add_header("HX-Current-URL", "http://localhost:3000/dashboard")
            .await;

        response.assert_status_ok();
        assert_eq!(
            response.header("hx-redirect"),
            "/log_in?redirect_url=%2Fdashboard"
        );
    }

    #[tokio::test]
    async fn api_guard_answers_unauthorized_with_json() {
        let server = get_test_server(get_test_app_state());

        let response = server.get(API_ROUTE).await;

        response.assert_status_unauthorized();
        let body = response.json::<serde_json::Value>();
        assert!(body["detail"].is_string());
    }

    #[tokio::test]
    async fn public_page_lets_anonymous_visitors_through() {
        let server = get_test_server(get_test_app_state());

        let response = server.get(PUBLIC_ROUTE).await;

        response.assert_status_ok();
        response.assert_text("public");
    }

    #[tokio::test]
    async fn public_page_redirects_logged_in_user_to_landing_page() {
        let state = get_test_app_state();
        let user = create_test_user("admin", true, &state.db_connection.lock().unwrap());
        let tokens = issue_session(&state, &user);
        let server = get_test_server(state);

        let response = server
            .get(PUBLIC_ROUTE)
            .add_cookie(Cookie::new(ACCESS_COOKIE, tokens.access.token))
            .await;

        response.assert_status_see_other();
        assert_eq!(response.header("location"), endpoints::ADMIN_VIEW);
    }
}
