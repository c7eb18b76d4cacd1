//! JSON endpoints for managing a session without the HTML forms.

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use serde_json::json;

use crate::{
    Error,
    auth::{
        cookie::{REFRESH_COOKIE, set_access_cookie, set_auth_cookies},
        log_in::start_session,
        log_out::end_session,
        middleware::AuthState,
        session::{CurrentUser, refresh_access_token},
    },
};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

/// Start a session and set the session cookies.
pub async fn post_login(
    State(state): State<AuthState>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> Response {
    match start_session(&state, &request.username, &request.password) {
        Ok((user, tokens)) => {
            tracing::info!("User {} logged in.", user.id);

            (
                set_auth_cookies(jar, &tokens),
                Json(json!({
                    "message": "Login successful",
                    "user_id": user.id,
                })),
            )
                .into_response()
        }
        Err(Error::InvalidCredentials) => {
            detail(StatusCode::UNAUTHORIZED, "Invalid username or password")
        }
        Err(error) => {
            tracing::error!("Unhandled error while logging in: {error}");
            detail(StatusCode::INTERNAL_SERVER_ERROR, "An unexpected error occurred.")
        }
    }
}

/// Exchange the refresh cookie for a new access cookie.
pub async fn post_refresh(State(state): State<AuthState>, jar: CookieJar) -> Response {
    let Some(refresh_token) = jar
        .get(REFRESH_COOKIE)
        .map(|cookie| cookie.value().to_owned())
    else {
        return detail(StatusCode::UNAUTHORIZED, "Refresh token not found");
    };

    let result = match state.db_connection.lock() {
        Ok(connection) => refresh_access_token(
            &refresh_token,
            &state.jwt_keys,
            &state.token_config,
            &connection,
        ),
        Err(_) => Err(Error::DatabaseLockError),
    };

    match result {
        Ok((user, access_token)) => {
            tracing::debug!("Refreshed access token for user {}", user.id);

            (
                set_access_cookie(jar, &access_token),
                Json(json!({ "message": "Token refreshed" })),
            )
                .into_response()
        }
        Err(Error::DatabaseLockError) => {
            detail(StatusCode::INTERNAL_SERVER_ERROR, "An unexpected error occurred.")
        }
        Err(error) => {
            tracing::warn!("Could not refresh access token: {error}");
            detail(StatusCode::UNAUTHORIZED, "Invalid or expired refresh token")
        }
    }
}

/// End the session. The cookies are cleared whether or not the session could be revoked.
pub async fn post_logout(State(state): State<AuthState>, jar: CookieJar) -> Response {
    let jar = end_session(&state, jar);

    (jar, Json(json!({ "message": "Logout successful" }))).into_response()
}

/// Describe the logged in user.
pub async fn get_me(Extension(user): Extension<CurrentUser>) -> Response {
    Json(json!({
        "authenticated": true,
        "user_id": user.id,
        "username": user.username,
        "is_staff": user.is_staff,
    }))
    .into_response()
}
