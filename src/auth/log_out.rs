//! Log-out route handler that revokes the refresh session and clears the session cookies.

use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;

use crate::{
    Error,
    auth::{
        cookie::{REFRESH_COOKIE, invalidate_auth_cookies},
        middleware::AuthState,
        refresh_session::revoke_refresh_session,
        token::{TokenKind, decode_token},
    },
    endpoints,
};

fn try_revoke_refresh_session(state: &AuthState, jar: &CookieJar) -> Result<(), Error> {
    let Some(refresh_cookie) = jar.get(REFRESH_COOKIE) else {
        return Ok(());
    };

    let claims = decode_token(refresh_cookie.value(), TokenKind::Refresh, &state.jwt_keys)?;
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    revoke_refresh_session(&claims.jti, &connection)
}

/// Revoke the refresh session in `jar` and return the jar with every session cookie expired.
///
/// Revocation is best-effort. The cookies are cleared even if the refresh token is missing,
/// invalid or expired, or the database cannot be reached.
pub(super) fn end_session(state: &AuthState, jar: CookieJar) -> CookieJar {
    if let Err(error) = try_revoke_refresh_session(state, &jar) {
        tracing::warn!("Could not revoke refresh session during log out: {error}");
    }

    invalidate_auth_cookies(jar)
}

/// Invalidate the session cookies and redirect the client to the log-in page.
pub async fn get_log_out(State(state): State<AuthState>, jar: CookieJar) -> Response {
    let jar = end_session(&state, jar);

    (jar, Redirect::to(endpoints::LOG_IN_VIEW)).into_response()
}
