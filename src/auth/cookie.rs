//! Reading and writing the cookies that carry the session tokens.

use axum_extra::extract::{
    CookieJar,
    cookie::{Cookie, SameSite},
};
use time::{Duration, OffsetDateTime};

use crate::auth::token::{SignedToken, TokenPair};

/// The name of the cookie holding the access token.
pub const ACCESS_COOKIE: &str = "access_token";
/// The name of the cookie holding the refresh token.
pub const REFRESH_COOKIE: &str = "refresh_token";
/// The name of the cookie holding the ID of the account shown on the dashboard.
pub const SELECTED_ACCOUNT_COOKIE: &str = "selected_account";

fn build_cookie(name: &'static str, value: String, expires_at: OffsetDateTime) -> Cookie<'static> {
    let max_age = (expires_at - OffsetDateTime::now_utc()).max(Duration::ZERO);

    Cookie::build((name, value))
        .path("/")
        .expires(expires_at)
        .max_age(max_age)
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(true)
        .build()
}

fn expired_cookie(name: &'static str) -> Cookie<'static> {
    Cookie::build((name, ""))
        .path("/")
        .expires(OffsetDateTime::UNIX_EPOCH)
        .max_age(Duration::ZERO)
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(true)
        .build()
}

/// Add the access cookie for `access_token` to the cookie jar.
pub fn set_access_cookie(jar: CookieJar, access_token: &SignedToken) -> CookieJar {
    jar.add(build_cookie(
        ACCESS_COOKIE,
        access_token.token.clone(),
        access_token.claims.expires_at(),
    ))
}

/// Add both session cookies to the cookie jar.
pub fn set_auth_cookies(jar: CookieJar, tokens: &TokenPair) -> CookieJar {
    let jar = set_access_cookie(jar, &tokens.access);

    jar.add(build_cookie(
        REFRESH_COOKIE,
        tokens.refresh.token.clone(),
        tokens.refresh.claims.expires_at(),
    ))
}

/// Expire the session cookies and the selected account cookie.
pub fn invalidate_auth_cookies(jar: CookieJar) -> CookieJar {
    jar.add(expired_cookie(ACCESS_COOKIE))
        .add(expired_cookie(REFRESH_COOKIE))
        .add(expired_cookie(SELECTED_ACCOUNT_COOKIE))
}

/// Remember which account the user is working with.
pub fn set_selected_account_cookie(jar: CookieJar, account_id: i64) -> CookieJar {
    let mut cookie = Cookie::new(SELECTED_ACCOUNT_COOKIE, account_id.to_string());
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Strict);
    cookie.set_secure(true);

    jar.add(cookie)
}

/// Forget the selected account, e.g. after it has been deleted.
pub fn clear_selected_account_cookie(jar: CookieJar) -> CookieJar {
    jar.add(expired_cookie(SELECTED_ACCOUNT_COOKIE))
}

/// The selected account ID, if the cookie is present and holds an integer.
pub fn get_selected_account_id(jar: &CookieJar) -> Option<i64> {
    jar.get(SELECTED_ACCOUNT_COOKIE)
        .and_then(|cookie| cookie.value().parse().ok())
}
