//! Resolving who is making a request from the tokens they present.

use rusqlite::Connection;
use serde::Serialize;

use crate::{
    Error, UserID,
    auth::{
        guard::Role,
        refresh_session::is_refresh_session_active,
        token::{JwtKeys, SignedToken, TokenConfig, TokenKind, create_token, decode_token},
    },
    user::get_user_by_id,
};

/// The identity of the user making a request.
///
/// This is always loaded fresh from the database, so changes to a user's staff flag take
/// effect on their next request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentUser {
    pub id: UserID,
    pub username: String,
    pub is_staff: bool,
}

impl CurrentUser {
    pub fn role(&self) -> Role {
        if self.is_staff {
            Role::Staff
        } else {
            Role::Member
        }
    }
}

/// What is known about the visitor.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// The session has not been resolved yet.
    #[allow(dead_code)]
    Loading,
    Authenticated(CurrentUser),
    Anonymous,
}

/// The outcome of checking a request's tokens.
#[derive(Debug, Clone)]
pub enum Resolution {
    /// The access token was valid.
    Active(CurrentUser),
    /// The access token was missing or rejected, and the refresh token was exchanged for a
    /// new access token. The caller should send the new token to the client.
    Refreshed(CurrentUser, SignedToken),
    /// Neither token could identify the visitor.
    Anonymous,
}

impl Resolution {
    pub fn user(&self) -> Option<&CurrentUser> {
        match self {
            Resolution::Active(user) | Resolution::Refreshed(user, _) => Some(user),
            Resolution::Anonymous => None,
        }
    }

    pub fn state(&self) -> SessionState {
        match self.user() {
            Some(user) => SessionState::Authenticated(user.clone()),
            None => SessionState::Anonymous,
        }
    }
}

fn load_current_user(user_id: UserID, connection: &Connection) -> Result<CurrentUser, Error> {
    let user = get_user_by_id(user_id, connection)?;

    Ok(CurrentUser {
        id: user.id,
        username: user.username.to_string(),
        is_staff: user.is_staff,
    })
}

/// Exchange a refresh token for a new access token.
///
/// The refresh token must be valid, its session must not have been revoked and its user must
/// still exist.
///
/// # Errors
///
/// Returns [Error::TokenError] if the refresh token is rejected, [Error::NotFound] if the user
/// no longer exists, or an SQL error.
pub fn refresh_access_token(
    refresh_token: &str,
    keys: &JwtKeys,
    config: &TokenConfig,
    connection: &Connection,
) -> Result<(CurrentUser, SignedToken), Error> {
    let claims = decode_token(refresh_token, TokenKind::Refresh, keys)?;

    if !is_refresh_session_active(&claims, connection)? {
        return Err(Error::TokenError(
            "refresh session has been revoked".to_owned(),
        ));
    }

    let user = load_current_user(claims.user_id, connection)?;
    let access_token = create_token(
        user.id,
        TokenKind::Access,
        config.access_token_duration,
        keys,
    )?;

    Ok((user, access_token))
}

/// Work out who is making a request.
///
/// A valid access token is accepted as is. Otherwise exactly one refresh is attempted with
/// `refresh_token`; there is no retry if that fails.
pub fn resolve_session(
    access_token: Option<&str>,
    refresh_token: Option<&str>,
    keys: &JwtKeys,
    config: &TokenConfig,
    connection: &Connection,
) -> Resolution {
    if let Some(access_token) = access_token {
        match decode_token(access_token, TokenKind::Access, keys)
            .and_then(|claims| load_current_user(claims.user_id, connection))
        {
            Ok(user) => return Resolution::Active(user),
            Err(error) => tracing::debug!("Access token rejected: {error}"),
        }
    }

    let Some(refresh_token) = refresh_token else {
        return Resolution::Anonymous;
    };

    match refresh_access_token(refresh_token, keys, config, connection) {
        Ok((user, access_token)) => {
            tracing::debug!("Refreshed access token for user {}", user.id);
            Resolution::Refreshed(user, access_token)
        }
        Err(error) => {
            tracing::warn!("Could not refresh access token: {error}");
            Resolution::Anonymous
        }
    }
}
