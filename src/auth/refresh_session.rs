//! Server-side records of issued refresh tokens.
//!
//! A refresh token is only honoured while its row exists, so logging out or deleting a user
//! revokes the session even though the token's signature is still valid.

use rusqlite::{Connection, OptionalExtension};
use time::OffsetDateTime;

use crate::{Error, UserID, auth::token::Claims};

pub fn create_refresh_session_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS refresh_session (
            jti TEXT PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            expires_at INTEGER NOT NULL
        )",
        (),
    )?;

    Ok(())
}

/// Record a newly issued refresh token.
pub fn insert_refresh_session(claims: &Claims, connection: &Connection) -> Result<(), Error> {
    connection.execute(
        "INSERT INTO refresh_session (jti, user_id, expires_at) VALUES (?1, ?2, ?3)",
        (&claims.jti, claims.user_id.as_i64(), claims.exp),
    )?;

    Ok(())
}

/// Whether the refresh token described by `claims` has been issued, not revoked and not
/// expired.
pub fn is_refresh_session_active(claims: &Claims, connection: &Connection) -> Result<bool, Error> {
    let now = OffsetDateTime::now_utc().unix_timestamp();

    let found = connection
        .query_row(
            "SELECT 1 FROM refresh_session WHERE jti = ?1 AND user_id = ?2 AND expires_at > ?3",
            (&claims.jti, claims.user_id.as_i64(), now),
            |_| Ok(()),
        )
        .optional()?;

    Ok(found.is_some())
}

/// Revoke a refresh token. Revoking a token that is unknown is not an error.
pub fn revoke_refresh_session(jti: &str, connection: &Connection) -> Result<(), Error> {
    connection.execute("DELETE FROM refresh_session WHERE jti = ?1", (jti,))?;

    Ok(())
}

/// Delete expired sessions, returning how many were removed.
pub fn delete_expired_refresh_sessions(connection: &Connection) -> Result<usize, Error> {
    let now = OffsetDateTime::now_utc().unix_timestamp();

    connection
        .execute(
            "DELETE FROM refresh_session WHERE expires_at <= ?1",
            (now,),
        )
        .map_err(Error::from)
}

/// Revoke every refresh token belonging to `user_id`.
pub fn revoke_user_refresh_sessions(user_id: UserID, connection: &Connection) -> Result<(), Error> {
    connection.execute(
        "DELETE FROM refresh_session WHERE user_id = ?1",
        (user_id.as_i64(),),
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use time::Duration;

    use crate::{
        auth::token::{JwtKeys, TokenKind, create_token},
        test_utils::{create_test_user, get_test_connection},
    };

    use super::{
        delete_expired_refresh_sessions, insert_refresh_session, is_refresh_session_active,
        revoke_refresh_session, revoke_user_refresh_sessions,
    };

    #[test]
    fn inserted_session_is_active_until_revoked() {
        let connection = get_test_connection();
        let user = create_test_user("jane", false, &connection);
        let keys = JwtKeys::new("secret");
        let token = create_token(user.id, TokenKind::Refresh, Duration::days(1), &keys).unwrap();

        assert!(!is_refresh_session_active(&token.claims, &connection).unwrap());

        insert_refresh_session(&token.claims, &connection).unwrap();
        assert!(is_refresh_session_active(&token.claims, &connection).unwrap());

        revoke_refresh_session(&token.claims.jti, &connection).unwrap();
        assert!(!is_refresh_session_active(&token.claims, &connection).unwrap());
    }

    #[test]
    fn revoking_unknown_session_succeeds() {
        let connection = get_test_connection();

        assert!(revoke_refresh_session("does-not-exist", &connection).is_ok());
    }

    #[test]
    fn expired_sessions_are_inactive_and_cleaned_up() {
        let connection = get_test_connection();
        let user = create_test_user("jane", false, &connection);
        let keys = JwtKeys::new("secret");
        let expired =
            create_token(user.id, TokenKind::Refresh, Duration::seconds(-5), &keys).unwrap();
        let live = create_token(user.id, TokenKind::Refresh, Duration::days(1), &keys).unwrap();
        insert_refresh_session(&expired.claims, &connection).unwrap();
        insert_refresh_session(&live.claims, &connection).unwrap();

        assert!(!is_refresh_session_active(&expired.claims, &connection).unwrap());
        assert_eq!(delete_expired_refresh_sessions(&connection), Ok(1));
        assert!(is_refresh_session_active(&live.claims, &connection).unwrap());
    }

    #[test]
    fn revoke_user_sessions_removes_all() {
        let connection = get_test_connection();
        let user = create_test_user("jane", false, &connection);
        let keys = JwtKeys::new("secret");
        let first = create_token(user.id, TokenKind::Refresh, Duration::days(1), &keys).unwrap();
        let second = create_token(user.id, TokenKind::Refresh, Duration::days(1), &keys).unwrap();
        insert_refresh_session(&first.claims, &connection).unwrap();
        insert_refresh_session(&second.claims, &connection).unwrap();

        revoke_user_refresh_sessions(user.id, &connection).unwrap();

        assert!(!is_refresh_session_active(&first.claims, &connection).unwrap());
        assert!(!is_refresh_session_active(&second.claims, &connection).unwrap());
    }
}
