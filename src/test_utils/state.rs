use rusqlite::Connection;

use crate::{
    AppState, PasswordHash, ValidatedPassword,
    auth::{CurrentUser, TokenPair, create_token_pair, insert_refresh_session},
    db::initialize,
    user::{User, Username, create_user},
};

/// The password given to every user made by [create_test_user].
pub(crate) const TEST_PASSWORD: &str = "averysafeandsecurepassword";

const TEST_SECRET: &str = "a-secret-only-used-in-tests";

/// bcrypt's minimum cost keeps the tests fast.
const TEST_BCRYPT_COST: u32 = 4;

pub(crate) fn get_test_connection() -> Connection {
    let connection =
        Connection::open_in_memory().expect("Could not open in-memory SQLite database");
    initialize(&connection).expect("Could not initialize database");

    connection
}

pub(crate) fn get_test_app_state() -> AppState {
    let connection =
        Connection::open_in_memory().expect("Could not open in-memory SQLite database");

    AppState::new(connection, TEST_SECRET, "Etc/UTC").expect("Could not create app state")
}

#[track_caller]
pub(crate) fn create_test_user(username: &str, is_staff: bool, connection: &Connection) -> User {
    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked(TEST_PASSWORD),
        TEST_BCRYPT_COST,
    )
    .expect("Could not hash password");

    create_user(
        &Username::new(username).expect("Invalid test username"),
        password_hash,
        is_staff,
        connection,
    )
    .expect("Could not create test user")
}

/// Issue tokens for `user` and record the refresh session, as logging in would.
#[track_caller]
pub(crate) fn issue_session(state: &AppState, user: &User) -> TokenPair {
    let tokens = create_token_pair(user.id, &state.token_config, &state.jwt_keys)
        .expect("Could not create tokens");
    insert_refresh_session(
        &tokens.refresh.claims,
        &state.db_connection.lock().expect("Could not lock database"),
    )
    .expect("Could not record refresh session");

    tokens
}

/// The identity the auth middleware would attach to requests from `user`.
pub(crate) fn as_current_user(user: &User) -> CurrentUser {
    CurrentUser {
        id: user.id,
        username: user.username.to_string(),
        is_staff: user.is_staff,
    }
}
