//! Code for creating the user table and fetching users from the database.

use std::fmt::Display;

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use unicode_segmentation::UnicodeSegmentation;

use crate::{Error, PasswordHash, db::get_count};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// The longest username allowed, counted in graphemes.
pub const MAX_USERNAME_LENGTH: usize = 150;

/// A username that is non-empty, at most [MAX_USERNAME_LENGTH] graphemes long and only
/// contains letters, digits and the characters `@.+-_`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Username(String);

impl Username {
    /// Trim and validate `raw_username`.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidUsername] describing the first rule the username breaks.
    pub fn new(raw_username: &str) -> Result<Self, Error> {
        let username = raw_username.trim();

        if username.is_empty() {
            return Err(Error::InvalidUsername(
                "Username cannot be empty".to_owned(),
            ));
        }

        if username.graphemes(true).count() > MAX_USERNAME_LENGTH {
            return Err(Error::InvalidUsername(format!(
                "Username cannot be longer than {MAX_USERNAME_LENGTH} characters"
            )));
        }

        if let Some(invalid) = username
            .chars()
            .find(|c| !(c.is_alphanumeric() || "@.+-_".contains(*c)))
        {
            return Err(Error::InvalidUsername(format!(
                "Username cannot contain '{invalid}'. Use letters, digits and @/./+/-/_ only"
            )));
        }

        Ok(Self(username.to_owned()))
    }

    /// Create a username without validation, e.g. when reading from the database.
    pub fn new_unchecked(raw_username: &str) -> Self {
        Self(raw_username.to_owned())
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for Username {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A user of the application.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The name the user logs in with.
    pub username: Username,
    /// The user's password hash.
    pub password_hash: PasswordHash,
    /// Whether the user may access the admin panel.
    pub is_staff: bool,
    /// The date the user registered.
    pub date_joined: Date,
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                username TEXT NOT NULL UNIQUE,
                password TEXT NOT NULL,
                is_staff INTEGER NOT NULL DEFAULT 0,
                date_joined TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Create and insert a new user into the database.
///
/// # Errors
///
/// Returns a [Error::DuplicateUsername] if the username is taken, or a [Error::SqlError] if
/// another SQL related error occurred.
pub fn create_user(
    username: &Username,
    password_hash: PasswordHash,
    is_staff: bool,
    connection: &Connection,
) -> Result<User, Error> {
    let date_joined = OffsetDateTime::now_utc().date();

    connection
        .execute(
            "INSERT INTO user (username, password, is_staff, date_joined) VALUES (?1, ?2, ?3, ?4)",
            (username.as_ref(), password_hash.as_ref(), is_staff, date_joined),
        )
        .map_err(|error| match error {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, _) if sql_error.extended_code == 2067 => {
                Error::DuplicateUsername(username.to_string())
            }
            error => error.into(),
        })?;

    Ok(User {
        id: UserID::new(connection.last_insert_rowid()),
        username: username.clone(),
        password_hash,
        is_staff,
        date_joined,
    })
}

fn map_row_to_user(row: &Row) -> Result<User, rusqlite::Error> {
    let raw_username: String = row.get(1)?;
    let raw_password_hash: String = row.get(2)?;

    Ok(User {
        id: UserID::new(row.get(0)?),
        username: Username::new_unchecked(&raw_username),
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
        is_staff: row.get(3)?,
        date_joined: row.get(4)?,
    })
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a registered user.
/// - there was an error trying to access the store.
pub fn get_user_by_id(user_id: UserID, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare(
            "SELECT id, username, password, is_staff, date_joined FROM user WHERE id = :id",
        )?
        .query_row(&[(":id", &user_id.as_i64())], map_row_to_user)
        .map_err(|error| error.into())
}

/// Get the user whose username matches `username` exactly.
///
/// # Errors
///
/// Returns [Error::NotFound] if no user has that username.
pub fn get_user_by_username(username: &str, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare(
            "SELECT id, username, password, is_staff, date_joined FROM user \
            WHERE username = :username",
        )?
        .query_row(&[(":username", &username.trim())], map_row_to_user)
        .map_err(|error| error.into())
}

/// Grant or revoke staff access for a user.
///
/// # Errors
///
/// Returns [Error::UpdateMissingUser] if the user does not exist.
pub fn set_staff(user_id: UserID, is_staff: bool, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE user SET is_staff = ?1 WHERE id = ?2",
        (is_staff, user_id.as_i64()),
    )?;

    match rows_affected {
        0 => Err(Error::UpdateMissingUser),
        _ => Ok(()),
    }
}

/// Replace a user's password hash.
///
/// # Errors
///
/// Returns [Error::UpdateMissingUser] if the user does not exist.
pub fn update_password(
    user_id: UserID,
    password_hash: &PasswordHash,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE user SET password = ?1 WHERE id = ?2",
        (password_hash.as_ref(), user_id.as_i64()),
    )?;

    match rows_affected {
        0 => Err(Error::UpdateMissingUser),
        _ => Ok(()),
    }
}

/// Delete a user. Their accounts, transactions and sessions are deleted by cascade.
///
/// # Errors
///
/// Returns [Error::DeleteMissingUser] if the user does not exist.
pub fn delete_user(user_id: UserID, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM user WHERE id = ?1", (user_id.as_i64(),))?;

    match rows_affected {
        0 => Err(Error::DeleteMissingUser),
        _ => Ok(()),
    }
}

/// Get the number of users in the database.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
pub fn count_users(connection: &Connection) -> Result<usize, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM user;", [], |row| get_count(row, 0))
        .map_err(|error| error.into())
}
