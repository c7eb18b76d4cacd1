use rusqlite::Connection;
use time::Date;

use crate::{Error, UserID, db::get_count};

/// A row in the admin panel's user table.
#[derive(Debug, Clone, PartialEq)]
pub struct UserOverview {
    pub id: UserID,
    pub username: String,
    pub is_staff: bool,
    pub date_joined: Date,
    pub account_count: usize,
}

/// Get every user with the number of accounts they own, ordered by username.
pub fn get_user_overviews(connection: &Connection) -> Result<Vec<UserOverview>, Error> {
    connection
        .prepare(
            "SELECT user.id, user.username, user.is_staff, user.date_joined, COUNT(account.id)
            FROM user
            LEFT JOIN account ON account.user_id = user.id
            GROUP BY user.id
            ORDER BY user.username ASC",
        )?
        .query_map([], |row| {
            Ok(UserOverview {
                id: UserID::new(row.get(0)?),
                username: row.get(1)?,
                is_staff: row.get(2)?,
                date_joined: row.get(3)?,
                account_count: get_count(row, 4)?,
            })
        })?
        .map(|maybe_user| maybe_user.map_err(Error::from))
        .collect()
}
