//! Defines the core data models and database queries for transactions.
//!
//! Creating or deleting a transaction also moves the balance of its account, and both writes
//! happen in one SQL transaction so the balance always equals the opening balance plus the sum
//! of the account's transactions.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, OptionalExtension, Row, params,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::{Date, Duration, Month, OffsetDateTime};

use crate::{
    Error, UserID,
    account::{AccountId, validate_amount},
    category::CategoryId,
};

pub type TransactionId = i64;

/// How often a transaction repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    /// A one-off transaction.
    #[default]
    None,
    /// Repeats every day.
    Daily,
    /// Repeats every seven days.
    Weekly,
    /// Repeats on the same day each month.
    Monthly,
    /// Repeats on the same day each year.
    Yearly,
}

impl Frequency {
    /// Every frequency, in the order they are offered to the user.
    pub const ALL: [Frequency; 5] = [
        Frequency::None,
        Frequency::Daily,
        Frequency::Weekly,
        Frequency::Monthly,
        Frequency::Yearly,
    ];

    /// The lowercase name stored in the database and sent in forms.
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::None => "none",
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::Yearly => "yearly",
        }
    }

    /// The name shown to the user.
    pub fn label(&self) -> &'static str {
        match self {
            Frequency::None => "One-off",
            Frequency::Daily => "Daily",
            Frequency::Weekly => "Weekly",
            Frequency::Monthly => "Monthly",
            Frequency::Yearly => "Yearly",
        }
    }

    /// When a transaction on `date` next falls due, or `None` if it does not repeat.
    ///
    /// Monthly and yearly repeats that land on a day the target month does not have are
    /// clamped to the last day of that month, e.g. 31 January is followed by 28 or 29 February.
    pub fn next_due_date(&self, date: Date) -> Option<Date> {
        match self {
            Frequency::None => None,
            Frequency::Daily => date.checked_add(Duration::days(1)),
            Frequency::Weekly => date.checked_add(Duration::weeks(1)),
            Frequency::Monthly => add_months(date, 1),
            Frequency::Yearly => add_months(date, 12),
        }
    }
}

fn add_months(date: Date, months: i32) -> Option<Date> {
    let month_index = date.month() as i32 - 1 + months;
    let year = date.year() + month_index.div_euclid(12);
    let month = Month::try_from((month_index.rem_euclid(12) + 1) as u8).ok()?;

    (1..=date.day())
        .rev()
        .find_map(|day| Date::from_calendar_date(year, month, day).ok())
}

impl Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Frequency::ALL
            .into_iter()
            .find(|frequency| frequency.as_str() == s)
            .ok_or_else(|| format!("unknown frequency \"{s}\""))
    }
}

impl ToSql for Frequency {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Frequency {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: String| FromSqlError::Other(error.into()))
    }
}

/// A movement of money in or out of an account.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub id: TransactionId,
    pub account_id: AccountId,
    /// Positive amounts are income, negative amounts are expenses.
    pub amount: f64,
    pub category_id: Option<CategoryId>,
    /// The name of the category, if the transaction has one.
    pub category_name: Option<String>,
    /// When the transaction happened.
    pub date: Date,
    pub description: String,
    pub frequency: Frequency,
    /// When a repeating transaction next falls due.
    pub next_due_date: Option<Date>,
    pub created_at: OffsetDateTime,
}

/// The data needed to create a transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    /// Positive amounts are income, negative amounts are expenses.
    pub amount: f64,
    /// The category to file the transaction under, if any.
    pub category_id: Option<CategoryId>,
    /// When the transaction happened.
    pub date: Date,
    /// Surrounding whitespace is trimmed before saving.
    pub description: String,
    /// How often the transaction repeats.
    pub frequency: Frequency,
}

pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS account_transaction (
            id INTEGER PRIMARY KEY,
            account_id INTEGER NOT NULL REFERENCES account(id) ON DELETE CASCADE,
            amount REAL NOT NULL,
            category_id INTEGER REFERENCES category(id) ON DELETE SET NULL,
            date TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            frequency TEXT NOT NULL DEFAULT 'none',
            next_due_date TEXT,
            created_at TEXT NOT NULL
        )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_account_date
        ON account_transaction(account_id, date)",
        (),
    )?;

    Ok(())
}

const TRANSACTION_COLUMNS: &str = "account_transaction.id, account_transaction.account_id, \
    account_transaction.amount, account_transaction.category_id, category.name, \
    account_transaction.date, account_transaction.description, account_transaction.frequency, \
    account_transaction.next_due_date, account_transaction.created_at";

const TRANSACTION_JOINS: &str = "FROM account_transaction \
    INNER JOIN account ON account.id = account_transaction.account_id \
    LEFT JOIN category ON category.id = account_transaction.category_id";

fn map_row_to_transaction(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        account_id: row.get(1)?,
        amount: row.get(2)?,
        category_id: row.get(3)?,
        category_name: row.get(4)?,
        date: row.get(5)?,
        description: row.get(6)?,
        frequency: row.get(7)?,
        next_due_date: row.get(8)?,
        created_at: row.get(9)?,
    })
}

fn account_is_owned_by(
    account_id: AccountId,
    user_id: UserID,
    connection: &Connection,
) -> Result<bool, Error> {
    let owned = connection
        .query_row(
            "SELECT 1 FROM account WHERE id = ?1 AND user_id = ?2",
            params![account_id, user_id.as_i64()],
            |_| Ok(()),
        )
        .optional()?
        .is_some();

    Ok(owned)
}

/// Add a transaction to the account with `account_id` and adjust the account's balance.
///
/// # Errors
///
/// Returns an error if:
/// - the account does not exist or is not owned by `user_id` ([Error::NotFound]),
/// - the amount is not finite or too large ([Error::InvalidAmount]),
/// - the category does not exist ([Error::InvalidCategory]),
/// - or there was an SQL error.
pub fn create_transaction(
    account_id: AccountId,
    user_id: UserID,
    new_transaction: &NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let amount = validate_amount(new_transaction.amount)?;

    if !account_is_owned_by(account_id, user_id, connection)? {
        return Err(Error::NotFound);
    }

    if let Some(category_id) = new_transaction.category_id {
        let category_exists = connection
            .query_row("SELECT 1 FROM category WHERE id = ?1", [category_id], |_| {
                Ok(())
            })
            .optional()?
            .is_some();

        if !category_exists {
            return Err(Error::InvalidCategory);
        }
    }

    let next_due_date = new_transaction
        .frequency
        .next_due_date(new_transaction.date);
    let created_at = OffsetDateTime::now_utc();

    let sql_transaction = connection.unchecked_transaction()?;

    sql_transaction.execute(
        "INSERT INTO account_transaction
        (account_id, amount, category_id, date, description, frequency, next_due_date, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            account_id,
            amount,
            new_transaction.category_id,
            new_transaction.date,
            new_transaction.description.trim(),
            new_transaction.frequency,
            next_due_date,
            created_at,
        ],
    )?;
    let transaction_id = sql_transaction.last_insert_rowid();

    sql_transaction.execute(
        "UPDATE account SET balance = ROUND(balance + ?1, 2) WHERE id = ?2",
        params![amount, account_id],
    )?;

    sql_transaction.commit()?;

    get_transaction(transaction_id, user_id, connection)
}

/// Get a transaction on one of `user_id`'s accounts.
///
/// # Errors
///
/// Returns [Error::NotFound] if the transaction does not exist or is on another user's account.
pub fn get_transaction(
    transaction_id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection
        .query_row(
            &format!(
                "SELECT {TRANSACTION_COLUMNS} {TRANSACTION_JOINS} \
                WHERE account_transaction.id = ?1 AND account.user_id = ?2"
            ),
            params![transaction_id, user_id.as_i64()],
            map_row_to_transaction,
        )
        .map_err(Error::from)
}

/// Get the transactions of an account owned by `user_id`, newest first.
pub fn get_transactions(
    account_id: AccountId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} {TRANSACTION_JOINS} \
            WHERE account_transaction.account_id = ?1 AND account.user_id = ?2 \
            ORDER BY account_transaction.date DESC, account_transaction.id DESC"
        ))?
        .query_map(params![account_id, user_id.as_i64()], map_row_to_transaction)?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
        .collect()
}

/// Delete a transaction on one of `user_id`'s accounts and reverse its effect on the balance.
///
/// # Errors
///
/// Returns [Error::DeleteMissingTransaction] if the transaction does not exist or is on
/// another user's account.
pub fn delete_transaction(
    transaction_id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = match get_transaction(transaction_id, user_id, connection) {
        Ok(transaction) => transaction,
        Err(Error::NotFound) => return Err(Error::DeleteMissingTransaction),
        Err(error) => return Err(error),
    };

    let sql_transaction = connection.unchecked_transaction()?;

    sql_transaction.execute(
        "DELETE FROM account_transaction WHERE id = ?1",
        [transaction.id],
    )?;
    sql_transaction.execute(
        "UPDATE account SET balance = ROUND(balance - ?1, 2) WHERE id = ?2",
        params![transaction.amount, transaction.account_id],
    )?;

    sql_transaction.commit()?;

    Ok(transaction)
}

#[cfg(test)]
pub(crate) fn test_transaction(amount: f64, category_id: Option<CategoryId>) -> NewTransaction {
    NewTransaction {
        amount,
        category_id,
        date: time::macros::date!(2025 - 01 - 15),
        description: "Test transaction".to_owned(),
        frequency: Frequency::None,
    }
}

#[cfg(test)]
mod frequency_tests {
    use time::macros::date;

    use super::Frequency;

    #[test]
    fn one_off_has_no_due_date() {
        assert_eq!(Frequency::None.next_due_date(date!(2025 - 01 - 15)), None);
    }

    #[test]
    fn daily_and_weekly_add_days() {
        assert_eq!(
            Frequency::Daily.next_due_date(date!(2024 - 12 - 31)),
            Some(date!(2025 - 01 - 01))
        );
        assert_eq!(
            Frequency::Weekly.next_due_date(date!(2025 - 02 - 25)),
            Some(date!(2025 - 03 - 04))
        );
    }

    #[test]
    fn monthly_clamps_to_end_of_month() {
        assert_eq!(
            Frequency::Monthly.next_due_date(date!(2025 - 01 - 31)),
            Some(date!(2025 - 02 - 28))
        );
        assert_eq!(
            Frequency::Monthly.next_due_date(date!(2024 - 01 - 31)),
            Some(date!(2024 - 02 - 29))
        );
        assert_eq!(
            Frequency::Monthly.next_due_date(date!(2025 - 12 - 15)),
            Some(date!(2026 - 01 - 15))
        );
    }

    #[test]
    fn yearly_clamps_leap_day() {
        assert_eq!(
            Frequency::Yearly.next_due_date(date!(2024 - 02 - 29)),
            Some(date!(2025 - 02 - 28))
        );
        assert_eq!(
            Frequency::Yearly.next_due_date(date!(2025 - 06 - 01)),
            Some(date!(2026 - 06 - 01))
        );
    }

    #[test]
    fn parses_lowercase_names() {
        for frequency in Frequency::ALL {
            assert_eq!(frequency.as_str().parse::<Frequency>(), Ok(frequency));
        }
        assert!("fortnightly".parse::<Frequency>().is_err());
    }
}
