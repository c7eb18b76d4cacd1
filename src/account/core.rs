//! Accounts, the currencies and account types they reference, and the queries that manage them.
//!
//! All queries that take a `user_id` only see accounts owned by that user, so a user asking
//! for another user's account gets [Error::NotFound].

use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::Deserialize;
use time::{Date, OffsetDateTime};

use crate::{Error, UserID, db::get_count};

/// The database ID of an account.
pub type AccountId = i64;
/// The database ID of a currency.
pub type CurrencyId = i64;
/// The database ID of an account type.
pub type AccountTypeId = i64;

/// The most accounts a single user may own.
pub const MAX_ACCOUNTS_PER_USER: usize = 4;

/// Amounts and balances hold at most ten whole digits and two decimal places.
pub const MAX_AMOUNT: f64 = 10_000_000_000.0;

/// Round `amount` to whole cents, rejecting it if it is not finite or if its magnitude
/// reaches [MAX_AMOUNT].
///
/// # Errors
///
/// Returns [Error::InvalidAmount] if `amount` cannot be stored.
pub fn validate_amount(amount: f64) -> Result<f64, Error> {
    if !amount.is_finite() || amount.abs() >= MAX_AMOUNT {
        return Err(Error::InvalidAmount);
    }

    let rounded = (amount * 100.0).round() / 100.0;
    if rounded.abs() >= MAX_AMOUNT {
        return Err(Error::InvalidAmount);
    }

    Ok(rounded)
}

/// A currency that an account's balance is held in.
#[derive(Debug, Clone, PartialEq)]
pub struct Currency {
    pub id: CurrencyId,
    /// The ISO 4217 code, e.g. "USD".
    pub code: String,
    pub name: String,
    pub symbol: String,
}

/// The kind of account, e.g. "Savings".
#[derive(Debug, Clone, PartialEq)]
pub struct AccountType {
    pub id: AccountTypeId,
    pub name: String,
    pub description: String,
}

/// A user-owned ledger with a balance, sometimes called a profile.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    /// The id for the account.
    pub id: AccountId,
    /// The user that owns the account.
    pub user_id: UserID,
    /// The display name of the account.
    pub name: String,
    /// The current balance in `currency`.
    pub balance: f64,
    /// The currency the balance is held in.
    pub currency: Currency,
    /// The kind of account.
    pub account_type: AccountType,
    /// When the account was created.
    pub created_at: Date,
}

/// The data needed to create or update an account.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AccountForm {
    /// The display name, surrounding whitespace is trimmed before saving.
    pub name: String,
    /// The balance in the account's currency.
    pub balance: f64,
    /// The ID of the currency the balance is held in.
    pub currency_id: CurrencyId,
    /// The ID of the kind of account.
    pub account_type_id: AccountTypeId,
}

const SEED_CURRENCIES: [(&str, &str, &str); 4] = [
    ("USD", "US Dollar", "$"),
    ("EUR", "Euro", "€"),
    ("GBP", "British Pound", "£"),
    ("NZD", "New Zealand Dollar", "NZ$"),
];

const SEED_ACCOUNT_TYPES: [(&str, &str); 3] = [
    ("Checking", "Everyday transaction account"),
    ("Savings", "Interest-earning savings account"),
    ("Credit Card", "Revolving credit account"),
];

/// Create the currency table and insert the default currencies if they are missing.
pub fn create_currency_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS currency (
            id INTEGER PRIMARY KEY,
            code TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            symbol TEXT NOT NULL
        )",
        (),
    )?;

    let mut statement = connection
        .prepare("INSERT OR IGNORE INTO currency (code, name, symbol) VALUES (?1, ?2, ?3)")?;

    for (code, name, symbol) in SEED_CURRENCIES {
        statement.execute((code, name, symbol))?;
    }

    Ok(())
}

/// Create the account type table and insert the default account types if they are missing.
pub fn create_account_type_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS account_type (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            description TEXT NOT NULL DEFAULT ''
        )",
        (),
    )?;

    let mut statement = connection
        .prepare("INSERT OR IGNORE INTO account_type (name, description) VALUES (?1, ?2)")?;

    for (name, description) in SEED_ACCOUNT_TYPES {
        statement.execute((name, description))?;
    }

    Ok(())
}

pub fn create_account_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS account (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            balance REAL NOT NULL DEFAULT 0,
            currency_id INTEGER NOT NULL REFERENCES currency(id),
            account_type_id INTEGER NOT NULL REFERENCES account_type(id),
            created_at TEXT NOT NULL
        )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_account_user_id ON account(user_id)",
        (),
    )?;

    Ok(())
}

/// The columns [map_row_to_account] expects, in order.
const ACCOUNT_COLUMNS: &str = "account.id, account.user_id, account.name, account.balance, \
    account.created_at, currency.id, currency.code, currency.name, currency.symbol, \
    account_type.id, account_type.name, account_type.description";

const ACCOUNT_JOINS: &str = "FROM account \
    INNER JOIN currency ON currency.id = account.currency_id \
    INNER JOIN account_type ON account_type.id = account.account_type_id";

pub fn map_row_to_account(row: &Row) -> Result<Account, rusqlite::Error> {
    Ok(Account {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        name: row.get(2)?,
        balance: row.get(3)?,
        created_at: row.get(4)?,
        currency: Currency {
            id: row.get(5)?,
            code: row.get(6)?,
            name: row.get(7)?,
            symbol: row.get(8)?,
        },
        account_type: AccountType {
            id: row.get(9)?,
            name: row.get(10)?,
            description: row.get(11)?,
        },
    })
}

/// Get all currencies ordered by code.
pub fn get_currencies(connection: &Connection) -> Result<Vec<Currency>, Error> {
    connection
        .prepare("SELECT id, code, name, symbol FROM currency ORDER BY code ASC")?
        .query_map([], |row| {
            Ok(Currency {
                id: row.get(0)?,
                code: row.get(1)?,
                name: row.get(2)?,
                symbol: row.get(3)?,
            })
        })?
        .map(|maybe_currency| maybe_currency.map_err(Error::from))
        .collect()
}

/// Get all account types ordered by ID.
pub fn get_account_types(connection: &Connection) -> Result<Vec<AccountType>, Error> {
    connection
        .prepare("SELECT id, name, description FROM account_type ORDER BY id ASC")?
        .query_map([], |row| {
            Ok(AccountType {
                id: row.get(0)?,
                name: row.get(1)?,
                description: row.get(2)?,
            })
        })?
        .map(|maybe_type| maybe_type.map_err(Error::from))
        .collect()
}

/// Check the parts of `form` that don't depend on the account's owner.
/// Returns the trimmed name and the balance rounded to cents.
fn validate_account_form(
    form: &AccountForm,
    connection: &Connection,
) -> Result<(String, f64), Error> {
    let name = form.name.trim();
    if name.is_empty() {
        return Err(Error::EmptyAccountName);
    }

    let balance = validate_amount(form.balance)?;

    let currency_exists = connection
        .query_row(
            "SELECT 1 FROM currency WHERE id = ?1",
            [form.currency_id],
            |_| Ok(()),
        )
        .optional()?
        .is_some();
    if !currency_exists {
        return Err(Error::InvalidCurrency);
    }

    let account_type_exists = connection
        .query_row(
            "SELECT 1 FROM account_type WHERE id = ?1",
            [form.account_type_id],
            |_| Ok(()),
        )
        .optional()?
        .is_some();
    if !account_type_exists {
        return Err(Error::InvalidAccountType);
    }

    Ok((name.to_owned(), balance))
}

/// Count the accounts owned by `user_id`.
pub fn count_accounts(user_id: UserID, connection: &Connection) -> Result<usize, Error> {
    connection
        .query_row(
            "SELECT COUNT(id) FROM account WHERE user_id = ?1",
            [user_id.as_i64()],
            |row| get_count(row, 0),
        )
        .map_err(Error::from)
}

/// Create an account for `user_id`.
///
/// # Errors
///
/// Returns an error if:
/// - the user already owns [MAX_ACCOUNTS_PER_USER] accounts ([Error::AccountLimitReached]),
/// - the name is blank ([Error::EmptyAccountName]),
/// - the balance is not finite or too large ([Error::InvalidAmount]),
/// - the currency or account type does not exist,
/// - or there was an SQL error.
pub fn create_account(
    user_id: UserID,
    form: &AccountForm,
    connection: &Connection,
) -> Result<Account, Error> {
    if count_accounts(user_id, connection)? >= MAX_ACCOUNTS_PER_USER {
        return Err(Error::AccountLimitReached);
    }

    let (name, balance) = validate_account_form(form, connection)?;
    let created_at = OffsetDateTime::now_utc().date();

    connection.execute(
        "INSERT INTO account (user_id, name, balance, currency_id, account_type_id, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            user_id.as_i64(),
            name,
            balance,
            form.currency_id,
            form.account_type_id,
            created_at
        ],
    )?;

    get_account(connection.last_insert_rowid(), user_id, connection)
}

/// Get the account with `account_id` if it is owned by `user_id`.
///
/// # Errors
///
/// Returns [Error::NotFound] if the account does not exist or belongs to another user.
pub fn get_account(
    account_id: AccountId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Account, Error> {
    connection
        .query_row(
            &format!(
                "SELECT {ACCOUNT_COLUMNS} {ACCOUNT_JOINS} \
                WHERE account.id = ?1 AND account.user_id = ?2"
            ),
            params![account_id, user_id.as_i64()],
            map_row_to_account,
        )
        .map_err(Error::from)
}

/// Get the accounts owned by `user_id` in the order they were created.
pub fn get_accounts(user_id: UserID, connection: &Connection) -> Result<Vec<Account>, Error> {
    connection
        .prepare(&format!(
            "SELECT {ACCOUNT_COLUMNS} {ACCOUNT_JOINS} \
            WHERE account.user_id = ?1 ORDER BY account.id ASC"
        ))?
        .query_map([user_id.as_i64()], map_row_to_account)?
        .map(|maybe_account| maybe_account.map_err(Error::from))
        .collect()
}

/// Update the name, balance, currency and type of an account owned by `user_id`.
///
/// # Errors
///
/// Returns [Error::UpdateMissingAccount] if the account does not exist or belongs to another
/// user, or a validation error as for [create_account].
pub fn update_account(
    account_id: AccountId,
    user_id: UserID,
    form: &AccountForm,
    connection: &Connection,
) -> Result<Account, Error> {
    let (name, balance) = validate_account_form(form, connection)?;

    let rows_affected = connection.execute(
        "UPDATE account SET name = ?1, balance = ?2, currency_id = ?3, account_type_id = ?4
        WHERE id = ?5 AND user_id = ?6",
        params![
            name,
            balance,
            form.currency_id,
            form.account_type_id,
            account_id,
            user_id.as_i64()
        ],
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingAccount);
    }

    get_account(account_id, user_id, connection)
}

/// Delete an account owned by `user_id` and, by cascade, its transactions.
///
/// # Errors
///
/// Returns [Error::DeleteMissingAccount] if the account does not exist or belongs to another
/// user.
pub fn delete_account(
    account_id: AccountId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM account WHERE id = ?1 AND user_id = ?2",
        params![account_id, user_id.as_i64()],
    )?;

    match rows_affected {
        0 => Err(Error::DeleteMissingAccount),
        _ => Ok(()),
    }
}

/// An account along with the username of its owner, for the admin panel.
#[derive(Debug, Clone, PartialEq)]
pub struct OwnedAccount {
    pub account: Account,
    pub owner: String,
}

/// Get every account in the database with its owner's username.
pub fn get_all_accounts(connection: &Connection) -> Result<Vec<OwnedAccount>, Error> {
    connection
        .prepare(&format!(
            "SELECT {ACCOUNT_COLUMNS}, user.username {ACCOUNT_JOINS} \
            INNER JOIN user ON user.id = account.user_id \
            ORDER BY user.username ASC, account.id ASC"
        ))?
        .query_map([], |row| {
            Ok(OwnedAccount {
                account: map_row_to_account(row)?,
                owner: row.get(12)?,
            })
        })?
        .map(|maybe_account| maybe_account.map_err(Error::from))
        .collect()
}

/// Delete any account regardless of its owner.
///
/// # Errors
///
/// Returns [Error::DeleteMissingAccount] if the account does not exist.
pub fn delete_any_account(account_id: AccountId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM account WHERE id = ?1", [account_id])?;

    match rows_affected {
        0 => Err(Error::DeleteMissingAccount),
        _ => Ok(()),
    }
}

#[cfg(test)]
pub(crate) fn test_account_form(name: &str) -> AccountForm {
    AccountForm {
        name: name.to_owned(),
        balance: 100.0,
        currency_id: 1,
        account_type_id: 1,
    }
}
