//! Creates the application's tables and seeds the reference data they depend on.

use rusqlite::{Connection, Row};

use crate::{
    Error,
    account::{create_account_table, create_account_type_table, create_currency_table},
    auth::create_refresh_session_table,
    category::create_category_table,
    transaction::create_transaction_table,
    user::create_user_table,
};

/// Create all the tables for the domain models and seed currencies, account types and
/// categories.
///
/// This function is idempotent: it may be called on an existing database.
///
/// # Errors
///
/// Returns an error if any of the tables could not be created or seeded.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    // Cascading deletes rely on foreign key enforcement, which SQLite disables by default.
    connection.execute_batch("PRAGMA foreign_keys = ON;")?;

    let transaction = connection.unchecked_transaction()?;

    create_user_table(&transaction)?;
    create_refresh_session_table(&transaction)?;
    create_currency_table(&transaction)?;
    create_account_type_table(&transaction)?;
    create_category_table(&transaction)?;
    create_account_table(&transaction)?;
    create_transaction_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

/// Read a `COUNT(..)` column as a `usize`.
///
/// SQLite counts are signed 64-bit integers, so a negative value is reported as out of range.
pub fn get_count(row: &Row, index: usize) -> Result<usize, rusqlite::Error> {
    let count: i64 = row.get(index)?;

    usize::try_from(count).map_err(|_| rusqlite::Error::IntegralValueOutOfRange(index, count))
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use super::{get_count, initialize};

    #[test]
    fn initialize_is_idempotent() {
        let connection = Connection::open_in_memory().unwrap();

        initialize(&connection).expect("first initialization failed");
        initialize(&connection).expect("second initialization failed");

        let currency_count: i64 = connection
            .query_row("SELECT COUNT(*) FROM currency", [], |row| row.get(0))
            .unwrap();
        assert_eq!(currency_count, 4, "seed data should not be duplicated");
    }

    #[test]
    fn enables_foreign_keys() {
        let connection = Connection::open_in_memory().unwrap();

        initialize(&connection).unwrap();

        let enabled: bool = connection
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert!(enabled);
    }

    #[test]
    fn reads_count_as_usize() {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        let count = connection
            .query_row("SELECT COUNT(*) FROM currency", [], |row| get_count(row, 0))
            .unwrap();

        assert_eq!(count, 4);
    }

    #[test]
    fn negative_count_is_out_of_range() {
        let connection = Connection::open_in_memory().unwrap();

        let result = connection.query_row("SELECT -1", [], |row| get_count(row, 0));

        assert!(matches!(
            result,
            Err(rusqlite::Error::IntegralValueOutOfRange(0, -1))
        ));
    }
}
