//! Transaction categories, such as "Salary" or "Housing".
//!
//! Categories are shared by all users and seeded when the database is initialized.

use rusqlite::{Connection, Row};

use crate::Error;

pub type CategoryId = i64;

/// A label for grouping transactions in spending summaries.
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: String,
    /// Whether transactions in this category are usually money coming in.
    pub is_income: bool,
}

const SEED_CATEGORIES: [(&str, &str, bool); 6] = [
    ("Salary", "Regular employment income", true),
    ("Investments", "Dividends, interest and capital gains", true),
    ("Gifts", "Money received as a gift", true),
    ("Food & Groceries", "Supermarket shopping and eating out", false),
    ("Housing", "Rent, mortgage and utilities", false),
    ("Entertainment", "Movies, games, events and subscriptions", false),
];

/// Create the category table and insert the default categories if they are missing.
///
/// # Errors
///
/// Returns an error if the SQL query failed.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            description TEXT NOT NULL DEFAULT '',
            is_income INTEGER NOT NULL DEFAULT 0
        )",
        (),
    )?;

    let mut statement = connection.prepare(
        "INSERT OR IGNORE INTO category (name, description, is_income) VALUES (?1, ?2, ?3)",
    )?;

    for (name, description, is_income) in SEED_CATEGORIES {
        statement.execute((name, description, is_income))?;
    }

    Ok(())
}

fn map_row_to_category(row: &Row) -> Result<Category, rusqlite::Error> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        is_income: row.get(3)?,
    })
}

/// Get all categories, income categories first and then by name.
///
/// # Errors
///
/// Returns an [Error::SqlError] if the query failed.
pub fn get_categories(connection: &Connection) -> Result<Vec<Category>, Error> {
    connection
        .prepare(
            "SELECT id, name, description, is_income FROM category \
            ORDER BY is_income DESC, name ASC",
        )?
        .query_map([], map_row_to_category)?
        .map(|maybe_category| maybe_category.map_err(Error::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use crate::db::initialize;

    use super::get_categories;

    #[test]
    fn seeds_income_and_expense_categories() {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        let categories = get_categories(&connection).unwrap();

        let names: Vec<&str> = categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "Gifts",
                "Investments",
                "Salary",
                "Entertainment",
                "Food & Groceries",
                "Housing"
            ]
        );
        assert_eq!(categories.iter().filter(|c| c.is_income).count(), 3);
    }
}
