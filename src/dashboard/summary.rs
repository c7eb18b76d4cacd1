//! Totals over an account's transactions for the dashboard summary cards and category table.

use rusqlite::{Connection, params};

use crate::{Error, UserID, account::AccountId, db::get_count};

/// The label used for transactions without a category.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// The net amount of the transactions in one category.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTotal {
    pub name: String,
    /// Negative when the category is mostly spending.
    pub total: f64,
    pub transaction_count: usize,
}

/// Income, expenses and per-category totals for one account.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AccountSummary {
    /// The sum of the positive amounts.
    pub income: f64,
    /// The sum of the negative amounts, so this is zero or negative.
    pub expenses: f64,
    pub by_category: Vec<CategoryTotal>,
}

impl AccountSummary {
    pub fn net(&self) -> f64 {
        self.income + self.expenses
    }
}

/// Summarise the transactions of an account owned by `user_id`.
///
/// Categories are ordered by total ascending, so the biggest spending comes first.
/// Transactions on another user's account are never counted.
pub fn get_account_summary(
    account_id: AccountId,
    user_id: UserID,
    connection: &Connection,
) -> Result<AccountSummary, Error> {
    let (income, expenses) = connection.query_row(
        "SELECT
            COALESCE(SUM(CASE WHEN t.amount > 0 THEN t.amount END), 0),
            COALESCE(SUM(CASE WHEN t.amount < 0 THEN t.amount END), 0)
        FROM account_transaction t
        INNER JOIN account ON account.id = t.account_id
        WHERE t.account_id = ?1 AND account.user_id = ?2",
        params![account_id, user_id.as_i64()],
        |row| Ok((row.get::<_, f64>(0)?, row.get::<_, f64>(1)?)),
    )?;

    let by_category = connection
        .prepare(
            "SELECT COALESCE(category.name, ?3), SUM(t.amount), COUNT(t.id)
            FROM account_transaction t
            INNER JOIN account ON account.id = t.account_id
            LEFT JOIN category ON category.id = t.category_id
            WHERE t.account_id = ?1 AND account.user_id = ?2
            GROUP BY t.category_id
            ORDER BY SUM(t.amount) ASC, 1 ASC",
        )?
        .query_map(params![account_id, user_id.as_i64(), UNCATEGORIZED], |row| {
            Ok(CategoryTotal {
                name: row.get(0)?,
                total: row.get(1)?,
                transaction_count: get_count(row, 2)?,
            })
        })?
        .map(|maybe_total| maybe_total.map_err(Error::from))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(AccountSummary {
        income,
        expenses,
        by_category,
    })
}

#[cfg(test)]
mod tests {
    use crate::{
        account::{create_account, test_account_form},
        test_utils::{create_test_user, get_test_connection},
        transaction::{create_transaction, test_transaction},
    };

    use super::{AccountSummary, CategoryTotal, UNCATEGORIZED, get_account_summary};

    #[test]
    fn empty_account_has_zero_summary() {
        let connection = get_test_connection();
        let user = create_test_user("jane", false, &connection);
        let account = create_account(user.id, &test_account_form("Everyday"), &connection).unwrap();

        let summary = get_account_summary(account.id, user.id, &connection).unwrap();

        assert_eq!(summary, AccountSummary::default());
        assert_eq!(summary.net(), 0.0);
    }

    #[test]
    fn sums_income_expenses_and_categories() {
        let connection = get_test_connection();
        let user = create_test_user("jane", false, &connection);
        let account = create_account(user.id, &test_account_form("Everyday"), &connection).unwrap();
        for (amount, category_id) in [
            (2000.0, Some(1)),
            (-120.0, Some(4)),
            (-30.0, Some(4)),
            (-800.0, Some(5)),
            (-15.0, None),
        ] {
            create_transaction(
                account.id,
                user.id,
                &test_transaction(amount, category_id),
                &connection,
            )
            .unwrap();
        }

        let summary = get_account_summary(account.id, user.id, &connection).unwrap();

        assert_eq!(summary.income, 2000.0);
        assert_eq!(summary.expenses, -965.0);
        assert_eq!(summary.net(), 1035.0);
        assert_eq!(
            summary.by_category,
            vec![
                CategoryTotal {
                    name: "Housing".to_owned(),
                    total: -800.0,
                    transaction_count: 1
                },
                CategoryTotal {
                    name: "Food & Groceries".to_owned(),
                    total: -150.0,
                    transaction_count: 2
                },
                CategoryTotal {
                    name: UNCATEGORIZED.to_owned(),
                    total: -15.0,
                    transaction_count: 1
                },
                CategoryTotal {
                    name: "Salary".to_owned(),
                    total: 2000.0,
                    transaction_count: 1
                },
            ]
        );
    }

    #[test]
    fn ignores_other_users_accounts() {
        let connection = get_test_connection();
        let owner = create_test_user("jane", false, &connection);
        let intruder = create_test_user("john", false, &connection);
        let account =
            create_account(owner.id, &test_account_form("Everyday"), &connection).unwrap();
        create_transaction(account.id, owner.id, &test_transaction(50.0, None), &connection)
            .unwrap();

        let summary = get_account_summary(account.id, intruder.id, &connection).unwrap();

        assert_eq!(summary, AccountSummary::default());
    }
}
