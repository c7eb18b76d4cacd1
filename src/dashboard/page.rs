//! The dashboard for the selected account.

use axum::{
    Extension,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use maud::{Markup, html};
use time::Date;

use crate::{
    Error,
    account::{Account, get_account},
    auth::{CurrentUser, clear_selected_account_cookie, get_selected_account_id},
    category::{Category, get_categories},
    dashboard::{
        DashboardState,
        summary::{AccountSummary, get_account_summary},
    },
    endpoints,
    html::{
        BADGE_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE,
        TABLE_ROW_STYLE, base, format_currency,
    },
    navigation::NavBar,
    timezone::local_today,
    transaction::{Transaction, get_transactions, new_transaction_form, transactions_table},
};

const CARD_STYLE: &str = "p-6 bg-white border border-gray-200 rounded-lg shadow \
    dark:bg-gray-800 dark:border-gray-700";

fn summary_card(title: &str, amount: f64, symbol: &str, kind: &str) -> Markup {
    html! {
        div class=(CARD_STYLE) data-summary=(kind)
        {
            h3 class="text-sm font-medium text-gray-500 dark:text-gray-400" { (title) }
            p class="mt-2 text-2xl font-bold" { (format_currency(amount, symbol)) }
        }
    }
}

fn category_table(summary: &AccountSummary, symbol: &str) -> Markup {
    html! {
        @if summary.by_category.is_empty() {
            p class="text-gray-500 dark:text-gray-400"
            {
                "Add a transaction to see where your money goes."
            }
        } @else {
            table class="w-full text-sm text-left text-gray-500 dark:text-gray-400" data-category-table
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Transactions" }
                        th scope="col" class={ (TABLE_CELL_STYLE) " text-right" } { "Total" }
                    }
                }

                tbody
                {
                    @for category in &summary.by_category {
                        tr class=(TABLE_ROW_STYLE)
                        {
                            td class=(TABLE_CELL_STYLE) { (category.name) }
                            td class=(TABLE_CELL_STYLE) { (category.transaction_count) }
                            td class={ (TABLE_CELL_STYLE) " text-right" }
                            {
                                (format_currency(category.total, symbol))
                            }
                        }
                    }
                }
            }
        }
    }
}

struct DashboardData {
    account: Account,
    summary: AccountSummary,
    transactions: Vec<Transaction>,
    categories: Vec<Category>,
    today: Date,
}

fn dashboard_view(user: &CurrentUser, data: &DashboardData) -> Markup {
    let nav_bar = NavBar::new(endpoints::DASHBOARD_VIEW, user.role(), &user.username).into_html();
    let account = &data.account;
    let symbol = account.currency.symbol.as_str();

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-5xl space-y-8"
            {
                header class="flex flex-wrap items-center justify-between gap-4"
                {
                    div
                    {
                        h1 class="text-2xl font-bold" { (account.name) }
                        span class=(BADGE_STYLE) { (account.account_type.name) }
                        span class="ms-2 text-sm text-gray-500 dark:text-gray-400"
                        {
                            (account.currency.code)
                        }
                    }

                    div class="text-right"
                    {
                        p class="text-sm text-gray-500 dark:text-gray-400" { "Balance" }
                        p class="text-3xl font-bold" data-balance
                        {
                            (format_currency(account.balance, symbol))
                        }
                        a href=(endpoints::ACCOUNTS_VIEW) class=(LINK_STYLE) { "Switch account" }
                    }
                }

                section class="grid grid-cols-1 md:grid-cols-3 gap-4"
                {
                    (summary_card("Income", data.summary.income, symbol, "income"))
                    (summary_card("Expenses", data.summary.expenses, symbol, "expenses"))
                    (summary_card("Net", data.summary.net(), symbol, "net"))
                }

                section class=(CARD_STYLE)
                {
                    h2 class="mb-4 text-xl font-semibold" { "Spending by Category" }
                    (category_table(&data.summary, symbol))
                }

                section class=(CARD_STYLE)
                {
                    h2 class="mb-4 text-xl font-semibold" { "New Transaction" }
                    (new_transaction_form(&data.categories, data.today))
                }

                section
                {
                    h2 class="mb-4 text-xl font-semibold" { "Transactions" }
                    (transactions_table(&data.transactions, symbol))
                }
            }
        }
    };

    base("Dashboard", &content)
}

/// Display the selected account with its summary and transactions.
///
/// Without a selected account, or when the selection is not one of the user's accounts, the
/// client is sent to the account selection page.
pub async fn get_dashboard_page(
    State(state): State<DashboardState>,
    Extension(user): Extension<CurrentUser>,
    jar: CookieJar,
) -> Result<Response, Error> {
    let Some(account_id) = get_selected_account_id(&jar) else {
        return Ok(Redirect::to(endpoints::ACCOUNTS_VIEW).into_response());
    };

    let today = local_today(&state.local_timezone)?;

    let data = {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        let account = match get_account(account_id, user.id, &connection) {
            Ok(account) => account,
            Err(Error::NotFound) => {
                tracing::debug!(
                    "User {} selected account {account_id} which they do not own",
                    user.id
                );

                return Ok((
                    clear_selected_account_cookie(jar),
                    Redirect::to(endpoints::ACCOUNTS_VIEW),
                )
                    .into_response());
            }
            Err(error) => return Err(error),
        };

        DashboardData {
            summary: get_account_summary(account.id, user.id, &connection)?,
            transactions: get_transactions(account.id, user.id, &connection)?,
            categories: get_categories(&connection)?,
            account,
            today,
        }
    };

    Ok(dashboard_view(&user, &data).into_response())
}
