//! The account selection page, where regular users land after logging in.

use axum::{
    Extension,
    extract::State,
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use maud::{Markup, html};

use crate::{
    Error,
    account::{
        AccountState,
        core::{Account, MAX_ACCOUNTS_PER_USER, get_accounts},
    },
    auth::{CurrentUser, get_selected_account_id},
    endpoints::{self, format_endpoint},
    html::{
        BADGE_STYLE, BUTTON_DELETE_STYLE, BUTTON_PRIMARY_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE,
        base, format_currency,
    },
    navigation::NavBar,
};

const CARD_STYLE: &str = "flex flex-col gap-3 p-6 bg-white border border-gray-200 rounded-lg \
    shadow dark:bg-gray-800 dark:border-gray-700";

fn account_card(account: &Account, is_selected: bool) -> Markup {
    let select_url = format_endpoint(endpoints::SELECT_ACCOUNT, account.id);
    let edit_url = format_endpoint(endpoints::EDIT_ACCOUNT_VIEW, account.id);
    let delete_url = format_endpoint(endpoints::ACCOUNT, account.id);

    html! {
        li class=(CARD_STYLE) data-account-id=(account.id)
        {
            div class="flex items-center justify-between gap-4"
            {
                h2 class="text-xl font-semibold" { (account.name) }
                span class=(BADGE_STYLE) { (account.account_type.name) }
            }

            p class="text-2xl font-bold" data-balance
            {
                (format_currency(account.balance, &account.currency.symbol))
            }

            p class="text-sm text-gray-500 dark:text-gray-400" { (account.currency.code) }

            @if is_selected {
                p class="text-sm text-green-600 dark:text-green-400" { "Currently selected" }
            }

            div class="flex items-center gap-4"
            {
                button
                    hx-post=(select_url)
                    hx-target-error="#alert-container"
                    class="px-4 py-2 bg-blue-500 hover:bg-blue-600 text-white rounded"
                {
                    "Select"
                }

                a href=(edit_url) class=(LINK_STYLE) { "Edit" }

                button
                    hx-delete=(delete_url)
                    hx-confirm={
                        "Are you sure you want to delete '" (account.name)
                        "'? Its transactions will be deleted too."
                    }
                    hx-target-error="#alert-container"
                    class=(BUTTON_DELETE_STYLE)
                {
                    "Delete"
                }
            }
        }
    }
}

fn accounts_view(user: &CurrentUser, accounts: &[Account], selected: Option<i64>) -> Markup {
    let nav_bar = NavBar::new(endpoints::ACCOUNTS_VIEW, user.role(), &user.username).into_html();

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-4xl space-y-6"
            {
                h1 class="text-2xl font-bold" { "Your Accounts" }

                @if accounts.is_empty() {
                    p { "You don't have any accounts yet. Create one to start tracking your money." }
                } @else {
                    ul class="grid grid-cols-1 md:grid-cols-2 gap-6"
                    {
                        @for account in accounts {
                            (account_card(account, selected == Some(account.id)))
                        }
                    }
                }

                @if accounts.len() < MAX_ACCOUNTS_PER_USER {
                    a
                        href=(endpoints::NEW_ACCOUNT_VIEW)
                        class={ "block text-center " (BUTTON_PRIMARY_STYLE) }
                        data-add-account
                    {
                        "Add Account"
                    }
                } @else {
                    p
                        class="p-4 text-sm rounded-lg text-yellow-800 bg-yellow-50 \
                            dark:bg-gray-800 dark:text-yellow-300"
                        data-account-limit
                    {
                        "You have reached the maximum limit of " (MAX_ACCOUNTS_PER_USER) " accounts."
                    }
                }
            }
        }
    };

    base("Accounts", &content)
}

/// Display the accounts owned by the current user.
pub async fn get_accounts_page(
    State(state): State<AccountState>,
    Extension(user): Extension<CurrentUser>,
    jar: CookieJar,
) -> Result<Response, Error> {
    let accounts = {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        get_accounts(user.id, &connection)?
    };

    let selected = get_selected_account_id(&jar);

    Ok(accounts_view(&user, &accounts, selected).into_response())
}
