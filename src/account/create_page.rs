//! The page for creating a new account.

use axum::{
    Extension,
    extract::State,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};

use crate::{
    Error,
    account::{
        AccountState,
        core::{
            AccountType, Currency, MAX_ACCOUNTS_PER_USER, count_accounts, get_account_types,
            get_currencies,
        },
        form::account_form_fields,
    },
    auth::CurrentUser,
    endpoints,
    html::{FORM_CONTAINER_STYLE, base, link},
    navigation::NavBar,
};

fn new_account_view(
    user: &CurrentUser,
    at_limit: bool,
    currencies: &[Currency],
    account_types: &[AccountType],
) -> Markup {
    let nav_bar = NavBar::new(endpoints::ACCOUNTS_VIEW, user.role(), &user.username).into_html();

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="mb-4 text-xl font-bold" { "New Account" }

            @if at_limit {
                p data-account-limit
                {
                    "You have reached the maximum limit of " (MAX_ACCOUNTS_PER_USER) " accounts. "
                    (link(endpoints::ACCOUNTS_VIEW, "Back to your accounts"))
                }
            } @else {
                form
                    hx-post=(endpoints::ACCOUNTS_API)
                    hx-target-error="#alert-container"
                    class="w-full space-y-4 md:space-y-6"
                {
                    (account_form_fields(None, currencies, account_types, "Create Account"))
                }
            }
        }
    };

    base("New Account", &content)
}

/// Display the form for creating an account, or a notice if the user is at the account limit.
pub async fn get_create_account_page(
    State(state): State<AccountState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Response, Error> {
    let (account_count, currencies, account_types) = {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        (
            count_accounts(user.id, &connection)?,
            get_currencies(&connection)?,
            get_account_types(&connection)?,
        )
    };

    let at_limit = account_count >= MAX_ACCOUNTS_PER_USER;

    Ok(new_account_view(&user, at_limit, &currencies, &account_types).into_response())
}
