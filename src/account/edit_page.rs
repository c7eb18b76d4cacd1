use axum::{
    Extension,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};

use crate::{
    Error,
    account::{
        AccountState,
        core::{
            Account, AccountId, AccountType, Currency, get_account, get_account_types,
            get_currencies,
        },
        form::account_form_fields,
    },
    auth::CurrentUser,
    endpoints::{self, format_endpoint},
    html::{FORM_CONTAINER_STYLE, base},
    navigation::NavBar,
};

fn edit_account_view(
    user: &CurrentUser,
    account: &Account,
    currencies: &[Currency],
    account_types: &[AccountType],
) -> Markup {
    let nav_bar = NavBar::new(endpoints::ACCOUNTS_VIEW, user.role(), &user.username).into_html();
    let update_url = format_endpoint(endpoints::ACCOUNT, account.id);

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="mb-4 text-xl font-bold" { "Edit Account" }

            form
                hx-put=(update_url)
                hx-target-error="#alert-container"
                class="w-full space-y-4 md:space-y-6"
            {
                (account_form_fields(Some(account), currencies, account_types, "Save Changes"))
            }
        }
    };

    base("Edit Account", &content)
}

/// Display the form for editing one of the current user's accounts.
///
/// Another user's account is reported as not found.
pub async fn get_edit_account_page(
    State(state): State<AccountState>,
    Extension(user): Extension<CurrentUser>,
    Path(account_id): Path<AccountId>,
) -> Result<Response, Error> {
    let (account, currencies, account_types) = {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        (
            get_account(account_id, user.id, &connection)?,
            get_currencies(&connection)?,
            get_account_types(&connection)?,
        )
    };

    Ok(edit_account_view(&user, &account, &currencies, &account_types).into_response())
}
