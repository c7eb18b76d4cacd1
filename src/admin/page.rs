//! The admin panel, the landing page for staff.

use axum::{
    Extension,
    extract::State,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};

use crate::{
    Error,
    account::{OwnedAccount, get_all_accounts},
    admin::{
        AdminState,
        users::{UserOverview, get_user_overviews},
    },
    auth::CurrentUser,
    endpoints::{self, format_endpoint},
    html::{
        BADGE_STYLE, BUTTON_DELETE_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, format_currency,
    },
    navigation::NavBar,
};

fn user_row(user: &UserOverview, current_user: &CurrentUser) -> Markup {
    let is_self = user.id == current_user.id;
    let staff_url = format_endpoint(endpoints::ADMIN_USER_STAFF, user.id.as_i64());
    let delete_url = format_endpoint(endpoints::ADMIN_USER, user.id.as_i64());
    let staff_action = if user.is_staff {
        "Remove staff"
    } else {
        "Make staff"
    };

    html! {
        tr class=(TABLE_ROW_STYLE) data-user-id=(user.id)
        {
            td class=(TABLE_CELL_STYLE) { (user.username) }
            td class=(TABLE_CELL_STYLE)
            {
                @if user.is_staff {
                    span class=(BADGE_STYLE) { "Staff" }
                } @else {
                    "Member"
                }
            }
            td class=(TABLE_CELL_STYLE) { (user.account_count) }
            td class=(TABLE_CELL_STYLE) { (user.date_joined) }
            td class=(TABLE_CELL_STYLE)
            {
                // Staff cannot demote or delete themselves, so their own row has no actions.
                @if !is_self {
                    div class="flex gap-4"
                    {
                        button
                            hx-put=(staff_url)
                            hx-target-error="#alert-container"
                            class=(LINK_STYLE)
                        {
                            (staff_action)
                        }

                        button
                            hx-delete=(delete_url)
                            hx-confirm={
                                "Are you sure you want to delete '" (user.username)
                                "'? Their accounts and transactions will be deleted too."
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
    }
}

fn account_row(owned: &OwnedAccount) -> Markup {
    let account = &owned.account;
    let delete_url = format_endpoint(endpoints::ADMIN_ACCOUNT, account.id);

    html! {
        tr class=(TABLE_ROW_STYLE) data-account-id=(account.id)
        {
            td class=(TABLE_CELL_STYLE) { (owned.owner) }
            td class=(TABLE_CELL_STYLE) { (account.name) }
            td class=(TABLE_CELL_STYLE) { (account.account_type.name) }
            td class={ (TABLE_CELL_STYLE) " text-right" }
            {
                (format_currency(account.balance, &account.currency.symbol))
            }
            td class=(TABLE_CELL_STYLE) { (account.currency.code) }
            td class=(TABLE_CELL_STYLE)
            {
                button
                    hx-delete=(delete_url)
                    hx-confirm={
                        "Are you sure you want to delete " (owned.owner) "'s account '"
                        (account.name) "'?"
                    }
                    hx-target="closest tr"
                    hx-target-error="#alert-container"
                    hx-swap="delete"
                    class=(BUTTON_DELETE_STYLE)
                {
                    "Delete"
                }
            }
        }
    }
}

fn table(headers: &[&str], rows: Markup) -> Markup {
    html! {
        div class="relative overflow-x-auto shadow-md sm:rounded-lg"
        {
            table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        @for header in headers {
                            th scope="col" class=(TABLE_CELL_STYLE) { (header) }
                        }
                    }
                }

                tbody { (rows) }
            }
        }
    }
}

fn admin_view(
    current_user: &CurrentUser,
    users: &[UserOverview],
    accounts: &[OwnedAccount],
) -> Markup {
    let nav_bar = NavBar::new(
        endpoints::ADMIN_VIEW,
        current_user.role(),
        &current_user.username,
    )
    .into_html();

    let user_rows = html! {
        @for user in users {
            (user_row(user, current_user))
        }
    };

    let account_rows = html! {
        @for account in accounts {
            (account_row(account))
        }
    };

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-6xl space-y-8"
            {
                h1 class="text-2xl font-bold" { "Admin" }

                section id="users" class="space-y-4"
                {
                    h2 class="text-xl font-semibold" { "Users (" (users.len()) ")" }
                    (table(&["Username", "Role", "Accounts", "Joined", ""], user_rows))
                }

                section id="accounts" class="space-y-4"
                {
                    h2 class="text-xl font-semibold" { "Accounts (" (accounts.len()) ")" }

                    @if accounts.is_empty() {
                        p class="text-gray-500 dark:text-gray-400" { "No accounts have been created yet." }
                    } @else {
                        (table(&["Owner", "Name", "Type", "Balance", "Currency", ""], account_rows))
                    }
                }
            }
        }
    };

    base("Admin", &content)
}

/// Display every user and every account.
pub async fn get_admin_page(
    State(state): State<AdminState>,
    Extension(current_user): Extension<CurrentUser>,
) -> Result<Response, Error> {
    let (users, accounts) = {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        (get_user_overviews(&connection)?, get_all_accounts(&connection)?)
    };

    Ok(admin_view(&current_user, &users, &accounts).into_response())
}

#[cfg(test)]
mod admin_page_tests {
    use axum::{
        Extension,
        extract::{FromRef, State},
        http::StatusCode,
    };
    use scraper::Selector;

    use crate::{
        account::{create_account, test_account_form},
        admin::AdminState,
        endpoints::{self, format_endpoint},
        test_utils::{
            as_current_user, assert_valid_html, create_test_user, get_test_app_state,
            parse_html_document,
        },
    };

    use super::get_admin_page;

    #[tokio::test]
    async fn lists_users_and_accounts() {
        let state = get_test_app_state();
        let (admin, jane) = {
            let connection = state.db_connection.lock().unwrap();
            let admin = create_test_user("admin", true, &connection);
            let jane = create_test_user("jane", false, &connection);
            create_account(jane.id, &test_account_form("Everyday"), &connection).unwrap();
            (admin, jane)
        };

        let response = get_admin_page(
            State(AdminState::from_ref(&state)),
            Extension(as_current_user(&admin)),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);

        let user_rows = html
            .select(&Selector::parse("#users tbody tr").unwrap())
            .count();
        assert_eq!(user_rows, 2);
        let account_rows = html
            .select(&Selector::parse("#accounts tbody tr").unwrap())
            .count();
        assert_eq!(account_rows, 1);

        let owner: String = html
            .select(&Selector::parse("#accounts tbody tr td").unwrap())
            .next()
            .unwrap()
            .text()
            .collect();
        assert_eq!(owner, "jane");

        let toggle = format!(
            "button[hx-put=\"{}\"]",
            format_endpoint(endpoints::ADMIN_USER_STAFF, jane.id.as_i64())
        );
        assert_eq!(html.select(&Selector::parse(&toggle).unwrap()).count(), 1);
    }

    #[tokio::test]
    async fn own_row_has_no_actions() {
        let state = get_test_app_state();
        let admin = create_test_user("admin", true, &state.db_connection.lock().unwrap());

        let response = get_admin_page(
            State(AdminState::from_ref(&state)),
            Extension(as_current_user(&admin)),
        )
        .await
        .unwrap();

        let html = parse_html_document(response).await;
        let own_row = format!("tr[data-user-id=\"{}\"] button", admin.id);
        assert_eq!(html.select(&Selector::parse(&own_row).unwrap()).count(), 0);
    }
}
