//! Accounts: the pages for listing, creating and editing them, and the HTMX endpoints behind
//! those pages.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;

use crate::AppState;

mod accounts_page;
mod core;
mod create_endpoint;
mod create_page;
mod delete_endpoint;
mod edit_endpoint;
mod edit_page;
mod form;
mod select_endpoint;

pub use accounts_page::get_accounts_page;
pub use core::{
    Account, AccountForm, AccountId, MAX_ACCOUNTS_PER_USER, OwnedAccount, create_account,
    create_account_table, create_account_type_table, create_currency_table, delete_any_account,
    get_account, get_accounts, get_all_accounts, validate_amount,
};
pub use create_endpoint::create_account_endpoint;
pub use create_page::get_create_account_page;
pub use delete_endpoint::delete_account_endpoint;
pub use edit_endpoint::edit_account_endpoint;
pub use edit_page::get_edit_account_page;
pub use select_endpoint::select_account_endpoint;

#[cfg(test)]
pub(crate) use core::test_account_form;

/// The state needed by the account pages and endpoints.
#[derive(Debug, Clone)]
pub struct AccountState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AccountState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}
