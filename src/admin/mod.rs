//! The staff-only admin panel for managing users and their accounts.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;

use crate::AppState;

mod actions;
mod page;
mod users;

pub use actions::{delete_account_as_staff_endpoint, delete_user_endpoint, toggle_staff_endpoint};
pub use page::get_admin_page;

/// The state needed by the admin panel.
#[derive(Debug, Clone)]
pub struct AdminState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AdminState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}
