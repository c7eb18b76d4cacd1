//! Transactions: money moving in or out of an account, optionally repeating.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;

use crate::AppState;

mod core;
mod create_endpoint;
mod delete_endpoint;
mod view;

pub use core::{
    Frequency, NewTransaction, Transaction, create_transaction, create_transaction_table,
    get_transactions,
};
pub use create_endpoint::create_transaction_endpoint;
pub use delete_endpoint::delete_transaction_endpoint;
pub use view::{new_transaction_form, transactions_table};

#[cfg(test)]
pub(crate) use core::test_transaction;

/// The state needed for creating and deleting transactions.
#[derive(Debug, Clone)]
pub struct TransactionState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}
