//! Pocketbook is a web app for tracking personal finances across a handful of accounts.
//!
//! This library provides a REST API that directly serves HTML pages, plus a small JSON API
//! for managing sessions. Sessions are carried in cookies as a short-lived access token and
//! a long-lived refresh token.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use tokio::signal;

mod account;
mod admin;
mod alert;
mod app_state;
mod auth;
mod category;
mod dashboard;
mod db;
mod endpoints;
mod html;
mod internal_server_error;
mod logging;
mod navigation;
mod not_found;
mod password;
mod routing;
mod timezone;
mod transaction;
mod user;

#[cfg(test)]
mod test_utils;

pub use account::{
    Account, AccountForm, AccountId, MAX_ACCOUNTS_PER_USER, create_account, get_accounts,
};
pub use app_state::AppState;
pub use auth::{TokenConfig, revoke_user_refresh_sessions};
pub use category::get_categories;
pub use db::initialize as initialize_db;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use password::{PasswordHash, ValidatedPassword};
pub use routing::build_router;
pub use transaction::{Frequency, NewTransaction, create_transaction};
pub use user::{
    User, UserID, Username, count_users, create_user, get_user_by_username,
    update_password,
};

use crate::{
    alert::{Alert, render_alert},
    internal_server_error::InternalServerError,
    not_found::get_404_not_found_response,
};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!("Failed to install terminate signal handler: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The username or password did not match a registered user.
    #[error("invalid username or password")]
    InvalidCredentials,

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The username is empty, too long or contains characters that are not allowed.
    #[error("{0}")]
    InvalidUsername(String),

    /// The username is already taken by another user.
    #[error("the username \"{0}\" is already taken")]
    DuplicateUsername(String),

    /// A JWT could not be created, or a token presented by the client was
    /// malformed, expired, revoked or of the wrong kind.
    #[error("token error: {0}")]
    TokenError(String),

    /// The user already owns the maximum number of accounts.
    #[error("You have reached the maximum limit of {} accounts.", account::MAX_ACCOUNTS_PER_USER)]
    AccountLimitReached,

    /// An empty string was used to name an account.
    #[error("Account name cannot be empty")]
    EmptyAccountName,

    /// The currency ID used for an account did not match a known currency.
    #[error("the currency ID does not refer to a valid currency")]
    InvalidCurrency,

    /// The account type ID used for an account did not match a known account type.
    #[error("the account type ID does not refer to a valid account type")]
    InvalidAccountType,

    /// The category ID used to create a transaction did not match a valid category.
    #[error("the category ID does not refer to a valid category")]
    InvalidCategory,

    /// An amount or balance was not finite or was too large to store.
    #[error("the amount must be a number smaller than 10,000,000,000")]
    InvalidAmount,

    /// The client tried to work with transactions without first selecting an account.
    #[error("no account has been selected")]
    NoAccountSelected,

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// Tried to update an account that does not exist
    #[error("tried to update an account that is not in the database")]
    UpdateMissingAccount,

    /// Tried to delete an account that does not exist
    #[error("tried to delete an account that is not in the database")]
    DeleteMissingAccount,

    /// Tried to delete a transaction that does not exist
    #[error("tried to delete a transaction that is not in the database")]
    DeleteMissingTransaction,

    /// Tried to update a user that does not exist
    #[error("tried to update a user that is not in the database")]
    UpdateMissingUser,

    /// Tried to delete a user that does not exist
    #[error("tried to delete a user that is not in the database")]
    DeleteMissingUser,

    /// A staff user tried to demote or delete their own user.
    #[error("staff users cannot demote or delete themselves")]
    SelfModification,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => get_404_not_found_response(),
            Error::InvalidTimezoneError(timezone) => InternalServerError {
                description: "Invalid Timezone Settings",
                fix: &format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            }
            .into_response(),
            Error::DatabaseLockError => InternalServerError::default().into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                InternalServerError::default().into_response()
            }
        }
    }
}

impl Error {
    /// Render the error as an alert fragment for HTMX requests.
    fn into_alert_response(self) -> Response {
        match self {
            Error::AccountLimitReached => render_alert(
                StatusCode::CONFLICT,
                Alert::error(
                    "Account limit reached",
                    &format!(
                        "You have reached the maximum limit of {} accounts. \
                        Delete an existing account before creating a new one.",
                        account::MAX_ACCOUNTS_PER_USER
                    ),
                ),
            ),
            Error::EmptyAccountName => render_alert(
                StatusCode::BAD_REQUEST,
                Alert::error("Invalid account name", "Account name cannot be empty."),
            ),
            Error::InvalidCurrency => render_alert(
                StatusCode::BAD_REQUEST,
                Alert::error(
                    "Invalid currency",
                    "The selected currency does not exist. Refresh the page and try again.",
                ),
            ),
            Error::InvalidAccountType => render_alert(
                StatusCode::BAD_REQUEST,
                Alert::error(
                    "Invalid account type",
                    "The selected account type does not exist. Refresh the page and try again.",
                ),
            ),
            Error::InvalidCategory => render_alert(
                StatusCode::BAD_REQUEST,
                Alert::error(
                    "Invalid category",
                    "The selected category does not exist. Refresh the page and try again.",
                ),
            ),
            Error::InvalidAmount => render_alert(
                StatusCode::BAD_REQUEST,
                Alert::error(
                    "Invalid amount",
                    "Enter a number smaller than 10,000,000,000, e.g. -12.50.",
                ),
            ),
            Error::NoAccountSelected => render_alert(
                StatusCode::BAD_REQUEST,
                Alert::error(
                    "No account selected",
                    "Select an account on the accounts page before adding transactions.",
                ),
            ),
            Error::UpdateMissingAccount => render_alert(
                StatusCode::NOT_FOUND,
                Alert::error(
                    "Could not update account",
                    "The account could not be found.",
                ),
            ),
            Error::DeleteMissingAccount => render_alert(
                StatusCode::NOT_FOUND,
                Alert::error(
                    "Could not delete account",
                    "The account could not be found. \
                    Try refreshing the page to see if the account has already been deleted.",
                ),
            ),
            Error::DeleteMissingTransaction => render_alert(
                StatusCode::NOT_FOUND,
                Alert::error(
                    "Could not delete transaction",
                    "The transaction could not be found. \
                    Try refreshing the page to see if the transaction has already been deleted.",
                ),
            ),
            Error::UpdateMissingUser => render_alert(
                StatusCode::NOT_FOUND,
                Alert::error("Could not update user", "The user could not be found."),
            ),
            Error::DeleteMissingUser => render_alert(
                StatusCode::NOT_FOUND,
                Alert::error(
                    "Could not delete user",
                    "The user could not be found. \
                    Try refreshing the page to see if the user has already been deleted.",
                ),
            ),
            Error::SelfModification => render_alert(
                StatusCode::FORBIDDEN,
                Alert::error(
                    "Action not allowed",
                    "You cannot remove your own staff access or delete your own user.",
                ),
            ),
            Error::NotFound => render_alert(
                StatusCode::NOT_FOUND,
                Alert::error(
                    "Not found",
                    "The requested item could not be found. Try refreshing the page.",
                ),
            ),
            Error::InvalidTimezoneError(timezone) => render_alert(
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert::error(
                    "Invalid Timezone Settings",
                    &format!(
                        "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                    ),
                ),
            ),
            error => {
                tracing::error!("An unexpected error occurred: {error}");
                render_alert(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Alert::error(
                        "Something went wrong",
                        "An unexpected error occurred, check the server logs for more details.",
                    ),
                )
            }
        }
    }
}
