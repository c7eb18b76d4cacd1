//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::{
    Error,
    auth::{JwtKeys, TokenConfig},
    db::initialize,
    timezone::get_local_offset,
};

/// The state of the REST server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The keys used to sign and verify session tokens.
    pub jwt_keys: JwtKeys,

    /// How long access and refresh tokens stay valid.
    pub token_config: TokenConfig,

    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,

    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for the domain models
    /// and the reference data (currencies, account types and categories).
    /// `local_timezone` should be a valid, canonical timezone name, e.g. "Pacific/Auckland".
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized or the timezone is not valid.
    pub fn new(
        db_connection: Connection,
        jwt_secret: &str,
        local_timezone: &str,
    ) -> Result<Self, Error> {
        if get_local_offset(local_timezone).is_none() {
            return Err(Error::InvalidTimezoneError(local_timezone.to_owned()));
        }

        initialize(&db_connection)?;

        Ok(Self {
            jwt_keys: JwtKeys::new(jwt_secret),
            token_config: TokenConfig::default(),
            local_timezone: local_timezone.to_owned(),
            db_connection: Arc::new(Mutex::new(db_connection)),
        })
    }

    /// Replace the default token lifetimes.
    pub fn with_token_config(mut self, token_config: TokenConfig) -> Self {
        self.token_config = token_config;
        self
    }
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::Duration;

    use crate::{Error, auth::TokenConfig};

    use super::AppState;

    #[test]
    fn rejects_invalid_timezone() {
        let connection = Connection::open_in_memory().unwrap();

        let result = AppState::new(connection, "secret", "Not/AZone");

        assert_eq!(
            result.err(),
            Some(Error::InvalidTimezoneError("Not/AZone".to_owned()))
        );
    }

    #[test]
    fn overrides_token_config() {
        let connection = Connection::open_in_memory().unwrap();
        let config = TokenConfig {
            access_token_duration: Duration::minutes(1),
            refresh_token_duration: Duration::days(1),
        };

        let state = AppState::new(connection, "secret", "Etc/UTC")
            .unwrap()
            .with_token_config(config);

        assert_eq!(state.token_config, config);
    }
}
