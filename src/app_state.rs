//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex};

use argon2::Params;
use rusqlite::Connection;
use time::Duration;

use crate::{
    Error, PasswordHash,
    auth::{DEFAULT_TOKEN_DURATION, TokenKeys},
    db::initialize,
};

/// The state of the REST server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The keys used for signing and verifying session tokens.
    pub token_keys: TokenKeys,

    /// The duration for which newly issued session tokens are valid.
    pub token_duration: Duration,

    /// The Argon2id costs used when hashing new passwords.
    pub password_params: Params,

    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for the domain models.
    /// `token_secret` is the process-wide secret used to sign session tokens.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(db_connection: Connection, token_secret: &str) -> Result<Self, Error> {
        initialize(&db_connection)?;

        Ok(Self {
            token_keys: TokenKeys::from_secret(token_secret),
            token_duration: DEFAULT_TOKEN_DURATION,
            password_params: PasswordHash::DEFAULT_PARAMS,
            db_connection: Arc::new(Mutex::new(db_connection)),
        })
    }

    /// Set how long newly issued session tokens stay valid.
    pub fn with_token_duration(mut self, token_duration: Duration) -> Self {
        self.token_duration = token_duration;
        self
    }

    /// Set the Argon2id costs for hashing new passwords.
    pub fn with_password_params(mut self, password_params: Params) -> Self {
        self.password_params = password_params;
        self
    }
}
