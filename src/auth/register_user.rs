//! The registration endpoint for creating a new user account.

use std::sync::{Arc, Mutex};

use argon2::Params;
use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error, PasswordHash, User, ValidatedPassword,
    db::lock_connection,
    user::{Username, create_user, parse_email},
};

/// The state needed for registering a user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The Argon2id costs for hashing the new user's password.
    pub password_params: Params,
    /// The database connection for storing the new user.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            password_params: state.password_params.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The data needed to register a new user.
#[derive(Clone, Serialize, Deserialize)]
pub struct RegisterData {
    /// The unique name the user will log in with.
    pub username: String,
    /// The user's email address.
    pub email: String,
    /// The user's password in plain text.
    pub password: String,
}

/// A route handler for registering a new user.
///
/// Responds with the created user, without the password hash.
///
/// # Errors
///
/// Returns a validation error for a blank username, an invalid email address
/// or an empty password, and a conflict if the username or email is taken.
pub async fn register_user(
    State(state): State<RegistrationState>,
    Json(user_data): Json<RegisterData>,
) -> Result<(StatusCode, Json<User>), Error> {
    let username = Username::new(&user_data.username)?;
    let email = parse_email(&user_data.email)?;
    let password = ValidatedPassword::new(&user_data.password)?;
    let password_hash = PasswordHash::new(password, state.password_params.clone())?;

    let connection = lock_connection(&state.db_connection)?;
    let user = create_user(username, email, password_hash, &connection)?;

    tracing::info!("Registered user {} with ID {}", user.username, user.id);

    Ok((StatusCode::CREATED, Json(user)))
}
