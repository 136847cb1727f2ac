//! Authentication middleware that resolves a bearer token into the calling user.

use std::sync::{Arc, Mutex};

use axum::{
    RequestPartsExt,
    extract::{FromRef, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use rusqlite::Connection;

use crate::{
    AppState, Error, User,
    auth::{TokenKeys, validate_token},
    db::lock_connection,
    user::get_user_by_id,
};

/// The state needed for the auth middleware
#[derive(Debug, Clone)]
pub struct AuthState {
    /// The keys for verifying session tokens.
    pub token_keys: TokenKeys,
    /// The database connection for looking up the token's user.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            token_keys: state.token_keys.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Resolve a session token into the user it was issued to.
///
/// # Errors
/// Returns an [Error::Unauthorized] if the token is invalid or expired, or if
/// its user no longer exists. Other errors are storage failures.
pub fn authenticate(
    token: &str,
    keys: &TokenKeys,
    connection: &Connection,
) -> Result<User, Error> {
    let claims = validate_token(token, keys)?;
    let user_id = claims.user_id()?;

    match get_user_by_id(user_id, connection) {
        Ok(user) => Ok(user),
        Err(Error::NotFound) => {
            tracing::debug!("session token refers to the missing user {user_id}");
            Err(Error::Unauthorized)
        }
        Err(error) => Err(error),
    }
}

/// Middleware function that checks for a valid bearer token.
/// The user is placed into the request and then the request executed normally if the token is valid, otherwise a 401 response is returned.
///
/// **Note**: Route handlers can use the function argument `Extension(user): Extension<User>` to receive the user.
pub async fn auth_guard(
    State(state): State<AuthState>,
    request: Request,
    next: Next,
) -> Response {
    let (mut parts, body) = request.into_parts();

    let bearer = match parts.extract::<TypedHeader<Authorization<Bearer>>>().await {
        Ok(TypedHeader(Authorization(bearer))) => bearer,
        Err(rejection) => {
            tracing::debug!("missing or malformed authorization header: {rejection}");
            return Error::Unauthorized.into_response();
        }
    };

    let user = {
        let connection = match lock_connection(&state.db_connection) {
            Ok(connection) => connection,
            Err(error) => return error.into_response(),
        };

        match authenticate(bearer.token(), &state.token_keys, &connection) {
            Ok(user) => user,
            Err(error) => return error.into_response(),
        }
    };

    parts.extensions.insert(user);
    let request = Request::from_parts(parts, body);

    next.run(request).await
}
