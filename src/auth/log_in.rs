//! The log in endpoint that exchanges a username and password for a session token.

use std::sync::{Arc, Mutex};

use axum::{
    Form, Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{
    AppState, Error,
    auth::{TokenKeys, issue_token},
    db::lock_connection,
    user::get_user_by_username,
};

/// The state needed for logging in a user.
#[derive(Debug, Clone)]
pub struct LogInState {
    /// The keys for signing session tokens.
    pub token_keys: TokenKeys,
    /// How long issued tokens are valid for.
    pub token_duration: Duration,
    /// The database connection for looking up users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LogInState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            token_keys: state.token_keys.clone(),
            token_duration: state.token_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The credentials entered during log in.
#[derive(Clone, Serialize, Deserialize)]
pub struct LogInData {
    /// The username entered during log in.
    pub username: String,
    /// Password entered during log in.
    pub password: String,
}

/// The response body of a successful log in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessToken {
    /// The signed session token.
    pub access_token: String,
    /// How the token should be presented, always "bearer".
    pub token_type: String,
}

impl AccessToken {
    fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_owned(),
        }
    }
}

/// Handler for log in requests via the POST method.
///
/// # Errors
///
/// This function will return an error in a few situations.
/// - The username does not belong to a registered user.
/// - The password is not correct.
/// - An internal error occurred when verifying the password or signing the token.
pub async fn post_log_in(
    State(state): State<LogInState>,
    Form(user_data): Form<LogInData>,
) -> Result<Json<AccessToken>, Error> {
    let user = {
        let connection = lock_connection(&state.db_connection)?;

        match get_user_by_username(&user_data.username, &connection) {
            Ok(user) => user,
            Err(Error::NotFound) => return Err(Error::InvalidCredentials),
            Err(error) => return Err(error),
        }
    };

    let is_password_correct = user.password_hash.verify(&user_data.password).map_err(|error| {
        tracing::error!("Error verifying password for user {}: {error}", user.id);
        Error::HashingError(error.to_string())
    })?;

    if !is_password_correct {
        return Err(Error::InvalidCredentials);
    }

    let token = issue_token(
        user.id,
        OffsetDateTime::now_utc(),
        state.token_duration,
        &state.token_keys,
    )?;

    tracing::debug!("issued session token for user {}", user.id);

    Ok(Json(AccessToken::bearer(token)))
}

#[cfg(test)]
mod log_in_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Router, http::StatusCode, routing::post};
    use axum_test::TestServer;
    use rusqlite::Connection;
    use time::Duration;

    use crate::{
        PasswordHash,
        auth::{AccessToken, LogInState, TokenKeys, post_log_in, validate_token},
        db::initialize,
        user::{Username, create_user, parse_email},
    };

    fn get_test_server() -> (TestServer, LogInState) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        create_user(
            Username::new_unchecked("alice"),
            parse_email("a@x.com").unwrap(),
            PasswordHash::from_raw_password("pw123").unwrap(),
            &connection,
        )
        .unwrap();

        let state = LogInState {
            token_keys: TokenKeys::from_secret("foobar"),
            token_duration: Duration::days(7),
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let app = Router::new()
            .route("/token", post(post_log_in))
            .with_state(state.clone());

        (
            TestServer::new(app).expect("Could not create test server."),
            state,
        )
    }

    #[tokio::test]
    async fn log_in_succeeds_with_valid_credentials() {
        let (server, state) = get_test_server();

        let response = server
            .post("/token")
            .form(&[("username", "alice"), ("password", "pw123")])
            .await;

        response.assert_status_ok();
        let token = response.json::<AccessToken>();
        assert_eq!(token.token_type, "bearer");
        assert!(validate_token(&token.access_token, &state.token_keys).is_ok());
    }

    #[tokio::test]
    async fn log_in_fails_with_wrong_password() {
        let (server, _) = get_test_server();

        server
            .post("/token")
            .form(&[("username", "alice"), ("password", "pw124")])
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn log_in_fails_with_unknown_user() {
        let (server, _) = get_test_server();

        server
            .post("/token")
            .form(&[("username", "bob"), ("password", "pw123")])
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn log_in_fails_with_missing_credentials() {
        let (server, _) = get_test_server();

        let response = server.post("/token").await;

        assert!(response.status_code().is_client_error());
    }
}
