//! Issues and validates the signed, time-limited session tokens handed out at log in.
//!
//! Tokens are HS256 JSON Web Tokens carrying the user ID as the subject.

use std::fmt::Debug;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{Error, UserID};

/// How long a session token is valid for by default.
pub const DEFAULT_TOKEN_DURATION: Duration = Duration::days(7);

/// The contents of a session token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// The ID of the user the token was issued to.
    pub sub: String,
    /// The time the token was issued, as a Unix timestamp.
    pub iat: i64,
    /// The expiry time of the token, as a Unix timestamp.
    pub exp: i64,
}

impl Claims {
    /// The ID of the user the token was issued to.
    ///
    /// # Errors
    /// Returns an [Error::Unauthorized] if the subject is not a user ID.
    pub fn user_id(&self) -> Result<UserID, Error> {
        self.sub.parse().map(UserID::new).map_err(|error| {
            tracing::debug!("token subject {:?} is not a user ID: {error}", self.sub);
            Error::Unauthorized
        })
    }
}

/// The keys for signing and verifying tokens, derived from the process-wide secret.
#[derive(Clone)]
pub struct TokenKeys {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenKeys {
    /// Derive the signing and verifying keys from `secret`.
    pub fn from_secret(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

impl Debug for TokenKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("TokenKeys { .. }")
    }
}

/// Issue a token for `user_id` that expires `duration` after `issued_at`.
///
/// # Errors
/// Returns an [Error::TokenCreation] if the expiry is out of range or the
/// token could not be signed.
pub fn issue_token(
    user_id: UserID,
    issued_at: OffsetDateTime,
    duration: Duration,
    keys: &TokenKeys,
) -> Result<String, Error> {
    let expires_at = issued_at.checked_add(duration).ok_or_else(|| {
        Error::TokenCreation(format!("token expiry {duration} after {issued_at} is out of range"))
    })?;

    let claims = Claims {
        sub: user_id.to_string(),
        iat: issued_at.unix_timestamp(),
        exp: expires_at.unix_timestamp(),
    };

    encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding_key)
        .map_err(|error| Error::TokenCreation(error.to_string()))
}

/// Check the signature and expiry of `token` and return its claims.
///
/// # Errors
/// Returns an [Error::Unauthorized] for any invalid token. The reason is only
/// logged at the debug level.
pub fn validate_token(token: &str, keys: &TokenKeys) -> Result<Claims, Error> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    decode::<Claims>(token, &keys.decoding_key, &validation)
        .map(|token_data| token_data.claims)
        .map_err(|error| {
            tracing::debug!("rejected session token: {error}");
            Error::Unauthorized
        })
}

#[cfg(test)]
mod token_tests {
    use time::{Duration, OffsetDateTime};

    use crate::{
        Error, UserID,
        auth::token::{DEFAULT_TOKEN_DURATION, TokenKeys, issue_token, validate_token},
    };

    fn get_keys() -> TokenKeys {
        TokenKeys::from_secret("nafstenoas")
    }

    #[test]
    fn validate_gives_correct_user_id() {
        let keys = get_keys();
        let user_id = UserID::new(123);
        let token = issue_token(
            user_id,
            OffsetDateTime::now_utc(),
            DEFAULT_TOKEN_DURATION,
            &keys,
        )
        .unwrap();

        let claims = validate_token(&token, &keys).unwrap();

        assert_eq!(claims.user_id(), Ok(user_id));
    }

    #[test]
    fn claims_contain_expiry() {
        let keys = get_keys();
        let issued_at = OffsetDateTime::now_utc();
        let token = issue_token(UserID::new(1), issued_at, Duration::days(7), &keys).unwrap();

        let claims = validate_token(&token, &keys).unwrap();

        assert_eq!(claims.iat, issued_at.unix_timestamp());
        assert_eq!(claims.exp - claims.iat, Duration::days(7).whole_seconds());
    }

    #[test]
    fn issue_fails_when_expiry_is_out_of_range() {
        let result = issue_token(
            UserID::new(1),
            OffsetDateTime::now_utc(),
            Duration::days(100_000_000),
            &get_keys(),
        );

        assert!(matches!(result, Err(Error::TokenCreation(_))));
    }

    #[test]
    fn validate_fails_after_expiry() {
        let keys = get_keys();
        let duration = Duration::days(7);
        let issued_at = OffsetDateTime::now_utc() - duration - Duration::seconds(2);
        let token = issue_token(UserID::new(1), issued_at, duration, &keys).unwrap();

        assert_eq!(validate_token(&token, &keys), Err(Error::Unauthorized));
    }

    #[test]
    fn validate_fails_with_wrong_secret() {
        let token = issue_token(
            UserID::new(1),
            OffsetDateTime::now_utc(),
            DEFAULT_TOKEN_DURATION,
            &get_keys(),
        )
        .unwrap();

        let result = validate_token(&token, &TokenKeys::from_secret("a different secret"));

        assert_eq!(result, Err(Error::Unauthorized));
    }

    #[test]
    fn validate_fails_on_garbage() {
        assert_eq!(
            validate_token("not.a.token", &get_keys()),
            Err(Error::Unauthorized)
        );
        assert_eq!(validate_token("", &get_keys()), Err(Error::Unauthorized));
    }

    #[test]
    fn validate_fails_on_tampered_payload() {
        let keys = get_keys();
        let token = issue_token(
            UserID::new(1),
            OffsetDateTime::now_utc(),
            DEFAULT_TOKEN_DURATION,
            &keys,
        )
        .unwrap();
        let other_token = issue_token(
            UserID::new(2),
            OffsetDateTime::now_utc(),
            DEFAULT_TOKEN_DURATION,
            &keys,
        )
        .unwrap();

        // Graft the second token's payload onto the first token's signature.
        let parts: Vec<&str> = token.split('.').collect();
        let other_parts: Vec<&str> = other_token.split('.').collect();
        let forged = format!("{}.{}.{}", parts[0], other_parts[1], parts[2]);

        assert_eq!(validate_token(&forged, &keys), Err(Error::Unauthorized));
    }
}
