//! Registration, log in, session tokens and the access gate for protected routes.

mod log_in;
mod middleware;
mod register_user;
mod token;

pub use log_in::{AccessToken, LogInData, LogInState, post_log_in};
pub use middleware::{AuthState, auth_guard, authenticate};
pub use register_user::{RegisterData, RegistrationState, register_user};
pub use token::{Claims, DEFAULT_TOKEN_DURATION, TokenKeys, issue_token, validate_token};
