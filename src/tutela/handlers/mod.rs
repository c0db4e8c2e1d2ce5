pub mod health;
pub use self::health::health;

pub mod user_register;
pub use self::user_register::register;

pub mod user_login;
pub use self::user_login::login;

pub mod users;
pub use self::users::{find_all, find_by_ids, find_one};

pub mod analysis;
pub use self::analysis::receive_analysis;

// common functions for the handlers
use crate::users::error::UserError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use regex::Regex;
use tracing::error;

pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").map_or(false, |re| re.is_match(email))
}

/// Map engine failures to the user-facing responses. Every kind stays
/// distinguishable; storage causes are logged, never sent to the client.
pub(crate) fn error_response(err: &UserError) -> Response {
    match err {
        UserError::NotFound => {
            (StatusCode::BAD_REQUEST, "User not found".to_string()).into_response()
        }
        UserError::Blocked => {
            (StatusCode::BAD_REQUEST, "User blocked".to_string()).into_response()
        }
        UserError::InvalidCredential => {
            (StatusCode::BAD_REQUEST, "Password invalid".to_string()).into_response()
        }
        UserError::DuplicateAccount => {
            (StatusCode::BAD_REQUEST, "Duplicate user".to_string()).into_response()
        }
        UserError::Credential(err) => {
            (StatusCode::BAD_REQUEST, err.to_string()).into_response()
        }
        UserError::Storage(err) => {
            error!("storage failure: {err:?}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
