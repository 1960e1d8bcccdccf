//! Error taxonomy for Keystone
//!
//! Every failure in the auth core is one of these kinds. Callers branch on
//! the kind, never on message text. In particular `ExpiredToken` is the only
//! kind that makes the request gate attempt a silent renewal; `InvalidToken`
//! never does.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Signature or structure failure on a token. Never triggers renewal.
    #[error("Invalid token")]
    InvalidToken,

    /// Timestamp failure on an otherwise well-formed, well-signed token.
    #[error("Token has expired")]
    ExpiredToken,

    /// Missing credentials, missing identity, or a failed login check.
    #[error("Unauthorized")]
    Unauthorized,

    /// Authenticated but not permitted (inactive account, wrong role, wrong owner).
    #[error("Forbidden")]
    Forbidden,

    /// Malformed or policy-rejected input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Registration with a birth date below the minimum age.
    #[error("User under age")]
    UserUnderAge,

    /// Username or email already taken (store-reported unique violation).
    #[error("User already exists")]
    UserExists,

    /// Store lookup found no matching record.
    #[error("Resource not found")]
    NotFound,

    /// Store-level failure that is not a not-found or conflict signal.
    #[error("Database error: {0}")]
    Database(String),

    /// Unexpected internal failure.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AuthError::NotFound,
            sqlx::Error::Database(db_err) => {
                // PostgreSQL unique violation
                if db_err.code().as_deref() == Some("23505") {
                    return AuthError::UserExists;
                }
                AuthError::Database(db_err.to_string())
            }
            _ => AuthError::Database(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err: AuthError = sqlx::Error::RowNotFound.into();
        assert_eq!(err, AuthError::NotFound);
    }

    #[test]
    fn test_kinds_are_distinguishable() {
        // The expired/invalid distinction is load-bearing for silent renewal.
        assert_ne!(AuthError::ExpiredToken, AuthError::InvalidToken);
        assert_ne!(AuthError::Unauthorized, AuthError::Forbidden);
    }
}
