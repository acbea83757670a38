//! Domain-level error taxonomy for session and authentication flows.
//!
//! These errors are presentation agnostic. Calling pages turn them into
//! notifications; the session store itself never pushes one.

use thiserror::Error;

/// Errors surfaced by the session store to its callers.
///
/// Every variant is recoverable at the UI level: show a message and let the
/// visitor retry. None should take down the render tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The email/password pair was structurally invalid or rejected by the
    /// identity service.
    #[error("invalid email or password")]
    InvalidCredentials,
    /// Signup attempted with an email that already has an account.
    #[error("an account already exists for {email}")]
    AccountExists {
        /// The conflicting email address.
        email: String,
    },
    /// The identity service could not be reached.
    #[error("identity service unreachable: {message}")]
    NetworkFailure {
        /// Adapter-supplied failure description.
        message: String,
    },
    /// The operation requires an authenticated session.
    #[error("no authenticated session")]
    NotAuthenticated,
    /// A previously authenticated session is no longer accepted.
    #[error("session expired")]
    SessionExpired,
}

/// Convenient result alias for session operations.
///
/// # Examples
/// ```
/// use client_core::domain::{AuthError, SessionResult, User};
///
/// fn requires_login() -> SessionResult<User> {
///     Err(AuthError::NotAuthenticated)
/// }
/// ```
pub type SessionResult<T> = Result<T, AuthError>;

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(AuthError::InvalidCredentials, "invalid email or password")]
    #[case(
        AuthError::AccountExists { email: "dup@x.com".to_owned() },
        "an account already exists for dup@x.com"
    )]
    #[case(
        AuthError::NetworkFailure { message: "dns".to_owned() },
        "identity service unreachable: dns"
    )]
    #[case(AuthError::NotAuthenticated, "no authenticated session")]
    #[case(AuthError::SessionExpired, "session expired")]
    fn messages_are_stable(#[case] error: AuthError, #[case] expected: &str) {
        assert_eq!(error.to_string(), expected);
    }
}
