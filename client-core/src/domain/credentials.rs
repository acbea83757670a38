//! Authentication input primitives such as login credentials.
//!
//! Structurally invalid input fails here, before the session store spends a
//! network round trip on it. Passwords are held in [`Zeroizing`] buffers so
//! they are wiped once dropped.

use std::fmt;

use zeroize::Zeroizing;

use super::user::{DisplayName, EmailAddress, Role, UserValidationError};

/// Validation errors for login and signup inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginValidationError {
    /// Email was missing or malformed.
    Email(UserValidationError),
    /// Password was blank.
    EmptyPassword,
    /// Display name on a signup profile was invalid.
    DisplayName(UserValidationError),
}

impl fmt::Display for LoginValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Email(inner) => write!(f, "{inner}"),
            Self::EmptyPassword => write!(f, "password must not be empty"),
            Self::DisplayName(inner) => write!(f, "{inner}"),
        }
    }
}

impl std::error::Error for LoginValidationError {}

/// Validated login credentials handed to the identity-service port.
///
/// ## Invariants
/// - `email` is normalised and structurally valid.
/// - `password` is non-empty but retains caller-provided whitespace to
///   avoid surprising credential comparisons.
///
/// # Examples
/// ```
/// use client_core::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts("ada@example.com", "s3cret").unwrap();
/// assert_eq!(creds.email().as_str(), "ada@example.com");
/// assert_eq!(creds.password(), "s3cret");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: EmailAddress,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw email/password inputs.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, LoginValidationError> {
        let email = EmailAddress::new(email).map_err(LoginValidationError::Email)?;
        if password.is_empty() {
            return Err(LoginValidationError::EmptyPassword);
        }

        Ok(Self {
            email,
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Normalised email address.
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Password string provided by the caller.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Validated profile submitted when creating a new account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignupProfile {
    email: EmailAddress,
    password: Zeroizing<String>,
    display_name: DisplayName,
    role: Role,
}

impl SignupProfile {
    /// Construct a profile from raw signup form inputs.
    pub fn try_from_parts(
        email: &str,
        password: &str,
        display_name: &str,
        role: Role,
    ) -> Result<Self, LoginValidationError> {
        let email = EmailAddress::new(email).map_err(LoginValidationError::Email)?;
        if password.is_empty() {
            return Err(LoginValidationError::EmptyPassword);
        }
        let display_name =
            DisplayName::new(display_name).map_err(LoginValidationError::DisplayName)?;

        Ok(Self {
            email,
            password: Zeroizing::new(password.to_owned()),
            display_name,
            role,
        })
    }

    /// Normalised email address.
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Password string provided by the caller.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }

    /// Requested display name.
    pub fn display_name(&self) -> &DisplayName {
        &self.display_name
    }

    /// Requested role.
    pub fn role(&self) -> Role {
        self.role
    }
}
