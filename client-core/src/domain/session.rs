//! Session state primitives.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::{Role, User};

/// Validation error for persisted credential tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialValidationError {
    /// The token blob was empty.
    Empty,
}

impl fmt::Display for CredentialValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "credential token must not be empty"),
        }
    }
}

impl std::error::Error for CredentialValidationError {}

/// Opaque credential blob issued by the identity service.
///
/// Persisted under the `session.credential` storage key so a returning
/// visitor can be restored without re-prompting. The core never inspects
/// the token's contents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Credential(String);

impl Credential {
    /// Validate and construct a [`Credential`] from an owned token blob.
    pub fn new(token: impl Into<String>) -> Result<Self, CredentialValidationError> {
        let token = token.into();
        if token.is_empty() {
            return Err(CredentialValidationError::Empty);
        }
        Ok(Self(token))
    }

    /// Mint a fresh random credential. Used by fixture identity services.
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Borrow the raw token blob.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for Credential {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl From<Credential> for String {
    fn from(value: Credential) -> Self {
        value.0
    }
}

impl TryFrom<String> for Credential {
    type Error = CredentialValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Authentication state of the current visitor.
///
/// Modelled as a tagged union rather than a `loading` flag plus an optional
/// user, so "still deciding" is a first-class, checkable value. `Pending`
/// is only valid before startup restore completes and is never re-entered
/// afterwards short of a full reload.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionStatus {
    /// Startup restore has not yet resolved.
    #[default]
    Pending,
    /// A user is logged in.
    Authenticated(User),
    /// No user is logged in.
    Anonymous,
}

impl SessionStatus {
    /// True while startup restore is unresolved.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// True when a user is logged in.
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    /// The authenticated user, if any.
    pub fn user(&self) -> Option<&User> {
        match self {
            Self::Authenticated(user) => Some(user),
            Self::Pending | Self::Anonymous => None,
        }
    }

    /// The authenticated user's role, if any.
    pub fn role(&self) -> Option<Role> {
        self.user().map(User::role)
    }
}
