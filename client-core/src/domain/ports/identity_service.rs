//! Port for the external identity service.
//!
//! The session store calls out through this trait to authenticate, create,
//! resume, and invalidate sessions. The service's wire protocol is not
//! defined here; adapters own it. Substituting a test double keeps session
//! store tests deterministic.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::credentials::{LoginCredentials, SignupProfile};
use crate::domain::session::Credential;
use crate::domain::user::{EmailAddress, SubscriptionTier, User, UserId};

/// Errors raised by identity service adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityServiceError {
    /// The email/password pair was rejected.
    #[error("email or password was rejected")]
    InvalidCredentials,
    /// Registration attempted with an email that already has an account.
    #[error("an account already exists for {email}")]
    DuplicateAccount {
        /// The conflicting email address.
        email: String,
    },
    /// The presented credential is unknown, revoked, or expired.
    #[error("credential rejected")]
    Unauthorized,
    /// The service could not be reached.
    #[error("identity service connection failed: {message}")]
    Connection {
        /// Adapter-supplied failure description.
        message: String,
    },
}

impl IdentityServiceError {
    /// Convenience constructor for [`IdentityServiceError::DuplicateAccount`].
    pub fn duplicate_account(email: impl Into<String>) -> Self {
        Self::DuplicateAccount {
            email: email.into(),
        }
    }

    /// Convenience constructor for [`IdentityServiceError::Connection`].
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }
}

/// Successful authentication outcome: the user plus the credential the
/// session store persists for restore.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthGrant {
    /// The authenticated user.
    pub user: User,
    /// Opaque token representing the session on the service side.
    pub credential: Credential,
}

/// Driven port for identity operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityService: Send + Sync {
    /// Validate credentials and open a session.
    async fn authenticate(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<AuthGrant, IdentityServiceError>;

    /// Create a new identity and open a session for it.
    async fn register(&self, profile: &SignupProfile) -> Result<AuthGrant, IdentityServiceError>;

    /// Validate a persisted credential and return its user. Used by startup
    /// restore.
    async fn resume(&self, credential: &Credential) -> Result<User, IdentityServiceError>;

    /// Revoke a credential on the service side.
    async fn invalidate(&self, credential: &Credential) -> Result<(), IdentityServiceError>;
}

#[derive(Debug, Clone)]
struct FixtureAccount {
    password: String,
    user: User,
}

#[derive(Debug, Default)]
struct FixtureState {
    accounts: HashMap<EmailAddress, FixtureAccount>,
    credentials: HashMap<Credential, EmailAddress>,
}

/// In-memory identity service for tests and development shells.
///
/// Accounts seeded via [`FixtureIdentityService::with_account`] (or created
/// through `register`) authenticate with their stored password. Issued
/// credentials resume until invalidated.
#[derive(Debug, Default)]
pub struct FixtureIdentityService {
    state: Mutex<FixtureState>,
}

impl FixtureIdentityService {
    /// Create an empty service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an account; the account's email becomes its login name.
    pub fn with_account(self, password: impl Into<String>, user: User) -> Self {
        {
            let mut state = self.lock_state();
            state.accounts.insert(
                user.email().clone(),
                FixtureAccount {
                    password: password.into(),
                    user,
                },
            );
        }
        self
    }

    /// Mint a credential for a seeded account, as though a prior login had
    /// happened. Returns `None` for unknown emails.
    pub fn issue_credential(&self, email: &EmailAddress) -> Option<Credential> {
        let mut state = self.lock_state();
        if !state.accounts.contains_key(email) {
            return None;
        }
        let credential = Credential::random();
        state.credentials.insert(credential.clone(), email.clone());
        Some(credential)
    }

    fn lock_state(&self) -> MutexGuard<'_, FixtureState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl IdentityService for FixtureIdentityService {
    async fn authenticate(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<AuthGrant, IdentityServiceError> {
        let mut state = self.lock_state();
        let Some(account) = state.accounts.get(credentials.email()).cloned() else {
            return Err(IdentityServiceError::InvalidCredentials);
        };
        if account.password != credentials.password() {
            return Err(IdentityServiceError::InvalidCredentials);
        }

        let credential = Credential::random();
        state
            .credentials
            .insert(credential.clone(), credentials.email().clone());
        Ok(AuthGrant {
            user: account.user,
            credential,
        })
    }

    async fn register(&self, profile: &SignupProfile) -> Result<AuthGrant, IdentityServiceError> {
        let mut state = self.lock_state();
        if state.accounts.contains_key(profile.email()) {
            return Err(IdentityServiceError::duplicate_account(
                profile.email().as_str(),
            ));
        }

        let user = User::new(
            UserId::random(),
            profile.display_name().clone(),
            profile.email().clone(),
            profile.role(),
            SubscriptionTier::default(),
        );
        state.accounts.insert(
            profile.email().clone(),
            FixtureAccount {
                password: profile.password().to_owned(),
                user: user.clone(),
            },
        );

        let credential = Credential::random();
        state
            .credentials
            .insert(credential.clone(), profile.email().clone());
        Ok(AuthGrant { user, credential })
    }

    async fn resume(&self, credential: &Credential) -> Result<User, IdentityServiceError> {
        let state = self.lock_state();
        let email = state
            .credentials
            .get(credential)
            .ok_or(IdentityServiceError::Unauthorized)?;
        let account = state
            .accounts
            .get(email)
            .ok_or(IdentityServiceError::Unauthorized)?;
        Ok(account.user.clone())
    }

    async fn invalidate(&self, credential: &Credential) -> Result<(), IdentityServiceError> {
        let mut state = self.lock_state();
        state.credentials.remove(credential);
        Ok(())
    }
}
