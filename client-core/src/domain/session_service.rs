//! Session store: the single source of truth for "who is logged in".
//!
//! The store owns the persisted credential and the in-memory
//! [`SessionStatus`], publishes every transition over a watch channel so
//! consumers never see a stale read, and discards stale resolutions of
//! superseded asynchronous calls via a per-operation generation counter.
//!
//! # Concurrency
//!
//! Execution is cooperative and event-driven; the only suspension points
//! are the identity-service calls. The internal mutex is held only while a
//! transition is applied, never across an await. Every auth-affecting call
//! (`login`, `signup`, `logout`, restore, session expiry) bumps the
//! generation; a resolution is applied only if its captured generation is
//! still current, so "last network response wins" cannot occur and a
//! logout can never be undone by a late-arriving login success.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::watch;

use crate::domain::credentials::{LoginCredentials, SignupProfile};
use crate::domain::error::{AuthError, SessionResult};
use crate::domain::ports::{AuthGrant, ClientStorage, IdentityService, IdentityServiceError};
use crate::domain::session::{Credential, SessionStatus};
use crate::domain::user::{User, UserUpdate};

/// Storage key holding the persisted credential. Written only by this
/// store; no other component may touch it.
pub const CREDENTIAL_KEY: &str = "session.credential";

/// Tuning knobs for the session store.
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    /// Upper bound on how long startup restore may wait for the identity
    /// service before resolving to an anonymous session. `None` waits
    /// indefinitely.
    pub restore_timeout: Option<Duration>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum RestoreState {
    #[default]
    NotStarted,
    Started,
    Completed,
}

#[derive(Debug, Default)]
struct Inner {
    /// Monotonic id of the most recent auth-affecting call.
    generation: u64,
    restore_state: RestoreState,
}

/// Client-side session store over an identity service and durable client
/// storage.
///
/// Construct one per application shell and share it behind an [`Arc`];
/// state lives in the instance, not in ambient globals, so tests can build
/// isolated stores.
pub struct SessionStore<I, S> {
    identity: Arc<I>,
    storage: Arc<S>,
    config: SessionConfig,
    status_tx: watch::Sender<SessionStatus>,
    inner: Mutex<Inner>,
}

impl<I, S> SessionStore<I, S>
where
    I: IdentityService,
    S: ClientStorage,
{
    /// Create a store with default configuration. Status starts `Pending`
    /// until [`SessionStore::restore_session`] resolves it.
    pub fn new(identity: Arc<I>, storage: Arc<S>) -> Self {
        Self::with_config(identity, storage, SessionConfig::default())
    }

    /// Create a store with explicit configuration.
    pub fn with_config(identity: Arc<I>, storage: Arc<S>, config: SessionConfig) -> Self {
        let (status_tx, _) = watch::channel(SessionStatus::Pending);
        Self {
            identity,
            storage,
            config,
            status_tx,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Snapshot of the current session status.
    pub fn status(&self) -> SessionStatus {
        self.status_tx.borrow().clone()
    }

    /// Subscribe to status transitions. The receiver observes every
    /// committed transition; the guard and rendering consumers re-evaluate
    /// from it.
    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.status_tx.subscribe()
    }

    /// Restore a previously persisted session, resolving `Pending` to
    /// either `Authenticated` or `Anonymous`.
    ///
    /// Invoked once at startup and idempotent: once a restore has started,
    /// later calls return the current status without touching the identity
    /// service. Any failure — missing credential, malformed value, service
    /// rejection, connection loss, or the configured timeout — resolves to
    /// `Anonymous`; the status never sticks at `Pending`.
    pub async fn restore_session(&self) -> SessionStatus {
        let generation = {
            let mut inner = self.lock_inner();
            if inner.restore_state != RestoreState::NotStarted {
                tracing::debug!("session restore already started; returning current status");
                drop(inner);
                return self.status();
            }
            inner.restore_state = RestoreState::Started;
            inner.generation += 1;
            inner.generation
        };

        let resolved = self.run_restore().await;

        {
            let mut inner = self.lock_inner();
            inner.restore_state = RestoreState::Completed;
            if inner.generation == generation {
                self.status_tx.send_replace(resolved);
            } else {
                tracing::debug!("session restore superseded; discarding result");
            }
        }
        self.status()
    }

    /// Authenticate with the identity service and open a session.
    ///
    /// On success the credential is persisted and `Authenticated` is
    /// published. On failure the status keeps its prior value; no user is
    /// fabricated. A resolution superseded by a later call returns the
    /// service's answer but leaves state and storage untouched.
    pub async fn login(&self, email: &str, password: &str) -> SessionResult<User> {
        let credentials = LoginCredentials::try_from_parts(email, password)
            .map_err(|_| AuthError::InvalidCredentials)?;
        let generation = self.begin_attempt();
        let grant = self
            .identity
            .authenticate(&credentials)
            .await
            .map_err(Self::map_identity_error)?;
        Ok(self.commit_grant(generation, grant))
    }

    /// Create a new identity and open a session for it.
    ///
    /// Same contract as [`SessionStore::login`]; a duplicate email rejects
    /// with [`AuthError::AccountExists`] and the status keeps its prior
    /// value.
    pub async fn signup(&self, profile: SignupProfile) -> SessionResult<User> {
        let generation = self.begin_attempt();
        let grant = self
            .identity
            .register(&profile)
            .await
            .map_err(Self::map_identity_error)?;
        Ok(self.commit_grant(generation, grant))
    }

    /// Log out locally and best-effort invalidate the credential remotely.
    ///
    /// The local transition always succeeds: the generation bump cancels
    /// any in-flight login/signup/restore, `Anonymous` is published, and
    /// the persisted credential is cleared before the remote call. An
    /// unreachable identity service must never strand the visitor in an
    /// authenticated-looking state.
    pub async fn logout(&self) {
        let credential = match self.storage.read(CREDENTIAL_KEY) {
            Ok(Some(raw)) => Credential::new(raw).ok(),
            Ok(None) => None,
            Err(error) => {
                tracing::warn!(%error, "failed to read persisted credential during logout");
                None
            }
        };

        {
            let mut inner = self.lock_inner();
            inner.generation += 1;
            self.status_tx.send_replace(SessionStatus::Anonymous);
        }
        self.clear_credential();

        if let Some(credential) = credential {
            if let Err(error) = self.identity.invalidate(&credential).await {
                tracing::debug!(%error, "remote credential invalidation failed; ignoring");
            }
        }
    }

    /// Merge fields into the current user without changing the status.
    pub fn update_user(&self, update: UserUpdate) -> SessionResult<User> {
        let _inner = self.lock_inner();
        let current = self.status_tx.borrow().clone();
        let SessionStatus::Authenticated(user) = current else {
            return Err(AuthError::NotAuthenticated);
        };

        let updated = user.with_update(update);
        self.status_tx
            .send_replace(SessionStatus::Authenticated(updated.clone()));
        Ok(updated)
    }

    /// Handle an authenticated call that the service rejected as
    /// unauthorized: drop the session locally and hand back the error the
    /// caller should surface, so stale UI cannot keep claiming the user is
    /// logged in.
    pub fn expire_session(&self) -> AuthError {
        {
            let mut inner = self.lock_inner();
            inner.generation += 1;
            self.status_tx.send_replace(SessionStatus::Anonymous);
        }
        self.clear_credential();
        AuthError::SessionExpired
    }

    async fn run_restore(&self) -> SessionStatus {
        let credential = match self.storage.read(CREDENTIAL_KEY) {
            Ok(Some(raw)) => match Credential::new(raw) {
                Ok(credential) => credential,
                Err(error) => {
                    tracing::warn!(%error, "persisted credential is malformed; discarding");
                    self.clear_credential();
                    return SessionStatus::Anonymous;
                }
            },
            Ok(None) => return SessionStatus::Anonymous,
            Err(error) => {
                tracing::warn!(%error, "failed to read persisted credential");
                return SessionStatus::Anonymous;
            }
        };

        match self.resume_with_timeout(&credential).await {
            Ok(user) => SessionStatus::Authenticated(user),
            Err(IdentityServiceError::Unauthorized | IdentityServiceError::InvalidCredentials) => {
                tracing::debug!("persisted credential rejected; clearing it");
                self.clear_credential();
                SessionStatus::Anonymous
            }
            Err(error) => {
                // Keep the credential: the next reload may reach the service.
                tracing::warn!(%error, "session restore failed; treating visitor as anonymous");
                SessionStatus::Anonymous
            }
        }
    }

    async fn resume_with_timeout(
        &self,
        credential: &Credential,
    ) -> Result<User, IdentityServiceError> {
        match self.config.restore_timeout {
            Some(limit) => match tokio::time::timeout(limit, self.identity.resume(credential)).await
            {
                Ok(result) => result,
                Err(_elapsed) => Err(IdentityServiceError::connection("session restore timed out")),
            },
            None => self.identity.resume(credential).await,
        }
    }

    fn begin_attempt(&self) -> u64 {
        let mut inner = self.lock_inner();
        inner.generation += 1;
        inner.generation
    }

    /// Apply a successful grant if `generation` is still current; a stale
    /// grant is returned to its caller without touching state or storage.
    fn commit_grant(&self, generation: u64, grant: AuthGrant) -> User {
        let inner = self.lock_inner();
        if inner.generation != generation {
            tracing::debug!("stale authentication resolution discarded");
            return grant.user;
        }

        self.persist_credential(&grant.credential);
        self.status_tx
            .send_replace(SessionStatus::Authenticated(grant.user.clone()));
        grant.user
    }

    fn persist_credential(&self, credential: &Credential) {
        if let Err(error) = self.storage.write(CREDENTIAL_KEY, credential.as_str()) {
            tracing::warn!(%error, "failed to persist credential; session will not survive a reload");
        }
    }

    fn clear_credential(&self) {
        if let Err(error) = self.storage.remove(CREDENTIAL_KEY) {
            tracing::warn!(%error, "failed to clear persisted credential");
        }
    }

    fn lock_inner(&self) -> MutexGuard<'_, Inner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn map_identity_error(error: IdentityServiceError) -> AuthError {
        match error {
            IdentityServiceError::InvalidCredentials => AuthError::InvalidCredentials,
            IdentityServiceError::DuplicateAccount { email } => AuthError::AccountExists { email },
            IdentityServiceError::Unauthorized => AuthError::SessionExpired,
            IdentityServiceError::Connection { message } => AuthError::NetworkFailure { message },
        }
    }
}
