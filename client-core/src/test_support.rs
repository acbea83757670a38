//! Shared test doubles.
//!
//! Available to downstream crates through the `test-support` feature, and
//! to this crate's own tests via the self dev-dependency.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeDelta, Utc};
use mockable::Clock;
use tokio::sync::Notify;

use crate::domain::credentials::{LoginCredentials, SignupProfile};
use crate::domain::ports::{AuthGrant, IdentityService, IdentityServiceError};
use crate::domain::session::Credential;
use crate::domain::user::User;

/// A clock that only moves when a test tells it to.
pub struct MutableClock {
    now: Mutex<DateTime<Utc>>,
}

impl MutableClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, delta: Duration) {
        let delta = TimeDelta::from_std(delta).unwrap_or(TimeDelta::MAX);
        *self.lock_now() += delta;
    }

    pub fn advance_seconds(&self, seconds: i64) {
        *self.lock_now() += TimeDelta::seconds(seconds);
    }

    /// Jump the clock to an absolute instant, forwards or backwards.
    pub fn set(&self, now: DateTime<Utc>) {
        *self.lock_now() = now;
    }

    fn lock_now(&self) -> MutexGuard<'_, DateTime<Utc>> {
        match self.now.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for MutableClock {
    fn default() -> Self {
        Self::new(DateTime::UNIX_EPOCH)
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.lock_now()
    }
}

/// Identity service wrapper that stalls selected calls until the test
/// releases them, so interleavings of concurrent logins are scripted rather
/// than racy.
///
/// Gate an email with [`GatedIdentityService::gate`]; `authenticate` and
/// `register` for that email then wait for [`GatedIdentityService::release`]
/// before delegating to the wrapped service. Ungated calls pass straight
/// through, as do `resume` and `invalidate`.
pub struct GatedIdentityService<I> {
    inner: Arc<I>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
}

impl<I> GatedIdentityService<I> {
    pub fn new(inner: Arc<I>) -> Self {
        Self {
            inner,
            gates: Mutex::new(HashMap::new()),
        }
    }

    /// Hold future `authenticate`/`register` calls for `email` until
    /// released.
    pub fn gate(&self, email: &str) {
        self.lock_gates()
            .insert(email.to_owned(), Arc::new(Notify::new()));
    }

    /// Let one held call for `email` proceed. Releasing before the call
    /// arrives is fine; the permit is stored.
    pub fn release(&self, email: &str) {
        if let Some(gate) = self.lock_gates().get(email) {
            gate.notify_one();
        }
    }

    fn gate_for(&self, email: &str) -> Option<Arc<Notify>> {
        self.lock_gates().get(email).cloned()
    }

    fn lock_gates(&self) -> MutexGuard<'_, HashMap<String, Arc<Notify>>> {
        match self.gates.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    async fn wait_for(&self, email: &str) {
        if let Some(gate) = self.gate_for(email) {
            gate.notified().await;
        }
    }
}

#[async_trait]
impl<I> IdentityService for GatedIdentityService<I>
where
    I: IdentityService,
{
    async fn authenticate(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<AuthGrant, IdentityServiceError> {
        self.wait_for(credentials.email().as_str()).await;
        self.inner.authenticate(credentials).await
    }

    async fn register(&self, profile: &SignupProfile) -> Result<AuthGrant, IdentityServiceError> {
        self.wait_for(profile.email().as_str()).await;
        self.inner.register(profile).await
    }

    async fn resume(&self, credential: &Credential) -> Result<User, IdentityServiceError> {
        self.inner.resume(credential).await
    }

    async fn invalidate(&self, credential: &Credential) -> Result<(), IdentityServiceError> {
        self.inner.invalidate(credential).await
    }
}
