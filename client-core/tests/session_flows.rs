//! End-to-end session flows over the fixture identity service and
//! in-memory storage.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use client_core::domain::credentials::{LoginCredentials, SignupProfile};
use client_core::domain::notifications::{NotificationKind, NotificationQueue};
use client_core::domain::ports::{
    AuthGrant, ClientStorage, FixtureIdentityService, IdentityService, IdentityServiceError,
    InMemoryStorage,
};
use client_core::domain::route_guard::{
    GuardOutcome, RouteAccess, RouteGuard, RouteRule, RouteTable,
};
use client_core::domain::session::{Credential, SessionStatus};
use client_core::domain::session_service::{CREDENTIAL_KEY, SessionConfig, SessionStore};
use client_core::domain::theme::{ThemePreference, ThemeStore};
use client_core::domain::user::{EmailAddress, Role, SubscriptionTier, User};
use client_core::domain::{AuthError, THEME_KEY};
use client_core::test_support::{GatedIdentityService, MutableClock};
use mockable::Clock;

fn instructor() -> User {
    User::try_from_strings(
        "user-ada",
        "Ada Lovelace",
        "ada@example.com",
        Role::Instructor,
        SubscriptionTier::Pro,
    )
    .expect("fixture user")
}

fn student(email: &str, name: &str) -> User {
    User::try_from_strings(
        format!("user-{name}"),
        name,
        email,
        Role::Student,
        SubscriptionTier::Basic,
    )
    .expect("fixture user")
}

fn route_table() -> RouteTable {
    RouteTable::new(vec![
        RouteRule::try_new("/courses", RouteAccess::Any).expect("rule shape"),
        RouteRule::try_new(
            "/instructor/dashboard",
            RouteAccess::roles([Role::Instructor, Role::Admin]),
        )
        .expect("rule shape"),
        RouteRule::try_new("/admin", RouteAccess::roles([Role::Admin])).expect("rule shape"),
    ])
}

#[tokio::test]
async fn restored_instructor_reaches_role_gated_routes() {
    let identity = Arc::new(FixtureIdentityService::new().with_account("s3cret", instructor()));
    let credential = identity
        .issue_credential(&EmailAddress::new("ada@example.com").expect("email"))
        .expect("seeded account");

    let storage = Arc::new(InMemoryStorage::new());
    storage
        .write(CREDENTIAL_KEY, credential.as_str())
        .expect("seed credential");

    let store = SessionStore::new(identity, storage);
    let status = store.restore_session().await;
    assert_eq!(status, SessionStatus::Authenticated(instructor()));

    let guard = RouteGuard::new(route_table());
    assert_eq!(
        guard.decide(&status, "/instructor/dashboard"),
        GuardOutcome::Render
    );
    assert_eq!(
        guard.decide(&status, "/admin"),
        GuardOutcome::RedirectToUnauthorized
    );
}

#[tokio::test]
async fn anonymous_visitor_is_redirected_then_returns_after_login() {
    let identity = Arc::new(FixtureIdentityService::new().with_account("s3cret", instructor()));
    let storage = Arc::new(InMemoryStorage::new());
    let store = SessionStore::new(identity, storage);
    let guard = RouteGuard::new(route_table());

    let status = store.restore_session().await;
    let outcome = guard.decide(&status, "/instructor/dashboard");
    let GuardOutcome::RedirectToLogin { return_to } = outcome else {
        panic!("expected a login redirect, got {outcome:?}");
    };
    assert_eq!(return_to, "/instructor/dashboard");

    store
        .login("ada@example.com", "s3cret")
        .await
        .expect("login succeeds");
    assert_eq!(
        guard.decide(&store.status(), &return_to),
        GuardOutcome::Render
    );
}

#[tokio::test]
async fn pending_session_defers_protected_routes() {
    let identity = Arc::new(FixtureIdentityService::new());
    let storage = Arc::new(InMemoryStorage::new());
    let store = SessionStore::new(identity, storage);
    let guard = RouteGuard::new(route_table());

    let status = store.status();
    assert!(status.is_pending());
    assert_eq!(
        guard.decide(&status, "/instructor/dashboard"),
        GuardOutcome::Pending
    );
    assert_eq!(guard.decide(&status, "/courses"), GuardOutcome::Render);
}

#[tokio::test(flavor = "current_thread")]
async fn second_login_supersedes_a_slow_first_login() {
    let fixture = FixtureIdentityService::new()
        .with_account("pw-alice", student("alice@example.com", "Alice"))
        .with_account("pw-bob", student("bob@example.com", "Bob"));
    let gated = Arc::new(GatedIdentityService::new(Arc::new(fixture)));
    gated.gate("alice@example.com");
    gated.gate("bob@example.com");

    let storage = Arc::new(InMemoryStorage::new());
    let store = Arc::new(SessionStore::new(Arc::clone(&gated), storage));

    let first = tokio::spawn({
        let store = Arc::clone(&store);
        async move { store.login("alice@example.com", "pw-alice").await }
    });
    tokio::task::yield_now().await;

    let second = tokio::spawn({
        let store = Arc::clone(&store);
        async move { store.login("bob@example.com", "pw-bob").await }
    });
    tokio::task::yield_now().await;

    // Bob's response arrives first; Alice's arrives late and must not win.
    gated.release("bob@example.com");
    tokio::task::yield_now().await;
    gated.release("alice@example.com");

    let bob = second.await.expect("task").expect("bob logs in");
    let alice = first.await.expect("task").expect("alice's call still succeeds");
    assert_eq!(alice.email().as_str(), "alice@example.com");

    assert_eq!(store.status(), SessionStatus::Authenticated(bob));
}

#[tokio::test(flavor = "current_thread")]
async fn logout_cancels_an_in_flight_login() {
    let fixture = FixtureIdentityService::new()
        .with_account("pw-alice", student("alice@example.com", "Alice"));
    let gated = Arc::new(GatedIdentityService::new(Arc::new(fixture)));
    gated.gate("alice@example.com");

    let storage = Arc::new(InMemoryStorage::new());
    let store = Arc::new(SessionStore::new(Arc::clone(&gated), Arc::clone(&storage)));

    let login = tokio::spawn({
        let store = Arc::clone(&store);
        async move { store.login("alice@example.com", "pw-alice").await }
    });
    tokio::task::yield_now().await;

    store.logout().await;
    gated.release("alice@example.com");
    login.await.expect("task").expect("late success is returned");

    assert_eq!(store.status(), SessionStatus::Anonymous);
    assert_eq!(storage.read(CREDENTIAL_KEY).expect("read"), None);
}

#[tokio::test]
async fn signup_creates_a_session_and_persists_its_credential() {
    let identity = Arc::new(FixtureIdentityService::new());
    let storage = Arc::new(InMemoryStorage::new());
    let store = SessionStore::new(identity, Arc::clone(&storage));

    let profile =
        SignupProfile::try_from_parts("new@example.com", "pw", "New Learner", Role::Student)
            .expect("profile shape");
    let user = store.signup(profile).await.expect("signup succeeds");
    assert_eq!(user.role(), Role::Student);
    assert_eq!(store.status(), SessionStatus::Authenticated(user));
    assert!(storage.read(CREDENTIAL_KEY).expect("read").is_some());
}

#[tokio::test]
async fn signup_with_taken_email_leaves_the_visitor_anonymous() {
    let identity = Arc::new(FixtureIdentityService::new().with_account("s3cret", instructor()));
    let storage = Arc::new(InMemoryStorage::new());
    let store = SessionStore::new(identity, Arc::clone(&storage));
    store.restore_session().await;

    let profile =
        SignupProfile::try_from_parts("ada@example.com", "pw", "Other Ada", Role::Student)
            .expect("profile shape");
    let err = store
        .signup(profile)
        .await
        .expect_err("duplicate email must fail");
    assert_eq!(
        err,
        AuthError::AccountExists {
            email: "ada@example.com".to_owned()
        }
    );
    assert_eq!(store.status(), SessionStatus::Anonymous);
    assert_eq!(storage.read(CREDENTIAL_KEY).expect("read"), None);
}

#[tokio::test]
async fn subscribers_follow_the_login_logout_cycle() {
    let identity = Arc::new(FixtureIdentityService::new().with_account("s3cret", instructor()));
    let storage = Arc::new(InMemoryStorage::new());
    let store = SessionStore::new(identity, storage);

    let mut receiver = store.subscribe();
    assert!(receiver.borrow_and_update().is_pending());

    store
        .login("ada@example.com", "s3cret")
        .await
        .expect("login succeeds");
    receiver.changed().await.expect("sender alive");
    assert_eq!(
        *receiver.borrow_and_update(),
        SessionStatus::Authenticated(instructor())
    );

    store.logout().await;
    receiver.changed().await.expect("sender alive");
    assert_eq!(*receiver.borrow_and_update(), SessionStatus::Anonymous);
}

struct StalledIdentityService;

#[async_trait]
impl IdentityService for StalledIdentityService {
    async fn authenticate(
        &self,
        _credentials: &LoginCredentials,
    ) -> Result<AuthGrant, IdentityServiceError> {
        std::future::pending().await
    }

    async fn register(&self, _profile: &SignupProfile) -> Result<AuthGrant, IdentityServiceError> {
        std::future::pending().await
    }

    async fn resume(&self, _credential: &Credential) -> Result<User, IdentityServiceError> {
        std::future::pending().await
    }

    async fn invalidate(&self, _credential: &Credential) -> Result<(), IdentityServiceError> {
        std::future::pending().await
    }
}

#[tokio::test(start_paused = true)]
async fn restore_times_out_when_the_service_stalls() {
    let storage = Arc::new(InMemoryStorage::new());
    storage
        .write(CREDENTIAL_KEY, "tok-stalled")
        .expect("seed credential");

    let store = SessionStore::with_config(
        Arc::new(StalledIdentityService),
        Arc::clone(&storage),
        SessionConfig {
            restore_timeout: Some(Duration::from_secs(5)),
        },
    );

    assert_eq!(store.restore_session().await, SessionStatus::Anonymous);
    // Connection-style failure: the credential stays for the next reload.
    assert_eq!(
        storage.read(CREDENTIAL_KEY).expect("read"),
        Some("tok-stalled".to_owned())
    );
}

#[tokio::test]
async fn theme_choice_survives_a_reload() {
    let storage = Arc::new(InMemoryStorage::new());
    ThemeStore::new(Arc::clone(&storage)).set(ThemePreference::Dark);

    assert_eq!(
        storage.read(THEME_KEY).expect("read"),
        Some("dark".to_owned())
    );
    let reloaded = ThemeStore::new(storage);
    assert_eq!(reloaded.get(), ThemePreference::Dark);
}

#[tokio::test]
async fn failed_login_surfaces_as_a_dismissible_notification() {
    let identity = Arc::new(FixtureIdentityService::new().with_account("s3cret", instructor()));
    let storage = Arc::new(InMemoryStorage::new());
    let store = SessionStore::new(identity, storage);

    let clock = Arc::new(MutableClock::default());
    let queue = NotificationQueue::new(Arc::clone(&clock) as Arc<dyn Clock>);

    let err = store
        .login("ada@example.com", "wrong")
        .await
        .expect_err("bad password must fail");
    let id = queue.push(NotificationKind::Error, "Sign-in failed", err.to_string());

    let visible = queue.visible();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].kind(), NotificationKind::Error);

    assert!(queue.dismiss(id));
    assert!(queue.visible().is_empty());
}
