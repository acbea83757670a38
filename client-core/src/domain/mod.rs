//! Domain layer: session, authorization, and client-side preference state.
//!
//! Pure application logic with no rendering or transport concerns. External
//! effects go through the driven ports in [`ports`]; everything else is
//! deterministic and unit-testable.

pub mod busy;
pub mod consent;
pub mod credentials;
pub mod error;
pub mod notifications;
pub mod ports;
pub mod route_guard;
pub mod session;
pub mod session_service;
pub mod theme;
pub mod user;

pub use busy::{BusyScope, BusyTracker};
pub use consent::{CONSENT_KEY, ConsentStore, ConsentStoreError, CookiePreferences};
pub use credentials::{LoginCredentials, LoginValidationError, SignupProfile};
pub use error::{AuthError, SessionResult};
pub use notifications::{
    Notification, NotificationId, NotificationKind, NotificationQueue, QueuePolicy,
};
pub use route_guard::{GuardOutcome, RouteAccess, RouteGuard, RouteRule, RouteTable};
pub use session::{Credential, CredentialValidationError, SessionStatus};
pub use session_service::{CREDENTIAL_KEY, SessionConfig, SessionStore};
pub use theme::{THEME_KEY, ThemePreference, ThemeStore};
pub use user::{
    DisplayName, EmailAddress, Role, SubscriptionTier, User, UserId, UserUpdate,
    UserValidationError,
};
