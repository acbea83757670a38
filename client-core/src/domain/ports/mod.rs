//! Driven ports connecting the session core to its collaborators.
//!
//! In hexagonal terms these are the boundaries the core calls out through:
//! the external identity service and durable client storage. Fixture
//! implementations ship alongside each port so tests and development shells
//! can run without real infrastructure; mockall mocks are generated under
//! `cfg(test)`.

pub mod client_storage;
pub mod identity_service;

pub use self::client_storage::{ClientStorage, ClientStorageError, InMemoryStorage};
pub use self::identity_service::{
    AuthGrant, FixtureIdentityService, IdentityService, IdentityServiceError,
};

#[cfg(test)]
pub use self::client_storage::MockClientStorage;
#[cfg(test)]
pub use self::identity_service::MockIdentityService;
