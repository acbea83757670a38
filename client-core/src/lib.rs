//! Client-side session and authorization core for the learning platform
//! front-end.
//!
//! Holds the state the rendering layer reads: who is signed in, whether a
//! route may render, queued notifications, the busy indicator, and
//! persisted preferences. Rendering and transport live in adapter crates;
//! this one is deterministic and runs the same under tests and in the
//! browser shell.

pub mod domain;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
