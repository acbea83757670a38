//! Cookie consent preference store.
//!
//! Essential cookies are always on; the visitor only toggles the optional
//! categories. Preferences persist as JSON under a single storage key.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::ports::{ClientStorage, ClientStorageError};

/// Storage key holding the persisted consent choices. Written only by this
/// store.
pub const CONSENT_KEY: &str = "cookie.preferences";

/// Per-category consent choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CookiePreferences {
    /// Required for the platform to function; not user-toggleable.
    pub essential: bool,
    /// Usage analytics.
    pub analytics: bool,
    /// Marketing and advertising.
    pub marketing: bool,
}

impl Default for CookiePreferences {
    fn default() -> Self {
        Self {
            essential: true,
            analytics: false,
            marketing: false,
        }
    }
}

/// Errors raised while persisting consent choices.
#[derive(Debug, Error)]
pub enum ConsentStoreError {
    #[error(transparent)]
    Storage(#[from] ClientStorageError),
    #[error("failed to serialise consent preferences: {message}")]
    Serialization {
        /// Underlying serde failure description.
        message: String,
    },
}

/// Consent store over durable client storage.
pub struct ConsentStore<S> {
    storage: Arc<S>,
}

impl<S> ConsentStore<S>
where
    S: ClientStorage,
{
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    /// The persisted choices, or the opt-out default when nothing valid is
    /// stored. A corrupt value falls back to the default rather than
    /// erroring; that is the privacy-preserving reading.
    pub fn get(&self) -> CookiePreferences {
        match self.storage.read(CONSENT_KEY) {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(preferences) => preferences,
                Err(error) => {
                    tracing::warn!(%error, "persisted consent is invalid; using defaults");
                    CookiePreferences::default()
                }
            },
            Ok(None) => CookiePreferences::default(),
            Err(error) => {
                tracing::warn!(%error, "failed to read persisted consent; using defaults");
                CookiePreferences::default()
            }
        }
    }

    /// Persist new choices. Essential consent is forced on regardless of
    /// the caller's value.
    pub fn set(&self, preferences: CookiePreferences) -> Result<(), ConsentStoreError> {
        let stored = CookiePreferences {
            essential: true,
            ..preferences
        };
        let raw =
            serde_json::to_string(&stored).map_err(|error| ConsentStoreError::Serialization {
                message: error.to_string(),
            })?;
        self.storage.write(CONSENT_KEY, &raw)?;
        Ok(())
    }
}
