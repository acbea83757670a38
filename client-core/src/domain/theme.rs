//! Theme preference store.
//!
//! Persistence is synchronous: `set` writes through before returning so a
//! reload observes the chosen theme before first paint, with no flash of
//! the wrong theme.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::ports::ClientStorage;

/// Storage key holding the persisted theme. Written only by this store.
pub const THEME_KEY: &str = "theme.preference";

/// Visual theme chosen by the visitor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThemePreference {
    #[default]
    Light,
    Dark,
}

impl ThemePreference {
    /// Canonical lower-case name, as persisted.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }
}

impl fmt::Display for ThemePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown theme name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseThemeError(String);

impl fmt::Display for ParseThemeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown theme: {}", self.0)
    }
}

impl std::error::Error for ParseThemeError {}

impl FromStr for ThemePreference {
    type Err = ParseThemeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            other => Err(ParseThemeError(other.to_owned())),
        }
    }
}

/// Theme store over durable client storage.
pub struct ThemeStore<S> {
    storage: Arc<S>,
    system_default: ThemePreference,
}

impl<S> ThemeStore<S>
where
    S: ClientStorage,
{
    /// Create a store that falls back to the light theme.
    pub fn new(storage: Arc<S>) -> Self {
        Self::with_default(storage, ThemePreference::default())
    }

    /// Create a store with an explicit fallback, typically the detected
    /// system preference.
    pub fn with_default(storage: Arc<S>, system_default: ThemePreference) -> Self {
        Self {
            storage,
            system_default,
        }
    }

    /// The persisted preference, or the system default when nothing valid
    /// is stored. A corrupt value falls back rather than erroring; theme is
    /// cosmetic.
    pub fn get(&self) -> ThemePreference {
        match self.storage.read(THEME_KEY) {
            Ok(Some(raw)) => raw.parse().unwrap_or_else(|error| {
                tracing::warn!(%error, "persisted theme is invalid; using default");
                self.system_default
            }),
            Ok(None) => self.system_default,
            Err(error) => {
                tracing::warn!(%error, "failed to read persisted theme; using default");
                self.system_default
            }
        }
    }

    /// Persist a new preference. The write completes before this returns.
    pub fn set(&self, theme: ThemePreference) {
        if let Err(error) = self.storage.write(THEME_KEY, theme.as_str()) {
            tracing::warn!(%error, "failed to persist theme; choice will not survive a reload");
        }
    }
}
