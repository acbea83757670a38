//! Route guard: maps (session state, requested path) to a render decision.
//!
//! The guard only signals intent. It never navigates; the page-composition
//! layer executes whichever redirect the outcome names.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::session::SessionStatus;
use super::user::Role;

/// Validation errors for route rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteRuleValidationError {
    /// Path was empty or blank.
    EmptyPath,
    /// Path did not start with `/`.
    RelativePath,
}

impl fmt::Display for RouteRuleValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyPath => write!(f, "route path must not be empty"),
            Self::RelativePath => write!(f, "route path must start with '/'"),
        }
    }
}

impl std::error::Error for RouteRuleValidationError {}

/// Roles allowed to view a route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteAccess {
    /// Any visitor, authenticated or not.
    Any,
    /// Only authenticated users holding one of these roles.
    Roles(BTreeSet<Role>),
}

impl RouteAccess {
    /// Build a role-restricted access set.
    pub fn roles(roles: impl IntoIterator<Item = Role>) -> Self {
        Self::Roles(roles.into_iter().collect())
    }

    /// True when `role` may view the route.
    pub fn permits(&self, role: Role) -> bool {
        match self {
            Self::Any => true,
            Self::Roles(allowed) => allowed.contains(&role),
        }
    }

    /// True when the route is open to unauthenticated visitors.
    pub fn is_public(&self) -> bool {
        matches!(self, Self::Any)
    }
}

/// A single path-to-roles mapping.
///
/// Static configuration maintained outside this core; never mutated at
/// runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RouteRuleDto", into = "RouteRuleDto")]
pub struct RouteRule {
    path: String,
    access: RouteAccess,
}

impl RouteRule {
    /// Validate and construct a rule.
    pub fn try_new(
        path: impl Into<String>,
        access: RouteAccess,
    ) -> Result<Self, RouteRuleValidationError> {
        let path = path.into();
        if path.trim().is_empty() {
            return Err(RouteRuleValidationError::EmptyPath);
        }
        if !path.starts_with('/') {
            return Err(RouteRuleValidationError::RelativePath);
        }
        Ok(Self { path, access })
    }

    /// The matched URL path.
    pub fn path(&self) -> &str {
        self.path.as_str()
    }

    /// Who may view the route.
    pub fn access(&self) -> &RouteAccess {
        &self.access
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RouteRuleDto {
    path: String,
    access: RouteAccess,
}

impl From<RouteRule> for RouteRuleDto {
    fn from(value: RouteRule) -> Self {
        let RouteRule { path, access } = value;
        Self { path, access }
    }
}

impl TryFrom<RouteRuleDto> for RouteRule {
    type Error = RouteRuleValidationError;

    fn try_from(value: RouteRuleDto) -> Result<Self, Self::Error> {
        RouteRule::try_new(value.path, value.access)
    }
}

/// Static route table consumed by the guard.
///
/// Paths absent from the table are public: display pages dominate the
/// platform and the table only has to enumerate the protected ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteTable {
    rules: Vec<RouteRule>,
}

impl RouteTable {
    /// Build a table from its rules.
    pub fn new(rules: Vec<RouteRule>) -> Self {
        Self { rules }
    }

    /// The rule matching `path` exactly, if any.
    pub fn rule_for(&self, path: &str) -> Option<&RouteRule> {
        self.rules.iter().find(|rule| rule.path() == path)
    }
}

/// Decision for a requested path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    /// Startup restore has not resolved; render a neutral placeholder,
    /// nothing decisive.
    Pending,
    /// The view may render.
    Render,
    /// Send the visitor to the login page, preserving the destination for
    /// the post-login return.
    RedirectToLogin {
        /// The originally requested path.
        return_to: String,
    },
    /// The visitor is authenticated but lacks a permitted role.
    RedirectToUnauthorized,
}

/// Pure decision function over the route table and a session snapshot.
#[derive(Debug, Clone, Default)]
pub struct RouteGuard {
    table: RouteTable,
}

impl RouteGuard {
    /// Build a guard over a route table.
    pub fn new(table: RouteTable) -> Self {
        Self { table }
    }

    /// Decide the outcome for `path` under `status`.
    ///
    /// The pending check runs first: redirecting before startup restore
    /// has resolved would bounce a returning visitor to the login page on
    /// every reload of a protected page.
    pub fn decide(&self, status: &SessionStatus, path: &str) -> GuardOutcome {
        const PUBLIC: &RouteAccess = &RouteAccess::Any;
        let access = self.table.rule_for(path).map_or(PUBLIC, RouteRule::access);

        match status {
            SessionStatus::Pending => {
                if access.is_public() {
                    GuardOutcome::Render
                } else {
                    GuardOutcome::Pending
                }
            }
            SessionStatus::Anonymous => {
                if access.is_public() {
                    GuardOutcome::Render
                } else {
                    GuardOutcome::RedirectToLogin {
                        return_to: path.to_owned(),
                    }
                }
            }
            SessionStatus::Authenticated(user) => {
                if access.permits(user.role()) {
                    GuardOutcome::Render
                } else {
                    GuardOutcome::RedirectToUnauthorized
                }
            }
        }
    }
}
