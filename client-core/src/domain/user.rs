//! User identity model.
//!
//! Keep inbound payload parsing outside the consuming pages by exposing
//! constructors that validate string inputs before they reach the session
//! store or the identity-service port.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Validation errors returned by the user model constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    /// User id was empty.
    EmptyId,
    /// User id carried leading or trailing whitespace.
    PaddedId,
    /// Email was missing or blank once trimmed.
    EmptyEmail,
    /// Email failed the structural check.
    InvalidEmail,
    /// Display name was missing or blank once trimmed.
    EmptyDisplayName,
    /// Display name was shorter than the allowed minimum.
    DisplayNameTooShort {
        /// Minimum number of characters.
        min: usize,
    },
    /// Display name was longer than the allowed maximum.
    DisplayNameTooLong {
        /// Maximum number of characters.
        max: usize,
    },
    /// Display name contained characters outside the allowed set.
    DisplayNameInvalidCharacters,
}

impl fmt::Display for UserValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyId => write!(f, "user id must not be empty"),
            Self::PaddedId => write!(f, "user id must not carry surrounding whitespace"),
            Self::EmptyEmail => write!(f, "email must not be empty"),
            Self::InvalidEmail => write!(f, "email must look like name@domain.tld"),
            Self::EmptyDisplayName => write!(f, "display name must not be empty"),
            Self::DisplayNameTooShort { min } => {
                write!(f, "display name must be at least {min} characters")
            }
            Self::DisplayNameTooLong { max } => {
                write!(f, "display name must be at most {max} characters")
            }
            Self::DisplayNameInvalidCharacters => write!(
                f,
                "display name may only contain letters, numbers, spaces, underscores, hyphens, or apostrophes",
            ),
        }
    }
}

impl std::error::Error for UserValidationError {}

/// Opaque user identifier issued by the identity service.
///
/// The id is never interpreted by this core; it only has to be non-empty
/// and free of surrounding whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Validate and construct a [`UserId`] from borrowed input.
    pub fn new(id: impl AsRef<str>) -> Result<Self, UserValidationError> {
        Self::from_owned(id.as_ref().to_owned())
    }

    /// Generate a new random [`UserId`].
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    fn from_owned(id: String) -> Result<Self, UserValidationError> {
        if id.is_empty() {
            return Err(UserValidationError::EmptyId);
        }
        if id.trim() != id {
            return Err(UserValidationError::PaddedId);
        }
        Ok(Self(id))
    }

    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        value.0
    }
}

impl TryFrom<String> for UserId {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        // Structural shape only; deliverability is the identity service's
        // problem.
        let pattern = r"^[^@\s]+@[^@\s]+\.[^@\s]+$";
        Regex::new(pattern)
            .unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

/// Email address, trimmed and lower-cased on construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Validate and construct an [`EmailAddress`] from borrowed input.
    pub fn new(email: impl AsRef<str>) -> Result<Self, UserValidationError> {
        Self::from_owned(email.as_ref().to_owned())
    }

    fn from_owned(email: String) -> Result<Self, UserValidationError> {
        let normalized = email.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(UserValidationError::EmptyEmail);
        }
        if !email_regex().is_match(&normalized) {
            return Err(UserValidationError::InvalidEmail);
        }
        Ok(Self(normalized))
    }

    /// Borrow the normalised address.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// Minimum allowed length for a display name.
pub const DISPLAY_NAME_MIN: usize = 2;
/// Maximum allowed length for a display name.
pub const DISPLAY_NAME_MAX: usize = 64;

static DISPLAY_NAME_RE: OnceLock<Regex> = OnceLock::new();

fn display_name_regex() -> &'static Regex {
    DISPLAY_NAME_RE.get_or_init(|| {
        // Length is enforced separately; this regex constrains allowed characters.
        let pattern = "^[A-Za-z0-9_' -]+$";
        Regex::new(pattern)
            .unwrap_or_else(|error| panic!("display name regex failed to compile: {error}"))
    })
}

/// Human readable display name for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DisplayName(String);

impl DisplayName {
    /// Validate and construct a [`DisplayName`] from owned input.
    pub fn new(display_name: impl Into<String>) -> Result<Self, UserValidationError> {
        Self::from_owned(display_name.into())
    }

    fn from_owned(display_name: String) -> Result<Self, UserValidationError> {
        if display_name.trim().is_empty() {
            return Err(UserValidationError::EmptyDisplayName);
        }

        let length = display_name.chars().count();
        if length < DISPLAY_NAME_MIN {
            return Err(UserValidationError::DisplayNameTooShort {
                min: DISPLAY_NAME_MIN,
            });
        }
        if length > DISPLAY_NAME_MAX {
            return Err(UserValidationError::DisplayNameTooLong {
                max: DISPLAY_NAME_MAX,
            });
        }

        if !display_name_regex().is_match(&display_name) {
            return Err(UserValidationError::DisplayNameInvalidCharacters);
        }

        Ok(Self(display_name))
    }
}

impl AsRef<str> for DisplayName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<DisplayName> for String {
    fn from(value: DisplayName) -> Self {
        value.0
    }
}

impl TryFrom<String> for DisplayName {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// Role held by an authenticated user, driving route authorization.
///
/// # Examples
///
/// ```
/// # use client_core::domain::Role;
/// assert_eq!(Role::default(), Role::Student);
/// assert_eq!(Role::Instructor.as_str(), "instructor");
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Learner enrolled in courses.
    #[default]
    Student,
    /// Course author and cohort lead.
    Instructor,
    /// Platform administrator.
    Admin,
    /// Enterprise account manager.
    Enterprise,
}

impl Role {
    /// Returns the stable string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Instructor => "instructor",
            Self::Admin => "admin",
            Self::Enterprise => "enterprise",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown role string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRoleError {
    /// The unrecognised input value.
    pub input: String,
}

impl fmt::Display for ParseRoleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown role: {}", self.input)
    }
}

impl std::error::Error for ParseRoleError {}

impl std::str::FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Self::Student),
            "instructor" => Ok(Self::Instructor),
            "admin" => Ok(Self::Admin),
            "enterprise" => Ok(Self::Enterprise),
            _ => Err(ParseRoleError {
                input: s.to_owned(),
            }),
        }
    }
}

/// Billing tier attached to the account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionTier {
    /// Free tier.
    #[default]
    Basic,
    /// Individual paid tier.
    Pro,
    /// Organisation-wide tier.
    Enterprise,
}

impl SubscriptionTier {
    /// Returns the stable string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Pro => "pro",
            Self::Enterprise => "enterprise",
        }
    }
}

impl fmt::Display for SubscriptionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown subscription tier string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseSubscriptionTierError {
    /// The unrecognised input value.
    pub input: String,
}

impl fmt::Display for ParseSubscriptionTierError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown subscription tier: {}", self.input)
    }
}

impl std::error::Error for ParseSubscriptionTierError {}

impl std::str::FromStr for SubscriptionTier {
    type Err = ParseSubscriptionTierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "basic" => Ok(Self::Basic),
            "pro" => Ok(Self::Pro),
            "enterprise" => Ok(Self::Enterprise),
            _ => Err(ParseSubscriptionTierError {
                input: s.to_owned(),
            }),
        }
    }
}

/// Authenticated platform user.
///
/// Owned exclusively by the session store; immutable except through
/// [`User::with_update`], which the store applies on behalf of
/// `update_user`.
///
/// ## Invariants
/// - `id` is non-empty with no surrounding whitespace.
/// - `email` is normalised and structurally valid.
/// - `display_name` satisfies the length and character rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "UserDto", into = "UserDto")]
pub struct User {
    id: UserId,
    display_name: DisplayName,
    email: EmailAddress,
    role: Role,
    subscription_tier: SubscriptionTier,
}

impl User {
    /// Build a new [`User`] from validated components.
    pub fn new(
        id: UserId,
        display_name: DisplayName,
        email: EmailAddress,
        role: Role,
        subscription_tier: SubscriptionTier,
    ) -> Self {
        Self {
            id,
            display_name,
            email,
            role,
            subscription_tier,
        }
    }

    /// Fallible constructor enforcing every component invariant.
    ///
    /// Prefer [`User::new`] when components are already validated.
    pub fn try_from_strings(
        id: impl AsRef<str>,
        display_name: impl Into<String>,
        email: impl AsRef<str>,
        role: Role,
        subscription_tier: SubscriptionTier,
    ) -> Result<Self, UserValidationError> {
        let id = UserId::new(id)?;
        let display_name = DisplayName::new(display_name)?;
        let email = EmailAddress::new(email)?;

        Ok(Self::new(id, display_name, email, role, subscription_tier))
    }

    /// Stable user identifier.
    pub fn id(&self) -> &UserId {
        &self.id
    }

    /// Display name shown to other users.
    pub fn display_name(&self) -> &DisplayName {
        &self.display_name
    }

    /// Normalised account email.
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Authorization role.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Billing tier.
    pub fn subscription_tier(&self) -> SubscriptionTier {
        self.subscription_tier
    }

    /// Return a copy with the update's populated fields merged in.
    ///
    /// Role is deliberately not part of [`UserUpdate`]: the client must not
    /// fabricate an authorization change the identity service never granted.
    pub fn with_update(&self, update: UserUpdate) -> Self {
        let mut merged = self.clone();
        if let Some(display_name) = update.display_name {
            merged.display_name = display_name;
        }
        if let Some(email) = update.email {
            merged.email = email;
        }
        if let Some(subscription_tier) = update.subscription_tier {
            merged.subscription_tier = subscription_tier;
        }
        merged
    }
}

/// Partial update applied to the current user via the session store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserUpdate {
    /// Replacement display name, if any.
    pub display_name: Option<DisplayName>,
    /// Replacement email, if any.
    pub email: Option<EmailAddress>,
    /// Replacement subscription tier, if any.
    pub subscription_tier: Option<SubscriptionTier>,
}

impl UserUpdate {
    /// True when the update carries no changes.
    pub fn is_empty(&self) -> bool {
        self.display_name.is_none() && self.email.is_none() && self.subscription_tier.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct UserDto {
    id: String,
    display_name: String,
    email: String,
    role: Role,
    subscription_tier: SubscriptionTier,
}

impl From<User> for UserDto {
    fn from(value: User) -> Self {
        let User {
            id,
            display_name,
            email,
            role,
            subscription_tier,
        } = value;
        Self {
            id: id.into(),
            display_name: display_name.into(),
            email: email.into(),
            role,
            subscription_tier,
        }
    }
}

impl TryFrom<UserDto> for User {
    type Error = UserValidationError;

    fn try_from(value: UserDto) -> Result<Self, Self::Error> {
        User::try_from_strings(
            value.id,
            value.display_name,
            value.email,
            value.role,
            value.subscription_tier,
        )
    }
}
