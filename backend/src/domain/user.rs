//! User account model.
//!
//! Accounts own manuals. The domain keeps validated value types for the
//! username and email so adapters cannot persist malformed identities.

use std::fmt;
use std::sync::OnceLock;

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use super::UserId;

/// Minimum allowed length for a username.
pub const USERNAME_MIN: usize = 3;
/// Maximum allowed length for a username.
pub const USERNAME_MAX: usize = 100;
/// Maximum allowed length for an email address.
pub const EMAIL_MAX: usize = 255;
/// Minimum allowed password length.
pub const PASSWORD_MIN: usize = 8;

/// Validation errors returned when building account values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    EmptyUsername,
    UsernameTooShort { min: usize },
    UsernameTooLong { max: usize },
    UsernameInvalidCharacters,
    EmptyEmail,
    InvalidEmail,
    PasswordTooShort { min: usize },
    EmptyCurrentPassword,
    NewPasswordTooShort { min: usize },
}

impl UserValidationError {
    /// Boundary field the error belongs to.
    pub const fn field(&self) -> &'static str {
        match self {
            Self::EmptyUsername
            | Self::UsernameTooShort { .. }
            | Self::UsernameTooLong { .. }
            | Self::UsernameInvalidCharacters => "username",
            Self::EmptyEmail | Self::InvalidEmail => "email",
            Self::PasswordTooShort { .. } => "password",
            Self::EmptyCurrentPassword => "currentPassword",
            Self::NewPasswordTooShort { .. } => "newPassword",
        }
    }
}

impl fmt::Display for UserValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyUsername => write!(f, "username must not be empty"),
            Self::UsernameTooShort { min } => {
                write!(f, "username must be at least {min} characters")
            }
            Self::UsernameTooLong { max } => {
                write!(f, "username must be at most {max} characters")
            }
            Self::UsernameInvalidCharacters => write!(
                f,
                "username may only contain letters, numbers, dots, hyphens, or underscores",
            ),
            Self::EmptyEmail => write!(f, "email must not be empty"),
            Self::InvalidEmail => write!(f, "email must be a valid address"),
            Self::PasswordTooShort { min } => {
                write!(f, "password must be at least {min} characters")
            }
            Self::EmptyCurrentPassword => write!(f, "current password is required"),
            Self::NewPasswordTooShort { min } => {
                write!(f, "new password must be at least {min} characters")
            }
        }
    }
}

impl std::error::Error for UserValidationError {}

static USERNAME_RE: OnceLock<Regex> = OnceLock::new();
static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn username_regex() -> &'static Regex {
    USERNAME_RE.get_or_init(|| {
        // Length is enforced separately; this constrains allowed characters.
        Regex::new(r"^[A-Za-z0-9_.\-]+$")
            .unwrap_or_else(|error| panic!("username regex failed to compile: {error}"))
    })
}

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$")
            .unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

/// Unique, human-chosen account name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    /// Validate and construct a [`Username`]. Surrounding whitespace is trimmed.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let value = raw.as_ref().trim();
        if value.is_empty() {
            return Err(UserValidationError::EmptyUsername);
        }
        let length = value.chars().count();
        if length < USERNAME_MIN {
            return Err(UserValidationError::UsernameTooShort { min: USERNAME_MIN });
        }
        if length > USERNAME_MAX {
            return Err(UserValidationError::UsernameTooLong { max: USERNAME_MAX });
        }
        if !username_regex().is_match(value) {
            return Err(UserValidationError::UsernameInvalidCharacters);
        }
        Ok(Self(value.to_owned()))
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Username> for String {
    fn from(value: Username) -> Self {
        value.0
    }
}

impl TryFrom<String> for Username {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Email address, lower-cased so lookups are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Validate and normalise an email address.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let value = raw.as_ref().trim();
        if value.is_empty() {
            return Err(UserValidationError::EmptyEmail);
        }
        if value.len() > EMAIL_MAX || !email_regex().is_match(value) {
            return Err(UserValidationError::InvalidEmail);
        }
        Ok(Self(value.to_lowercase()))
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
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
        Self::new(value)
    }
}

/// Registered account as exposed to the rest of the system.
///
/// The password digest never leaves the persistence adapter through this
/// type; see [`StoredCredentials`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub username: Username,
    pub email: EmailAddress,
    pub profile_image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Account row paired with its password digest, used only for login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCredentials {
    pub user: User,
    pub password_digest: PasswordDigest,
}

/// Validated sign-up request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    username: Username,
    email: EmailAddress,
    password: Zeroizing<String>,
}

impl Registration {
    /// Validate raw sign-up fields.
    pub fn try_from_parts(
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<Self, UserValidationError> {
        let username = Username::new(username)?;
        let email = EmailAddress::new(email)?;
        if !long_enough(password) {
            return Err(UserValidationError::PasswordTooShort { min: PASSWORD_MIN });
        }
        Ok(Self {
            username,
            email,
            password: Zeroizing::new(password.to_owned()),
        })
    }

    pub fn username(&self) -> &Username {
        &self.username
    }

    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

fn long_enough(password: &str) -> bool {
    password.chars().count() >= PASSWORD_MIN
}

/// Validated request to replace the caller's password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordChange {
    current: Zeroizing<String>,
    new: Zeroizing<String>,
}

impl PasswordChange {
    /// Validate raw fields. The new password follows the sign-up length rule.
    pub fn try_from_parts(current: &str, new: &str) -> Result<Self, UserValidationError> {
        if current.is_empty() {
            return Err(UserValidationError::EmptyCurrentPassword);
        }
        if !long_enough(new) {
            return Err(UserValidationError::NewPasswordTooShort { min: PASSWORD_MIN });
        }
        Ok(Self {
            current: Zeroizing::new(current.to_owned()),
            new: Zeroizing::new(new.to_owned()),
        })
    }

    pub fn current(&self) -> &str {
        self.current.as_str()
    }

    pub fn new_password(&self) -> &str {
        self.new.as_str()
    }
}

/// Record handed to the user repository on sign-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: Username,
    pub email: EmailAddress,
    pub password_digest: PasswordDigest,
    pub created_at: DateTime<Utc>,
}

/// Partial profile update. `None` leaves a field untouched; a blank
/// `profile_image` clears it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProfileChanges {
    pub username: Option<Username>,
    pub email: Option<EmailAddress>,
    pub profile_image: Option<String>,
}

impl ProfileChanges {
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.email.is_none() && self.profile_image.is_none()
    }

    /// Apply the supplied fields to `user`, stamping `updated_at`.
    pub fn apply_to(&self, user: &mut User, now: DateTime<Utc>) {
        if let Some(username) = &self.username {
            user.username = username.clone();
        }
        if let Some(email) = &self.email {
            user.email = email.clone();
        }
        if let Some(image) = &self.profile_image {
            user.profile_image = super::manual::non_blank(image);
        }
        user.updated_at = now;
    }
}

/// Hashing a password failed inside the KDF.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("password hashing failed: {0}")]
pub struct PasswordHashError(String);

/// Argon2id password digest in PHC string format.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordDigest(String);

impl PasswordDigest {
    /// Hash `password` under a fresh random salt.
    pub fn hash(password: &str) -> Result<Self, PasswordHashError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| Self(hash.to_string()))
            .map_err(|error| PasswordHashError(error.to_string()))
    }

    /// Wrap a digest previously produced by [`PasswordDigest::hash`].
    pub fn from_stored(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Check `password` against the digest in constant time. Malformed
    /// digests never match.
    pub fn verify(&self, password: &str) -> bool {
        PasswordHash::new(&self.0).is_ok_and(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for PasswordDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordDigest(..)")
    }
}
