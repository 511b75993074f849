//! Port abstraction for user persistence adapters and their errors.
use async_trait::async_trait;

use chrono::{DateTime, Utc};

use crate::domain::{EmailAddress, NewUser, PasswordDigest, StoredCredentials, User, UserId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by user repository adapters.
    pub enum UserRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}",
        /// A unique field is already taken by another account.
        Duplicate { field: String } => "{field} is already registered",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new account.
    async fn create(&self, user: &NewUser) -> Result<User, UserRepositoryError>;

    /// Fetch a user by identifier.
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, UserRepositoryError>;

    /// Fetch an account together with its password digest.
    async fn find_credentials_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<StoredCredentials>, UserRepositoryError>;

    /// Fetch the account `id` together with its password digest.
    async fn find_credentials_by_id(
        &self,
        id: UserId,
    ) -> Result<Option<StoredCredentials>, UserRepositoryError>;

    /// Persist username, email, profile image and `updated_at`.
    async fn update_profile(&self, user: &User) -> Result<(), UserRepositoryError>;

    /// Replace the stored digest of `id` and stamp `updated_at`.
    async fn update_password(
        &self,
        id: UserId,
        digest: &PasswordDigest,
        updated_at: DateTime<Utc>,
    ) -> Result<(), UserRepositoryError>;
}
