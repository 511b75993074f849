//! Driving port for account sign-up and profile edits.

use async_trait::async_trait;

use crate::domain::{Error, PasswordChange, ProfileChanges, Registration, User, UserId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserAccountCommand: Send + Sync {
    /// Create an account. Taken usernames or emails are a conflict.
    async fn register(&self, registration: Registration) -> Result<User, Error>;

    /// Apply a partial profile update for `user_id`.
    async fn update_profile(&self, user_id: UserId, changes: ProfileChanges) -> Result<User, Error>;

    /// Replace the password of `user_id` after checking the current one.
    /// A wrong current password is unauthorised.
    async fn change_password(&self, user_id: UserId, change: PasswordChange) -> Result<(), Error>;
}
