//! Account service: sign-up, login and profile management.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::debug;
use zeroize::Zeroizing;

use crate::domain::ports::{
    LoginService, UserAccountCommand, UserProfileQuery, UserRepository, UserRepositoryError,
};
use crate::domain::{
    EmailAddress, Error, FieldErrors, LoginCredentials, NewUser, PasswordChange, PasswordDigest,
    ProfileChanges, Registration, User, UserId,
};

const INVALID_CREDENTIALS: &str = "invalid credentials";

/// Service implementing the account driving ports.
#[derive(Clone)]
pub struct AccountService<U> {
    users: Arc<U>,
    clock: Arc<dyn Clock>,
}

impl<U> AccountService<U> {
    pub fn new(users: Arc<U>, clock: Arc<dyn Clock>) -> Self {
        Self { users, clock }
    }
}

impl<U: UserRepository> AccountService<U> {
    async fn find_user(&self, id: UserId) -> Result<User, Error> {
        self.users
            .find_by_id(id)
            .await
            .map_err(map_user_error)?
            .ok_or_else(|| Error::not_found(format!("user {id} not found")))
    }
}

/// Hash `password` away from the async workers; Argon2 is deliberately slow.
async fn hash_password(password: &str) -> Result<PasswordDigest, Error> {
    let password = Zeroizing::new(password.to_owned());
    tokio::task::spawn_blocking(move || PasswordDigest::hash(&password))
        .await
        .map_err(|error| Error::internal(format!("password hashing task failed: {error}")))?
        .map_err(|error| Error::internal(error.to_string()))
}

fn map_user_error(error: UserRepositoryError) -> Error {
    match error {
        UserRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("user repository unavailable: {message}"))
        }
        UserRepositoryError::Query { message } => {
            Error::internal(format!("user repository error: {message}"))
        }
        UserRepositoryError::Duplicate { field } => {
            let message = format!("{field} is already registered");
            let errors = FieldErrors::from([(field, vec![message.clone()])]);
            Error::conflict(message).with_field_errors(errors)
        }
    }
}

#[async_trait]
impl<U: UserRepository> LoginService for AccountService<U> {
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<UserId, Error> {
        let Ok(email) = EmailAddress::new(credentials.email()) else {
            return Err(Error::unauthorized(INVALID_CREDENTIALS));
        };
        let stored = self
            .users
            .find_credentials_by_email(&email)
            .await
            .map_err(map_user_error)?;
        match stored {
            Some(stored) if stored.password_digest.verify(credentials.password()) => {
                debug!(user_id = %stored.user.id, "login succeeded");
                Ok(stored.user.id)
            }
            _ => Err(Error::unauthorized(INVALID_CREDENTIALS)),
        }
    }
}

#[async_trait]
impl<U: UserRepository> UserAccountCommand for AccountService<U> {
    async fn register(&self, registration: Registration) -> Result<User, Error> {
        let record = NewUser {
            username: registration.username().clone(),
            email: registration.email().clone(),
            password_digest: hash_password(registration.password()).await?,
            created_at: self.clock.utc(),
        };
        let user = self.users.create(&record).await.map_err(map_user_error)?;
        debug!(user_id = %user.id, "user registered");
        Ok(user)
    }

    async fn update_profile(&self, user_id: UserId, changes: ProfileChanges) -> Result<User, Error> {
        let mut user = self.find_user(user_id).await?;
        if changes.is_empty() {
            return Ok(user);
        }
        changes.apply_to(&mut user, self.clock.utc());
        self.users
            .update_profile(&user)
            .await
            .map_err(map_user_error)?;
        Ok(user)
    }

    async fn change_password(&self, user_id: UserId, change: PasswordChange) -> Result<(), Error> {
        let stored = self
            .users
            .find_credentials_by_id(user_id)
            .await
            .map_err(map_user_error)?
            .ok_or_else(|| Error::not_found(format!("user {user_id} not found")))?;
        if !stored.password_digest.verify(change.current()) {
            return Err(Error::unauthorized(INVALID_CREDENTIALS));
        }
        let digest = hash_password(change.new_password()).await?;
        self.users
            .update_password(user_id, &digest, self.clock.utc())
            .await
            .map_err(map_user_error)?;
        debug!(user_id = %user_id, "password changed");
        Ok(())
    }
}

#[async_trait]
impl<U: UserRepository> UserProfileQuery for AccountService<U> {
    async fn fetch_profile(&self, user_id: UserId) -> Result<User, Error> {
        self.find_user(user_id).await
    }
}
