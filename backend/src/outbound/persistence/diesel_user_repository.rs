//! PostgreSQL-backed `UserRepository` implementation using Diesel ORM.
//!
//! Unique violations on `users_username_key` and `users_email_key` surface
//! as [`UserRepositoryError::Duplicate`] naming the clashing field, so a
//! registration race that slips past any pre-check still reports cleanly.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{UserRepository, UserRepositoryError};
use crate::domain::{EmailAddress, NewUser, PasswordDigest, StoredCredentials, User, UserId};

use super::error_mapping::{map_diesel_error, map_pool_error, unique_violation};
use super::models::{NewUserRow, UserPasswordUpdate, UserProfileUpdate, UserRow};
use super::pool::{DbPool, PoolError};
use super::schema::users;

/// Diesel-backed implementation of the `UserRepository` port.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> UserRepositoryError {
    map_pool_error(error, UserRepositoryError::connection)
}

/// Boundary field name for a unique constraint on `users`.
fn duplicate_field(constraint: &str) -> &'static str {
    match constraint {
        "users_username_key" => "username",
        _ => "email",
    }
}

fn diesel_error(error: diesel::result::Error) -> UserRepositoryError {
    if let Some(constraint) = unique_violation(&error) {
        return UserRepositoryError::duplicate(duplicate_field(constraint));
    }
    map_diesel_error(
        error,
        UserRepositoryError::query,
        UserRepositoryError::connection,
    )
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn create(&self, user: &NewUser) -> Result<User, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row = NewUserRow {
            username: user.username.as_ref(),
            email: user.email.as_ref(),
            password_digest: user.password_digest.as_str(),
            created_at: user.created_at,
            updated_at: user.created_at,
        };
        let inserted: UserRow = diesel::insert_into(users::table)
            .values(&row)
            .returning(UserRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(diesel_error)?;
        inserted.into_user().map_err(UserRepositoryError::query)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row: Option<UserRow> = users::table
            .find(id.get())
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;
        row.map(UserRow::into_user)
            .transpose()
            .map_err(UserRepositoryError::query)
    }

    async fn find_credentials_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<StoredCredentials>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row: Option<UserRow> = users::table
            .filter(users::email.eq(email.as_ref()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;
        row.map(UserRow::into_credentials)
            .transpose()
            .map_err(UserRepositoryError::query)
    }

    async fn find_credentials_by_id(
        &self,
        id: UserId,
    ) -> Result<Option<StoredCredentials>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row: Option<UserRow> = users::table
            .find(id.get())
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;
        row.map(UserRow::into_credentials)
            .transpose()
            .map_err(UserRepositoryError::query)
    }

    async fn update_profile(&self, user: &User) -> Result<(), UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let changes = UserProfileUpdate {
            username: user.username.as_ref(),
            email: user.email.as_ref(),
            profile_image: user.profile_image.as_deref(),
            updated_at: user.updated_at,
        };
        let updated = diesel::update(users::table.find(user.id.get()))
            .set(&changes)
            .execute(&mut conn)
            .await
            .map_err(diesel_error)?;
        if updated == 0 {
            return Err(UserRepositoryError::query(format!(
                "user {} no longer exists",
                user.id
            )));
        }
        Ok(())
    }

    async fn update_password(
        &self,
        id: UserId,
        digest: &PasswordDigest,
        updated_at: DateTime<Utc>,
    ) -> Result<(), UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let changes = UserPasswordUpdate {
            password_digest: digest.as_str(),
            updated_at,
        };
        let updated = diesel::update(users::table.find(id.get()))
            .set(&changes)
            .execute(&mut conn)
            .await
            .map_err(diesel_error)?;
        if updated == 0 {
            return Err(UserRepositoryError::query(format!("user {id} no longer exists")));
        }
        Ok(())
    }
}
