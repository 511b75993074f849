//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. Conversions into domain types re-validate
//! identifiers and ranges; a failure there means the stored data is corrupt
//! and is reported as a query error by the calling repository.

use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::domain::{
    EmailAddress, Image, ImageId, Manual, ManualId, PasswordDigest, Relation, Step, StepId,
    StoredCredentials, User, UserId, Username, Visibility,
};

use super::schema::{images, manuals, steps, users};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_digest: String,
    pub profile_image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRow {
    pub fn into_user(self) -> Result<User, String> {
        Ok(User {
            id: UserId::new(self.id).map_err(|err| err.to_string())?,
            username: Username::new(self.username).map_err(|err| err.to_string())?,
            email: EmailAddress::new(self.email).map_err(|err| err.to_string())?,
            profile_image: self.profile_image,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }

    pub fn into_credentials(mut self) -> Result<StoredCredentials, String> {
        let digest = PasswordDigest::from_stored(std::mem::take(&mut self.password_digest));
        Ok(StoredCredentials {
            user: self.into_user()?,
            password_digest: digest,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password_digest: &'a str,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = users)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct UserProfileUpdate<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub profile_image: Option<&'a str>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = users)]
pub(crate) struct UserPasswordUpdate<'a> {
    pub password_digest: &'a str,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = manuals)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ManualRow {
    pub id: i64,
    pub owner_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ManualRow {
    pub fn into_manual(self) -> Result<Manual, String> {
        Ok(Manual {
            id: ManualId::new(self.id).map_err(|err| err.to_string())?,
            owner_id: UserId::new(self.owner_id).map_err(|err| err.to_string())?,
            title: self.title,
            description: self.description,
            category: self.category,
            visibility: Visibility::from_is_public(self.is_public),
            created_at: self.created_at,
            updated_at: self.updated_at,
            steps: Relation::NotLoaded,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = manuals)]
pub(crate) struct NewManualRow<'a> {
    pub owner_id: i64,
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub category: Option<&'a str>,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = manuals)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct ManualUpdate<'a> {
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub category: Option<&'a str>,
    pub is_public: bool,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = steps)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct StepRow {
    pub id: i64,
    pub manual_id: i64,
    pub order_number: i32,
    pub title: String,
    pub content: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StepRow {
    pub fn into_step(self) -> Result<Step, String> {
        Ok(Step {
            id: StepId::new(self.id).map_err(|err| err.to_string())?,
            manual_id: ManualId::new(self.manual_id).map_err(|err| err.to_string())?,
            order_number: u32::try_from(self.order_number)
                .map_err(|_| format!("step {} has negative order number", self.id))?,
            title: self.title,
            content: self.content,
            created_at: self.created_at,
            updated_at: self.updated_at,
            images: Relation::NotLoaded,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = steps)]
pub(crate) struct NewStepRow<'a> {
    pub manual_id: i64,
    pub order_number: i32,
    pub title: &'a str,
    pub content: Option<&'a str>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = steps)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct StepContentUpdate<'a> {
    pub title: &'a str,
    pub content: Option<&'a str>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = images)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ImageRow {
    pub id: i64,
    pub step_id: i64,
    pub file_path: String,
    pub file_name: String,
    pub file_size: i64,
    pub mime_type: String,
    pub created_at: DateTime<Utc>,
}

impl ImageRow {
    pub fn into_image(self) -> Result<Image, String> {
        Ok(Image {
            id: ImageId::new(self.id).map_err(|err| err.to_string())?,
            step_id: StepId::new(self.step_id).map_err(|err| err.to_string())?,
            file_path: self.file_path,
            file_name: self.file_name,
            file_size: self.file_size,
            mime_type: self.mime_type,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = images)]
pub(crate) struct NewImageRow<'a> {
    pub step_id: i64,
    pub file_path: &'a str,
    pub file_name: &'a str,
    pub file_size: i64,
    pub mime_type: &'a str,
    pub created_at: DateTime<Utc>,
}

/// Convert every row or fail on the first corrupt one.
pub(crate) fn collect_rows<R, T>(
    rows: Vec<R>,
    convert: impl Fn(R) -> Result<T, String>,
) -> Result<Vec<T>, String> {
    rows.into_iter().map(convert).collect()
}
