//! Request and response payloads for the REST surface.
//!
//! Field names are camelCase on the wire. Responses are built from domain
//! values; requests convert into domain inputs, reporting malformed values
//! through the shared validation envelope.

use chrono::{DateTime, Utc};
use pagination::PageRequest;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{
    Error, IdValidationError, Image, ImageUpload, Manual, ManualChanges, ManualDraft, ManualSearch, Step,
    StepChanges, StepDraft, StepId, StepOrderUpdate, User, ValidationError, Visibility,
};

/// Convert a path segment into an entity id.
///
/// Ids start at 1, so a non-positive segment cannot name an existing entity
/// and is reported as `not_found`.
pub fn path_id<T>(raw: i64) -> Result<T, Error>
where
    T: TryFrom<i64, Error = IdValidationError>,
{
    T::try_from(raw).map_err(|err| Error::not_found(err.to_string()))
}

/// Image metadata as returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageResponse {
    pub id: i64,
    pub step_id: i64,
    pub file_path: String,
    pub file_name: String,
    pub file_size: i64,
    pub mime_type: String,
    pub created_at: DateTime<Utc>,
}

impl From<Image> for ImageResponse {
    fn from(value: Image) -> Self {
        Self {
            id: value.id.get(),
            step_id: value.step_id.get(),
            file_path: value.file_path,
            file_name: value.file_name,
            file_size: value.file_size,
            mime_type: value.mime_type,
            created_at: value.created_at,
        }
    }
}

/// Step as returned to clients. `images` is omitted when not loaded.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StepResponse {
    pub id: i64,
    pub manual_id: i64,
    pub order_number: u32,
    pub title: String,
    pub content: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<ImageResponse>>,
}

impl From<Step> for StepResponse {
    fn from(value: Step) -> Self {
        Self {
            id: value.id.get(),
            manual_id: value.manual_id.get(),
            order_number: value.order_number,
            title: value.title,
            content: value.content,
            created_at: value.created_at,
            updated_at: value.updated_at,
            images: value
                .images
                .into_loaded()
                .map(|images| images.into_iter().map(ImageResponse::from).collect()),
        }
    }
}

/// Manual as returned to clients. `steps` is omitted when not loaded.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ManualResponse {
    pub id: i64,
    pub owner_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steps: Option<Vec<StepResponse>>,
}

impl From<Manual> for ManualResponse {
    fn from(value: Manual) -> Self {
        Self {
            id: value.id.get(),
            owner_id: value.owner_id.get(),
            title: value.title,
            description: value.description,
            category: value.category,
            is_public: value.visibility.is_public(),
            created_at: value.created_at,
            updated_at: value.updated_at,
            steps: value
                .steps
                .into_loaded()
                .map(|steps| steps.into_iter().map(StepResponse::from).collect()),
        }
    }
}

/// Account profile. The password digest never leaves the server.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub profile_image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(value: User) -> Self {
        Self {
            id: value.id.get(),
            username: value.username.into(),
            email: value.email.into(),
            profile_image: value.profile_image,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

/// Paginated manual listing.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ManualPageResponse {
    pub items: Vec<ManualResponse>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u64,
}

impl From<pagination::Page<Manual>> for ManualPageResponse {
    fn from(value: pagination::Page<Manual>) -> Self {
        let page = value.map(ManualResponse::from);
        Self {
            items: page.items,
            total: page.total,
            page: page.page,
            limit: page.limit,
            total_pages: page.total_pages,
        }
    }
}

/// `POST /manuals` body.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ManualCreateRequest {
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub is_public: Option<bool>,
}

impl From<ManualCreateRequest> for ManualDraft {
    fn from(value: ManualCreateRequest) -> Self {
        Self {
            title: value.title,
            description: value.description,
            category: value.category,
            visibility: Visibility::from_is_public(value.is_public.unwrap_or(false)),
        }
    }
}

/// `PUT /manuals/{id}` body. Omitted fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ManualUpdateRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub is_public: Option<bool>,
}

impl From<ManualUpdateRequest> for ManualChanges {
    fn from(value: ManualUpdateRequest) -> Self {
        Self {
            title: value.title,
            description: value.description,
            category: value.category,
            visibility: value.is_public.map(Visibility::from_is_public),
        }
    }
}

/// `POST /manuals/{id}/steps` body. Without `orderNumber` the step is
/// appended.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StepCreateRequest {
    pub title: String,
    pub content: Option<String>,
    pub order_number: Option<i64>,
}

impl From<StepCreateRequest> for StepDraft {
    fn from(value: StepCreateRequest) -> Self {
        Self {
            title: value.title,
            content: value.content,
            order_number: value.order_number,
        }
    }
}

/// `PUT /steps/{id}` body. `orderNumber` moves the step.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StepUpdateRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub order_number: Option<i64>,
}

impl From<StepUpdateRequest> for StepChanges {
    fn from(value: StepUpdateRequest) -> Self {
        Self {
            title: value.title,
            content: value.content,
            order_number: value.order_number,
        }
    }
}

/// One entry of `PUT /manuals/{id}/steps/order`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StepOrderEntry {
    pub id: i64,
    pub order_number: i64,
}

/// Convert a bulk reorder payload, reporting the first malformed id.
pub fn step_order_updates(entries: Vec<StepOrderEntry>) -> Result<Vec<StepOrderUpdate>, Error> {
    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            let id = StepId::new(entry.id).map_err(|err| {
                Error::from(ValidationError::single(
                    &format!("steps[{index}].id"),
                    err.to_string(),
                ))
            })?;
            Ok(StepOrderUpdate {
                id,
                order_number: entry.order_number,
            })
        })
        .collect()
}

/// `POST /steps/{id}/images` body, describing a completed upload.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageAttachRequest {
    pub file_path: String,
    pub file_name: String,
    pub file_size: i64,
    pub mime_type: String,
}

impl From<ImageAttachRequest> for ImageUpload {
    fn from(value: ImageAttachRequest) -> Self {
        Self {
            file_path: value.file_path,
            file_name: value.file_name,
            file_size: value.file_size,
            mime_type: value.mime_type,
        }
    }
}

/// `POST /users` body.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// `POST /login` body.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// `PUT /users/me` body. A blank `profileImage` clears it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdateRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub profile_image: Option<String>,
}

/// `PUT /users/me/password` body.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChangeRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Query string accepted by the manual listings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct ManualSearchParams {
    /// Case-insensitive substring of the title or description.
    pub search: Option<String>,
    /// Exact category.
    pub category: Option<String>,
    /// Restrict to public (`true`) or private (`false`) manuals.
    pub is_public: Option<bool>,
    /// 1-based page, default 1.
    pub page: Option<i64>,
    /// Page size, default 10, at most 100.
    pub limit: Option<i64>,
    /// `title`, `createdAt` or `updatedAt` (default).
    pub sort_by: Option<String>,
    /// `asc` or `desc` (default).
    pub sort_order: Option<String>,
}

impl TryFrom<ManualSearchParams> for ManualSearch {
    type Error = Error;

    fn try_from(value: ManualSearchParams) -> Result<Self, Self::Error> {
        let page = PageRequest::new(value.page, value.limit)
            .map_err(|err| ValidationError::single(err.field(), err.to_string()))?;
        let sort_by = value
            .sort_by
            .as_deref()
            .map(str::parse)
            .transpose()?
            .unwrap_or_default();
        let sort_order = value
            .sort_order
            .as_deref()
            .map(str::parse)
            .transpose()?
            .unwrap_or_default();
        Ok(Self {
            search: value.search,
            category: value.category,
            visibility: value.is_public.map(Visibility::from_is_public),
            page,
            sort_by,
            sort_order,
        })
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::{ErrorCode, SortField, SortOrder};
    use rstest::rstest;

    #[rstest]
    fn search_params_apply_defaults() {
        let search = ManualSearch::try_from(ManualSearchParams::default()).expect("defaults");
        assert_eq!(search.page, PageRequest::default());
        assert_eq!(search.sort_by, SortField::UpdatedAt);
        assert_eq!(search.sort_order, SortOrder::Desc);
        assert!(search.visibility.is_none());
    }

    #[rstest]
    fn search_params_parse_sorting_and_visibility() {
        let search = ManualSearch::try_from(ManualSearchParams {
            is_public: Some(true),
            sort_by: Some("title".to_owned()),
            sort_order: Some("asc".to_owned()),
            page: Some(3),
            limit: Some(10),
            ..ManualSearchParams::default()
        })
        .expect("valid params");
        assert_eq!(search.sort_by, SortField::Title);
        assert_eq!(search.sort_order, SortOrder::Asc);
        assert_eq!(search.visibility, Some(Visibility::Public));
        assert_eq!(search.page.offset(), 20);
    }

    #[rstest]
    #[case(ManualSearchParams { limit: Some(0), ..ManualSearchParams::default() }, "limit")]
    #[case(ManualSearchParams { page: Some(-1), ..ManualSearchParams::default() }, "page")]
    #[case(ManualSearchParams { sort_by: Some("rating".to_owned()), ..ManualSearchParams::default() }, "sortBy")]
    #[case(ManualSearchParams { sort_order: Some("up".to_owned()), ..ManualSearchParams::default() }, "sortOrder")]
    fn malformed_params_name_the_field(#[case] params: ManualSearchParams, #[case] field: &str) {
        let error = ManualSearch::try_from(params).expect_err("rejected");
        assert_eq!(error.code(), ErrorCode::InvalidRequest);
        let fields = error.field_errors().expect("field errors");
        assert!(fields.contains_key(field), "{fields:?}");
    }

    #[rstest]
    fn reorder_entries_reject_non_positive_ids() {
        let error = step_order_updates(vec![
            StepOrderEntry { id: 4, order_number: 1 },
            StepOrderEntry { id: 0, order_number: 2 },
        ])
        .expect_err("bad id");
        let fields = error.field_errors().expect("field errors");
        assert!(fields.contains_key("steps[1].id"));
    }

    #[rstest]
    fn manuals_without_loaded_steps_omit_the_key() {
        let manual = Manual {
            id: crate::domain::ManualId::new(1).expect("id"),
            owner_id: crate::domain::UserId::new(2).expect("id"),
            title: "Onboarding".to_owned(),
            description: None,
            category: None,
            visibility: Visibility::Public,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            steps: crate::domain::Relation::NotLoaded,
        };
        let json = serde_json::to_value(ManualResponse::from(manual.clone())).expect("json");
        assert!(json.get("steps").is_none());
        assert_eq!(json["isPublic"], true);

        let json = serde_json::to_value(ManualResponse::from(manual.with_steps(Vec::new())))
            .expect("json");
        assert_eq!(json["steps"], serde_json::json!([]));
    }
}
