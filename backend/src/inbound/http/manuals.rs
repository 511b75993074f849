//! Manual HTTP handlers.
//!
//! ```text
//! GET    /api/v1/manuals?search=onboard&page=1&limit=10
//! POST   /api/v1/manuals
//! GET    /api/v1/manuals/{id}
//! PUT    /api/v1/manuals/{id}
//! DELETE /api/v1/manuals/{id}
//! ```
//!
//! Anonymous callers see public manuals only; a session widens listings to
//! the caller's private manuals as well.

use actix_web::{HttpResponse, delete, get, post, put, web};

use crate::domain::{ManualId, ManualSearch, SearchScope};
use crate::inbound::http::ApiResult;
use crate::inbound::http::dto::{
    ManualCreateRequest, ManualPageResponse, ManualResponse, ManualSearchParams,
    ManualUpdateRequest, path_id,
};
use crate::inbound::http::envelope;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Search manuals with filters, sorting and pagination.
#[utoipa::path(
    get,
    path = "/api/v1/manuals",
    params(ManualSearchParams),
    responses(
        (status = 200, description = "Page of manuals", body = ManualPageResponse),
        (status = 400, description = "Invalid query parameters", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["manuals"],
    operation_id = "listManuals",
    security([])
)]
#[get("/manuals")]
pub async fn list_manuals(
    state: web::Data<HttpState>,
    session: SessionContext,
    params: web::Query<ManualSearchParams>,
) -> ApiResult<HttpResponse> {
    let search = ManualSearch::try_from(params.into_inner())?;
    let scope = session
        .user_id()?
        .map_or(SearchScope::Public, SearchScope::Visible);
    let page = state.manuals_query.search_manuals(search, scope).await?;
    Ok(envelope::ok(ManualPageResponse::from(page)))
}

/// Create a manual owned by the caller.
#[utoipa::path(
    post,
    path = "/api/v1/manuals",
    request_body = ManualCreateRequest,
    responses(
        (status = 201, description = "Manual created", body = ManualResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["manuals"],
    operation_id = "createManual"
)]
#[post("/manuals")]
pub async fn create_manual(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<ManualCreateRequest>,
) -> ApiResult<HttpResponse> {
    let owner = session.require_user_id()?;
    let manual = state
        .manuals
        .create_manual(owner, payload.into_inner().into())
        .await?;
    Ok(envelope::created(ManualResponse::from(manual)))
}

/// Fetch a manual with its ordered steps and their images.
#[utoipa::path(
    get,
    path = "/api/v1/manuals/{id}",
    params(("id" = i64, Path, description = "Manual id")),
    responses(
        (status = 200, description = "Manual with steps", body = ManualResponse),
        (status = 403, description = "Private manual of another user", body = ErrorSchema),
        (status = 404, description = "Unknown manual", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["manuals"],
    operation_id = "getManual",
    security([])
)]
#[get("/manuals/{id}")]
pub async fn get_manual(
    state: web::Data<HttpState>,
    session: SessionContext,
    id: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    let id: ManualId = path_id(id.into_inner())?;
    let manual = state.manuals_query.get_manual(session.user_id()?, id).await?;
    Ok(envelope::ok(ManualResponse::from(manual)))
}

/// Partially update a manual's metadata.
#[utoipa::path(
    put,
    path = "/api/v1/manuals/{id}",
    params(("id" = i64, Path, description = "Manual id")),
    request_body = ManualUpdateRequest,
    responses(
        (status = 200, description = "Updated manual", body = ManualResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Not the owner", body = ErrorSchema),
        (status = 404, description = "Unknown manual", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["manuals"],
    operation_id = "updateManual"
)]
#[put("/manuals/{id}")]
pub async fn update_manual(
    state: web::Data<HttpState>,
    session: SessionContext,
    id: web::Path<i64>,
    payload: web::Json<ManualUpdateRequest>,
) -> ApiResult<HttpResponse> {
    let actor = session.require_user_id()?;
    let id: ManualId = path_id(id.into_inner())?;
    let manual = state
        .manuals
        .update_manual(actor, id, payload.into_inner().into())
        .await?;
    Ok(envelope::ok(ManualResponse::from(manual)))
}

/// Delete a manual together with its steps and images.
#[utoipa::path(
    delete,
    path = "/api/v1/manuals/{id}",
    params(("id" = i64, Path, description = "Manual id")),
    responses(
        (status = 200, description = "Manual deleted"),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Not the owner", body = ErrorSchema),
        (status = 404, description = "Unknown manual", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["manuals"],
    operation_id = "deleteManual"
)]
#[delete("/manuals/{id}")]
pub async fn delete_manual(
    state: web::Data<HttpState>,
    session: SessionContext,
    id: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    let actor = session.require_user_id()?;
    let id: ManualId = path_id(id.into_inner())?;
    state.manuals.delete_manual(actor, id).await?;
    Ok(envelope::message("Manual deleted"))
}

#[cfg(test)]
#[path = "manuals_tests.rs"]
mod tests;
