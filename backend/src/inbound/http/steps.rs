//! Step HTTP handlers.
//!
//! ```text
//! GET    /api/v1/manuals/{id}/steps
//! POST   /api/v1/manuals/{id}/steps        {"title":"Unbox","orderNumber":2}
//! PUT    /api/v1/manuals/{id}/steps/order  [{"id":7,"orderNumber":1}, ...]
//! PUT    /api/v1/steps/{id}                {"orderNumber":3}
//! DELETE /api/v1/steps/{id}
//! ```
//!
//! Every positional change keeps a manual's order numbers contiguous from 1;
//! the response to a move or bulk reorder reflects the committed sequence.

use actix_web::{HttpResponse, delete, get, post, put, web};

use crate::domain::{ManualId, Step, StepId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::dto::{
    StepCreateRequest, StepOrderEntry, StepResponse, StepUpdateRequest, path_id,
    step_order_updates,
};
use crate::inbound::http::envelope;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

fn step_list(steps: Vec<Step>) -> Vec<StepResponse> {
    steps.into_iter().map(StepResponse::from).collect()
}

/// List a manual's steps in order, each with its images.
#[utoipa::path(
    get,
    path = "/api/v1/manuals/{id}/steps",
    params(("id" = i64, Path, description = "Manual id")),
    responses(
        (status = 200, description = "Ordered steps", body = [StepResponse]),
        (status = 403, description = "Private manual of another user", body = ErrorSchema),
        (status = 404, description = "Unknown manual", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["steps"],
    operation_id = "listSteps",
    security([])
)]
#[get("/manuals/{id}/steps")]
pub async fn list_steps(
    state: web::Data<HttpState>,
    session: SessionContext,
    id: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    let manual_id: ManualId = path_id(id.into_inner())?;
    let steps = state.steps.list_steps(session.user_id()?, manual_id).await?;
    Ok(envelope::ok(step_list(steps)))
}

/// Insert a step. Without `orderNumber` (or with `0`) it is appended.
#[utoipa::path(
    post,
    path = "/api/v1/manuals/{id}/steps",
    params(("id" = i64, Path, description = "Manual id")),
    request_body = StepCreateRequest,
    responses(
        (status = 201, description = "Step created", body = StepResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Not the owner", body = ErrorSchema),
        (status = 404, description = "Unknown manual", body = ErrorSchema),
        (status = 409, description = "Concurrent edits kept conflicting", body = ErrorSchema),
        (status = 422, description = "Position past the end of the manual", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["steps"],
    operation_id = "createStep"
)]
#[post("/manuals/{id}/steps")]
pub async fn create_step(
    state: web::Data<HttpState>,
    session: SessionContext,
    id: web::Path<i64>,
    payload: web::Json<StepCreateRequest>,
) -> ApiResult<HttpResponse> {
    let actor = session.require_user_id()?;
    let manual_id: ManualId = path_id(id.into_inner())?;
    let step = state
        .steps
        .create_step(actor, manual_id, payload.into_inner().into())
        .await?;
    Ok(envelope::created(StepResponse::from(step)))
}

/// Assign every step of a manual a new position in one operation.
///
/// The payload must name each step exactly once and use each position in
/// `1..=N` exactly once.
#[utoipa::path(
    put,
    path = "/api/v1/manuals/{id}/steps/order",
    params(("id" = i64, Path, description = "Manual id")),
    request_body = [StepOrderEntry],
    responses(
        (status = 200, description = "Steps in their new order", body = [StepResponse]),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Not the owner", body = ErrorSchema),
        (status = 404, description = "Unknown manual or step", body = ErrorSchema),
        (status = 409, description = "Not a permutation of the current steps", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["steps"],
    operation_id = "reorderSteps"
)]
#[put("/manuals/{id}/steps/order")]
pub async fn reorder_steps(
    state: web::Data<HttpState>,
    session: SessionContext,
    id: web::Path<i64>,
    payload: web::Json<Vec<StepOrderEntry>>,
) -> ApiResult<HttpResponse> {
    let actor = session.require_user_id()?;
    let manual_id: ManualId = path_id(id.into_inner())?;
    let updates = step_order_updates(payload.into_inner())?;
    let steps = state
        .steps
        .reorder_steps(actor, manual_id, updates)
        .await?;
    Ok(envelope::ok(step_list(steps)))
}

/// Update a step's text and optionally move it.
#[utoipa::path(
    put,
    path = "/api/v1/steps/{id}",
    params(("id" = i64, Path, description = "Step id")),
    request_body = StepUpdateRequest,
    responses(
        (status = 200, description = "Updated step", body = StepResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Not the owner", body = ErrorSchema),
        (status = 404, description = "Unknown step", body = ErrorSchema),
        (status = 409, description = "Concurrent edits kept conflicting", body = ErrorSchema),
        (status = 422, description = "Position outside the manual", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["steps"],
    operation_id = "updateStep"
)]
#[put("/steps/{id}")]
pub async fn update_step(
    state: web::Data<HttpState>,
    session: SessionContext,
    id: web::Path<i64>,
    payload: web::Json<StepUpdateRequest>,
) -> ApiResult<HttpResponse> {
    let actor = session.require_user_id()?;
    let step_id: StepId = path_id(id.into_inner())?;
    let step = state
        .steps
        .update_step(actor, step_id, payload.into_inner().into())
        .await?;
    Ok(envelope::ok(StepResponse::from(step)))
}

/// Delete a step and close the gap it leaves.
#[utoipa::path(
    delete,
    path = "/api/v1/steps/{id}",
    params(("id" = i64, Path, description = "Step id")),
    responses(
        (status = 200, description = "Step deleted"),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Not the owner", body = ErrorSchema),
        (status = 404, description = "Unknown step", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["steps"],
    operation_id = "deleteStep"
)]
#[delete("/steps/{id}")]
pub async fn delete_step(
    state: web::Data<HttpState>,
    session: SessionContext,
    id: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    let actor = session.require_user_id()?;
    let step_id: StepId = path_id(id.into_inner())?;
    state.steps.delete_step(actor, step_id).await?;
    Ok(envelope::message("Step deleted"))
}

#[cfg(test)]
#[path = "steps_tests.rs"]
mod tests;
