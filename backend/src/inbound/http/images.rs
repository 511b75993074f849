//! Step image HTTP handlers.
//!
//! ```text
//! POST   /api/v1/steps/{id}/images  {"filePath":"...","fileName":"...","fileSize":1024,"mimeType":"image/png"}
//! DELETE /api/v1/images/{id}
//! ```
//!
//! Uploads are stored by the file-storage collaborator first; these
//! endpoints only record or drop the resulting metadata. Deleting an image
//! also removes its stored file.

use actix_web::{HttpResponse, delete, post, web};

use crate::domain::{ImageId, StepId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::dto::{ImageAttachRequest, ImageResponse, path_id};
use crate::inbound::http::envelope;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Attach uploaded image metadata to a step.
#[utoipa::path(
    post,
    path = "/api/v1/steps/{id}/images",
    params(("id" = i64, Path, description = "Step id")),
    request_body = ImageAttachRequest,
    responses(
        (status = 201, description = "Image attached", body = ImageResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Not the owner", body = ErrorSchema),
        (status = 404, description = "Unknown step", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["images"],
    operation_id = "attachImage"
)]
#[post("/steps/{id}/images")]
pub async fn attach_image(
    state: web::Data<HttpState>,
    session: SessionContext,
    id: web::Path<i64>,
    payload: web::Json<ImageAttachRequest>,
) -> ApiResult<HttpResponse> {
    let actor = session.require_user_id()?;
    let step_id: StepId = path_id(id.into_inner())?;
    let image = state
        .images
        .attach_image(actor, step_id, payload.into_inner().into())
        .await?;
    Ok(envelope::created(ImageResponse::from(image)))
}

/// Delete an image and its stored file.
#[utoipa::path(
    delete,
    path = "/api/v1/images/{id}",
    params(("id" = i64, Path, description = "Image id")),
    responses(
        (status = 200, description = "Image deleted"),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Not the owner", body = ErrorSchema),
        (status = 404, description = "Unknown image", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["images"],
    operation_id = "deleteImage"
)]
#[delete("/images/{id}")]
pub async fn delete_image(
    state: web::Data<HttpState>,
    session: SessionContext,
    id: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    let actor = session.require_user_id()?;
    let image_id: ImageId = path_id(id.into_inner())?;
    state.images.delete_image(actor, image_id).await?;
    Ok(envelope::message("Image deleted"))
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use actix_web::test as actix_test;
    use rstest::rstest;
    use serde_json::{Value, json};

    use crate::inbound::http::test_utils::{
        call_json, create_manual, create_step, memory_state, register_and_login, test_app,
    };

    fn upload() -> Value {
        json!({
            "filePath": "uploads/7/shot.png",
            "fileName": "shot.png",
            "fileSize": 2048,
            "mimeType": "image/png",
        })
    }

    #[actix_web::test]
    async fn attached_images_show_up_on_the_manual() {
        let app = actix_test::init_service(test_app(memory_state())).await;
        let cookie = register_and_login(&app, "ada").await;
        let manual_id = create_manual(&app, &cookie, json!({"title": "Guide"})).await;
        let step_id = create_step(&app, &cookie, manual_id, "a").await;

        let (status, body) = call_json(
            &app,
            actix_test::TestRequest::post()
                .uri(&format!("/api/v1/steps/{step_id}/images"))
                .cookie(cookie.clone())
                .set_json(upload()),
        )
        .await;
        assert_eq!(status, 201, "{body}");
        assert_eq!(body["data"]["stepId"], step_id);
        let image_id = body["data"]["id"].as_i64().expect("image id");

        let (_, body) = call_json(
            &app,
            actix_test::TestRequest::get()
                .uri(&format!("/api/v1/manuals/{manual_id}"))
                .cookie(cookie.clone()),
        )
        .await;
        assert_eq!(body["data"]["steps"][0]["images"][0]["id"], image_id);

        let (status, _) = call_json(
            &app,
            actix_test::TestRequest::delete()
                .uri(&format!("/api/v1/images/{image_id}"))
                .cookie(cookie.clone()),
        )
        .await;
        assert_eq!(status, 200);

        let (status, _) = call_json(
            &app,
            actix_test::TestRequest::delete()
                .uri(&format!("/api/v1/images/{image_id}"))
                .cookie(cookie),
        )
        .await;
        assert_eq!(status, 404);
    }

    #[rstest]
    #[case("mimeType", json!("application/pdf"))]
    #[case("fileSize", json!(0))]
    #[case("fileName", json!(" "))]
    #[actix_web::test]
    async fn invalid_metadata_is_a_field_error(#[case] field: &str, #[case] value: Value) {
        let app = actix_test::init_service(test_app(memory_state())).await;
        let cookie = register_and_login(&app, "ada").await;
        let manual_id = create_manual(&app, &cookie, json!({"title": "Guide"})).await;
        let step_id = create_step(&app, &cookie, manual_id, "a").await;
        let mut payload = upload();
        payload[field] = value;

        let (status, body) = call_json(
            &app,
            actix_test::TestRequest::post()
                .uri(&format!("/api/v1/steps/{step_id}/images"))
                .cookie(cookie)
                .set_json(payload),
        )
        .await;
        assert_eq!(status, 400);
        assert!(body["errors"].get(field).is_some(), "{body}");
    }

    #[actix_web::test]
    async fn attaching_to_another_users_step_is_forbidden() {
        let app = actix_test::init_service(test_app(memory_state())).await;
        let ada = register_and_login(&app, "ada").await;
        let grace = register_and_login(&app, "grace").await;
        let manual_id = create_manual(&app, &ada, json!({"title": "Guide"})).await;
        let step_id = create_step(&app, &ada, manual_id, "a").await;

        let (status, _) = call_json(
            &app,
            actix_test::TestRequest::post()
                .uri(&format!("/api/v1/steps/{step_id}/images"))
                .cookie(grace)
                .set_json(upload()),
        )
        .await;
        assert_eq!(status, 403);
    }
}
