//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every REST handler, the request and response
//! payloads from [`crate::inbound::http::dto`], the error envelope schema,
//! and the session cookie security scheme. Swagger UI serves it in debug
//! builds and `openapi-dump` prints it for external tooling.

use crate::inbound::http::dto::{
    ImageAttachRequest, ImageResponse, LoginRequest, ManualCreateRequest, ManualPageResponse,
    ManualResponse, ManualUpdateRequest, PasswordChangeRequest, ProfileUpdateRequest,
    RegisterRequest, StepCreateRequest, StepOrderEntry, StepResponse, StepUpdateRequest, UserResponse,
};
use crate::inbound::http::schemas::{ErrorCodeSchema, ErrorSchema};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /api/v1/login.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Guideforge API",
        description = "Author step-by-step manuals: ordered steps, step images and manual search."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::users::register,
        crate::inbound::http::users::login,
        crate::inbound::http::users::logout,
        crate::inbound::http::users::current_user,
        crate::inbound::http::users::update_profile,
        crate::inbound::http::users::change_password,
        crate::inbound::http::users::my_manuals,
        crate::inbound::http::manuals::list_manuals,
        crate::inbound::http::manuals::create_manual,
        crate::inbound::http::manuals::get_manual,
        crate::inbound::http::manuals::update_manual,
        crate::inbound::http::manuals::delete_manual,
        crate::inbound::http::steps::list_steps,
        crate::inbound::http::steps::create_step,
        crate::inbound::http::steps::reorder_steps,
        crate::inbound::http::steps::update_step,
        crate::inbound::http::steps::delete_step,
        crate::inbound::http::images::attach_image,
        crate::inbound::http::images::delete_image,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ErrorSchema,
        ErrorCodeSchema,
        UserResponse,
        ManualResponse,
        ManualPageResponse,
        StepResponse,
        ImageResponse,
        RegisterRequest,
        LoginRequest,
        ProfileUpdateRequest,
        PasswordChangeRequest,
        ManualCreateRequest,
        ManualUpdateRequest,
        StepCreateRequest,
        StepUpdateRequest,
        StepOrderEntry,
        ImageAttachRequest,
    )),
    tags(
        (name = "users", description = "Accounts and sessions"),
        (name = "manuals", description = "Manual catalogue and authoring"),
        (name = "steps", description = "Ordered steps within a manual"),
        (name = "images", description = "Images attached to steps"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    //! Tests verifying the generated document.

    use super::*;
    use rstest::rstest;
    use utoipa::OpenApi;
    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::Schema;

    // Note: utoipa replaces :: with . in schema names
    const ERROR_SCHEMA_NAME: &str = "crate.domain.Error";

    /// Assert that an Object schema contains a field with the given name.
    fn assert_object_schema_has_field(schema: &RefOr<Schema>, field: &str) {
        match schema {
            RefOr::T(Schema::Object(obj)) => {
                assert!(
                    obj.properties.contains_key(field),
                    "schema should have field '{field}'"
                );
            }
            _ => panic!("expected Object schema"),
        }
    }

    #[test]
    fn error_schema_has_envelope_fields() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let error_schema = schemas.get(ERROR_SCHEMA_NAME).expect("Error schema");

        for field in ["status", "code", "message", "errors", "traceId"] {
            assert_object_schema_has_field(error_schema, field);
        }
    }

    #[rstest]
    #[case("ManualResponse", "isPublic")]
    #[case("StepResponse", "orderNumber")]
    #[case("ImageResponse", "mimeType")]
    #[case("UserResponse", "profileImage")]
    #[case("PasswordChangeRequest", "currentPassword")]
    fn payload_schemas_use_camel_case(#[case] name: &str, #[case] field: &str) {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let schema = schemas.get(name).expect("schema registered");
        assert_object_schema_has_field(schema, field);
    }

    #[rstest]
    #[case("/api/v1/manuals")]
    #[case("/api/v1/manuals/{id}/steps/order")]
    #[case("/api/v1/steps/{id}/images")]
    #[case("/api/v1/users/me/manuals")]
    #[case("/api/v1/users/me/password")]
    #[case("/health/ready")]
    fn documents_paths(#[case] path: &str) {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key(path), "missing {path}");
    }

    #[test]
    fn session_cookie_scheme_is_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("SessionCookie"));
    }
}
