//! Account HTTP handlers.
//!
//! ```text
//! POST /api/v1/users {"username":"ada","email":"ada@example.com","password":"..."}
//! POST /api/v1/login {"email":"ada@example.com","password":"..."}
//! POST /api/v1/logout
//! GET  /api/v1/users/me
//! PUT  /api/v1/users/me
//! PUT  /api/v1/users/me/password {"currentPassword":"...","newPassword":"..."}
//! GET  /api/v1/users/me/manuals
//! ```

use actix_web::{HttpResponse, get, post, put, web};

use crate::domain::{
    EmailAddress, Error, LoginCredentials, LoginValidationError, ManualSearch, PasswordChange,
    ProfileChanges, Registration, SearchScope, UserValidationError, Username, ValidationError,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::dto::{
    LoginRequest, ManualPageResponse, ManualSearchParams, PasswordChangeRequest,
    ProfileUpdateRequest, RegisterRequest, UserResponse,
};
use crate::inbound::http::envelope;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

impl TryFrom<LoginRequest> for LoginCredentials {
    type Error = LoginValidationError;

    fn try_from(value: LoginRequest) -> Result<Self, Self::Error> {
        Self::try_from_parts(&value.email, &value.password)
    }
}

impl TryFrom<RegisterRequest> for Registration {
    type Error = UserValidationError;

    fn try_from(value: RegisterRequest) -> Result<Self, Self::Error> {
        Self::try_from_parts(&value.username, &value.email, &value.password)
    }
}

impl TryFrom<ProfileUpdateRequest> for ProfileChanges {
    type Error = UserValidationError;

    fn try_from(value: ProfileUpdateRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            username: value.username.map(Username::new).transpose()?,
            email: value.email.map(EmailAddress::new).transpose()?,
            profile_image: value.profile_image,
        })
    }
}

impl TryFrom<PasswordChangeRequest> for PasswordChange {
    type Error = UserValidationError;

    fn try_from(value: PasswordChangeRequest) -> Result<Self, Self::Error> {
        Self::try_from_parts(&value.current_password, &value.new_password)
    }
}

fn field_error(field: &str, message: String) -> Error {
    ValidationError::single(field, message).into()
}

/// Create an account.
#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = UserResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 409, description = "Username or email already registered", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "register",
    security([])
)]
#[post("/users")]
pub async fn register(
    state: web::Data<HttpState>,
    payload: web::Json<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    let registration = Registration::try_from(payload.into_inner())
        .map_err(|err| field_error(err.field(), err.to_string()))?;
    let user = state.accounts.register(registration).await?;
    Ok(envelope::created(UserResponse::from(user)))
}

/// Authenticate by email and password and establish a session.
#[utoipa::path(
    post,
    path = "/api/v1/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success", body = UserResponse,
            headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Invalid credentials", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "login",
    security([])
)]
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<LoginRequest>,
) -> ApiResult<HttpResponse> {
    let credentials = LoginCredentials::try_from(payload.into_inner())
        .map_err(|err| field_error(err.field(), err.to_string()))?;
    let user_id = state.login.authenticate(&credentials).await?;
    session.persist_user(user_id)?;
    let user = state.profile.fetch_profile(user_id).await?;
    Ok(envelope::ok(UserResponse::from(user)))
}

/// Drop the session cookie.
#[utoipa::path(
    post,
    path = "/api/v1/logout",
    responses((status = 200, description = "Session cleared")),
    tags = ["users"],
    operation_id = "logout",
    security([])
)]
#[post("/logout")]
pub async fn logout(session: SessionContext) -> HttpResponse {
    session.purge();
    envelope::message("Logged out")
}

/// Fetch the authenticated user's profile.
#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Account no longer exists", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "currentUser"
)]
#[get("/users/me")]
pub async fn current_user(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let user = state.profile.fetch_profile(user_id).await?;
    Ok(envelope::ok(UserResponse::from(user)))
}

/// Partially update the authenticated user's profile.
#[utoipa::path(
    put,
    path = "/api/v1/users/me",
    request_body = ProfileUpdateRequest,
    responses(
        (status = 200, description = "Updated profile", body = UserResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 409, description = "Username or email already registered", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "updateProfile"
)]
#[put("/users/me")]
pub async fn update_profile(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<ProfileUpdateRequest>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let changes = ProfileChanges::try_from(payload.into_inner())
        .map_err(|err| field_error(err.field(), err.to_string()))?;
    let user = state.accounts.update_profile(user_id, changes).await?;
    Ok(envelope::ok(UserResponse::from(user)))
}

/// Replace the authenticated user's password.
#[utoipa::path(
    put,
    path = "/api/v1/users/me/password",
    request_body = PasswordChangeRequest,
    responses(
        (status = 200, description = "Password updated"),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised or wrong current password", body = ErrorSchema),
        (status = 404, description = "Account no longer exists", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "changePassword"
)]
#[put("/users/me/password")]
pub async fn change_password(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<PasswordChangeRequest>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let change = PasswordChange::try_from(payload.into_inner())
        .map_err(|err| field_error(err.field(), err.to_string()))?;
    state.accounts.change_password(user_id, change).await?;
    Ok(envelope::message("Password updated"))
}

/// List the authenticated user's manuals, private ones included.
#[utoipa::path(
    get,
    path = "/api/v1/users/me/manuals",
    params(ManualSearchParams),
    responses(
        (status = 200, description = "Page of the caller's manuals", body = ManualPageResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "listMyManuals"
)]
#[get("/users/me/manuals")]
pub async fn my_manuals(
    state: web::Data<HttpState>,
    session: SessionContext,
    params: web::Query<ManualSearchParams>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let search = ManualSearch::try_from(params.into_inner())?;
    let page = state
        .manuals_query
        .search_manuals(search, SearchScope::Owner(user_id))
        .await?;
    Ok(envelope::ok(ManualPageResponse::from(page)))
}
