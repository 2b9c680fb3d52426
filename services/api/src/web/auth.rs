//! services/api/src/web/auth.rs
//!
//! Authentication endpoints: registration, login, token verification, and the
//! caller's own account.

use axum::{extract::State, Extension};
use lms_core::domain::ProfileUpdate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::services::auth::{LoginOutcome, RegisteredUser, Registration, UserProfile, UserSummary};
use crate::services::AuthUser;
use crate::web::rest::{ok, with_data, ApiJson, ApiResult, Empty};
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct VerifyTokenRequest {
    pub token: String,
}

#[derive(Deserialize, ToSchema)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

/// Unknown fields are ignored; absent fields are left unchanged.
#[derive(Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct VerifiedUser {
    pub user: UserSummary,
}

#[derive(Serialize, ToSchema)]
pub struct PermissionList {
    pub role: String,
    pub permissions: Vec<String>,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /register - Create a new account
#[utoipa::path(
    post,
    path = "/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "User registered successfully", body = RegisteredUser),
        (status = 400, description = "Missing fields, malformed email or unknown role"),
        (status = 409, description = "Username or email already taken")
    )
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> ApiResult<RegisteredUser> {
    let registered = state
        .auth
        .register(Registration {
            username: req.username,
            email: req.email,
            password: req.password,
            role: req.role,
            first_name: req.first_name,
            last_name: req.last_name,
            phone_number: req.phone_number,
        })
        .await?;
    ok("User registered successfully", registered)
}

/// POST /login - Exchange credentials for an access token
#[utoipa::path(
    post,
    path = "/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginOutcome),
        (status = 401, description = "User not found or invalid password")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<LoginOutcome> {
    let outcome = state.auth.login(&req.username, &req.password).await?;
    ok("Login successful", outcome)
}

/// POST /verify-token - Check a token and return its user
#[utoipa::path(
    post,
    path = "/verify-token",
    tag = "auth",
    request_body = VerifyTokenRequest,
    responses(
        (status = 200, description = "The token is valid", body = VerifiedUser),
        (status = 401, description = "Token expired, invalid, or its user is gone")
    )
)]
pub async fn verify_token_handler(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<VerifyTokenRequest>,
) -> ApiResult<VerifiedUser> {
    let user = state.auth.verify_token(&req.token).await?;
    with_data(VerifiedUser {
        user: user.summary(),
    })
}

/// POST /logout - Tokens are stateless; the client drops its copy
#[utoipa::path(
    post,
    path = "/logout",
    tag = "auth",
    responses((status = 200, description = "Logged out successfully"))
)]
pub async fn logout_handler() -> ApiResult<Empty> {
    ok("Logged out successfully", Empty {})
}

/// POST /change-password
#[utoipa::path(
    post,
    path = "/change-password",
    tag = "auth",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed successfully"),
        (status = 400, description = "Current password is incorrect"),
        (status = 401, description = "Authentication required")
    ),
    security(("token" = []))
)]
pub async fn change_password_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ApiJson(req): ApiJson<ChangePasswordRequest>,
) -> ApiResult<Empty> {
    state
        .auth
        .change_password(user.id, &req.old_password, &req.new_password)
        .await?;
    ok("Password changed successfully", Empty {})
}

/// PUT /profile
#[utoipa::path(
    put,
    path = "/profile",
    tag = "auth",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated successfully", body = UserProfile),
        (status = 400, description = "Malformed email"),
        (status = 409, description = "Email already registered")
    ),
    security(("token" = []))
)]
pub async fn update_profile_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ApiJson(req): ApiJson<UpdateProfileRequest>,
) -> ApiResult<UserProfile> {
    let update = ProfileUpdate {
        first_name: req.first_name,
        last_name: req.last_name,
        email: req.email,
        phone_number: req.phone_number,
    };
    let profile = state.auth.update_profile(user.id, update).await?;
    ok("Profile updated successfully", profile)
}

/// GET /permissions - The caller's role and what it grants
#[utoipa::path(
    get,
    path = "/permissions",
    tag = "auth",
    responses((status = 200, description = "The caller's permissions", body = PermissionList)),
    security(("token" = []))
)]
pub async fn permissions_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<PermissionList> {
    with_data(PermissionList {
        role: user.role.to_string(),
        permissions: state
            .auth
            .permissions(user.role)
            .into_iter()
            .map(str::to_string)
            .collect(),
    })
}
