//! Public and self-service identity endpoints under `/api/auth`.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::error::ApiError;
use crate::api::extract::ApiJson;
use crate::api::handlers::MessageResponse;
use crate::api::routes::ApiState;
use crate::auth::{Account, AuthContext, AuthSession, ProfileChanges, Registration};

/// Returned for every forgot-password request so callers cannot probe for accounts.
pub const RESET_REQUESTED_MESSAGE: &str = "If this email exists, a reset link has been sent.";

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct RegisterBody {
    pub full_name: String,
    pub username: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct LoginBody {
    /// Username or email address
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct RefreshBody {
    pub refresh_token: String,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdateProfileBody {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct ChangePasswordBody {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct ForgotPasswordBody {
    pub email: String,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct ResetPasswordBody {
    pub password: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub success: bool,
    pub message: String,
    pub token: String,
    pub refresh_token: String,
    pub user: Account,
}

impl SessionResponse {
    fn new(message: &str, session: AuthSession) -> Self {
        Self {
            success: true,
            message: message.to_string(),
            token: session.access_token,
            refresh_token: session.refresh_token,
            user: session.account,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TokenResponse {
    pub success: bool,
    pub token: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub user: Account,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ForgotPasswordResponse {
    pub success: bool,
    pub message: String,
    /// Present only when the deployment echoes reset tokens (development)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_token: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterBody,
    responses(
        (status = 201, description = "Account created", body = SessionResponse),
        (status = 400, description = "Missing fields or username/email taken", body = crate::api::error::ErrorBody)
    ),
    tag = "auth"
)]
pub async fn register_handler(
    State(state): State<ApiState>,
    ApiJson(body): ApiJson<RegisterBody>,
) -> Result<(StatusCode, Json<SessionResponse>), ApiError> {
    let registration =
        Registration::user(body.full_name, body.username, body.email, body.phone, body.password);

    let session = state
        .login
        .register(registration)
        .await
        .map_err(|e| ApiError::from(e).or_internal("Server error during registration"))?;

    Ok((StatusCode::CREATED, Json(SessionResponse::new("Account created successfully", session))))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginBody,
    responses(
        (status = 200, description = "Login successful", body = SessionResponse),
        (status = 400, description = "Missing username or password", body = crate::api::error::ErrorBody),
        (status = 401, description = "Invalid credentials or deactivated account", body = crate::api::error::ErrorBody)
    ),
    tag = "auth"
)]
pub async fn login_handler(
    State(state): State<ApiState>,
    ApiJson(body): ApiJson<LoginBody>,
) -> Result<Json<SessionResponse>, ApiError> {
    let session = state
        .login
        .login(&body.username, &body.password)
        .await
        .map_err(|e| ApiError::from(e).or_internal("Server error during login"))?;

    Ok(Json(SessionResponse::new("Login successful", session)))
}

#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    request_body = RefreshBody,
    responses(
        (status = 200, description = "New access token", body = TokenResponse),
        (status = 401, description = "Refresh token rejected", body = crate::api::error::ErrorBody)
    ),
    tag = "auth"
)]
pub async fn refresh_handler(
    State(state): State<ApiState>,
    ApiJson(body): ApiJson<RefreshBody>,
) -> Result<Json<TokenResponse>, ApiError> {
    let token = state.login.refresh(&body.refresh_token).await?;
    Ok(Json(TokenResponse { success: true, token }))
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "The authenticated account", body = UserResponse),
        (status = 401, description = "Not authenticated", body = crate::api::error::ErrorBody)
    ),
    security(("bearerAuth" = [])),
    tag = "auth"
)]
pub async fn me_handler(Extension(context): Extension<AuthContext>) -> Json<UserResponse> {
    Json(UserResponse { success: true, message: None, user: context.account })
}

#[utoipa::path(
    put,
    path = "/api/auth/profile",
    request_body = UpdateProfileBody,
    responses(
        (status = 200, description = "Profile updated", body = UserResponse),
        (status = 400, description = "Invalid or taken email", body = crate::api::error::ErrorBody),
        (status = 401, description = "Not authenticated", body = crate::api::error::ErrorBody)
    ),
    security(("bearerAuth" = [])),
    tag = "auth"
)]
pub async fn update_profile_handler(
    State(state): State<ApiState>,
    Extension(context): Extension<AuthContext>,
    ApiJson(body): ApiJson<UpdateProfileBody>,
) -> Result<Json<UserResponse>, ApiError> {
    let changes =
        ProfileChanges { full_name: body.full_name, email: body.email, phone: body.phone };

    let user = state
        .accounts
        .update_profile(context.user_id(), changes)
        .await
        .map_err(|e| ApiError::from(e).or_internal("Error updating profile"))?;

    Ok(Json(UserResponse { success: true, message: Some("Profile updated".to_string()), user }))
}

#[utoipa::path(
    put,
    path = "/api/auth/password",
    request_body = ChangePasswordBody,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 400, description = "Current password incorrect or new password invalid", body = crate::api::error::ErrorBody),
        (status = 401, description = "Not authenticated", body = crate::api::error::ErrorBody)
    ),
    security(("bearerAuth" = [])),
    tag = "auth"
)]
pub async fn change_password_handler(
    State(state): State<ApiState>,
    Extension(context): Extension<AuthContext>,
    ApiJson(body): ApiJson<ChangePasswordBody>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .accounts
        .change_password(context.user_id(), &body.current_password, &body.new_password)
        .await
        .map_err(|e| ApiError::from(e).or_internal("Error changing password"))?;

    Ok(Json(MessageResponse::new("Password updated successfully")))
}

#[utoipa::path(
    post,
    path = "/api/auth/forgot-password",
    request_body = ForgotPasswordBody,
    responses(
        (status = 200, description = "Reset issued if the email is registered", body = ForgotPasswordResponse),
        (status = 400, description = "Email missing", body = crate::api::error::ErrorBody)
    ),
    tag = "auth"
)]
pub async fn forgot_password_handler(
    State(state): State<ApiState>,
    ApiJson(body): ApiJson<ForgotPasswordBody>,
) -> Result<Json<ForgotPasswordResponse>, ApiError> {
    let outcome = state
        .resets
        .request_reset(&body.email)
        .await
        .map_err(|e| ApiError::from(e).or_internal("Error sending reset email"))?;

    Ok(Json(ForgotPasswordResponse {
        success: true,
        message: RESET_REQUESTED_MESSAGE.to_string(),
        reset_token: outcome.echoed_token().map(str::to_string),
    }))
}

#[utoipa::path(
    post,
    path = "/api/auth/reset-password/{token}",
    params(("token" = String, Path, description = "Raw reset token")),
    request_body = ResetPasswordBody,
    responses(
        (status = 200, description = "Password reset", body = MessageResponse),
        (status = 400, description = "Invalid or expired reset token", body = crate::api::error::ErrorBody)
    ),
    tag = "auth"
)]
pub async fn reset_password_handler(
    State(state): State<ApiState>,
    Path(token): Path<String>,
    ApiJson(body): ApiJson<ResetPasswordBody>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .resets
        .consume_reset(&token, &body.password)
        .await
        .map_err(|e| ApiError::from(e).or_internal("Error resetting password"))?;

    Ok(Json(MessageResponse::new("Password reset successful")))
}
