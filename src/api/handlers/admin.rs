//! Administrative account endpoints under `/api/admin`. Admin role required.

use axum::{
    extract::{Path, State},
    Json,
};

use crate::api::error::ApiError;
use crate::api::handlers::auth::UserResponse;
use crate::api::handlers::MessageResponse;
use crate::api::routes::ApiState;
use crate::domain::UserId;

fn parse_user_id(raw: &str) -> Result<UserId, ApiError> {
    UserId::parse(raw).map_err(|_| ApiError::not_found("User not found"))
}

#[utoipa::path(
    put,
    path = "/api/admin/users/{id}/toggle",
    params(("id" = String, Path, description = "Account id")),
    responses(
        (status = 200, description = "Active flag toggled", body = UserResponse),
        (status = 400, description = "Target is an admin", body = crate::api::error::ErrorBody),
        (status = 403, description = "Caller is not an admin", body = crate::api::error::ErrorBody),
        (status = 404, description = "No such account", body = crate::api::error::ErrorBody)
    ),
    security(("bearerAuth" = [])),
    tag = "admin"
)]
pub async fn toggle_user_handler(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    let id = parse_user_id(&id)?;
    let user = state
        .admin
        .toggle_active(&id)
        .await
        .map_err(|e| ApiError::from(e).or_internal("Error toggling user status"))?;

    let message = if user.is_active { "User activated" } else { "User deactivated" };
    Ok(Json(UserResponse { success: true, message: Some(message.to_string()), user }))
}

#[utoipa::path(
    delete,
    path = "/api/admin/users/{id}",
    params(("id" = String, Path, description = "Account id")),
    responses(
        (status = 200, description = "Account and its applications deleted", body = MessageResponse),
        (status = 400, description = "Target is an admin", body = crate::api::error::ErrorBody),
        (status = 403, description = "Caller is not an admin", body = crate::api::error::ErrorBody),
        (status = 404, description = "No such account", body = crate::api::error::ErrorBody)
    ),
    security(("bearerAuth" = [])),
    tag = "admin"
)]
pub async fn delete_user_handler(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_user_id(&id)?;
    state
        .admin
        .delete_account(&id)
        .await
        .map_err(|e| ApiError::from(e).or_internal("Error deleting user"))?;

    Ok(Json(MessageResponse::new("User deleted")))
}
