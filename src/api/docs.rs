use axum::{routing::get, Json, Router};
use utoipa::{Modify, OpenApi};

use crate::api::error::ErrorBody;
use crate::api::handlers::auth::{
    ChangePasswordBody, ForgotPasswordBody, ForgotPasswordResponse, LoginBody, RefreshBody,
    RegisterBody, ResetPasswordBody, SessionResponse, TokenResponse, UpdateProfileBody,
    UserResponse,
};
use crate::api::handlers::health::HealthResponse;
use crate::api::handlers::MessageResponse;
use crate::auth::{Account, Role};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::handlers::health::health_handler,
        crate::api::handlers::auth::register_handler,
        crate::api::handlers::auth::login_handler,
        crate::api::handlers::auth::refresh_handler,
        crate::api::handlers::auth::me_handler,
        crate::api::handlers::auth::update_profile_handler,
        crate::api::handlers::auth::change_password_handler,
        crate::api::handlers::auth::forgot_password_handler,
        crate::api::handlers::auth::reset_password_handler,
        crate::api::handlers::admin::toggle_user_handler,
        crate::api::handlers::admin::delete_user_handler,
    ),
    components(schemas(
        Account,
        Role,
        ErrorBody,
        MessageResponse,
        HealthResponse,
        RegisterBody,
        LoginBody,
        RefreshBody,
        UpdateProfileBody,
        ChangePasswordBody,
        ForgotPasswordBody,
        ResetPasswordBody,
        SessionResponse,
        TokenResponse,
        UserResponse,
        ForgotPasswordResponse,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Service liveness"),
        (name = "auth", description = "Registration, login, tokens and password reset"),
        (name = "admin", description = "Administrative account management"),
    ),
    info(title = "InCrime Identity API")
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};

        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearerAuth",
            SecurityScheme::Http(
                HttpBuilder::new().scheme(HttpAuthScheme::Bearer).bearer_format("JWT").build(),
            ),
        );
    }
}

/// Serves the generated OpenAPI document as JSON.
pub fn docs_router() -> Router {
    Router::new().route("/api/docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
}
