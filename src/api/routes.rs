use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::{
    middleware::{authenticate, require_role},
    AccessGate, AccountService, AdminService, CredentialStore, LoginService, PasswordHasher,
    ResetDelivery, ResetFlowManager, Role, TokenService,
};
use crate::config::{ApiServerConfig, AuthConfig};
use crate::errors::{Error, Result};
use crate::storage::DbPool;

use super::{
    docs,
    handlers::{
        change_password_handler, delete_user_handler, forgot_password_handler, health_handler,
        login_handler, me_handler, not_found_handler, refresh_handler, register_handler,
        reset_password_handler, toggle_user_handler, update_profile_handler,
    },
};

/// Shared services, cloned into every request.
#[derive(Clone)]
pub struct ApiState {
    pub login: Arc<LoginService>,
    pub accounts: Arc<AccountService>,
    pub admin: Arc<AdminService>,
    pub resets: Arc<ResetFlowManager>,
    pub gate: Arc<AccessGate>,
}

impl ApiState {
    /// Wire every service over one pool and one set of signing secrets.
    pub fn new(pool: DbPool, auth: &AuthConfig, delivery: Arc<dyn ResetDelivery>) -> Result<Self> {
        let hasher = PasswordHasher::new(auth.bcrypt_cost).with_timeout(auth.hash_timeout());
        let credentials = CredentialStore::with_sqlx(pool, hasher);
        let tokens = Arc::new(TokenService::new(&auth.jwt_secret, &auth.jwt_refresh_secret)?);
        let gate = Arc::new(AccessGate::new(tokens.clone(), credentials.clone()));

        Ok(Self {
            login: Arc::new(LoginService::new(credentials.clone(), tokens, gate.clone())),
            accounts: Arc::new(AccountService::new(credentials.clone())),
            admin: Arc::new(AdminService::new(credentials.clone())),
            resets: Arc::new(
                ResetFlowManager::new(credentials, delivery)
                    .with_token_echo(auth.expose_reset_token),
            ),
            gate,
        })
    }
}

pub fn build_router(state: ApiState, config: &ApiServerConfig) -> Result<Router> {
    let auth_layer = middleware::from_fn_with_state(state.gate.clone(), authenticate);
    let admin_layer = middleware::from_fn_with_state(Role::Admin, require_role);

    let public = Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/auth/register", post(register_handler))
        .route("/api/auth/login", post(login_handler))
        .route("/api/auth/refresh", post(refresh_handler))
        .route("/api/auth/forgot-password", post(forgot_password_handler))
        .route("/api/auth/reset-password/{token}", post(reset_password_handler));

    let authenticated = Router::new()
        .route("/api/auth/me", get(me_handler))
        .route("/api/auth/profile", put(update_profile_handler))
        .route("/api/auth/password", put(change_password_handler))
        .route_layer(auth_layer.clone());

    // The last route_layer added runs first: authenticate, then the role check.
    let admin = Router::new()
        .route("/api/admin/users/{id}/toggle", put(toggle_user_handler))
        .route("/api/admin/users/{id}", axum::routing::delete(delete_user_handler))
        .route_layer(admin_layer)
        .route_layer(auth_layer);

    let router = Router::new()
        .merge(public)
        .merge(authenticated)
        .merge(admin)
        .fallback(not_found_handler)
        .with_state(state)
        .merge(docs::docs_router())
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(cors_layer(config)?));

    Ok(router)
}

/// Credentials are allowed, so the origin must be explicit rather than `*`.
fn cors_layer(config: &ApiServerConfig) -> Result<CorsLayer> {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::PATCH])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    match config.cors_origin.as_deref() {
        Some(origin) => {
            let origin = HeaderValue::from_str(origin)
                .map_err(|e| Error::config(format!("Invalid CLIENT_URL '{}': {}", origin, e)))?;
            Ok(layer.allow_origin(origin).allow_credentials(true))
        }
        None => Ok(layer),
    }
}
