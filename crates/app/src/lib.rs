//! Tokenauth application composition root
//!
//! Registers the demo entities, installs their hooks and composes the
//! protected routers into a single application.

pub mod accounts;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    middleware::from_fn_with_state,
    routing::get,
    Json, Router,
};
use tokenauth::{
    AfterAuthentication, EntityOptions, EntityRegistryBuilder, FallbackPolicy, KnownModels,
    RouteHooks, TokenAuthSettings, TokenAuthState, TokenAuthenticated, TokenAuthError,
    TokenAuthenticator,
};

pub use accounts::{Account, AccountStore};

/// Post-authentication audit trail
#[derive(Debug, Clone, Copy, Default)]
pub struct AuditTrail;

#[async_trait]
impl AfterAuthentication for AuditTrail {
    async fn after_successful_token_authentication(&self) -> anyhow::Result<()> {
        tracing::info!("Token authentication succeeded");
        Ok(())
    }
}

/// Create the main application router with all routes and middleware
pub fn create_app(settings: TokenAuthSettings, store: AccountStore) -> Result<Router, anyhow::Error> {
    let models = KnownModels::new(["User", "AdminUser"]);
    let mut hooks = RouteHooks::new();

    let mut builder = EntityRegistryBuilder::new(&settings, &models, &mut hooks);

    // API clients get a 401 on a bad token
    let user = builder.register(
        "User",
        EntityOptions::default()
            .fallback(FallbackPolicy::Exception)
            .only(["/api/*"]),
    )?;
    builder.install_hook(user.auth_bang_method_name(), user.route_filter().clone())?;

    // Browsers are sent to the admin sign-in page
    let admin = builder.register(
        "AdminUser",
        EntityOptions::default()
            .fallback(FallbackPolicy::DelegateLogin)
            .only(["/admin/*"]),
    )?;
    builder.install_hook(admin.auth_bang_method_name(), admin.route_filter().clone())?;

    let registry = Arc::new(builder.build());

    let authenticator = TokenAuthenticator::<Account>::new(registry, Arc::new(store), &settings)
        .with_after_authentication(Arc::new(AuditTrail));
    let state = TokenAuthState::new(Arc::new(authenticator), Arc::new(hooks));

    let protected = Router::new()
        .route("/api/me", get(current_user))
        .route("/admin/dashboard", get(admin_dashboard))
        .route_layer(from_fn_with_state(state, tokenauth::token_auth_middleware::<Account>));

    let app = Router::new()
        .route("/health", get(health_check))
        .route("/", get(|| async { "Tokenauth API v0.0.1-SNAPSHOT" }))
        .route("/admin_users/sign_in", get(|| async { "Admin sign in" }))
        .merge(protected);

    Ok(app)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

async fn current_user(
    auth: TokenAuthenticated<Account>,
) -> Result<Json<Account>, TokenAuthError> {
    auth.current("user")
        .cloned()
        .map(Json)
        .ok_or_else(|| TokenAuthError::Unauthenticated {
            scope: "user".to_string(),
        })
}

async fn admin_dashboard(
    auth: TokenAuthenticated<Account>,
) -> Result<Json<serde_json::Value>, TokenAuthError> {
    let admin = auth
        .current("admin_user")
        .ok_or_else(|| TokenAuthError::Unauthenticated {
            scope: "admin_user".to_string(),
        })?;

    Ok(Json(serde_json::json!({
        "dashboard": "admin",
        "signed_in_as": admin.email,
    })))
}
