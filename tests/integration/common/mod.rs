//! Shared fixtures for token authentication integration tests
//!
//! - Seeded account store and demo router
//! - Engine harness with recording collaborators
//! - Request and response helpers

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, Response},
    Router,
};
use serde_json::Value;
use tokenauth::{
    AfterAuthentication, Entity, EntityOptions, EntityRegistryBuilder, FallbackPolicy,
    KnownModels, LoginRedirector, ModelType, RecordFinder, RouteHooks, TokenAuthSettings,
    TokenAuthenticator,
};
use tokenauth_app::{Account, AccountStore};

pub const USER_EMAIL: &str = "a@b.com";
pub const USER_TOKEN: &str = "abc123";
pub const ADMIN_EMAIL: &str = "root@b.com";
pub const ADMIN_TOKEN: &str = "s3cret";

/// Store seeded with one account per demo model.
pub fn seeded_store() -> AccountStore {
    AccountStore::new()
        .with_account(Account::new("User", USER_EMAIL, "alice", Some(USER_TOKEN)))
        .with_account(Account::new("AdminUser", ADMIN_EMAIL, "root", Some(ADMIN_TOKEN)))
}

/// Demo application router
pub struct TestApp {
    pub router: Router,
}

impl TestApp {
    pub fn new() -> anyhow::Result<Self> {
        Self::with_settings(TokenAuthSettings::default())
    }

    pub fn with_settings(settings: TokenAuthSettings) -> anyhow::Result<Self> {
        let router = tokenauth_app::create_app(settings, seeded_store())?;
        Ok(Self { router })
    }

    pub fn test_router(&self) -> Router {
        self.router.clone()
    }
}

/// Finder that records every lookup before delegating to the store.
pub struct RecordingFinder {
    store: AccountStore,
    pub lookups: Mutex<Vec<(String, String)>>,
}

impl RecordingFinder {
    pub fn new(store: AccountStore) -> Self {
        Self {
            store,
            lookups: Mutex::new(Vec::new()),
        }
    }

    pub fn lookups(&self) -> Vec<(String, String)> {
        self.lookups.lock().unwrap().clone()
    }
}

#[async_trait]
impl RecordFinder<Account> for RecordingFinder {
    async fn find_for_authentication(
        &self,
        model: &ModelType,
        field: &str,
        value: &str,
    ) -> anyhow::Result<Option<Account>> {
        self.lookups
            .lock()
            .unwrap()
            .push((field.to_string(), value.to_string()));
        self.store.find_for_authentication(model, field, value).await
    }
}

#[derive(Default)]
pub struct CountingHook {
    calls: AtomicUsize,
}

impl CountingHook {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AfterAuthentication for CountingHook {
    async fn after_successful_token_authentication(&self) -> anyhow::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
pub struct CountingRedirector {
    calls: AtomicUsize,
}

impl CountingRedirector {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl LoginRedirector for CountingRedirector {
    fn redirect_to_login(&self, entity: &Entity) -> String {
        self.calls.fetch_add(1, Ordering::SeqCst);
        format!("/{}s/sign_in", entity.alias())
    }
}

/// Engine wired to recording collaborators for a single `User` entity.
pub struct Harness {
    pub authenticator: TokenAuthenticator<Account>,
    pub finder: Arc<RecordingFinder>,
    pub hook: Arc<CountingHook>,
    pub redirector: Arc<CountingRedirector>,
    pub installed: Vec<String>,
}

impl Harness {
    pub fn new(fallback: FallbackPolicy) -> Self {
        Self::with_settings(fallback, TokenAuthSettings::default())
    }

    pub fn with_settings(fallback: FallbackPolicy, settings: TokenAuthSettings) -> Self {
        let models = KnownModels::new(["User"]);
        let mut hooks = RouteHooks::new();
        let mut builder = EntityRegistryBuilder::new(&settings, &models, &mut hooks);
        builder
            .register("User", EntityOptions::default().fallback(fallback))
            .unwrap();
        let registry = Arc::new(builder.build());
        let installed = hooks.names().map(str::to_string).collect();

        let finder = Arc::new(RecordingFinder::new(seeded_store()));
        let hook = Arc::new(CountingHook::default());
        let redirector = Arc::new(CountingRedirector::default());

        let authenticator =
            TokenAuthenticator::<Account>::new(registry, finder.clone(), &settings)
                .with_after_authentication(hook.clone())
                .with_login_redirector(redirector.clone());

        Self {
            authenticator,
            finder,
            hook,
            redirector,
            installed,
        }
    }
}

/// Helper: build a GET request with headers
pub fn get_request(uri: &str, headers: &[(&str, &str)]) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    builder.body(Body::empty()).unwrap()
}

/// Helper: parse response body as JSON Value
pub async fn parse_body(response: Response<Body>) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

/// Settings with a custom sign-in path for the admin scope.
pub fn settings_with_sign_in_path(alias: &str, path: &str) -> TokenAuthSettings {
    TokenAuthSettings {
        sign_in_paths: HashMap::from([(alias.to_string(), path.to_string())]),
        ..TokenAuthSettings::default()
    }
}
