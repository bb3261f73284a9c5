//! Host-side collaborators
//!
//! The engine never talks to a database, a session store or a router
//! directly. Each of those concerns is a narrow trait implemented by the
//! host application and handed to [`crate::TokenAuthenticator`] once at
//! startup.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokenauth_common::TokenAuthSettings;

use crate::context::RequestContext;
use crate::entity::Entity;
use crate::error::TokenAuthError;
use crate::types::ModelType;

/// Resolves a classified model name to a known record type.
pub trait ModelResolver: Send + Sync {
    fn resolve_model(&self, name: &str) -> Result<ModelType, TokenAuthError>;
}

/// Resolver over a fixed set of model names.
#[derive(Debug, Clone, Default)]
pub struct KnownModels {
    names: HashSet<String>,
}

impl KnownModels {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }
}

impl ModelResolver for KnownModels {
    fn resolve_model(&self, name: &str) -> Result<ModelType, TokenAuthError> {
        if self.names.contains(name) {
            Ok(ModelType::new(name))
        } else {
            Err(TokenAuthError::Configuration(format!(
                "unknown model `{name}`"
            )))
        }
    }
}

/// Record lookup by identifier.
///
/// `Ok(None)` is the normal "no such record" answer. An `Err` is logged
/// by the engine and handled the same way as a missing record.
#[async_trait]
pub trait RecordFinder<R>: Send + Sync {
    async fn find_for_authentication(
        &self,
        model: &ModelType,
        field: &str,
        value: &str,
    ) -> anyhow::Result<Option<R>>;
}

/// Case-insensitivity policy of the identity layer.
pub trait IdentityPolicy: Send + Sync {
    fn is_case_insensitive(&self, field: &str) -> bool;
}

impl IdentityPolicy for TokenAuthSettings {
    fn is_case_insensitive(&self, field: &str) -> bool {
        self.case_insensitive_keys.iter().any(|key| key == field)
    }
}

/// Session sign-in primitive.
#[async_trait]
pub trait SignInHandler<R>: Send + Sync {
    async fn sign_in(
        &self,
        ctx: &mut RequestContext<R>,
        scope: &str,
        record: R,
        persist: bool,
    ) -> anyhow::Result<()>;
}

/// Signs the record into the current request only.
///
/// Persistence is recorded on the [`crate::SignedIn`] entry so a session
/// layer further out can decide whether to store it.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestSignIn;

#[async_trait]
impl<R> SignInHandler<R> for RequestSignIn
where
    R: Send + Sync + 'static,
{
    async fn sign_in(
        &self,
        ctx: &mut RequestContext<R>,
        scope: &str,
        record: R,
        persist: bool,
    ) -> anyhow::Result<()> {
        ctx.sign_in(scope, record, persist);
        Ok(())
    }
}

/// Login-redirect collaborator used by the delegate-login fallback.
pub trait LoginRedirector: Send + Sync {
    /// Location of the sign-in page for `entity`.
    fn redirect_to_login(&self, entity: &Entity) -> String;
}

/// Redirects to `/<alias>s/sign_in` unless a path is configured for the alias.
#[derive(Debug, Clone, Default)]
pub struct SignInPathRedirector {
    paths: HashMap<String, String>,
}

impl SignInPathRedirector {
    pub fn new(paths: HashMap<String, String>) -> Self {
        Self { paths }
    }

    pub fn from_settings(settings: &TokenAuthSettings) -> Self {
        Self::new(settings.sign_in_paths.clone())
    }
}

impl LoginRedirector for SignInPathRedirector {
    fn redirect_to_login(&self, entity: &Entity) -> String {
        self.paths
            .get(entity.alias())
            .cloned()
            .unwrap_or_else(|| format!("/{}s/sign_in", entity.alias()))
    }
}

/// Extension point invoked after every successful token authentication.
///
/// Only side effects matter; an error is propagated to the host untouched.
#[async_trait]
pub trait AfterAuthentication: Send + Sync {
    async fn after_successful_token_authentication(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAfterAuthentication;

impl AfterAuthentication for NoopAfterAuthentication {}
