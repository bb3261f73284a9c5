//! Token authentication orchestration
//!
//! Ties the registry, credential locator, record lookup, comparator,
//! sign-in and fallback together. All collaborators are injected once at
//! construction; nothing here holds per-request state.

use std::sync::Arc;

use tokenauth_common::TokenAuthSettings;

use crate::backend::{
    AfterAuthentication, IdentityPolicy, LoginRedirector, NoopAfterAuthentication, RecordFinder,
    RequestSignIn, SignInHandler, SignInPathRedirector,
};
use crate::comparator::TokenComparator;
use crate::context::RequestContext;
use crate::entity::Entity;
use crate::error::TokenAuthError;
use crate::fallback::FallbackDispatcher;
use crate::hooks::HookKind;
use crate::locator::CredentialLocator;
use crate::registry::EntityRegistry;
use crate::types::Authenticatable;

/// Why an attempt did not sign anybody in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoMatchReason {
    CredentialAbsent,
    RecordNotFound,
    TokenMismatch,
}

/// Result of one authentication attempt. Lives for a single request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthenticationOutcome<R> {
    Authenticated(R),
    NoMatch(NoMatchReason),
}

impl<R> AuthenticationOutcome<R> {
    pub fn matched(&self) -> bool {
        matches!(self, AuthenticationOutcome::Authenticated(_))
    }

    pub fn record(&self) -> Option<&R> {
        match self {
            AuthenticationOutcome::Authenticated(record) => Some(record),
            AuthenticationOutcome::NoMatch(_) => None,
        }
    }
}

/// Token authentication engine for one protected resource.
pub struct TokenAuthenticator<R> {
    registry: Arc<EntityRegistry>,
    finder: Arc<dyn RecordFinder<R>>,
    sign_in: Arc<dyn SignInHandler<R>>,
    identity: Arc<dyn IdentityPolicy>,
    after_auth: Arc<dyn AfterAuthentication>,
    fallback: FallbackDispatcher,
    comparator: TokenComparator,
    locator: CredentialLocator,
    persist_sign_in: bool,
}

impl<R> TokenAuthenticator<R>
where
    R: Authenticatable + Clone + Send + Sync + 'static,
{
    /// Create an authenticator with the default request sign-in, the
    /// settings' case-insensitive keys and the sign-in path redirector.
    pub fn new(
        registry: Arc<EntityRegistry>,
        finder: Arc<dyn RecordFinder<R>>,
        settings: &TokenAuthSettings,
    ) -> Self {
        Self {
            registry,
            finder,
            sign_in: Arc::new(RequestSignIn),
            identity: Arc::new(settings.clone()),
            after_auth: Arc::new(NoopAfterAuthentication),
            fallback: FallbackDispatcher::new(Arc::new(SignInPathRedirector::from_settings(
                settings,
            ))),
            comparator: TokenComparator,
            locator: CredentialLocator,
            persist_sign_in: settings.sign_in_token,
        }
    }

    pub fn with_sign_in_handler(mut self, sign_in: Arc<dyn SignInHandler<R>>) -> Self {
        self.sign_in = sign_in;
        self
    }

    pub fn with_identity_policy(mut self, identity: Arc<dyn IdentityPolicy>) -> Self {
        self.identity = identity;
        self
    }

    pub fn with_login_redirector(mut self, redirector: Arc<dyn LoginRedirector>) -> Self {
        self.fallback = FallbackDispatcher::new(redirector);
        self
    }

    pub fn with_after_authentication(mut self, hook: Arc<dyn AfterAuthentication>) -> Self {
        self.after_auth = hook;
        self
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    /// Try to sign the request in as `model_key` without applying any fallback.
    pub async fn authenticate(
        &self,
        model_key: &str,
        ctx: &mut RequestContext<R>,
    ) -> Result<AuthenticationOutcome<R>, TokenAuthError> {
        let entity = self.entity(model_key)?;
        self.authenticate_entity(&entity, ctx).await
    }

    /// Authenticate, then apply the entity's fallback policy.
    pub async fn authenticate_or_fallback(
        &self,
        model_key: &str,
        ctx: &mut RequestContext<R>,
    ) -> Result<AuthenticationOutcome<R>, TokenAuthError> {
        let entity = self.entity(model_key)?;
        let outcome = self.authenticate_entity(&entity, ctx).await?;

        self.fallback.dispatch(&entity, outcome.matched(), ctx)?;
        Ok(outcome)
    }

    /// Run the handler registered under `hook_name`.
    pub async fn run_hook(
        &self,
        hook_name: &str,
        ctx: &mut RequestContext<R>,
    ) -> Result<(), TokenAuthError> {
        let handler = self.registry.resolve_hook(hook_name).ok_or_else(|| {
            TokenAuthError::Configuration(format!("unknown token authentication hook `{hook_name}`"))
        })?;

        match handler.kind {
            HookKind::Authenticate => {
                self.authenticate(&handler.model_key, ctx).await?;
            }
            HookKind::AuthenticateOrFallback => {
                // A silent hook may already have signed this scope in.
                let entity = self.entity(&handler.model_key)?;
                let signed_in = ctx
                    .signed_in(entity.alias())
                    .is_some_and(|signed_in| signed_in.via_token);
                let matched = signed_in || self.authenticate_entity(&entity, ctx).await?.matched();
                self.fallback.dispatch(&entity, matched, ctx)?;
            }
            HookKind::CurrentRecord => {
                let entity = self.entity(&handler.model_key)?;
                if ctx.current_record_for(entity.alias()).is_none() {
                    self.authenticate_entity(&entity, ctx).await?;
                }
            }
        }
        Ok(())
    }

    fn entity(&self, model_key: &str) -> Result<Arc<Entity>, TokenAuthError> {
        self.registry.get(model_key).cloned().ok_or_else(|| {
            TokenAuthError::Configuration(format!(
                "`{model_key}` is not registered for token authentication"
            ))
        })
    }

    async fn authenticate_entity(
        &self,
        entity: &Entity,
        ctx: &mut RequestContext<R>,
    ) -> Result<AuthenticationOutcome<R>, TokenAuthError> {
        let credentials = self.locator.locate(&*ctx, entity);

        let Some(identifier) = credentials
            .identifier
            .filter(|value| !value.trim().is_empty())
        else {
            tracing::debug!(entity = %entity.alias(), "No token authentication identifier presented");
            return Ok(AuthenticationOutcome::NoMatch(NoMatchReason::CredentialAbsent));
        };

        let Some(record) = self.find_record(entity, identifier).await else {
            tracing::debug!(entity = %entity.alias(), "No record for token authentication identifier");
            return Ok(AuthenticationOutcome::NoMatch(NoMatchReason::RecordNotFound));
        };

        if !self
            .comparator
            .compare(record.authentication_token(), credentials.token.as_deref())
        {
            tracing::debug!(entity = %entity.alias(), "Authentication token mismatch");
            return Ok(AuthenticationOutcome::NoMatch(NoMatchReason::TokenMismatch));
        }

        self.sign_in
            .sign_in(ctx, entity.alias(), record.clone(), self.persist_sign_in)
            .await
            .map_err(TokenAuthError::SignIn)?;

        tracing::info!(
            entity = %entity.alias(),
            persisted = self.persist_sign_in,
            "Signed in from authentication token"
        );

        self.after_auth
            .after_successful_token_authentication()
            .await
            .map_err(TokenAuthError::AfterAuthentication)?;

        Ok(AuthenticationOutcome::Authenticated(record))
    }

    async fn find_record(&self, entity: &Entity, identifier: String) -> Option<R> {
        let identifier = if self.identity.is_case_insensitive(entity.identifier()) {
            identifier.to_lowercase()
        } else {
            identifier
        };

        match self
            .finder
            .find_for_authentication(entity.model(), entity.identifier(), &identifier)
            .await
        {
            Ok(record) => record,
            Err(e) => {
                tracing::error!(error = %e, entity = %entity.alias(), "Token authentication record lookup failed");
                None
            }
        }
    }
}
