//! Fallback policy applied after a token authentication attempt

use std::sync::Arc;

use serde::Deserialize;

use crate::backend::LoginRedirector;
use crate::context::RequestContext;
use crate::entity::Entity;
use crate::error::TokenAuthError;

/// What happens when token authentication does not sign anybody in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "Option<String>")]
pub enum FallbackPolicy {
    /// Leave the caller unauthenticated; later hooks decide.
    #[default]
    NoFallback,
    /// Signal an authentication failure unless the caller is already signed in.
    Exception,
    /// Hand the request to the login-redirect collaborator.
    DelegateLogin,
}

impl FallbackPolicy {
    /// `exception` and `devise` (or `login`) select a policy; anything else disables it.
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("exception") => FallbackPolicy::Exception,
            Some("devise") | Some("login") => FallbackPolicy::DelegateLogin,
            None | Some("none") => FallbackPolicy::NoFallback,
            Some(other) => {
                tracing::warn!(fallback = %other, "Unrecognised fallback, token authentication will not fall back");
                FallbackPolicy::NoFallback
            }
        }
    }

    pub fn is_configured(&self) -> bool {
        !matches!(self, FallbackPolicy::NoFallback)
    }
}

impl From<Option<String>> for FallbackPolicy {
    fn from(value: Option<String>) -> Self {
        Self::parse(value.as_deref())
    }
}

/// Applies an entity's fallback policy.
#[derive(Clone)]
pub struct FallbackDispatcher {
    redirector: Arc<dyn LoginRedirector>,
}

impl FallbackDispatcher {
    pub fn new(redirector: Arc<dyn LoginRedirector>) -> Self {
        Self { redirector }
    }

    /// Returns `Err` when the policy rejects the request.
    ///
    /// The exception policy only fires on a failed match with no record
    /// current for the entity's scope, so a caller signed in through a
    /// session is left alone. The login policy fires on every failed match.
    pub fn dispatch<R>(
        &self,
        entity: &Entity,
        matched: bool,
        ctx: &RequestContext<R>,
    ) -> Result<(), TokenAuthError> {
        match entity.fallback() {
            FallbackPolicy::NoFallback => Ok(()),
            FallbackPolicy::Exception => {
                if matched || ctx.current_record_for(entity.alias()).is_some() {
                    return Ok(());
                }
                tracing::debug!(entity = %entity.alias(), "Signaling token authentication failure");
                Err(TokenAuthError::Unauthenticated {
                    scope: entity.alias().to_string(),
                })
            }
            FallbackPolicy::DelegateLogin => {
                if matched {
                    return Ok(());
                }
                let location = self.redirector.redirect_to_login(entity);
                tracing::debug!(entity = %entity.alias(), location = %location, "Delegating to login");
                Err(TokenAuthError::LoginRequired {
                    scope: entity.alias().to_string(),
                    location,
                })
            }
        }
    }
}
