//! Axum extractors for token-authenticated records

use std::collections::HashMap;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::context::SignedIn;
use crate::error::TokenAuthError;

/// Records signed in for the request, keyed by entity scope.
///
/// Inserted by [`crate::token_auth_middleware`]. Extracting it fails with
/// 401 when the middleware did not run or nobody is signed in.
#[derive(Debug, Clone)]
pub struct TokenAuthenticated<R>(HashMap<String, SignedIn<R>>);

impl<R> TokenAuthenticated<R> {
    pub fn new(signed_in: HashMap<String, SignedIn<R>>) -> Self {
        Self(signed_in)
    }

    /// Current record for an entity scope, e.g. `user`.
    pub fn current(&self, scope: &str) -> Option<&R> {
        self.0.get(scope).map(|signed_in| &signed_in.record)
    }

    pub fn signed_in(&self, scope: &str) -> Option<&SignedIn<R>> {
        self.0.get(scope)
    }

    pub fn scopes(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S, R> FromRequestParts<S> for TokenAuthenticated<R>
where
    S: Send + Sync,
    R: Clone + Send + Sync + 'static,
{
    type Rejection = TokenAuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<TokenAuthenticated<R>>()
            .filter(|authenticated| !authenticated.is_empty())
            .cloned()
            .ok_or_else(|| TokenAuthError::Unauthenticated {
                scope: "request".to_string(),
            })
    }
}
