//! axum middleware running the installed token authentication hooks
//!
//! ```ignore
//! let state = TokenAuthState::new(authenticator, hooks);
//! let app = Router::new()
//!     .route("/orders", get(list_orders))
//!     .route_layer(axum::middleware::from_fn_with_state(state, token_auth_middleware::<User>));
//! ```

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::authenticator::TokenAuthenticator;
use crate::context::RequestContext;
use crate::extractors::TokenAuthenticated;
use crate::hooks::RouteHooks;
use crate::types::Authenticatable;

/// Middleware state: the engine plus the hooks installed for this router.
pub struct TokenAuthState<R> {
    pub authenticator: Arc<TokenAuthenticator<R>>,
    pub hooks: Arc<RouteHooks>,
}

impl<R> TokenAuthState<R> {
    pub fn new(authenticator: Arc<TokenAuthenticator<R>>, hooks: Arc<RouteHooks>) -> Self {
        Self {
            authenticator,
            hooks,
        }
    }
}

impl<R> Clone for TokenAuthState<R> {
    fn clone(&self) -> Self {
        Self {
            authenticator: self.authenticator.clone(),
            hooks: self.hooks.clone(),
        }
    }
}

/// Run every matching hook in installation order.
///
/// The first rejection short-circuits into its response. Records signed
/// in along the way are published as a [`TokenAuthenticated`] extension.
pub async fn token_auth_middleware<R>(
    State(state): State<TokenAuthState<R>>,
    request: Request,
    next: Next,
) -> Response
where
    R: Authenticatable + Clone + Send + Sync + 'static,
{
    let (mut parts, body) = request.into_parts();
    let mut ctx = RequestContext::<R>::from_parts(&parts);

    for hook in state.hooks.matching(&parts) {
        if let Err(e) = state.authenticator.run_hook(&hook, &mut ctx).await {
            tracing::debug!(hook = %hook, error = %e, "Token authentication rejected request");
            return e.into_response();
        }
    }

    parts
        .extensions
        .insert(TokenAuthenticated::new(ctx.into_signed_in()));

    next.run(Request::from_parts(parts, body)).await
}
