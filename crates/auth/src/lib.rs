//! Static token authentication for axum services
//!
//! Registers authenticatable entity types, extracts a token and an
//! identifier from request parameters or headers, compares the token in
//! constant time against the stored one, and signs the record in for the
//! request. Failures are handed to a per-entity fallback policy.

mod authenticator;
mod backend;
mod comparator;
mod context;
mod entity;
mod error;
mod extractors;
mod fallback;
mod hooks;
mod locator;
mod middleware;
mod registry;
mod types;

pub use authenticator::{AuthenticationOutcome, NoMatchReason, TokenAuthenticator};
pub use backend::{
    AfterAuthentication, IdentityPolicy, KnownModels, LoginRedirector, ModelResolver,
    NoopAfterAuthentication, RecordFinder, RequestSignIn, SignInHandler, SignInPathRedirector,
};
pub use comparator::TokenComparator;
pub use context::{CredentialSource, RequestContext, RequestParams, SessionRecords, SignedIn};
pub use entity::{Entity, EntityOptions, TOKEN_HEADER_FIELD};
pub use error::TokenAuthError;
pub use extractors::TokenAuthenticated;
pub use fallback::{FallbackDispatcher, FallbackPolicy};
pub use hooks::{Condition, HookKind, HookRegistrar, RouteFilter, RouteHooks};
pub use locator::{CredentialLocator, Credentials};
pub use middleware::{token_auth_middleware, TokenAuthState};
pub use registry::{EntityRegistry, EntityRegistryBuilder, HookHandler};
pub use types::{Authenticatable, ModelType};

pub use tokenauth_common::TokenAuthSettings;
