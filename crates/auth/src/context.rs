//! Per-request authentication context
//!
//! Holds the credential sources of one request (parameters and headers)
//! and the records signed in for it. Lives exactly as long as the request.

use std::collections::HashMap;

use axum::{
    extract::Query,
    http::{request::Parts, HeaderMap, HeaderName, HeaderValue},
};
use chrono::{DateTime, Utc};

/// Read-only view of request parameters and headers.
pub trait CredentialSource {
    fn param(&self, name: &str) -> Option<&str>;
    fn header(&self, name: &str) -> Option<&str>;
}

/// A record signed in for the current request.
#[derive(Debug, Clone)]
pub struct SignedIn<R> {
    pub record: R,
    /// Whether the sign-in should outlive the request.
    pub persisted: bool,
    /// False for records that were already authenticated by a session.
    pub via_token: bool,
    pub signed_in_at: DateTime<Utc>,
}

/// Parameters parsed by the host from the request body.
///
/// Inserted as a request extension by an outer layer. Query string values
/// take precedence over body values of the same name.
#[derive(Debug, Clone, Default)]
pub struct RequestParams(pub HashMap<String, String>);

/// Records already authenticated by the host's session layer, keyed by scope.
#[derive(Debug, Clone)]
pub struct SessionRecords<R>(pub HashMap<String, R>);

impl<R> Default for SessionRecords<R> {
    fn default() -> Self {
        Self(HashMap::new())
    }
}

#[derive(Debug, Clone)]
pub struct RequestContext<R> {
    params: HashMap<String, String>,
    headers: HeaderMap,
    signed_in: HashMap<String, SignedIn<R>>,
}

impl<R> Default for RequestContext<R> {
    fn default() -> Self {
        Self {
            params: HashMap::new(),
            headers: HeaderMap::new(),
            signed_in: HashMap::new(),
        }
    }
}

impl<R> RequestContext<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a request parameter
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Add a request header. Invalid header names or values are ignored.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Mark `record` as already authenticated for `scope` by other means.
    pub fn with_current_record(mut self, scope: impl Into<String>, record: R) -> Self {
        self.signed_in.insert(
            scope.into(),
            SignedIn {
                record,
                persisted: true,
                via_token: false,
                signed_in_at: Utc::now(),
            },
        );
        self
    }

    /// Current-record accessor for an entity alias.
    pub fn current_record_for(&self, scope: &str) -> Option<&R> {
        self.signed_in.get(scope).map(|signed_in| &signed_in.record)
    }

    pub fn signed_in(&self, scope: &str) -> Option<&SignedIn<R>> {
        self.signed_in.get(scope)
    }

    /// Sign `record` in for `scope`, replacing any previous record.
    pub fn sign_in(&mut self, scope: &str, record: R, persist: bool) {
        self.signed_in.insert(
            scope.to_string(),
            SignedIn {
                record,
                persisted: persist,
                via_token: true,
                signed_in_at: Utc::now(),
            },
        );
    }

    pub fn into_signed_in(self) -> HashMap<String, SignedIn<R>> {
        self.signed_in
    }
}

impl<R: Clone> RequestContext<R> {
    /// Build the context from request parts: query string, headers, and
    /// the optional [`RequestParams`] / [`SessionRecords`] extensions.
    pub fn from_parts(parts: &Parts) -> Self
    where
        R: Send + Sync + 'static,
    {
        let mut params = parts
            .extensions
            .get::<RequestParams>()
            .map(|RequestParams(body_params)| body_params.clone())
            .unwrap_or_default();

        if let Ok(Query(query)) = Query::<HashMap<String, String>>::try_from_uri(&parts.uri) {
            params.extend(query);
        }

        let mut ctx = Self {
            params,
            headers: parts.headers.clone(),
            signed_in: HashMap::new(),
        };

        if let Some(SessionRecords(records)) = parts.extensions.get::<SessionRecords<R>>() {
            for (scope, record) in records {
                ctx = ctx.with_current_record(scope.clone(), record.clone());
            }
        }

        ctx
    }
}

impl<R> CredentialSource for RequestContext<R> {
    fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }
}
