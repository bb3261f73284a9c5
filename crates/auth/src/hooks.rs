//! Before-route hook registration
//!
//! The engine names hooks and hands them, with their route filter, to a
//! [`HookRegistrar`]. [`RouteHooks`] is the axum-side registrar used by
//! [`crate::token_auth_middleware`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use axum::extract::MatchedPath;
use axum::http::request::Parts;

use crate::error::TokenAuthError;

/// Which routes a hook applies to. Interpreted by the registrar only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteFilter {
    pub only: Vec<String>,
    pub except: Vec<String>,
    pub if_conditions: Vec<String>,
    pub unless: Vec<String>,
}

/// Handler variant behind a hook name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookKind {
    /// `authenticate_<alias>_from_token`: try silently.
    Authenticate,
    /// `authenticate_<alias>_from_token!`: try, then apply the fallback.
    AuthenticateOrFallback,
    /// `current_<alias>`: try silently unless a record is already current.
    CurrentRecord,
}

/// Host hook-registration boundary.
pub trait HookRegistrar {
    fn register_before_route_hook(
        &mut self,
        hook_name: &str,
        filter: &RouteFilter,
    ) -> Result<(), TokenAuthError>;
}

/// Predicate over request parts, referenced by name from `if` / `unless`.
pub type Condition = Arc<dyn Fn(&Parts) -> bool + Send + Sync>;

#[derive(Debug, Clone)]
struct InstalledHook {
    name: String,
    filter: RouteFilter,
}

/// Ordered before-route hooks with path and condition matching.
///
/// `only` / `except` entries match a request path exactly, or by prefix
/// when they end in `*`. The route template from [`MatchedPath`] is
/// checked as well as the concrete path.
#[derive(Clone, Default)]
pub struct RouteHooks {
    hooks: Vec<InstalledHook>,
    conditions: HashMap<String, Condition>,
}

impl RouteHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a named condition. Must happen before hooks referencing it.
    pub fn with_condition<F>(mut self, name: impl Into<String>, condition: F) -> Self
    where
        F: Fn(&Parts) -> bool + Send + Sync + 'static,
    {
        self.conditions.insert(name.into(), Arc::new(condition));
        self
    }

    /// Installed hook names in installation order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.hooks.iter().map(|hook| hook.name.as_str())
    }

    /// Hooks that apply to the request, in installation order.
    pub fn matching(&self, parts: &Parts) -> Vec<String> {
        let path = parts.uri.path();
        let template = parts.extensions.get::<MatchedPath>().map(MatchedPath::as_str);

        self.hooks
            .iter()
            .filter(|hook| self.applies(&hook.filter, path, template, parts))
            .map(|hook| hook.name.clone())
            .collect()
    }

    fn applies(
        &self,
        filter: &RouteFilter,
        path: &str,
        template: Option<&str>,
        parts: &Parts,
    ) -> bool {
        let hits = |patterns: &[String]| {
            patterns.iter().any(|pattern| {
                path_matches(pattern, path) || template.is_some_and(|t| path_matches(pattern, t))
            })
        };

        if !filter.only.is_empty() && !hits(filter.only.as_slice()) {
            return false;
        }
        if hits(filter.except.as_slice()) {
            return false;
        }

        let holds = |name: &String| self.conditions.get(name).is_some_and(|c| c(parts));

        filter.if_conditions.iter().all(holds) && !filter.unless.iter().any(holds)
    }
}

impl HookRegistrar for RouteHooks {
    fn register_before_route_hook(
        &mut self,
        hook_name: &str,
        filter: &RouteFilter,
    ) -> Result<(), TokenAuthError> {
        if let Some(unknown) = filter
            .if_conditions
            .iter()
            .chain(&filter.unless)
            .find(|name| !self.conditions.contains_key(*name))
        {
            return Err(TokenAuthError::Configuration(format!(
                "hook `{hook_name}` references unknown condition `{unknown}`"
            )));
        }

        self.hooks.push(InstalledHook {
            name: hook_name.to_string(),
            filter: filter.clone(),
        });
        Ok(())
    }
}

impl fmt::Debug for RouteHooks {
    #[mutants::skip] // Diagnostic output only
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteHooks")
            .field("hooks", &self.hooks)
            .field("conditions", &self.conditions.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn path_matches(pattern: &str, path: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => path.starts_with(prefix),
        None => pattern == path,
    }
}
