//! Authenticatable entity configuration
//!
//! An [`Entity`] describes one record type that can sign in with a token.
//! Every derived name (headers, params, hook names) is computed once in
//! [`Entity::new`] because headers and params are part of the wire
//! contract and must never drift between requests.

use serde::{Deserialize, Deserializer};
use tokenauth_common::TokenAuthSettings;

use crate::backend::ModelResolver;
use crate::error::TokenAuthError;
use crate::fallback::FallbackPolicy;
use crate::hooks::RouteFilter;
use crate::types::{camelize, classify, underscore, ModelType};

/// Settings key of the token header override.
pub const TOKEN_HEADER_FIELD: &str = "authentication_token";

/// Options accepted when registering an entity. Unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EntityOptions {
    /// Alias used to derive param, scope and hook names.
    #[serde(rename = "as")]
    pub alias: Option<String>,
    #[serde(deserialize_with = "one_or_many")]
    pub only: Vec<String>,
    #[serde(deserialize_with = "one_or_many")]
    pub except: Vec<String>,
    /// Names of host conditions that must all hold.
    #[serde(rename = "if", deserialize_with = "one_or_many")]
    pub if_conditions: Vec<String>,
    /// Names of host conditions that must all fail.
    #[serde(deserialize_with = "one_or_many")]
    pub unless: Vec<String>,
    pub fallback: FallbackPolicy,
}

impl EntityOptions {
    /// Parse options from a JSON object.
    pub fn from_value(value: serde_json::Value) -> Result<Self, TokenAuthError> {
        serde_json::from_value(value)
            .map_err(|e| TokenAuthError::Configuration(format!("invalid entity options: {e}")))
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn fallback(mut self, fallback: FallbackPolicy) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn only<I, S>(mut self, routes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.only = routes.into_iter().map(Into::into).collect();
        self
    }

    pub fn except<I, S>(mut self, routes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.except = routes.into_iter().map(Into::into).collect();
        self
    }

    fn route_filter(&self) -> RouteFilter {
        RouteFilter {
            only: self.only.clone(),
            except: self.except.clone(),
            if_conditions: self.if_conditions.clone(),
            unless: self.unless.clone(),
        }
    }
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(value) => vec![value],
        OneOrMany::Many(values) => values,
    })
}

/// One authenticatable record type. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    model: ModelType,
    alias: String,
    identifier: String,
    token_header_name: String,
    identifier_header_name: String,
    token_param_name: String,
    identifier_param_name: String,
    auth_method_name: String,
    auth_bang_method_name: String,
    auth_object_method_name: String,
    controller_auth_hook_name: String,
    route_filter: RouteFilter,
    fallback: FallbackPolicy,
}

impl Entity {
    pub fn new(
        model_key: &str,
        options: EntityOptions,
        settings: &TokenAuthSettings,
        resolver: &dyn ModelResolver,
    ) -> Result<Self, TokenAuthError> {
        let model = resolver.resolve_model(&classify(model_key))?;

        let alias = match options.alias.as_deref().map(str::trim) {
            Some("") => {
                return Err(TokenAuthError::Configuration(format!(
                    "empty `as` option for model `{model}`"
                )))
            }
            Some(alias) => underscore(alias),
            None => underscore(model.name()),
        };

        let identifier = settings.identifier_for(&alias).to_string();

        let token_header_name = settings
            .header_name(&alias, TOKEN_HEADER_FIELD)
            .map(str::to_string)
            .unwrap_or_else(|| format!("X-{model}-Token"));
        let identifier_header_name = settings
            .header_name(&alias, &identifier)
            .map(str::to_string)
            .unwrap_or_else(|| format!("X-{model}-{}", camelize(&identifier)));

        let auth_method_name = format!("authenticate_{alias}_from_token");
        let auth_bang_method_name = format!("{auth_method_name}!");
        let auth_object_method_name = format!("current_{alias}");

        // Chosen once here; request handling never re-evaluates it.
        let controller_auth_hook_name = if options.fallback.is_configured() {
            auth_method_name.clone()
        } else {
            auth_object_method_name.clone()
        };

        Ok(Self {
            token_param_name: format!("{alias}_token"),
            identifier_param_name: format!("{alias}_{identifier}"),
            route_filter: options.route_filter(),
            fallback: options.fallback,
            model,
            alias,
            identifier,
            token_header_name,
            identifier_header_name,
            auth_method_name,
            auth_bang_method_name,
            auth_object_method_name,
            controller_auth_hook_name,
        })
    }

    /// Canonical model key, e.g. `AdminUser`.
    pub fn model_key(&self) -> &str {
        self.model.name()
    }

    pub fn model(&self) -> &ModelType {
        &self.model
    }

    /// Underscored alias; also the sign-in and failure scope.
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Record attribute used for lookup.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn token_header_name(&self) -> &str {
        &self.token_header_name
    }

    pub fn identifier_header_name(&self) -> &str {
        &self.identifier_header_name
    }

    pub fn token_param_name(&self) -> &str {
        &self.token_param_name
    }

    pub fn identifier_param_name(&self) -> &str {
        &self.identifier_param_name
    }

    pub fn auth_method_name(&self) -> &str {
        &self.auth_method_name
    }

    pub fn auth_bang_method_name(&self) -> &str {
        &self.auth_bang_method_name
    }

    pub fn auth_object_method_name(&self) -> &str {
        &self.auth_object_method_name
    }

    /// Hook installed at registration: the bang-free authenticate hook
    /// when a fallback is configured, otherwise the current-record accessor.
    pub fn controller_auth_hook_name(&self) -> &str {
        &self.controller_auth_hook_name
    }

    pub fn route_filter(&self) -> &RouteFilter {
        &self.route_filter
    }

    pub fn fallback(&self) -> FallbackPolicy {
        self.fallback
    }
}
