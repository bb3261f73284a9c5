//! Per-resource entity registry
//!
//! Built once at startup through [`EntityRegistryBuilder`]; the finished
//! [`EntityRegistry`] has no mutating API, so request handlers can share
//! it freely behind an `Arc`.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokenauth_common::TokenAuthSettings;

use crate::backend::ModelResolver;
use crate::entity::{Entity, EntityOptions};
use crate::error::TokenAuthError;
use crate::hooks::{HookKind, HookRegistrar, RouteFilter};
use crate::types::classify;

/// A named handler: which entity it authenticates and how.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookHandler {
    pub model_key: String,
    pub kind: HookKind,
}

/// Registers entities and installs their hooks with the host.
pub struct EntityRegistryBuilder<'a> {
    settings: &'a TokenAuthSettings,
    resolver: &'a dyn ModelResolver,
    registrar: &'a mut dyn HookRegistrar,
    entities: Vec<Arc<Entity>>,
    by_key: HashMap<String, usize>,
    handlers: HashMap<String, HookHandler>,
    installed: HashSet<String>,
}

impl<'a> EntityRegistryBuilder<'a> {
    pub fn new(
        settings: &'a TokenAuthSettings,
        resolver: &'a dyn ModelResolver,
        registrar: &'a mut dyn HookRegistrar,
    ) -> Self {
        Self {
            settings,
            resolver,
            registrar,
            entities: Vec::new(),
            by_key: HashMap::new(),
            handlers: HashMap::new(),
            installed: HashSet::new(),
        }
    }

    /// Register `model` and install its controller hook.
    ///
    /// Registering a model key that is already present returns the
    /// existing entity untouched; the new options are ignored and no hook
    /// is installed a second time.
    pub fn register(
        &mut self,
        model: &str,
        options: EntityOptions,
    ) -> Result<Arc<Entity>, TokenAuthError> {
        let key = classify(model);
        if let Some(&index) = self.by_key.get(&key) {
            tracing::debug!(model = %key, "Entity already registered");
            return Ok(self.entities[index].clone());
        }

        let entity = Arc::new(Entity::new(&key, options, self.settings, self.resolver)?);

        let named = [
            (entity.auth_method_name(), HookKind::Authenticate),
            (entity.auth_bang_method_name(), HookKind::AuthenticateOrFallback),
            (entity.auth_object_method_name(), HookKind::CurrentRecord),
        ];

        for (name, _) in &named {
            if let Some(existing) = self.handlers.get(*name) {
                return Err(TokenAuthError::Configuration(format!(
                    "hook `{name}` of `{}` collides with `{}`; use a distinct `as` alias",
                    entity.model_key(),
                    existing.model_key
                )));
            }
        }
        // The host may still reject the hook; commit nothing until it accepts.
        let hook_name = entity.controller_auth_hook_name();
        self.registrar
            .register_before_route_hook(hook_name, entity.route_filter())?;
        tracing::debug!(hook = %hook_name, "Installed before-route hook");

        for (name, kind) in named {
            self.handlers.insert(
                name.to_string(),
                HookHandler {
                    model_key: entity.model_key().to_string(),
                    kind,
                },
            );
        }
        self.installed.insert(hook_name.to_string());
        self.by_key.insert(entity.model_key().to_string(), self.entities.len());
        self.entities.push(entity.clone());

        tracing::info!(
            model = %entity.model_key(),
            entity = %entity.alias(),
            fallback = ?entity.fallback(),
            "Registered token authenticatable entity"
        );

        Ok(entity)
    }

    /// Install a named hook with the host, at most once per name.
    ///
    /// Used for the bang guard (`authenticate_<alias>_from_token!`), which
    /// registration never installs on its own. A hook the host rejected
    /// may be installed again later.
    pub fn install_hook(
        &mut self,
        hook_name: &str,
        filter: RouteFilter,
    ) -> Result<(), TokenAuthError> {
        if !self.handlers.contains_key(hook_name) {
            return Err(TokenAuthError::Configuration(format!(
                "no registered entity provides hook `{hook_name}`"
            )));
        }
        if self.installed.contains(hook_name) {
            return Ok(());
        }

        self.registrar.register_before_route_hook(hook_name, &filter)?;
        self.installed.insert(hook_name.to_string());
        tracing::debug!(hook = %hook_name, "Installed before-route hook");
        Ok(())
    }

    pub fn build(self) -> EntityRegistry {
        EntityRegistry {
            entities: self.entities,
            by_key: self.by_key,
            handlers: self.handlers,
        }
    }
}

/// Immutable mapping of model key to entity, plus the named hook handlers.
#[derive(Debug, Clone)]
pub struct EntityRegistry {
    entities: Vec<Arc<Entity>>,
    by_key: HashMap<String, usize>,
    handlers: HashMap<String, HookHandler>,
}

impl EntityRegistry {
    /// Look up an entity; `user` and `User` name the same entity.
    pub fn get(&self, model: &str) -> Option<&Arc<Entity>> {
        let index = match self.by_key.get(model) {
            Some(index) => index,
            None => self.by_key.get(&classify(model))?,
        };
        self.entities.get(*index)
    }

    pub fn resolve_hook(&self, hook_name: &str) -> Option<&HookHandler> {
        self.handlers.get(hook_name)
    }

    /// Entities in registration order.
    pub fn entities(&self) -> impl Iterator<Item = &Arc<Entity>> {
        self.entities.iter()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
