//! Record and model types shared by the resolution engine

use std::fmt;

use convert_case::{Case, Casing};

/// A record that can be authenticated by a static token.
pub trait Authenticatable {
    /// Token stored on the record, if one has been set.
    fn authentication_token(&self) -> Option<&str>;
}

/// Handle to a resolved record type (e.g. `User`, `AdminUser`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelType(String);

impl ModelType {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Canonical model key: `user`, `User` -> `User`; `admin_user` -> `AdminUser`.
pub(crate) fn classify(name: &str) -> String {
    name.to_case(Case::Pascal)
}

/// Underscored form used for aliases and derived names: `AdminUser` -> `admin_user`.
pub(crate) fn underscore(name: &str) -> String {
    name.to_case(Case::Snake)
}

/// Header segment for an identifier field: `email` -> `Email`, `phone_number` -> `PhoneNumber`.
pub(crate) fn camelize(name: &str) -> String {
    name.to_case(Case::Pascal)
}
