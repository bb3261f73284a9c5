//! In-memory account store
//!
//! Stands in for the persistence layer of a real deployment: accounts are
//! seeded at startup and looked up by model and identifier field.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokenauth::{Authenticatable, ModelType, RecordFinder};
use uuid::Uuid;

/// Account row as exposed to handlers. The token is never serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Account {
    pub id: Uuid,
    pub model: String,
    pub email: String,
    pub username: String,
    #[serde(skip)]
    pub authentication_token: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn new(model: &str, email: &str, username: &str, token: Option<&str>) -> Self {
        Self {
            id: Uuid::new_v4(),
            model: model.to_string(),
            email: email.to_string(),
            username: username.to_string(),
            authentication_token: token.map(str::to_string),
            created_at: Utc::now(),
        }
    }

    fn field(&self, field: &str) -> Option<&str> {
        match field {
            "email" => Some(&self.email),
            "username" => Some(&self.username),
            _ => None,
        }
    }
}

impl Authenticatable for Account {
    fn authentication_token(&self) -> Option<&str> {
        self.authentication_token.as_deref()
    }
}

/// Accounts grouped by model name.
#[derive(Debug, Clone, Default)]
pub struct AccountStore {
    accounts: HashMap<String, Vec<Account>>,
}

impl AccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account(mut self, account: Account) -> Self {
        self.accounts
            .entry(account.model.clone())
            .or_default()
            .push(account);
        self
    }
}

#[async_trait]
impl RecordFinder<Account> for AccountStore {
    async fn find_for_authentication(
        &self,
        model: &ModelType,
        field: &str,
        value: &str,
    ) -> anyhow::Result<Option<Account>> {
        let Some(accounts) = self.accounts.get(model.name()) else {
            return Ok(None);
        };

        if accounts.first().is_some_and(|account| account.field(field).is_none()) {
            anyhow::bail!("`{model}` has no `{field}` attribute");
        }

        Ok(accounts
            .iter()
            .find(|account| account.field(field) == Some(value))
            .cloned())
    }
}
