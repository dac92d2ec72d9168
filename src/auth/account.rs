//! Account records and the account-store seam.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::RwLock;

/// A stored account as the authentication core sees it.
///
/// `srp` is the serialized `"<salt>|<verifier>"` pair, both decimal big
/// integers. An account without it cannot authenticate via SRP.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Account {
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub srp: Option<String>,
}

/// Resolves usernames to credential records.
///
/// The store owns the canonicalization rule: every lookup and every
/// session-level operation goes through `normalize_username` first.
pub trait AccountStore: Send + Sync {
    fn get_account(&self, username: &str) -> Option<Account>;

    /// Canonical form used for lookups and session identity.
    fn normalize_username(&self, username: &str) -> String {
        username.trim().to_lowercase()
    }
}

/// In-memory store, seeded from a JSON file or built up in tests.
#[derive(Debug, Default)]
pub struct MemoryAccountStore {
    accounts: RwLock<HashMap<String, Account>>,
}

impl MemoryAccountStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load accounts from a JSON array of `{"username", "srp"}` objects.
    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read accounts file {}", path.display()))?;
        let accounts: Vec<Account> = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse accounts file {}", path.display()))?;

        let store = Self::new();
        for account in accounts {
            store.insert(account);
        }
        Ok(store)
    }

    /// Insert or replace an account, keyed by its normalized username.
    pub fn insert(&self, account: Account) {
        let key = self.normalize_username(&account.username);
        if let Ok(mut accounts) = self.accounts.write() {
            accounts.insert(key, account);
        }
    }
}

impl AccountStore for MemoryAccountStore {
    fn get_account(&self, username: &str) -> Option<Account> {
        let key = self.normalize_username(username);
        self.accounts
            .read()
            .ok()
            .and_then(|accounts| accounts.get(&key).cloned())
    }
}
