//! Deduplicated, cached credential verification.
//!
//! Concurrent `verify` calls carrying the same credentials collapse onto a
//! single SRP exchange: the first caller inserts a shared cell under the
//! cache lock and computes outside it, everyone else awaits that cell.
//! Entries are swept lazily on the next lookup once their window passes, so
//! there are no timers to leak and nothing blocks shutdown.

use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, OnceCell};
use tracing::debug;

use super::{Account, AccountStore, AuthError};
use crate::srp;

type Fingerprint = [u8; 32];

struct CacheEntry {
    outcome: Arc<OnceCell<bool>>,
    created_at: Instant,
}

pub struct Verifier {
    accounts: Arc<dyn AccountStore>,
    ttl: Duration,
    entries: Mutex<HashMap<Fingerprint, CacheEntry>>,
    handshakes: AtomicU64,
}

impl Verifier {
    #[must_use]
    pub fn new(accounts: Arc<dyn AccountStore>, ttl: Duration) -> Self {
        Self {
            accounts,
            ttl,
            entries: Mutex::new(HashMap::new()),
            handshakes: AtomicU64::new(0),
        }
    }

    /// Check `(username, password)` against the stored verifier.
    ///
    /// `Ok(Some(account))` on a match, `Ok(None)` for every routine
    /// rejection — unknown user, no SRP material, empty password, wrong
    /// password — with no structural difference between them. A stored pair
    /// that fails to parse is a data-integrity problem and comes back as
    /// [`AuthError::MalformedAccount`].
    pub async fn verify(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<Account>, AuthError> {
        if password.is_empty() {
            return Ok(None);
        }
        let username = self.accounts.normalize_username(username);
        let Some(account) = self.accounts.get_account(&username) else {
            return Ok(None);
        };
        let Some(material) = account.srp.clone() else {
            return Ok(None);
        };

        let outcome = {
            let key = fingerprint(&username, password, &material);
            let mut entries = self.entries.lock().await;
            let now = Instant::now();
            entries.retain(|_, entry| now.duration_since(entry.created_at) < self.ttl);
            entries
                .entry(key)
                .or_insert_with(|| CacheEntry {
                    outcome: Arc::new(OnceCell::new()),
                    created_at: now,
                })
                .outcome
                .clone()
        };

        // A caller still in flight when its entry is swept keeps the cell
        // alive through this clone and observes the true outcome.
        let matched = *outcome
            .get_or_try_init(|| self.exchange(account.clone(), password.to_string()))
            .await?;

        Ok(if matched { Some(account) } else { None })
    }

    async fn exchange(&self, account: Account, password: String) -> Result<bool, AuthError> {
        self.handshakes.fetch_add(1, Ordering::Relaxed);
        debug!("running SRP exchange for {}", account.username);

        // Modular exponentiation is the expensive step; keep it off the
        // async workers.
        let matched = tokio::task::spawn_blocking(move || {
            let challenge = srp::begin_handshake(&account)?;
            let response =
                srp::client::respond(&password, &challenge.salt, &challenge.public_key)?;
            challenge
                .handshake
                .complete(&response.public_key, &response.proof)
        })
        .await??;

        Ok(matched)
    }

    /// SRP exchanges actually executed, i.e. cache misses.
    #[must_use]
    pub fn handshakes_run(&self) -> u64 {
        self.handshakes.load(Ordering::Relaxed)
    }
}

/// Cache key over everything that determines an attempt's outcome. The
/// stored material is part of the input, so rotating a verifier implicitly
/// invalidates stale entries.
fn fingerprint(username: &str, password: &str, material: &str) -> Fingerprint {
    let mut hasher = Sha256::new();
    hasher.update(username.as_bytes());
    hasher.update([0u8]);
    hasher.update(password.as_bytes());
    hasher.update([0u8]);
    hasher.update(material.as_bytes());
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryAccountStore;
    use crate::srp::client;
    use std::time::Duration;

    fn store_with_account(username: &str, password: &str) -> Arc<MemoryAccountStore> {
        let store = Arc::new(MemoryAccountStore::new());
        store.insert(account_for(username, password));
        store
    }

    fn account_for(username: &str, password: &str) -> Account {
        let salt = client::generate_salt();
        let verifier = client::derive_verifier(password, &salt).expect("derive verifier");
        Account {
            username: username.to_string(),
            srp: Some(format!("{salt}|{verifier}")),
        }
    }

    fn verifier_with_ttl(store: Arc<MemoryAccountStore>, ttl: Duration) -> Verifier {
        Verifier::new(store, ttl)
    }

    #[tokio::test]
    async fn matching_password_returns_the_account() {
        let store = store_with_account("alice", "correct horse");
        let verifier = verifier_with_ttl(store, Duration::from_secs(60));

        let result = verifier.verify("alice", "correct horse").await.expect("verify");
        assert_eq!(result.map(|account| account.username), Some("alice".to_string()));
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_are_shape_identical() {
        let store = store_with_account("alice", "correct horse");
        let verifier = verifier_with_ttl(store, Duration::from_secs(60));

        let wrong = verifier.verify("alice", "wrongpassword").await.expect("verify");
        let unknown = verifier.verify("doesNotExist", "anything").await.expect("verify");
        assert!(wrong.is_none());
        assert!(unknown.is_none());
    }

    #[tokio::test]
    async fn empty_password_short_circuits_without_a_handshake() {
        let store = store_with_account("alice", "correct horse");
        let verifier = verifier_with_ttl(store, Duration::from_secs(60));

        let result = verifier.verify("alice", "").await.expect("verify");
        assert!(result.is_none());
        assert_eq!(verifier.handshakes_run(), 0);
    }

    #[tokio::test]
    async fn account_without_srp_is_a_routine_rejection() {
        let store = Arc::new(MemoryAccountStore::new());
        store.insert(Account {
            username: "alice".to_string(),
            srp: None,
        });
        let verifier = verifier_with_ttl(store, Duration::from_secs(60));

        let result = verifier.verify("alice", "anything").await.expect("verify");
        assert!(result.is_none());
        assert_eq!(verifier.handshakes_run(), 0);
    }

    #[tokio::test]
    async fn malformed_material_is_a_hard_error() {
        let store = Arc::new(MemoryAccountStore::new());
        store.insert(Account {
            username: "alice".to_string(),
            srp: Some("onlysalt".to_string()),
        });
        let verifier = verifier_with_ttl(store, Duration::from_secs(60));

        let result = verifier.verify("alice", "anything").await;
        assert!(matches!(result, Err(AuthError::MalformedAccount)));
    }

    #[tokio::test]
    async fn concurrent_identical_attempts_share_one_exchange() {
        let store = store_with_account("alice", "correct horse");
        let verifier = verifier_with_ttl(store, Duration::from_secs(60));

        let (a, b, c, d, e) = tokio::join!(
            verifier.verify("alice", "correct horse"),
            verifier.verify("alice", "correct horse"),
            verifier.verify("alice", "correct horse"),
            verifier.verify("alice", "correct horse"),
            verifier.verify("alice", "correct horse"),
        );

        for result in [a, b, c, d, e] {
            let account = result.expect("verify");
            assert_eq!(account.map(|account| account.username), Some("alice".to_string()));
        }
        assert_eq!(verifier.handshakes_run(), 1);
    }

    #[tokio::test]
    async fn settled_entries_are_reused_within_the_window() {
        let store = store_with_account("alice", "correct horse");
        let verifier = verifier_with_ttl(store, Duration::from_secs(60));

        verifier.verify("alice", "correct horse").await.expect("verify");
        verifier.verify("alice", "correct horse").await.expect("verify");
        assert_eq!(verifier.handshakes_run(), 1);
    }

    #[tokio::test]
    async fn entries_expire_after_the_window() {
        let store = store_with_account("alice", "correct horse");
        let verifier = verifier_with_ttl(store, Duration::from_millis(50));

        verifier.verify("alice", "correct horse").await.expect("verify");
        tokio::time::sleep(Duration::from_millis(80)).await;
        verifier.verify("alice", "correct horse").await.expect("verify");
        assert_eq!(verifier.handshakes_run(), 2);
    }

    #[tokio::test]
    async fn failed_outcomes_are_cached_too() {
        let store = store_with_account("alice", "correct horse");
        let verifier = verifier_with_ttl(store, Duration::from_secs(60));

        let first = verifier.verify("alice", "wrongpassword").await.expect("verify");
        let second = verifier.verify("alice", "wrongpassword").await.expect("verify");
        assert!(first.is_none());
        assert!(second.is_none());
        assert_eq!(verifier.handshakes_run(), 1);
    }

    #[tokio::test]
    async fn rotating_the_verifier_rotates_the_fingerprint() {
        let store = store_with_account("alice", "correct horse");
        let verifier = verifier_with_ttl(store.clone(), Duration::from_secs(60));

        verifier.verify("alice", "correct horse").await.expect("verify");
        assert_eq!(verifier.handshakes_run(), 1);

        // Same password, fresh salt: the stored material changes, so the
        // cached outcome no longer applies.
        store.insert(account_for("alice", "correct horse"));
        let result = verifier.verify("alice", "correct horse").await.expect("verify");
        assert!(result.is_some());
        assert_eq!(verifier.handshakes_run(), 2);
    }
}
