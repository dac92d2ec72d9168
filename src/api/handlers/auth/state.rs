//! Auth state and configuration for the HTTP surface.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::auth::{AccountStore, SessionManager, Verifier};
use crate::srp::ServerHandshake;

const DEFAULT_SESSION_TTL_SECONDS: u64 = 12 * 60 * 60;
const DEFAULT_VERIFY_CACHE_TTL_SECONDS: u64 = 60;
const DEFAULT_HANDSHAKE_TTL_SECONDS: u64 = 5 * 60;

#[derive(Clone, Debug)]
pub struct AuthConfig {
    frontend_base_url: String,
    session_ttl_seconds: u64,
    verify_cache_ttl_seconds: u64,
    handshake_ttl_seconds: u64,
}

impl AuthConfig {
    #[must_use]
    pub fn new(frontend_base_url: String) -> Self {
        Self {
            frontend_base_url,
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            verify_cache_ttl_seconds: DEFAULT_VERIFY_CACHE_TTL_SECONDS,
            handshake_ttl_seconds: DEFAULT_HANDSHAKE_TTL_SECONDS,
        }
    }

    #[must_use]
    pub fn with_session_ttl_seconds(mut self, seconds: u64) -> Self {
        self.session_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_verify_cache_ttl_seconds(mut self, seconds: u64) -> Self {
        self.verify_cache_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_handshake_ttl_seconds(mut self, seconds: u64) -> Self {
        self.handshake_ttl_seconds = seconds;
        self
    }

    pub(crate) fn frontend_base_url(&self) -> &str {
        &self.frontend_base_url
    }

    pub(super) fn session_ttl_seconds(&self) -> u64 {
        self.session_ttl_seconds
    }

    pub(super) fn verify_cache_ttl_seconds(&self) -> u64 {
        self.verify_cache_ttl_seconds
    }

    pub(super) fn handshake_ttl_seconds(&self) -> u64 {
        self.handshake_ttl_seconds
    }

    pub(super) fn session_cookie_secure(&self) -> bool {
        self.frontend_base_url.starts_with("https://")
    }
}

/// A handshake parked between the challenge and proof requests.
pub(super) struct PendingLogin {
    pub(super) handshake: ServerHandshake,
    pub(super) username: String,
    created_at: Instant,
}

/// Custody of in-flight handshakes, keyed by an opaque login id.
///
/// `take` is single-use: whatever the proof outcome, a login id never
/// completes twice.
pub struct PendingLogins {
    ttl: Duration,
    entries: Mutex<HashMap<Uuid, PendingLogin>>,
}

impl PendingLogins {
    fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub(super) async fn store(&self, handshake: ServerHandshake, username: String) -> Uuid {
        let login_id = Uuid::new_v4();
        let mut entries = self.entries.lock().await;
        entries.retain(|_, entry| entry.created_at.elapsed() < self.ttl);
        entries.insert(
            login_id,
            PendingLogin {
                handshake,
                username,
                created_at: Instant::now(),
            },
        );
        login_id
    }

    pub(super) async fn take(&self, login_id: Uuid) -> Option<PendingLogin> {
        let mut entries = self.entries.lock().await;
        match entries.remove(&login_id) {
            Some(entry) if entry.created_at.elapsed() < self.ttl => Some(entry),
            _ => None,
        }
    }
}

pub struct AuthState {
    config: AuthConfig,
    accounts: Arc<dyn AccountStore>,
    verifier: Verifier,
    sessions: SessionManager,
    logins: PendingLogins,
}

impl AuthState {
    #[must_use]
    pub fn new(config: AuthConfig, accounts: Arc<dyn AccountStore>) -> Self {
        let verifier = Verifier::new(
            accounts.clone(),
            Duration::from_secs(config.verify_cache_ttl_seconds()),
        );
        let sessions = SessionManager::new(
            accounts.clone(),
            Duration::from_secs(config.session_ttl_seconds()),
        );
        let logins = PendingLogins::new(Duration::from_secs(config.handshake_ttl_seconds()));
        Self {
            config,
            accounts,
            verifier,
            sessions,
            logins,
        }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn accounts(&self) -> &dyn AccountStore {
        self.accounts.as_ref()
    }

    #[must_use]
    pub fn verifier(&self) -> &Verifier {
        &self.verifier
    }

    #[must_use]
    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub(super) fn logins(&self) -> &PendingLogins {
        &self.logins
    }
}
