//! Login-session lifecycle.
//!
//! Sessions live in process memory as hashed tokens; the raw token travels
//! to the client once and is never stored. Because a client can keep
//! presenting a token the server cannot reach out and destroy, forced
//! logout goes through an invalidated-usernames overlay: membership hides
//! every session of that account at resolve time, and the next successful
//! login lifts the mark.

use base64ct::{Base64UrlUnpadded, Encoding};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use super::{Account, AccountStore, AuthError};

/// Per-request view of the session transport.
#[derive(Debug, Default)]
struct RequestSession {
    token: Option<String>,
    username: Option<String>,
}

/// A request's working authentication state.
///
/// Handlers read it; only [`SessionManager::login`] and
/// [`SessionManager::logout`] mutate it.
#[derive(Debug)]
pub struct RequestContext {
    session: Option<RequestSession>,
    account: Option<Account>,
}

impl RequestContext {
    /// Context with a session transport attached and no identity bound.
    #[must_use]
    pub fn new() -> Self {
        Self {
            session: Some(RequestSession::default()),
            account: None,
        }
    }

    /// Context for an integration that never attached a session transport.
    /// Logging in through it is a server-configuration error.
    #[must_use]
    pub fn detached() -> Self {
        Self {
            session: None,
            account: None,
        }
    }

    /// The bound identity, or `None` when anonymous. Never fails.
    #[must_use]
    pub fn current_username(&self) -> Option<&str> {
        self.session
            .as_ref()
            .and_then(|session| session.username.as_deref())
    }

    /// The account resolved at login, kept for the rest of the request.
    #[must_use]
    pub fn account(&self) -> Option<&Account> {
        self.account.as_ref()
    }
}

struct SessionRecord {
    username: String,
    created_at: Instant,
}

pub struct SessionManager {
    accounts: Arc<dyn AccountStore>,
    ttl: Duration,
    sessions: Mutex<HashMap<Vec<u8>, SessionRecord>>,
    invalidated: Mutex<HashSet<String>>,
}

impl SessionManager {
    #[must_use]
    pub fn new(accounts: Arc<dyn AccountStore>, ttl: Duration) -> Self {
        Self {
            accounts,
            ttl,
            sessions: Mutex::new(HashMap::new()),
            invalidated: Mutex::new(HashSet::new()),
        }
    }

    /// Bind `username` into the request's session.
    ///
    /// Mints a transport token, records its hash, lifts any pending forced
    /// invalidation for the account, and attaches the resolved [`Account`]
    /// to the context. Returns the raw token for the transport cookie.
    pub async fn login(
        &self,
        ctx: &mut RequestContext,
        username: &str,
    ) -> Result<String, AuthError> {
        if ctx.session.is_none() {
            return Err(AuthError::NoSessionTransport);
        }
        let username = self.accounts.normalize_username(username);

        // A fresh login supersedes any pending forced invalidation.
        self.invalidated.lock().await.remove(&username);

        let token = generate_token()?;
        let now = Instant::now();
        {
            let mut sessions = self.sessions.lock().await;
            sessions.retain(|_, record| now.duration_since(record.created_at) < self.ttl);
            sessions.insert(
                hash_token(&token),
                SessionRecord {
                    username: username.clone(),
                    created_at: now,
                },
            );
        }

        ctx.account = self.accounts.get_account(&username);
        if let Some(session) = ctx.session.as_mut() {
            session.username = Some(username);
            session.token = Some(token.clone());
        }
        Ok(token)
    }

    /// Clear the bound identity and drop the token's record.
    ///
    /// Idempotent: logging out twice, or logging out a session that was
    /// never authenticated, is a no-op.
    pub async fn logout(&self, ctx: &mut RequestContext) {
        let token = match ctx.session.as_mut() {
            Some(session) => {
                session.username = None;
                session.token.take()
            }
            None => None,
        };
        if let Some(token) = token {
            self.sessions.lock().await.remove(&hash_token(&token));
        }
        ctx.account = None;
    }

    /// Force every session of `username` to read as anonymous until the
    /// account logs in again.
    pub async fn invalidate(&self, username: &str) {
        let username = self.accounts.normalize_username(username);
        self.invalidated.lock().await.insert(username);
    }

    pub async fn is_invalidated(&self, username: &str) -> bool {
        let username = self.accounts.normalize_username(username);
        self.invalidated.lock().await.contains(&username)
    }

    /// Build the request context for a presented token.
    ///
    /// Unknown tokens, expired records, and invalidated usernames all yield
    /// an anonymous context; this is a pure read and never errors.
    pub async fn context(&self, token: Option<&str>) -> RequestContext {
        let mut ctx = RequestContext::new();
        let Some(token) = token else {
            return ctx;
        };

        let username = self.resolve(token).await;
        ctx.account = match &username {
            Some(username) => self.accounts.get_account(username),
            None => None,
        };
        if let Some(session) = ctx.session.as_mut() {
            session.token = Some(token.to_string());
            session.username = username;
        }
        ctx
    }

    async fn resolve(&self, token: &str) -> Option<String> {
        let hash = hash_token(token);
        let username = {
            let mut sessions = self.sessions.lock().await;
            match sessions.get(&hash) {
                Some(record) if record.created_at.elapsed() < self.ttl => {
                    record.username.clone()
                }
                Some(_) => {
                    sessions.remove(&hash);
                    return None;
                }
                None => return None,
            }
        };

        if self.is_invalidated(&username).await {
            return None;
        }
        Some(username)
    }
}

/// Session tokens go to the client verbatim; only the hash is retained.
fn generate_token() -> Result<String, AuthError> {
    let mut bytes = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|_| AuthError::Token)?;
    Ok(Base64UrlUnpadded::encode_string(&bytes))
}

fn hash_token(token: &str) -> Vec<u8> {
    Sha256::digest(token.as_bytes()).to_vec()
}
