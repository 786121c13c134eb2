//! Authentication Module
//!
//! Token lifecycle: validity checking, the per-account token cache, and the
//! two auth strategies (OAuth refresh token vs. legacy owner login).

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// A bearer token with issuance time and declared lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    /// Seconds since epoch when the token was obtained.
    pub issued_at: i64,
    /// Validity duration declared by the auth server, in seconds.
    pub expires_in: i64,
}

impl Token {
    pub fn new(access_token: String, expires_in: i64) -> Self {
        Self {
            access_token,
            issued_at: chrono::Utc::now().timestamp(),
            expires_in,
        }
    }

    /// Check validity against an explicit clock.
    pub fn is_valid_at(&self, now: i64) -> bool {
        !self.access_token.is_empty() && now < self.issued_at + self.expires_in
    }

    /// Check if the token is currently valid
    pub fn is_valid(&self) -> bool {
        self.is_valid_at(chrono::Utc::now().timestamp())
    }
}

/// Cache key derived from the account.
///
/// Refresh-token mode keys by email. Owner-login mode keys by a hash of
/// email and password, so two passwords for one email never collide and the
/// password itself is not held as a map key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity(String);

impl Identity {
    pub fn from_email(email: &str) -> Self {
        Self(email.to_string())
    }

    pub fn from_login(email: &str, password: &str) -> Self {
        let digest = Sha256::digest(format!("{email}:{password}").as_bytes());
        Self(format!("{digest:x}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Credentials for minting a new token. The two strategies are alternatives
/// selected by configuration, never mixed.
#[derive(Debug, Clone)]
pub enum Credentials {
    /// OAuth refresh grant against the SSO token endpoint.
    RefreshToken { email: String, refresh_token: String },
    /// Legacy password grant against the Owner API.
    OwnerLogin { email: String, password: String },
}

impl Credentials {
    /// Cache key for these credentials.
    pub fn identity(&self) -> Identity {
        match self {
            Credentials::RefreshToken { email, .. } => Identity::from_email(email),
            Credentials::OwnerLogin { email, password } => Identity::from_login(email, password),
        }
    }
}

/// Auth endpoint errors
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Auth endpoint rejected request: {0}")]
    Rejected(String),

    #[error("Malformed token response: {0}")]
    MalformedResponse(String),

    #[error("Fetched token failed validity check")]
    InvalidToken,
}

/// Seam to the auth endpoint, substituted by fakes in tests.
#[async_trait::async_trait]
pub trait AuthApi: Send + Sync {
    async fn fetch_token(&self, credentials: &Credentials) -> Result<Token, AuthError>;
}

/// Storage behind the token cache.
#[async_trait::async_trait]
pub trait TokenStore: Send + Sync {
    async fn get(&self, identity: &Identity) -> Option<Token>;
    async fn put(&self, identity: Identity, token: Token);
}

/// Default in-memory store. Entries are only written by a successful fetch
/// and never evicted; a stale entry is replaced on the next resolve.
#[derive(Default)]
pub struct MemoryStore {
    tokens: Mutex<HashMap<Identity, Token>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl TokenStore for MemoryStore {
    async fn get(&self, identity: &Identity) -> Option<Token> {
        self.tokens.lock().await.get(identity).cloned()
    }

    async fn put(&self, identity: Identity, token: Token) {
        self.tokens.lock().await.insert(identity, token);
    }
}

/// Per-account token cache.
///
/// Concurrent resolves for the same identity are coalesced: a per-identity
/// lock guards the fetch, and the store is re-checked after acquiring it, so
/// N racing callers produce exactly one refresh call.
pub struct TokenCache<S: TokenStore = MemoryStore> {
    store: S,
    refresh_locks: Mutex<HashMap<Identity, Arc<Mutex<()>>>>,
}

impl TokenCache<MemoryStore> {
    pub fn new() -> Self {
        Self::with_store(MemoryStore::new())
    }
}

impl Default for TokenCache<MemoryStore> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: TokenStore> TokenCache<S> {
    pub fn with_store(store: S) -> Self {
        Self {
            store,
            refresh_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve an access token for the given credentials.
    ///
    /// Returns the cached token when present and valid, without any network
    /// call; otherwise fetches a replacement, stores it, and returns it. A
    /// fetched token that fails the validity check is a hard error and is
    /// never cached.
    pub async fn resolve(
        &self,
        auth: &impl AuthApi,
        credentials: &Credentials,
    ) -> Result<String, AuthError> {
        let identity = credentials.identity();

        if let Some(token) = self.store.get(&identity).await {
            if token.is_valid() {
                debug!("Using cached access token for {}", identity.as_str());
                return Ok(token.access_token);
            }
            debug!("Cached token for {} expired", identity.as_str());
        }

        let lock = self.refresh_lock(&identity).await;
        let _guard = lock.lock().await;

        // Another caller may have refreshed while we waited for the lock.
        if let Some(token) = self.store.get(&identity).await {
            if token.is_valid() {
                debug!("Token refreshed concurrently for {}", identity.as_str());
                return Ok(token.access_token);
            }
        }

        info!("Fetching new access token for {}", identity.as_str());
        let token = auth.fetch_token(credentials).await?;
        if !token.is_valid() {
            return Err(AuthError::InvalidToken);
        }

        let access_token = token.access_token.clone();
        self.store.put(identity, token).await;
        Ok(access_token)
    }

    async fn refresh_lock(&self, identity: &Identity) -> Arc<Mutex<()>> {
        let mut locks = self.refresh_locks.lock().await;
        locks
            .entry(identity.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}
