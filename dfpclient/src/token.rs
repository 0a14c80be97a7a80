//! ClientLogin token lifetime and the shared token cache

use chrono::{DateTime, TimeDelta, Utc};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// How long a ClientLogin token stays valid.
pub const TOKEN_TTL: TimeDelta = TimeDelta::hours(23);

/// Token and the time it was issued
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthToken {
    pub token: String,
    pub issued_at: DateTime<Utc>,
}

impl AuthToken {
    /// Token issued now.
    pub fn new(token: impl Into<String>) -> Self {
        Self::issued_at(token, Utc::now())
    }

    pub fn issued_at(token: impl Into<String>, issued_at: DateTime<Utc>) -> Self {
        Self {
            token: token.into(),
            issued_at,
        }
    }

    /// Expired once [`TOKEN_TTL`] has fully elapsed.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now - self.issued_at >= TOKEN_TTL
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.issued_at + TOKEN_TTL
    }
}

/// Identity a token belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CredentialKey {
    pub email: String,
    pub service: String,
}

impl CredentialKey {
    pub fn new(email: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            service: service.into(),
        }
    }
}

/// Tokens by credential identity
///
/// Clients built with the same credentials share one entry, so a token
/// renewed by one client is picked up by the others.
#[derive(Debug, Default)]
pub struct TokenCache {
    tokens: Mutex<HashMap<CredentialKey, AuthToken>>,
}

static GLOBAL_CACHE: Lazy<Arc<TokenCache>> = Lazy::new(|| Arc::new(TokenCache::new()));

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide cache.
    pub fn global() -> Arc<TokenCache> {
        GLOBAL_CACHE.clone()
    }

    pub fn get(&self, key: &CredentialKey) -> Option<AuthToken> {
        self.tokens.lock().get(key).cloned()
    }

    /// Token for `key` that is still valid at `now`.
    pub fn get_valid(&self, key: &CredentialKey, now: DateTime<Utc>) -> Option<AuthToken> {
        self.get(key).filter(|t| !t.is_expired_at(now))
    }

    pub fn store(&self, key: CredentialKey, token: AuthToken) {
        self.tokens.lock().insert(key, token);
    }

    pub fn invalidate(&self, key: &CredentialKey) -> Option<AuthToken> {
        self.tokens.lock().remove(key)
    }

    pub fn len(&self) -> usize {
        self.tokens.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.lock().is_empty()
    }
}
