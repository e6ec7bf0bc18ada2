//! In-memory session registry.
//!
//! Sessions have no expiry: a token stays valid until it is destroyed by
//! logout or the process exits.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;

use crate::auth::AuthError;
use crate::types::{SessionToken, Username};

/// Random bytes per token (256 bits).
pub const TOKEN_BYTES: usize = 32;

/// A live session.
#[derive(Debug, Clone)]
pub struct Session {
    pub username: Username,
    pub created_at: DateTime<Utc>,
}

/// Process-wide token → identity mapping.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<SessionToken, Session>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session for `username` and return its token.
    pub async fn create(&self, username: Username) -> Result<SessionToken, AuthError> {
        let mut sessions = self.sessions.write().await;
        loop {
            let token = generate_token()?;
            if let Entry::Vacant(slot) = sessions.entry(token.clone()) {
                debug!(
                    username = %username,
                    token = %token.fingerprint(),
                    "Session created"
                );
                slot.insert(Session {
                    username,
                    created_at: Utc::now(),
                });
                return Ok(token);
            }
        }
    }

    pub async fn resolve(&self, token: &str) -> Option<Username> {
        self.sessions
            .read()
            .await
            .get(token)
            .map(|s| s.username.clone())
    }

    /// Full session record, including creation time.
    pub async fn get(&self, token: &str) -> Option<Session> {
        self.sessions.read().await.get(token).cloned()
    }

    /// Remove a session. Returns whether it existed.
    pub async fn destroy(&self, token: &str) -> bool {
        self.sessions.write().await.remove(token).is_some()
    }

    /// Number of live sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

/// Generate a base64url token from the OS random source.
pub fn generate_token() -> Result<SessionToken, AuthError> {
    let mut buf = [0u8; TOKEN_BYTES];
    getrandom::getrandom(&mut buf)
        .map_err(|e| AuthError::Internal(format!("Random source unavailable: {}", e)))?;
    Ok(SessionToken::new(URL_SAFE_NO_PAD.encode(buf)))
}
