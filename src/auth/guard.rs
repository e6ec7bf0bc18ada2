//! Bearer-token authentication for HTTP requests.

use std::fmt;
use std::sync::Arc;

use http::StatusCode;
use tracing::{debug, info, warn};

use crate::auth::credentials::CredentialStore;
use crate::auth::sessions::SessionRegistry;
use crate::types::{SessionToken, Username};

/// Authentication errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Missing, malformed or unknown bearer token
    Unauthenticated,
    /// Login rejected. Deliberately does not say which field was wrong.
    InvalidCredentials,
    /// Token generation failed
    Internal(String),
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthenticated | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unauthenticated => write!(f, "Authentication required"),
            Self::InvalidCredentials => write!(f, "Invalid username or password"),
            Self::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AuthError {}

/// Resolves identities from `Authorization` headers and runs login/logout.
///
/// Every user in the credential store is a teacher, so any live session
/// satisfies [`AuthGuard::require_teacher`].
#[derive(Clone)]
pub struct AuthGuard {
    credentials: Arc<CredentialStore>,
    sessions: Arc<SessionRegistry>,
}

impl AuthGuard {
    pub fn new(credentials: Arc<CredentialStore>, sessions: Arc<SessionRegistry>) -> Self {
        Self {
            credentials,
            sessions,
        }
    }

    pub fn sessions(&self) -> &Arc<SessionRegistry> {
        &self.sessions
    }

    /// Resolve the identity behind an `Authorization` header, if any.
    ///
    /// Absent or malformed headers yield `None`, never an error.
    pub async fn identify(&self, authorization: Option<&str>) -> Option<Username> {
        let token = parse_bearer(authorization?)?;
        self.sessions.resolve(token).await
    }

    /// Like [`identify`](Self::identify) but fails with
    /// [`AuthError::Unauthenticated`] when no session is found.
    pub async fn require_teacher(&self, authorization: Option<&str>) -> Result<Username, AuthError> {
        self.identify(authorization)
            .await
            .ok_or(AuthError::Unauthenticated)
    }

    /// Check credentials and open a session.
    pub async fn login(&self, username: &str, password: &str) -> Result<SessionToken, AuthError> {
        if !self.credentials.verify(username, password) {
            warn!(username = %username, "Login rejected");
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.sessions.create(Username::new(username)).await?;
        info!(username = %username, "Teacher logged in");
        Ok(token)
    }

    /// Destroy the session behind an `Authorization` header.
    ///
    /// Returns whether a session was removed; callers treat both outcomes
    /// as success.
    pub async fn logout(&self, authorization: Option<&str>) -> bool {
        let Some(token) = authorization.and_then(parse_bearer) else {
            return false;
        };
        let removed = self.sessions.destroy(token).await;
        if removed {
            info!("Teacher logged out");
        } else {
            debug!("Logout for unknown session");
        }
        removed
    }
}

/// Extract the token from a `Bearer <token>` header value.
///
/// The scheme is matched case-insensitively. Empty tokens and tokens
/// containing whitespace are rejected.
pub fn parse_bearer(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    if token.is_empty() || token.contains(char::is_whitespace) {
        return None;
    }
    Some(token)
}
