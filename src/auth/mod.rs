//! Authentication and session management.
//!
//! Teachers log in with a username and password from the credential store
//! and receive an opaque bearer token. The token is presented as
//! `Authorization: Bearer <token>` on protected requests.
//!
//! ## Security Model
//!
//! - The session registry is the only source of truth: a token that is not
//!   live in the registry is rejected, whatever the client believes.
//! - Secrets are compared in constant time.
//! - Login failures never reveal whether the username or the password was
//!   wrong.
//! - Sessions do not expire; they end on logout or process restart.
//!
//! ## Usage
//!
//! ```ignore
//! let guard = AuthGuard::new(credentials, sessions);
//! let token = guard.login("mr.chen", "s3cret").await?;
//! let teacher = guard.require_teacher(Some(&format!("Bearer {}", token))).await?;
//! ```

mod credentials;
mod guard;
mod sessions;

pub use credentials::{Credential, CredentialStore};
pub use guard::{AuthError, AuthGuard, parse_bearer};
pub use sessions::{Session, SessionRegistry, TOKEN_BYTES, generate_token};
