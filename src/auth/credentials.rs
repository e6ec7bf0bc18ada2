//! Teacher credential storage.

use std::collections::HashMap;
use std::fmt;

use serde::Deserialize;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::types::Username;

/// A single teacher login as it appears in the teachers file.
#[derive(Clone, Deserialize)]
pub struct Credential {
    pub username: Username,
    #[serde(rename = "password")]
    pub secret: String,
}

impl Credential {
    pub fn new(username: impl Into<Username>, secret: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            secret: secret.into(),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Read-only username → secret mapping, loaded once at startup.
#[derive(Default)]
pub struct CredentialStore {
    secrets: HashMap<Username, String>,
}

impl CredentialStore {
    /// Build a store, rejecting duplicate usernames.
    pub fn from_credentials(
        credentials: impl IntoIterator<Item = Credential>,
    ) -> anyhow::Result<Self> {
        let mut secrets: HashMap<Username, String> = HashMap::new();
        for cred in credentials {
            if secrets.contains_key(cred.username.as_str()) {
                return Err(anyhow::anyhow!(
                    "Duplicate teacher username `{}`",
                    cred.username
                ));
            }
            secrets.insert(cred.username, cred.secret);
        }
        Ok(Self { secrets })
    }

    /// Look up the stored secret for a username.
    pub fn lookup(&self, username: &str) -> Option<&str> {
        self.secrets.get(username).map(String::as_str)
    }

    /// Check a username/password pair.
    ///
    /// Both sides are reduced to SHA-256 digests and compared in constant
    /// time. A missing username still runs the comparison against a fixed
    /// digest so the two failure paths cost the same.
    pub fn verify(&self, username: &str, password: &str) -> bool {
        let supplied = digest(password);
        match self.lookup(username) {
            Some(secret) => bool::from(digest(secret)[..].ct_eq(&supplied[..])),
            None => {
                let _ = digest("")[..].ct_eq(&supplied[..]);
                false
            }
        }
    }

    /// Usernames in sorted order, for diagnostics.
    pub fn usernames(&self) -> Vec<&Username> {
        let mut names: Vec<_> = self.secrets.keys().collect();
        names.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        names
    }

    pub fn len(&self) -> usize {
        self.secrets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.secrets.is_empty()
    }
}

impl fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialStore")
            .field("usernames", &self.usernames())
            .finish_non_exhaustive()
    }
}

fn digest(value: &str) -> [u8; 32] {
    Sha256::digest(value.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> CredentialStore {
        CredentialStore::from_credentials([
            Credential::new("ms.rivera", "chalkboard"),
            Credential::new("mr.chen", "s3cret"),
        ])
        .unwrap()
    }

    #[test]
    fn test_lookup() {
        let store = store();
        assert_eq!(store.lookup("mr.chen"), Some("s3cret"));
        assert_eq!(store.lookup("nobody"), None);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_verify() {
        let store = store();
        assert!(store.verify("ms.rivera", "chalkboard"));
        assert!(!store.verify("ms.rivera", "chalkboard "));
        assert!(!store.verify("ms.rivera", "chalk"));
        assert!(!store.verify("ms.rivera", ""));
        assert!(!store.verify("nobody", "chalkboard"));
    }

    #[test]
    fn test_duplicate_usernames_rejected() {
        let result = CredentialStore::from_credentials([
            Credential::new("mr.chen", "a"),
            Credential::new("mr.chen", "b"),
        ]);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("mr.chen"));
    }

    #[test]
    fn test_empty_store_rejects_everything() {
        let store = CredentialStore::default();
        assert!(store.is_empty());
        assert!(!store.verify("", ""));
    }

    #[test]
    fn test_credential_deserialization() {
        let cred: Credential =
            serde_json::from_str(r#"{"username": "mr.chen", "password": "pw"}"#).unwrap();
        assert_eq!(cred.username.as_str(), "mr.chen");
        assert_eq!(cred.secret, "pw");
    }

    #[test]
    fn test_usernames_sorted() {
        let store = store();
        let names: Vec<&str> = store.usernames().into_iter().map(|u| u.as_str()).collect();
        assert_eq!(names, vec!["mr.chen", "ms.rivera"]);
    }

    #[test]
    fn test_debug_output_hides_secrets() {
        let cred = Credential::new("mr.chen", "s3cret");
        let shown = format!("{:?}", cred);
        assert!(shown.contains("mr.chen"));
        assert!(!shown.contains("s3cret"));

        let shown = format!("{:?}", store());
        assert!(shown.contains("ms.rivera"));
        assert!(!shown.contains("chalkboard"));
        assert!(!shown.contains("s3cret"));
    }
}
