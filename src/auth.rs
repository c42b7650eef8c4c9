//! Credential hashing and the opaque-token session registry.
//!
//! Passwords are stored as salted PBKDF2-SHA256 hashes. Logins mint a
//! random bearer token whose SHA-256 hash keys the in-memory registry;
//! the token itself never touches the store.

use std::collections::HashMap;

use base64::Engine;
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

use crate::models::Role;

pub const PBKDF2_ITERATIONS: u32 = 600_000;
const HASH_LENGTH: usize = 32;
const SALT_LENGTH: usize = 16;

/// Stored hash format marker: `pbkdf2$<iterations>$<salt>$<hash>`.
const SCHEME: &str = "pbkdf2";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Malformed password hash")]
    MalformedHash,
}

fn b64() -> base64::engine::GeneralPurpose {
    base64::engine::general_purpose::STANDARD_NO_PAD
}

fn derive(password: &str, salt: &[u8], iterations: u32) -> [u8; HASH_LENGTH] {
    let mut out = [0u8; HASH_LENGTH];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut out);
    out
}

/// Hash a password for storage, with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    use rand::RngCore;
    let mut salt = [0u8; SALT_LENGTH];
    rand::thread_rng().fill_bytes(&mut salt);

    let hash = derive(password, &salt, PBKDF2_ITERATIONS);
    Ok(format!(
        "{SCHEME}${PBKDF2_ITERATIONS}${}${}",
        b64().encode(salt),
        b64().encode(hash)
    ))
}

/// Verify a password against a stored hash. Malformed hashes verify false.
pub fn verify_password(stored: &str, password: &str) -> bool {
    let mut parts = stored.split('$');
    let (Some(SCHEME), Some(iterations), Some(salt), Some(hash)) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return false;
    };
    let Ok(iterations) = iterations.parse::<u32>() else {
        return false;
    };
    let (Ok(salt), Ok(expected)) = (b64().decode(salt), b64().decode(hash)) else {
        return false;
    };

    let actual = derive(password, &salt, iterations);
    actual.ct_eq(&expected).into()
}

/// The resolved identity of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user_id: i64,
    pub role: Role,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Generate a random bearer token (URL-safe base64, 32 bytes of entropy).
pub fn generate_token() -> String {
    let bytes: [u8; 32] = rand::random();
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Hash a bearer token string using SHA-256.
fn hash_token(token: &str) -> [u8; 32] {
    use sha2::Digest;
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().into()
}

/// In-memory session store keyed by token hash.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: HashMap<[u8; 32], Identity>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a token for an authenticated identity.
    pub fn issue(&mut self, identity: Identity) -> String {
        let token = generate_token();
        self.sessions.insert(hash_token(&token), identity);
        token
    }

    /// Resolve a presented token to its identity, if the session is live.
    pub fn resolve(&self, token: &str) -> Option<Identity> {
        self.sessions.get(&hash_token(token)).copied()
    }

    /// Revoke a session. Returns whether a session existed.
    pub fn revoke(&mut self, token: &str) -> bool {
        self.sessions.remove(&hash_token(token)).is_some()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_round_trip() {
        let hash = hash_password("hunter2").unwrap();
        assert!(verify_password(&hash, "hunter2"));
        assert!(!verify_password(&hash, "hunter3"));
    }

    #[test]
    fn malformed_hash_verifies_false() {
        assert!(!verify_password("not-a-stored-hash", "anything"));
        assert!(!verify_password("pbkdf2$abc$notb64$either", "anything"));
        assert!(!verify_password("", "anything"));
    }

    #[test]
    fn hashes_are_salted() {
        let a = hash_password("same").unwrap();
        let b = hash_password("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn stored_format_is_self_describing() {
        let hash = hash_password("pw").unwrap();
        assert!(hash.starts_with("pbkdf2$600000$"));
        assert_eq!(hash.split('$').count(), 4);
    }

    #[test]
    fn issue_resolve_revoke() {
        let mut registry = SessionRegistry::new();
        let identity = Identity {
            user_id: 7,
            role: Role::Client,
        };

        let token = registry.issue(identity);
        assert_eq!(registry.resolve(&token), Some(identity));

        assert!(registry.revoke(&token));
        assert_eq!(registry.resolve(&token), None);
        assert!(!registry.revoke(&token));
    }

    #[test]
    fn unknown_token_does_not_resolve() {
        let registry = SessionRegistry::new();
        assert!(registry.resolve("made-up-token").is_none());
    }

    #[test]
    fn tokens_are_unique_per_issue() {
        let mut registry = SessionRegistry::new();
        let identity = Identity {
            user_id: 1,
            role: Role::Client,
        };
        let a = registry.issue(identity);
        let b = registry.issue(identity);
        assert_ne!(a, b);
        assert_eq!(registry.session_count(), 2);
    }
}
