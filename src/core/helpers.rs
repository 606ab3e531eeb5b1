use std::collections::HashSet;

use ammonia::Builder;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use rand::rngs::OsRng;
use tracing_subscriber::EnvFilter;

use crate::core::errors::{BordError, Result};

pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| BordError::Hashing(e.to_string()))
}

/// Constant-time check of `password` against a PHC hash string. Malformed
/// hashes never verify.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Strips every HTML tag, leaving plain text. The result is unescaped;
/// escaping for display belongs to whoever renders it.
pub fn sanitize_text(text: &str) -> String {
    let cleaned = Builder::default().tags(HashSet::new()).clean(text).to_string();
    // ammonia only emits these entities for text nodes; `&amp;` goes last so
    // an escaped entity is decoded exactly once.
    cleaned
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", "\u{a0}")
        .replace("&amp;", "&")
}

/// Installs the global fmt subscriber. `RUST_LOG` wins over `default_filter`.
pub fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_are_salted() {
        let a = hash_password("hunter2").unwrap();
        let b = hash_password("hunter2").unwrap();
        assert_ne!(a, b);
        assert!(verify_password("hunter2", &a));
        assert!(verify_password("hunter2", &b));
    }

    #[test]
    fn corrupt_hash_never_verifies() {
        assert!(!verify_password("anything", "not-a-phc-string"));
        assert!(!verify_password("", ""));
    }

    #[test]
    fn sanitize_strips_tags() {
        assert_eq!(sanitize_text("<b>bold</b> move"), "bold move");
        assert_eq!(sanitize_text("plain words"), "plain words");
    }

    #[test]
    fn sanitize_leaves_text_unescaped() {
        assert_eq!(sanitize_text("Tom & Jerry <3"), "Tom & Jerry <3");
        assert_eq!(sanitize_text("a > b"), "a > b");
        assert_eq!(sanitize_text("&amp;lt; stays literal"), "&lt; stays literal");
        assert_eq!(sanitize_text("&".repeat(140).as_str()).chars().count(), 140);
    }
}
