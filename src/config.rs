use std::time::Duration;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::RngCore;
use secrecy::SecretString;
use uuid::Uuid;

pub const MIN_USERNAME_LENGTH: usize = 3;
pub const MAX_USERNAME_LENGTH: usize = 64;
pub const MAX_EMAIL_LENGTH: usize = 120;
pub const MAX_ABOUT_ME_LENGTH: usize = 140;
pub const MAX_POST_LENGTH: usize = 140;

pub const DEFAULT_POSTS_PER_PAGE: usize = 3;
pub const DEFAULT_RESET_TOKEN_TTL_SECS: u64 = 600;

pub const POST_SEQUENCE_KEY: &str = "seq:post";
pub const USER_PREFIX: &str = "user:";
pub const POST_PREFIX: &str = "post:";

pub fn user_key(id: &Uuid) -> String {
    format!("{USER_PREFIX}{id}")
}

pub fn username_key(username: &str) -> String {
    format!("username:{}", username.to_lowercase())
}

pub fn email_key(email: &str) -> String {
    format!("email:{}", email.to_lowercase())
}

pub fn followings_key(follower: &Uuid, followee: &Uuid) -> String {
    format!("following:{follower}:{followee}")
}

pub fn followings_prefix(follower: &Uuid) -> String {
    format!("following:{follower}:")
}

pub fn followers_key(followee: &Uuid, follower: &Uuid) -> String {
    format!("followers:{followee}:{follower}")
}

pub fn followers_prefix(followee: &Uuid) -> String {
    format!("followers:{followee}:")
}

pub fn author_posts_prefix(author: &Uuid) -> String {
    format!("author_post:{author}:")
}

/// Runtime settings, read once at startup and handed to [`crate::Bord::new`].
pub struct Config {
    /// Key for signing password-reset tokens. Rotating it invalidates every
    /// outstanding token.
    pub secret_key: SecretString,
    pub reset_token_ttl: Duration,
    pub posts_per_page: usize,
}

impl Config {
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            secret_key: SecretString::from(secret_key.into()),
            reset_token_ttl: Duration::from_secs(DEFAULT_RESET_TOKEN_TTL_SECS),
            posts_per_page: DEFAULT_POSTS_PER_PAGE,
        }
    }

    /// Reads `BORD_*` variables, loading a `.env` file first when one exists.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();

        let secret_key = match std::env::var("BORD_SECRET_KEY") {
            Ok(key) if !key.is_empty() => key,
            _ => {
                tracing::warn!("BORD_SECRET_KEY not set, generating an ephemeral key");
                generate_secret()
            }
        };

        Self {
            secret_key: SecretString::from(secret_key),
            reset_token_ttl: Duration::from_secs(reset_token_ttl_secs()),
            posts_per_page: posts_per_page(),
        }
    }
}

fn reset_token_ttl_secs() -> u64 {
    std::env::var("BORD_RESET_TOKEN_TTL_SECS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(DEFAULT_RESET_TOKEN_TTL_SECS)
}

fn posts_per_page() -> usize {
    std::env::var("BORD_POSTS_PER_PAGE")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(DEFAULT_POSTS_PER_PAGE)
        .max(1)
}

fn generate_secret() -> String {
    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_and_email_keys_ignore_case() {
        assert_eq!(username_key("Alice"), username_key("alice"));
        assert_eq!(email_key("A@Example.com"), "email:a@example.com");
    }

    #[test]
    fn generated_secrets_differ() {
        assert_ne!(generate_secret(), generate_secret());
    }
}
