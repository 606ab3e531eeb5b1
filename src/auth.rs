//! Passwords, logins and password-reset tokens.
//!
//! Reset tokens are stateless: `base64url(claims) "." base64url(hmac)`, where
//! the claims carry the user id and an expiry in unix seconds and the MAC is
//! HMAC-SHA256 over the encoded claims. Nothing is stored, so a token cannot
//! be revoked before it expires; keep the TTL short. Changing the secret key
//! invalidates every token already issued.

use std::sync::Arc;
use std::time::Duration;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::core::clock::Clock;
use crate::core::errors::Result;
use crate::core::validation::{LoginForm, ResetPasswordForm};
use crate::models::models::{User, UserId};
use crate::users::UserDirectory;

type HmacSha256 = Hmac<Sha256>;

#[derive(Serialize, Deserialize)]
struct ResetClaims {
    sub: UserId,
    exp: i64,
}

pub struct CredentialStore {
    users: UserDirectory,
    clock: Arc<dyn Clock>,
    secret_key: SecretString,
    reset_token_ttl: Duration,
}

impl CredentialStore {
    pub fn new(
        users: UserDirectory,
        clock: Arc<dyn Clock>,
        secret_key: SecretString,
        reset_token_ttl: Duration,
    ) -> Self {
        Self {
            users,
            clock,
            secret_key,
            reset_token_ttl,
        }
    }

    /// Hashes `plaintext` onto `user` and persists the record.
    pub fn set_password(&self, user: &mut User, plaintext: &str) -> Result<()> {
        user.set_password(plaintext)?;
        self.users.save(user)?;
        tracing::info!(user_id = %user.id, "password updated");
        Ok(())
    }

    pub fn check_password(&self, user: &User, plaintext: &str) -> bool {
        user.check_password(plaintext)
    }

    /// The user only when the username exists *and* the password matches.
    pub fn authenticate(&self, form: &LoginForm) -> Result<Option<User>> {
        LoginForm::validator().validate(form).into_result()?;

        let Some(user) = self.users.find_by_username(&form.username)? else {
            tracing::debug!("login for unknown username");
            return Ok(None);
        };
        if !user.check_password(&form.password) {
            tracing::info!(user_id = %user.id, "login rejected");
            return Ok(None);
        }

        self.users.touch_last_seen(&user.id)?;
        tracing::info!(user_id = %user.id, "login accepted");
        self.users.get(&user.id)
    }

    pub fn issue_reset_token(&self, user: &User, ttl: Duration) -> String {
        let ttl_secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        let claims = ResetClaims {
            sub: user.id,
            exp: self.clock.now().timestamp().saturating_add(ttl_secs),
        };
        // Serializing a uuid and an integer cannot fail.
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims).unwrap_or_default());
        let signature = URL_SAFE_NO_PAD.encode(self.sign(payload.as_bytes()));
        format!("{payload}.{signature}")
    }

    /// The user id bound into `token`, or `None` if the token is malformed,
    /// forged, or expired. The account itself may no longer exist.
    pub fn verify_reset_token(&self, token: &str) -> Option<UserId> {
        let (payload, signature) = token.split_once('.')?;
        let signature = URL_SAFE_NO_PAD.decode(signature).ok()?;

        let mut mac = self.mac();
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature).ok()?;

        let claims: ResetClaims = serde_json::from_slice(&URL_SAFE_NO_PAD.decode(payload).ok()?).ok()?;
        if self.clock.now().timestamp() > claims.exp {
            return None;
        }
        Some(claims.sub)
    }

    /// A reset token for the account registered under `email`, if any.
    /// Delivering it is up to the caller.
    pub fn request_password_reset(&self, email: &str) -> Result<Option<String>> {
        let Some(user) = self.users.find_by_email(email)? else {
            return Ok(None);
        };
        tracing::info!(user_id = %user.id, "password reset requested");
        Ok(Some(self.issue_reset_token(&user, self.reset_token_ttl)))
    }

    /// Sets a new password for the token's user. `None` means the token was
    /// rejected or the account is gone.
    pub fn reset_password(&self, token: &str, form: &ResetPasswordForm) -> Result<Option<User>> {
        let Some(user_id) = self.verify_reset_token(token) else {
            return Ok(None);
        };
        let Some(mut user) = self.users.get(&user_id)? else {
            return Ok(None);
        };
        ResetPasswordForm::validator().validate(form).into_result()?;

        self.set_password(&mut user, &form.password)?;
        Ok(Some(user))
    }

    fn mac(&self) -> HmacSha256 {
        HmacSha256::new_from_slice(self.secret_key.expose_secret().as_bytes())
            .expect("HMAC can take key of any size")
    }

    fn sign(&self, payload: &[u8]) -> Vec<u8> {
        let mut mac = self.mac();
        mac.update(payload);
        mac.finalize().into_bytes().to_vec()
    }
}
