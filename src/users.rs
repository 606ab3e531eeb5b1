use std::sync::Arc;

use crate::config::*;
use crate::core::clock::Clock;
use crate::core::db::{Store, StoreExt};
use crate::core::errors::{BordError, FieldError, Result};
use crate::core::helpers::sanitize_text;
use crate::core::validation::{EditProfileForm, RegistrationForm};
use crate::models::models::{User, UserId};

const USERNAME_TAKEN: &str = "Please use a different username.";
const EMAIL_TAKEN: &str = "Please use a different email address.";

/// User records plus the unique username and email indexes.
#[derive(Clone)]
pub struct UserDirectory {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
}

impl UserDirectory {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn get(&self, id: &UserId) -> Result<Option<User>> {
        Ok(self.store.get_json::<User>(&user_key(id))?)
    }

    pub fn exists(&self, id: &UserId) -> Result<bool> {
        Ok(self.store.get(&user_key(id))?.is_some())
    }

    /// Like [`get`](Self::get) but a missing user is an error.
    pub fn require(&self, id: &UserId) -> Result<User> {
        self.get(id)?
            .ok_or_else(|| BordError::NotFound(format!("user {id}")))
    }

    pub fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        match self.store.get_json::<UserId>(&username_key(username))? {
            Some(id) => self.get(&id),
            None => Ok(None),
        }
    }

    pub fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        match self.store.get_json::<UserId>(&email_key(email))? {
            Some(id) => self.get(&id),
            None => Ok(None),
        }
    }

    pub fn save(&self, user: &User) -> Result<()> {
        self.store.set_json(&user_key(&user.id), user)?;
        Ok(())
    }

    pub fn register(&self, form: &RegistrationForm) -> Result<User> {
        let mut errors = RegistrationForm::validator().validate(form);
        if !errors.has("username") && self.find_by_username(&form.username)?.is_some() {
            errors.push(FieldError::new("username", USERNAME_TAKEN));
        }
        if !errors.has("email") && self.find_by_email(&form.email)?.is_some() {
            errors.push(FieldError::new("email", EMAIL_TAKEN));
        }
        errors.into_result()?;

        let mut user = User::new(form.username.clone(), form.email.clone(), self.clock.now());
        user.set_password(&form.password)?;

        // The lookups above can race with another registration; the claims decide.
        let name_key = username_key(&user.username);
        let mail_key = email_key(&user.email);
        if !self.store.insert_json_if_absent(&name_key, &user.id)? {
            return Err(BordError::validation("username", USERNAME_TAKEN));
        }
        if !self.store.insert_json_if_absent(&mail_key, &user.id)? {
            self.release_claims(&[name_key.as_str()]);
            return Err(BordError::validation("email", EMAIL_TAKEN));
        }
        if let Err(e) = self.save(&user) {
            self.release_claims(&[name_key.as_str(), mail_key.as_str()]);
            return Err(e);
        }

        tracing::info!(user_id = %user.id, username = %user.username, "user registered");
        Ok(user)
    }

    pub fn edit_profile(&self, id: &UserId, form: &EditProfileForm) -> Result<User> {
        let mut user = self.require(id)?;

        let old_key = username_key(&user.username);
        let new_key = username_key(&form.username);
        let renamed = old_key != new_key;

        // Limits apply to what gets stored.
        let cleaned = EditProfileForm {
            username: form.username.clone(),
            about_me: sanitize_text(&form.about_me),
        };
        let mut errors = EditProfileForm::validator().validate(&cleaned);
        if renamed && !errors.has("username") && self.find_by_username(&form.username)?.is_some() {
            errors.push(FieldError::new("username", USERNAME_TAKEN));
        }
        errors.into_result()?;

        if renamed && !self.store.insert_json_if_absent(&new_key, &user.id)? {
            return Err(BordError::validation("username", USERNAME_TAKEN));
        }

        let EditProfileForm { username, about_me } = cleaned;
        user.username = username;
        user.about_me = if about_me.trim().is_empty() { None } else { Some(about_me) };
        if let Err(e) = self.save(&user) {
            if renamed {
                self.release_claims(&[new_key.as_str()]);
            }
            return Err(e);
        }
        // The old handle stays claimed until the record points at the new one.
        if renamed {
            self.store.delete(&old_key)?;
        }

        tracing::info!(user_id = %user.id, renamed, "profile updated");
        Ok(user)
    }

    /// Drops unique claims taken by a write that then failed. A claim that
    /// cannot be dropped is logged; the caller reports the original error.
    fn release_claims(&self, keys: &[&str]) {
        for key in keys {
            if let Err(e) = self.store.delete(key) {
                tracing::warn!(key = %key, error = %e, "failed to release unique claim");
            }
        }
    }

    /// Records activity by the user at the current clock time.
    pub fn touch_last_seen(&self, id: &UserId) -> Result<()> {
        let mut user = self.require(id)?;
        user.last_seen = self.clock.now();
        self.save(&user)
    }
}
