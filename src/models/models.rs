use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::errors::{BordError, Result};
use crate::core::helpers::{hash_password, verify_password};

pub type UserId = Uuid;
pub type PostId = u64;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    password_hash: Option<String>,
    pub about_me: Option<String>,
    pub last_seen: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// A fresh account with no password set.
    pub fn new(username: impl Into<String>, email: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            email: email.into(),
            password_hash: None,
            about_me: None,
            last_seen: now,
            created_at: now,
        }
    }

    /// Replaces the stored hash with a new salted argon2 hash of `plaintext`.
    pub fn set_password(&mut self, plaintext: &str) -> Result<()> {
        if plaintext.is_empty() {
            return Err(BordError::InvalidInput("password must not be empty".to_string()));
        }
        self.password_hash = Some(hash_password(plaintext)?);
        Ok(())
    }

    pub fn check_password(&self, plaintext: &str) -> bool {
        match &self.password_hash {
            Some(hash) => verify_password(plaintext, hash),
            None => false,
        }
    }

    pub fn has_password(&self) -> bool {
        self.password_hash.is_some()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Post {
    pub id: PostId,
    pub author_id: UserId,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Follow {
    pub follower_id: UserId,
    pub followee_id: UserId,
    pub created_at: DateTime<Utc>,
}

/// One page of an ordered listing. `page` is 1-indexed.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub per_page: usize,
    pub total: usize,
    pub has_next: bool,
    pub has_prev: bool,
    pub next_num: Option<usize>,
    pub prev_num: Option<usize>,
}

impl<T> Page<T> {
    /// Cuts page `page` out of an already ordered sequence. Zero page or
    /// page size is treated as 1.
    pub fn slice(all: Vec<T>, page: usize, per_page: usize) -> Self {
        let page = page.max(1);
        let per_page = per_page.max(1);
        let total = all.len();
        let start = (page - 1).saturating_mul(per_page);

        let items: Vec<T> = all.into_iter().skip(start).take(per_page).collect();
        let has_next = page.saturating_mul(per_page) < total;
        let has_prev = page > 1;

        Self {
            items,
            page,
            per_page,
            total,
            has_next,
            has_prev,
            next_num: has_next.then(|| page + 1),
            prev_num: has_prev.then(|| page - 1),
        }
    }
}
