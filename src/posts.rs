use std::sync::Arc;

use chrono::{DateTime, SubsecRound, Utc};

use crate::config::*;
use crate::core::clock::Clock;
use crate::core::db::{Store, StoreExt};
use crate::core::errors::{BordError, Result};
use crate::core::validation::{length, required, Validator};
use crate::models::models::{Post, PostId, UserId};
use crate::users::UserDirectory;

/// Order-preserving key for `(created_at, id)`. Flipping the sign bit makes
/// the two's-complement timestamp sort correctly as unsigned hex.
pub(crate) fn sort_key(created_at: &DateTime<Utc>, id: PostId) -> String {
    let micros = created_at.timestamp_micros() as u64 ^ (1u64 << 63);
    format!("{micros:016x}:{id:016x}")
}

fn body_validator<'a>() -> Validator<'a, str> {
    Validator::new()
        .rule(|body: &str| required("body", body))
        .rule(|body: &str| length("body", body, 1, MAX_POST_LENGTH))
}

pub struct ContentStore {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    users: UserDirectory,
}

impl ContentStore {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>, users: UserDirectory) -> Self {
        Self { store, clock, users }
    }

    /// Nothing is written unless the body passes validation and the author exists.
    pub fn create_post(&self, author: &UserId, body: &str) -> Result<Post> {
        body_validator().validate(body).into_result()?;
        if !self.users.exists(author)? {
            return Err(BordError::NotFound(format!("user {author}")));
        }

        let id = self.store.increment(POST_SEQUENCE_KEY)?;
        // Stored at key precision so every listing orders posts the same way.
        let post = Post {
            id,
            author_id: *author,
            body: body.to_string(),
            created_at: self.clock.now().trunc_subsecs(6),
        };

        let key = sort_key(&post.created_at, post.id);
        self.store.set_json(&format!("{POST_PREFIX}{key}"), &post)?;
        self.store.set_json(&format!("{}{key}", author_posts_prefix(author)), &post)?;

        tracing::info!(post_id = post.id, author = %author, "post created");
        Ok(post)
    }

    /// Newest first.
    pub fn posts_by_author(&self, author: &UserId) -> Result<Vec<Post>> {
        let mut posts: Vec<Post> = self.store.scan_json(&author_posts_prefix(author))?;
        posts.reverse();
        Ok(posts)
    }

    /// Every post, newest first.
    pub fn all_posts(&self) -> Result<Vec<Post>> {
        let mut posts: Vec<Post> = self.store.scan_json(POST_PREFIX)?;
        posts.reverse();
        Ok(posts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn sort_key_orders_by_time_then_id() {
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        let earlier = Utc.with_ymd_and_hms(1960, 1, 1, 0, 0, 0).unwrap();

        assert!(sort_key(&t, 1) < sort_key(&t, 2));
        assert!(sort_key(&t, 9) < sort_key(&(t + Duration::microseconds(1)), 1));
        assert!(sort_key(&earlier, 5) < sort_key(&t, 1));
    }

    #[test]
    fn body_rules() {
        assert!(body_validator().validate("hello").is_empty());
        assert!(body_validator().validate("").has("body"));
        assert!(body_validator().validate("   ").has("body"));
        assert!(body_validator().validate(&"é".repeat(MAX_POST_LENGTH)).is_empty());
        assert!(body_validator().validate(&"a".repeat(MAX_POST_LENGTH + 1)).has("body"));
    }
}
