use std::collections::BTreeSet;
use std::sync::Arc;

use crate::config::*;
use crate::core::clock::Clock;
use crate::core::db::{Store, StoreExt};
use crate::core::errors::{BordError, Result};
use crate::models::models::{Follow, UserId};
use crate::users::UserDirectory;

/// Directed follow edges. The forward edge under `following:` is the source
/// of truth; `followers:` is a reverse index checked against it on read.
pub struct SocialGraph {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    users: UserDirectory,
}

impl SocialGraph {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>, users: UserDirectory) -> Self {
        Self { store, clock, users }
    }

    pub fn follow(&self, follower: &UserId, followee: &UserId) -> Result<()> {
        if follower == followee {
            return Err(BordError::InvalidOperation("You cannot follow yourself.".to_string()));
        }
        for id in [follower, followee] {
            if !self.users.exists(id)? {
                return Err(BordError::NotFound(format!("user {id}")));
            }
        }

        let edge = Follow {
            follower_id: *follower,
            followee_id: *followee,
            created_at: self.clock.now(),
        };
        // Losing the insert means the edge is already there.
        if self.store.insert_json_if_absent(&followings_key(follower, followee), &edge)? {
            self.store.set_json(&followers_key(followee, follower), &edge)?;
            tracing::info!(%follower, %followee, "followed");
        } else {
            tracing::debug!(%follower, %followee, "already following");
        }
        Ok(())
    }

    pub fn unfollow(&self, follower: &UserId, followee: &UserId) -> Result<()> {
        if follower == followee {
            return Err(BordError::InvalidOperation("You cannot unfollow yourself.".to_string()));
        }

        // Reverse entry first: a follow racing in between still sees the
        // forward edge and writes nothing.
        self.store.delete(&followers_key(followee, follower))?;
        let removed = self.store.delete(&followings_key(follower, followee))?;
        if removed {
            tracing::info!(%follower, %followee, "unfollowed");
        }
        Ok(())
    }

    pub fn is_following(&self, follower: &UserId, followee: &UserId) -> Result<bool> {
        Ok(self.store.get(&followings_key(follower, followee))?.is_some())
    }

    /// Everyone `user` follows, plus `user`.
    pub fn followed_user_ids(&self, user: &UserId) -> Result<BTreeSet<UserId>> {
        let mut ids: BTreeSet<UserId> = self.following(user)?.into_iter().collect();
        ids.insert(*user);
        Ok(ids)
    }

    pub fn following(&self, user: &UserId) -> Result<Vec<UserId>> {
        let edges: Vec<Follow> = self.store.scan_json(&followings_prefix(user))?;
        Ok(edges.into_iter().map(|e| e.followee_id).collect())
    }

    pub fn followers(&self, user: &UserId) -> Result<Vec<UserId>> {
        let edges: Vec<Follow> = self.store.scan_json(&followers_prefix(user))?;
        let mut followers = Vec::with_capacity(edges.len());
        for edge in edges {
            // skip reverse entries written by a follow that lost to an unfollow
            if self.is_following(&edge.follower_id, user)? {
                followers.push(edge.follower_id);
            }
        }
        Ok(followers)
    }

    pub fn following_count(&self, user: &UserId) -> Result<usize> {
        Ok(self.following(user)?.len())
    }

    pub fn followers_count(&self, user: &UserId) -> Result<usize> {
        Ok(self.followers(user)?.len())
    }
}
