use std::sync::Arc;

use crate::core::errors::Result;
use crate::follow::SocialGraph;
use crate::models::models::{Page, Post, UserId};
use crate::posts::ContentStore;

/// Paginated post listings, newest first with ties broken by post id.
///
/// Pages are 1-indexed. A page past the end comes back empty with
/// `has_next == false` rather than as an error.
pub struct FeedQuery {
    graph: Arc<SocialGraph>,
    posts: Arc<ContentStore>,
}

impl FeedQuery {
    pub fn new(graph: Arc<SocialGraph>, posts: Arc<ContentStore>) -> Self {
        Self { graph, posts }
    }

    /// Posts by `user` and everyone `user` follows.
    pub fn followed_feed(&self, user: &UserId, page: usize, page_size: usize) -> Result<Page<Post>> {
        let mut posts = Vec::new();
        for author in self.graph.followed_user_ids(user)? {
            posts.extend(self.posts.posts_by_author(&author)?);
        }
        sort_newest_first(&mut posts);

        tracing::debug!(%user, page, total = posts.len(), "followed feed");
        Ok(Page::slice(posts, page, page_size))
    }

    pub fn global_feed(&self, page: usize, page_size: usize) -> Result<Page<Post>> {
        Ok(Page::slice(self.posts.all_posts()?, page, page_size))
    }

    /// One author's posts, as shown on their profile.
    pub fn author_feed(&self, author: &UserId, page: usize, page_size: usize) -> Result<Page<Post>> {
        Ok(Page::slice(self.posts.posts_by_author(author)?, page, page_size))
    }
}

fn sort_newest_first(posts: &mut [Post]) {
    posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn post(id: u64, minute: u32) -> Post {
        Post {
            id,
            author_id: Uuid::nil(),
            body: format!("post {id}"),
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 10, minute, 0).unwrap(),
        }
    }

    #[test]
    fn ties_break_on_id() {
        let mut posts = vec![post(1, 0), post(3, 1), post(2, 1), post(4, 0)];
        sort_newest_first(&mut posts);
        let ids: Vec<u64> = posts.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![3, 2, 4, 1]);
    }
}
