//! Accounts, credentials, follows, posts and feeds for Bord.
//!
//! Everything hangs off [`Bord`], which is built from an explicit store,
//! clock and [`Config`] and handed to whatever serves requests.

use std::sync::Arc;

pub mod auth;
pub mod config;
pub mod core;
pub mod feed;
pub mod follow;
pub mod models;
pub mod posts;
pub mod users;

pub use crate::auth::CredentialStore;
pub use crate::config::Config;
pub use crate::core::clock::{Clock, ManualClock, SystemClock};
pub use crate::core::db::{MemoryStore, Store, StoreExt};
pub use crate::core::errors::{BordError, FieldError, Result, StoreError, ValidationErrors};
pub use crate::core::validation::{EditProfileForm, LoginForm, RegistrationForm, ResetPasswordForm};
pub use crate::feed::FeedQuery;
pub use crate::follow::SocialGraph;
pub use crate::models::models::{Follow, Page, Post, PostId, User, UserId};
pub use crate::posts::ContentStore;
pub use crate::users::UserDirectory;

pub struct Bord {
    pub users: UserDirectory,
    pub credentials: CredentialStore,
    pub graph: Arc<SocialGraph>,
    pub posts: Arc<ContentStore>,
    pub feed: FeedQuery,
    pub posts_per_page: usize,
    store: Arc<dyn Store>,
}

impl Bord {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>, config: Config) -> Self {
        let users = UserDirectory::new(store.clone(), clock.clone());
        let credentials = CredentialStore::new(
            users.clone(),
            clock.clone(),
            config.secret_key,
            config.reset_token_ttl,
        );
        let graph = Arc::new(SocialGraph::new(store.clone(), clock.clone(), users.clone()));
        let posts = Arc::new(ContentStore::new(store.clone(), clock, users.clone()));
        let feed = FeedQuery::new(graph.clone(), posts.clone());

        Self {
            users,
            credentials,
            graph,
            posts,
            feed,
            posts_per_page: config.posts_per_page,
            store,
        }
    }

    /// A memory-backed instance on the system clock.
    pub fn in_memory(config: Config) -> Self {
        Self::new(Arc::new(MemoryStore::new()), Arc::new(SystemClock), config)
    }

    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }
}
