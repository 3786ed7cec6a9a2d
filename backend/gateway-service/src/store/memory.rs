//! In-memory store implementations used by the test suites.
//!
//! They mirror the semantics of the Postgres/Redis implementations closely
//! enough that the guard and pagination properties can be exercised without
//! external services.
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{NewPost, Post, QuotaCounter, POST_STATUS_AVAILABLE};
use crate::store::{CounterStore, PostStore};

#[derive(Default)]
pub struct MemoryPostStore {
    posts: RwLock<Vec<Post>>,
}

impl MemoryPostStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a post with an explicit creation time. Test-only entry point;
    /// the gateway itself always assigns timestamps through `insert`.
    pub async fn seed(&self, new: NewPost, created_at: DateTime<Utc>) -> Post {
        let post = Post {
            id: Uuid::new_v4(),
            author_id: new.author_id,
            origin_ip: new.origin_ip,
            name: new.name,
            category: new.category,
            extra: new.extra,
            status: POST_STATUS_AVAILABLE.to_string(),
            created_at,
            updated_at: created_at,
        };
        self.posts.write().await.push(post.clone());
        post
    }

    /// Remove a post entirely, as a collaborator outside the core would.
    pub async fn remove(&self, id: Uuid) {
        self.posts.write().await.retain(|p| p.id != id);
    }
}

#[async_trait]
impl PostStore for MemoryPostStore {
    async fn insert(&self, new: NewPost) -> Result<Post> {
        Ok(self.seed(new, Utc::now()).await)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>> {
        Ok(self.posts.read().await.iter().find(|p| p.id == id).cloned())
    }

    async fn count_by_author_since(&self, author_id: Uuid, since: DateTime<Utc>) -> Result<i64> {
        Ok(self
            .posts
            .read()
            .await
            .iter()
            .filter(|p| p.author_id == author_id && p.created_at > since)
            .count() as i64)
    }

    async fn count_by_origin_since(&self, origin_ip: &str, since: DateTime<Utc>) -> Result<i64> {
        Ok(self
            .posts
            .read()
            .await
            .iter()
            .filter(|p| p.origin_ip == origin_ip && p.created_at > since)
            .count() as i64)
    }

    async fn list_available_after(&self, after: Option<&Post>, limit: i64) -> Result<Vec<Post>> {
        let mut posts: Vec<Post> = self
            .posts
            .read()
            .await
            .iter()
            .filter(|p| p.status == POST_STATUS_AVAILABLE)
            .cloned()
            .collect();

        // created_at DESC, id DESC, the same order the SQL index serves.
        posts.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });

        if let Some(last) = after {
            let boundary = (last.created_at, last.id);
            posts.retain(|p| (p.created_at, p.id) < boundary);
        }

        posts.truncate(limit.max(0) as usize);
        Ok(posts)
    }
}

#[derive(Default)]
pub struct MemoryCounterStore {
    counters: RwLock<HashMap<String, QuotaCounter>>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn read(&self, key: &str) -> Result<Option<QuotaCounter>> {
        Ok(self.counters.read().await.get(key).cloned())
    }

    async fn write(&self, key: &str, counter: &QuotaCounter) -> Result<()> {
        self.counters
            .write()
            .await
            .insert(key.to_string(), counter.clone());
        Ok(())
    }
}
