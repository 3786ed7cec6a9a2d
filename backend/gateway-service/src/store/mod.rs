/// Persistence seams for gateway-service
///
/// Two abstractions back the guards and the pagination engine:
///
/// - [`PostStore`]: the shared document collection. The daily quota guard
///   derives its counts from this collection on every call rather than
///   keeping a persisted daily counter, so quota self-corrects from the
///   actual posts.
/// - [`CounterStore`]: a key-value store with plain read/write semantics for
///   whole [`QuotaCounter`] documents. No atomic increment primitive is
///   assumed; callers read, decide, and write back. Swapping this trait for
///   an atomic increment-with-ceiling operation would close the documented
///   read-modify-write race without changing the external contract.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{NewPost, Post, QuotaCounter};

pub mod memory;
pub mod postgres;
pub mod redis;

pub use memory::{MemoryCounterStore, MemoryPostStore};
pub use postgres::PgPostStore;
pub use redis::RedisCounterStore;

/// The timestamp-ordered post collection.
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Persist a new post with server-assigned id, timestamps, and
    /// `available` status.
    async fn insert(&self, new: NewPost) -> Result<Post>;

    /// Resolve a post by id, regardless of status.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>>;

    /// Count posts authored by `author_id` with `created_at` strictly
    /// greater than `since`.
    async fn count_by_author_since(&self, author_id: Uuid, since: DateTime<Utc>) -> Result<i64>;

    /// Count posts originating from `origin_ip` with `created_at` strictly
    /// greater than `since`.
    async fn count_by_origin_since(&self, origin_ip: &str, since: DateTime<Utc>) -> Result<i64>;

    /// Fetch up to `limit` available posts ordered by `created_at` DESC
    /// (id DESC tiebreak), starting strictly after `after` when supplied.
    async fn list_available_after(&self, after: Option<&Post>, limit: i64) -> Result<Vec<Post>>;
}

/// Per-identity counter documents, read and overwritten whole.
#[async_trait]
pub trait CounterStore: Send + Sync {
    async fn read(&self, key: &str) -> Result<Option<QuotaCounter>>;
    async fn write(&self, key: &str, counter: &QuotaCounter) -> Result<()>;
}
