/// Data models for gateway-service
///
/// This module defines structures for:
/// - Post: a content item in the shared, timestamp-ordered collection
/// - QuotaCounter: persisted per-identity counter used by the read limiter
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A post as stored and as returned to clients.
///
/// `created_at` is assigned by the server, never trusted from the caller,
/// and is immutable once set: it defines the total order for pagination.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub origin_ip: String,
    pub name: String,
    pub category: String,
    /// Free-form payload fields supplied by the caller, stored as-is.
    pub extra: serde_json::Value,
    /// `available` on creation; other terminal states are client-owned.
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub const POST_STATUS_AVAILABLE: &str = "available";

/// Fields the orchestrator supplies when persisting a new post.
/// Timestamps and id are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub author_id: Uuid,
    pub origin_ip: String,
    pub name: String,
    pub category: String,
    pub extra: serde_json::Value,
}

/// Per-identity fixed-window counter document.
///
/// `count` only increases within a window. A counter whose window has
/// elapsed is treated as logically reset on the next read; the stored value
/// may stay stale until the next write (no TTL, lazy reclamation). The whole
/// document is overwritten on every call, never incremented in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotaCounter {
    pub count: u32,
    pub window_start: DateTime<Utc>,
}

impl QuotaCounter {
    pub fn fresh(now: DateTime<Utc>) -> Self {
        Self {
            count: 0,
            window_start: now,
        }
    }
}
