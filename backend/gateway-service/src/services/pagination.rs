/// Cursor Pagination Engine
///
/// Produces ordered, bounded pages of posts plus an opaque continuation
/// cursor. Posts are ordered by `created_at` descending (id descending as a
/// tiebreak); a cursor references the last post of the previous page and
/// the next page starts strictly after it.
use std::sync::Arc;

use base64::{engine::general_purpose, Engine as _};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::Post;
use crate::store::PostStore;

/// Page size applied when the caller does not ask for one.
pub const DEFAULT_PAGE_SIZE: i64 = 5;
/// Hard maximum page size, independent of caller input.
pub const MAX_PAGE_SIZE: i64 = 20;

/// Opaque cursor codec. The payload is the id of the last post returned;
/// base64 keeps the format free to evolve without breaking clients. The
/// URL-safe alphabet lets cursors travel in query strings unescaped.
pub struct CursorCodec;

impl CursorCodec {
    pub fn encode(id: Uuid) -> String {
        general_purpose::URL_SAFE_NO_PAD.encode(id.to_string())
    }

    pub fn decode(cursor: &str) -> Result<Uuid> {
        let decoded = general_purpose::URL_SAFE_NO_PAD
            .decode(cursor)
            .map_err(|_| AppError::BadRequest("Invalid cursor format".to_string()))?;

        let id_str = String::from_utf8(decoded)
            .map_err(|_| AppError::BadRequest("Invalid cursor encoding".to_string()))?;

        Uuid::parse_str(&id_str)
            .map_err(|_| AppError::BadRequest("Invalid cursor value".to_string()))
    }
}

#[derive(Debug)]
pub struct PostPage {
    pub items: Vec<Post>,
    /// True iff the page is exactly full-sized. A final page that happens
    /// to fill the limit is mis-reported as having more; acceptable for a
    /// "load more" UI.
    pub has_more: bool,
    /// Id of the last item returned, or None for an empty page.
    pub cursor: Option<String>,
}

pub struct PaginationEngine {
    posts: Arc<dyn PostStore>,
}

impl PaginationEngine {
    pub fn new(posts: Arc<dyn PostStore>) -> Self {
        Self { posts }
    }

    /// Effective page size: the caller's request (or the default when
    /// absent) clamped into `1..=MAX_PAGE_SIZE`. Zero and negative requests
    /// are promoted to a one-item page rather than rejected.
    pub fn clamp_size(requested: Option<i64>) -> i64 {
        requested.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    /// Fetch one page. A cursor whose post no longer resolves is ignored
    /// and pagination restarts from the newest post; callers must tolerate
    /// the apparent jump.
    pub async fn page(&self, cursor: Option<&str>, requested: Option<i64>) -> Result<PostPage> {
        let limit = Self::clamp_size(requested);

        let after = match cursor {
            Some(raw) => {
                let id = CursorCodec::decode(raw)?;
                let resolved = self.posts.find_by_id(id).await?;
                if resolved.is_none() {
                    tracing::debug!(%id, "cursor no longer resolves, restarting from newest");
                }
                resolved
            }
            None => None,
        };

        let items = self.posts.list_available_after(after.as_ref(), limit).await?;

        let has_more = items.len() as i64 == limit;
        let next_cursor = items.last().map(|post| CursorCodec::encode(post.id));

        Ok(PostPage {
            items,
            has_more,
            cursor: next_cursor,
        })
    }
}
