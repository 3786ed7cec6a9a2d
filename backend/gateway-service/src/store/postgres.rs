use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{NewPost, Post};
use crate::store::PostStore;

const POST_COLUMNS: &str =
    "id, author_id, origin_ip, name, category, extra, status, created_at, updated_at";

/// sqlx-backed post collection.
pub struct PgPostStore {
    pool: PgPool,
}

impl PgPostStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostStore for PgPostStore {
    async fn insert(&self, new: NewPost) -> Result<Post> {
        let post = sqlx::query_as::<_, Post>(&format!(
            r#"
            INSERT INTO posts (author_id, origin_ip, name, category, extra, status)
            VALUES ($1, $2, $3, $4, $5, 'available')
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(new.author_id)
        .bind(&new.origin_ip)
        .bind(&new.name)
        .bind(&new.category)
        .bind(&new.extra)
        .fetch_one(&self.pool)
        .await?;

        Ok(post)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    async fn count_by_author_since(&self, author_id: Uuid, since: DateTime<Utc>) -> Result<i64> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS count FROM posts WHERE author_id = $1 AND created_at > $2",
        )
        .bind(author_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get::<i64, _>("count"))
    }

    async fn count_by_origin_since(&self, origin_ip: &str, since: DateTime<Utc>) -> Result<i64> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS count FROM posts WHERE origin_ip = $1 AND created_at > $2",
        )
        .bind(origin_ip)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get::<i64, _>("count"))
    }

    async fn list_available_after(&self, after: Option<&Post>, limit: i64) -> Result<Vec<Post>> {
        let posts = match after {
            Some(last) => {
                // Keyset comparison keeps the page stable while writes continue.
                sqlx::query_as::<_, Post>(&format!(
                    r#"
                    SELECT {POST_COLUMNS}
                    FROM posts
                    WHERE status = 'available' AND (created_at, id) < ($1, $2)
                    ORDER BY created_at DESC, id DESC
                    LIMIT $3
                    "#
                ))
                .bind(last.created_at)
                .bind(last.id)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Post>(&format!(
                    r#"
                    SELECT {POST_COLUMNS}
                    FROM posts
                    WHERE status = 'available'
                    ORDER BY created_at DESC, id DESC
                    LIMIT $1
                    "#
                ))
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(posts)
    }
}
