/// Post submission and listing flows.
///
/// The submission orchestrator is deliberately thin: it composes the two
/// daily guards, validates the payload shape, writes the post, and reports
/// remaining-quota telemetry. The list flow composes the hourly limiter and
/// the pagination engine.
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::config::QuotaConfig;
use crate::error::{AppError, Result};
use crate::models::{NewPost, Post};
use crate::services::pagination::{PaginationEngine, PostPage};
use crate::services::quota::DailyQuotaGuard;
use crate::services::rate_limit::ReadRateLimiter;
use crate::store::{CounterStore, PostStore};

/// Successful submission outcome, including remaining-quota telemetry
/// derived from the pre-write counts.
#[derive(Debug)]
pub struct SubmitOutcome {
    pub post: Post,
    pub remaining_user: i64,
    pub remaining_origin: i64,
}

pub struct PostGateway {
    posts: Arc<dyn PostStore>,
    quota_guard: DailyQuotaGuard,
    read_limiter: ReadRateLimiter,
    pagination: PaginationEngine,
    quota: QuotaConfig,
}

impl PostGateway {
    pub fn new(
        posts: Arc<dyn PostStore>,
        counters: Arc<dyn CounterStore>,
        quota: QuotaConfig,
    ) -> Self {
        Self {
            quota_guard: DailyQuotaGuard::new(posts.clone()),
            read_limiter: ReadRateLimiter::new(counters, quota.read_hourly_ceiling),
            pagination: PaginationEngine::new(posts.clone()),
            posts,
            quota,
        }
    }

    /// Submit a new post on behalf of an authenticated user.
    ///
    /// Sequence: payload validation, user daily guard, origin daily guard,
    /// persist with server-assigned timestamps and `available` status.
    /// A guard query failure aborts before the write (fail closed); a failed
    /// write needs no compensation because the quota check is a derived
    /// count, not a reservation.
    pub async fn submit(
        &self,
        author_id: Uuid,
        origin_ip: &str,
        name: &str,
        category: &str,
        extra: serde_json::Value,
    ) -> Result<SubmitOutcome> {
        let name = name.trim();
        let category = category.trim();
        if name.is_empty() {
            return Err(AppError::Validation("name must not be empty".to_string()));
        }
        if category.is_empty() {
            return Err(AppError::Validation(
                "category must not be empty".to_string(),
            ));
        }

        let now = Utc::now();

        let user_decision = self
            .quota_guard
            .check_user(author_id, self.quota.user_daily_ceiling, now)
            .await?;
        if !user_decision.admitted {
            tracing::info!(
                %author_id,
                count = user_decision.count,
                ceiling = user_decision.ceiling,
                "daily user quota exhausted"
            );
            return Err(AppError::DailyQuotaExceeded {
                scope: user_decision.scope,
                count: user_decision.count,
                ceiling: user_decision.ceiling,
            });
        }

        let origin_decision = self
            .quota_guard
            .check_origin(origin_ip, self.quota.origin_daily_ceiling, now)
            .await?;
        if !origin_decision.admitted {
            tracing::info!(
                origin = origin_ip,
                count = origin_decision.count,
                ceiling = origin_decision.ceiling,
                "daily origin quota exhausted"
            );
            return Err(AppError::DailyQuotaExceeded {
                scope: origin_decision.scope,
                count: origin_decision.count,
                ceiling: origin_decision.ceiling,
            });
        }

        let post = self
            .posts
            .insert(NewPost {
                author_id,
                origin_ip: origin_ip.to_string(),
                name: name.to_string(),
                category: category.to_string(),
                extra,
            })
            .await?;

        tracing::info!(post_id = %post.id, %author_id, "post created");

        Ok(SubmitOutcome {
            post,
            remaining_user: user_decision.remaining_after_write(),
            remaining_origin: origin_decision.remaining_after_write(),
        })
    }

    /// List a page of available posts, gated by the hourly read limiter.
    pub async fn list(
        &self,
        origin_ip: &str,
        cursor: Option<&str>,
        requested_size: Option<i64>,
    ) -> Result<PostPage> {
        let decision = self.read_limiter.check(origin_ip, Utc::now()).await?;
        if !decision.admitted {
            return Err(AppError::ReadRateExceeded {
                count: decision.count,
                ceiling: decision.ceiling,
            });
        }

        self.pagination.page(cursor, requested_size).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::QuotaCounter;
    use crate::store::{MemoryCounterStore, MemoryPostStore};
    use async_trait::async_trait;
    use chrono::{DateTime, Duration};

    /// Post store whose count queries fail, as they would when the database
    /// is unreachable. Everything else delegates to the in-memory store so
    /// the test can observe whether a write slipped through.
    struct CountFailingPostStore {
        inner: MemoryPostStore,
    }

    #[async_trait]
    impl PostStore for CountFailingPostStore {
        async fn insert(&self, new: NewPost) -> Result<Post> {
            self.inner.insert(new).await
        }

        async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>> {
            self.inner.find_by_id(id).await
        }

        async fn count_by_author_since(
            &self,
            _author_id: Uuid,
            _since: DateTime<Utc>,
        ) -> Result<i64> {
            Err(AppError::Database("connection refused".to_string()))
        }

        async fn count_by_origin_since(
            &self,
            _origin_ip: &str,
            _since: DateTime<Utc>,
        ) -> Result<i64> {
            Err(AppError::Database("connection refused".to_string()))
        }

        async fn list_available_after(
            &self,
            after: Option<&Post>,
            limit: i64,
        ) -> Result<Vec<Post>> {
            self.inner.list_available_after(after, limit).await
        }
    }

    struct FailingCounterStore;

    #[async_trait]
    impl CounterStore for FailingCounterStore {
        async fn read(&self, _key: &str) -> Result<Option<QuotaCounter>> {
            Err(AppError::CounterStore("connection refused".to_string()))
        }

        async fn write(&self, _key: &str, _counter: &QuotaCounter) -> Result<()> {
            Err(AppError::CounterStore("connection refused".to_string()))
        }
    }

    fn test_quota() -> QuotaConfig {
        QuotaConfig {
            user_daily_ceiling: 5,
            origin_daily_ceiling: 8,
            read_hourly_ceiling: 300,
        }
    }

    fn gateway_with(store: Arc<MemoryPostStore>) -> PostGateway {
        PostGateway::new(store, Arc::new(MemoryCounterStore::new()), test_quota())
    }

    #[tokio::test]
    async fn submit_persists_and_reports_remaining() {
        let store = Arc::new(MemoryPostStore::new());
        let gateway = gateway_with(store.clone());
        let user = Uuid::new_v4();

        let outcome = gateway
            .submit(
                user,
                "10.0.0.1",
                "kettle",
                "kitchen",
                serde_json::json!({"price": 12}),
            )
            .await
            .unwrap();

        assert_eq!(outcome.remaining_user, 4);
        assert_eq!(outcome.remaining_origin, 7);
        assert_eq!(outcome.post.status, "available");
        assert_eq!(outcome.post.author_id, user);

        let stored = store.find_by_id(outcome.post.id).await.unwrap();
        assert!(stored.is_some());
    }

    #[tokio::test]
    async fn sixth_submission_within_24h_is_denied_with_zero_remaining() {
        let store = Arc::new(MemoryPostStore::new());
        let gateway = gateway_with(store.clone());
        let user = Uuid::new_v4();
        let now = Utc::now();

        for i in 0..5 {
            store
                .seed(
                    NewPost {
                        author_id: user,
                        origin_ip: format!("10.0.0.{i}"),
                        name: "chair".to_string(),
                        category: "furniture".to_string(),
                        extra: serde_json::json!({}),
                    },
                    now - Duration::minutes(30),
                )
                .await;
        }

        let err = gateway
            .submit(user, "10.0.0.9", "chair", "furniture", serde_json::json!({}))
            .await
            .unwrap_err();

        match err {
            AppError::DailyQuotaExceeded { count, ceiling, .. } => {
                assert_eq!(count, 5);
                assert_eq!(ceiling, 5);
                assert_eq!((ceiling - count).max(0), 0);
            }
            other => panic!("expected quota error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn origin_ceiling_denies_across_users() {
        let store = Arc::new(MemoryPostStore::new());
        let gateway = gateway_with(store.clone());
        let now = Utc::now();

        for _ in 0..8 {
            store
                .seed(
                    NewPost {
                        author_id: Uuid::new_v4(),
                        origin_ip: "203.0.113.4".to_string(),
                        name: "bike".to_string(),
                        category: "sports".to_string(),
                        extra: serde_json::json!({}),
                    },
                    now - Duration::hours(2),
                )
                .await;
        }

        let err = gateway
            .submit(
                Uuid::new_v4(),
                "203.0.113.4",
                "bike",
                "sports",
                serde_json::json!({}),
            )
            .await
            .unwrap_err();

        assert_eq!(err.code(), "daily-quota-origin-exceeded");
    }

    #[tokio::test]
    async fn blank_required_fields_are_rejected_without_a_write() {
        let store = Arc::new(MemoryPostStore::new());
        let gateway = gateway_with(store.clone());
        let user = Uuid::new_v4();

        let err = gateway
            .submit(user, "10.0.0.1", "   ", "kitchen", serde_json::json!({}))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "missing-required-field");

        let err = gateway
            .submit(user, "10.0.0.1", "kettle", "", serde_json::json!({}))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "missing-required-field");

        let count = store
            .count_by_author_since(user, Utc::now() - Duration::days(1))
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn quota_query_failure_aborts_submit_before_any_write() {
        let store = Arc::new(CountFailingPostStore {
            inner: MemoryPostStore::new(),
        });
        let gateway = PostGateway::new(
            store.clone(),
            Arc::new(MemoryCounterStore::new()),
            test_quota(),
        );

        let err = gateway
            .submit(
                Uuid::new_v4(),
                "10.0.0.1",
                "kettle",
                "kitchen",
                serde_json::json!({}),
            )
            .await
            .unwrap_err();

        // Failed closed: surfaced as a generic internal error, never an admit.
        assert_eq!(err.code(), "internal-error");

        let written = store.inner.list_available_after(None, 10).await.unwrap();
        assert!(written.is_empty());
    }

    #[tokio::test]
    async fn counter_store_failure_denies_the_list_call() {
        let gateway = PostGateway::new(
            Arc::new(MemoryPostStore::new()),
            Arc::new(FailingCounterStore),
            test_quota(),
        );

        let err = gateway.list("198.51.100.1", None, None).await.unwrap_err();
        assert_eq!(err.code(), "internal-error");
    }

    #[tokio::test]
    async fn list_is_denied_once_the_hourly_ceiling_is_hit() {
        let store = Arc::new(MemoryPostStore::new());
        let counters = Arc::new(MemoryCounterStore::new());
        let gateway = PostGateway::new(
            store,
            counters,
            QuotaConfig {
                user_daily_ceiling: 5,
                origin_daily_ceiling: 8,
                read_hourly_ceiling: 2,
            },
        );

        assert!(gateway.list("198.51.100.1", None, None).await.is_ok());
        assert!(gateway.list("198.51.100.1", None, None).await.is_ok());

        let err = gateway
            .list("198.51.100.1", None, None)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "hourly-rate-exceeded");

        // A different origin is unaffected.
        assert!(gateway.list("198.51.100.2", None, None).await.is_ok());
    }
}
