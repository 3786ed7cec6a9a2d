/// Daily Quota Guard
///
/// Computes whether an identity (user or network origin) has exhausted its
/// fixed ceiling of writes in the trailing 24 hours. The count is derived
/// from the post collection itself on every call; there is no persisted
/// daily counter. "Yesterday" is recomputed fresh as `now - 24h`, so the
/// quota self-corrects from the actual posts, at the cost of a known
/// check-then-act race: two concurrent submissions can both observe
/// `count < ceiling` and both be admitted.
///
/// A failed count query propagates as an error, which aborts the request
/// before anything is written: the guard fails closed.
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::error::{QuotaScope, Result};
use crate::store::PostStore;

const DAILY_WINDOW_HOURS: i64 = 24;

/// Outcome of a quota check, also used for remaining-quota telemetry.
#[derive(Debug, Clone, Copy)]
pub struct QuotaDecision {
    pub scope: QuotaScope,
    pub admitted: bool,
    /// Posts observed in the trailing window before this request.
    pub count: i64,
    pub ceiling: i64,
}

impl QuotaDecision {
    /// Slots left after admitting the current request, clamped at zero.
    /// Equal to what a post-write re-count would report.
    pub fn remaining_after_write(&self) -> i64 {
        (self.ceiling - self.count - 1).max(0)
    }
}

pub struct DailyQuotaGuard {
    posts: Arc<dyn PostStore>,
}

impl DailyQuotaGuard {
    pub fn new(posts: Arc<dyn PostStore>) -> Self {
        Self { posts }
    }

    /// Check the per-user ceiling. Admit only while `count < ceiling`;
    /// a tie at exactly the ceiling is denied.
    pub async fn check_user(
        &self,
        author_id: Uuid,
        ceiling: i64,
        now: DateTime<Utc>,
    ) -> Result<QuotaDecision> {
        let since = now - Duration::hours(DAILY_WINDOW_HOURS);
        let count = self.posts.count_by_author_since(author_id, since).await?;
        Ok(Self::decide(QuotaScope::User, count, ceiling))
    }

    /// Check the per-origin ceiling.
    pub async fn check_origin(
        &self,
        origin_ip: &str,
        ceiling: i64,
        now: DateTime<Utc>,
    ) -> Result<QuotaDecision> {
        let since = now - Duration::hours(DAILY_WINDOW_HOURS);
        let count = self.posts.count_by_origin_since(origin_ip, since).await?;
        Ok(Self::decide(QuotaScope::Origin, count, ceiling))
    }

    fn decide(scope: QuotaScope, count: i64, ceiling: i64) -> QuotaDecision {
        QuotaDecision {
            scope,
            admitted: count < ceiling,
            count,
            ceiling,
        }
    }
}
