/// Hourly Read-Rate Limiter
///
/// Fixed-window counter per network origin, gating list reads. Unlike the
/// daily guard this limiter persists a QuotaCounter document per origin.
/// The counter is always written back, including on denial, so repeated
/// over-limit calls keep incrementing and keep being denied instead of
/// resetting through duplicate requests.
///
/// The read-modify-write has the same race class as the daily guard:
/// concurrent calls from one origin can each write `count + 1` from the
/// same stale base, under-counting true concurrent load. The limiter is a
/// best-effort fairness mechanism, not a hard guarantee.
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::error::Result;
use crate::models::QuotaCounter;
use crate::store::CounterStore;

const HOURLY_WINDOW_MINUTES: i64 = 60;

#[derive(Debug, Clone, Copy)]
pub struct RateDecision {
    pub admitted: bool,
    /// Post-increment count within the current window.
    pub count: u32,
    pub ceiling: u32,
}

pub struct ReadRateLimiter {
    counters: Arc<dyn CounterStore>,
    ceiling: u32,
}

impl ReadRateLimiter {
    pub fn new(counters: Arc<dyn CounterStore>, ceiling: u32) -> Self {
        Self { counters, ceiling }
    }

    fn key(origin_ip: &str) -> String {
        format!("read_rate:ip:{origin_ip}")
    }

    /// Record one call from `origin_ip` and decide whether to admit it.
    ///
    /// Exactly `ceiling` calls are admitted per window; the `ceiling + 1`-th
    /// is denied (the check is `count > ceiling` post-increment).
    pub async fn check(&self, origin_ip: &str, now: DateTime<Utc>) -> Result<RateDecision> {
        let key = Self::key(origin_ip);

        let previous = self
            .counters
            .read(&key)
            .await?
            .unwrap_or_else(|| QuotaCounter::fresh(now));

        let next = if now - previous.window_start >= Duration::minutes(HOURLY_WINDOW_MINUTES) {
            // Stale window: logically reset regardless of the stored count.
            QuotaCounter {
                count: 1,
                window_start: now,
            }
        } else {
            QuotaCounter {
                count: previous.count + 1,
                window_start: previous.window_start,
            }
        };

        self.counters.write(&key, &next).await?;

        let admitted = next.count <= self.ceiling;
        if !admitted {
            tracing::warn!(
                origin = origin_ip,
                count = next.count,
                ceiling = self.ceiling,
                "hourly read ceiling exceeded"
            );
        }

        Ok(RateDecision {
            admitted,
            count: next.count,
            ceiling: self.ceiling,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{CounterStore, MemoryCounterStore};

    #[tokio::test]
    async fn admits_exactly_ceiling_calls_per_window() {
        let store = Arc::new(MemoryCounterStore::new());
        let limiter = ReadRateLimiter::new(store, 10);
        let now = Utc::now();

        let mut admits = 0;
        let mut denies = 0;
        for _ in 0..13 {
            let decision = limiter.check("198.51.100.7", now).await.unwrap();
            if decision.admitted {
                admits += 1;
            } else {
                denies += 1;
            }
        }

        assert_eq!(admits, 10);
        assert_eq!(denies, 3);
    }

    #[tokio::test]
    async fn denied_calls_still_increment_the_counter() {
        let store = Arc::new(MemoryCounterStore::new());
        let limiter = ReadRateLimiter::new(store.clone(), 2);
        let now = Utc::now();

        for _ in 0..5 {
            let _ = limiter.check("198.51.100.7", now).await.unwrap();
        }

        let counter = store
            .read("read_rate:ip:198.51.100.7")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(counter.count, 5);
    }

    #[tokio::test]
    async fn stale_window_resets_to_one_regardless_of_stored_count() {
        let store = Arc::new(MemoryCounterStore::new());
        let now = Utc::now();

        store
            .write(
                "read_rate:ip:198.51.100.7",
                &QuotaCounter {
                    count: 300,
                    window_start: now - Duration::minutes(61),
                },
            )
            .await
            .unwrap();

        let limiter = ReadRateLimiter::new(store.clone(), 300);
        let decision = limiter.check("198.51.100.7", now).await.unwrap();

        assert!(decision.admitted);
        assert_eq!(decision.count, 1);

        let counter = store
            .read("read_rate:ip:198.51.100.7")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(counter.window_start, now);
    }

    #[tokio::test]
    async fn in_flight_window_is_kept() {
        let store = Arc::new(MemoryCounterStore::new());
        let now = Utc::now();
        let window_start = now - Duration::minutes(10);

        store
            .write(
                "read_rate:ip:198.51.100.7",
                &QuotaCounter {
                    count: 300,
                    window_start,
                },
            )
            .await
            .unwrap();

        let limiter = ReadRateLimiter::new(store.clone(), 300);
        let decision = limiter.check("198.51.100.7", now).await.unwrap();

        // 301st call in an open window: denied, window untouched.
        assert!(!decision.admitted);
        assert_eq!(decision.count, 301);

        let counter = store
            .read("read_rate:ip:198.51.100.7")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(counter.window_start, window_start);
    }
}
