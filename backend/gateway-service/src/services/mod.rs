/// Business logic for the gateway: quota guards, the hourly read limiter,
/// the pagination engine, and the submission orchestrator composing them.
pub mod pagination;
pub mod posts;
pub mod quota;
pub mod rate_limit;

pub use pagination::{CursorCodec, PaginationEngine, PostPage};
pub use posts::{PostGateway, SubmitOutcome};
pub use quota::{DailyQuotaGuard, QuotaDecision};
pub use rate_limit::{RateDecision, ReadRateLimiter};
