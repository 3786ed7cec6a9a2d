/// HTTP handlers for gateway-service
pub mod posts;

pub use posts::{list_posts, submit_post};
