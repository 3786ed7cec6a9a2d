//! Gateway service for the shared posts collection.
//!
//! Request handlers in front of a timestamp-ordered post store, enforcing a
//! daily per-user and per-origin write quota, an hourly per-origin read-rate
//! limit, and cursor-based pagination. The mobile client, token issuance,
//! and media storage are external collaborators.
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod store;

pub use config::Config;
pub use error::{AppError, Result};
