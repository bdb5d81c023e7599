//! Query result caching and per-session history.
//!
//! # Main types
//!
//! - [`QueryCache`]: Exact-query cache keyed by SHA-256, with lazy TTL eviction.
//! - [`Session`]: Query history and registered documents of one caller session.
//! - [`SessionStore`]: Async store trait; [`InMemorySessionStore`] is the default backend.

/// Query result cache.
pub mod cache;
/// Session model.
pub mod session;
/// Session storage.
pub mod store;

pub use cache::{CacheStats, QueryCache};
pub use session::{QueryRecord, Session, SessionStats};
pub use store::{InMemorySessionStore, SessionStore};
