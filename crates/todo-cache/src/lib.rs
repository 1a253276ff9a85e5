//! Todo Cache - user cache and token deny list
//!
//! Both caches sit on a [`CacheStore`], a string key/value substrate with
//! per-entry TTL. [`RedisStore`] is the production backend; [`MemoryStore`]
//! keeps everything in-process and reads expiry from an injected clock.
//!
//! The user cache is strictly optional: read failures are misses and write
//! failures are logged. The deny list fails open on lookups.

pub mod deny_list;
pub mod error;
pub mod keys;
pub mod memory;
pub mod redis_store;
pub mod store;
pub mod user_cache;

pub use deny_list::DenyList;
pub use error::{CacheError, CacheResult};
pub use keys::{deny_key, UserKeys};
pub use memory::MemoryStore;
pub use redis_store::RedisStore;
pub use store::{CacheStore, SharedStore};
pub use user_cache::UserCache;
