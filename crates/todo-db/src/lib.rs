//! Todo DB - Database abstractions
//!
//! SQLx-based repositories for users and their external identities.
//! Repositories speak domain types from `todo-types`; row types and the
//! conversions between the two stay inside this crate.
//!
//! # Example
//!
//! ```rust,ignore
//! use todo_db::{create_pool_with_options, PoolOptions, Repositories, UserRepository};
//!
//! let pool = create_pool_with_options("postgres://localhost/todo", PoolOptions::default()).await?;
//! let repos = Repositories::new(pool);
//!
//! let user = repos.users.get_by_email("user@example.com").await?;
//! ```

pub mod error;
pub mod models;
pub mod pg;
pub mod pool;
pub mod repo;

pub use error::{DbError, DbResult};
pub use pg::Repositories;
pub use pool::{create_pool, create_pool_with_options, run_migrations, DbPool, PoolOptions};
pub use repo::*;
