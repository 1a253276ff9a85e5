//! Todo Types - Shared domain types
//!
//! This crate contains domain types used across the todo auth crates:
//! - Users, roles and pagination windows
//! - External identities and login input
//! - The injectable clock

pub mod clock;
pub mod error;
pub mod identity;
pub mod user;

pub use clock::*;
pub use error::*;
pub use identity::*;
pub use user::*;
