//! HTTP handlers

mod auth;
mod health;

pub use auth::{login, logout, validate};
pub use health::{health, ready};
