//! Shared data model and input validators for the tiny queue service.
//!
//! Deliberately framework-agnostic: no `axum`, no `rusqlite`, no async.
//! The HTTP surface and the store each depend on this crate, not the
//! other way around.

pub mod model;
pub mod validate;

pub use model::{MediaType, Message, Queue, QueueStats};
