//! Transactional persistence over two entities: queues and messages.
//!
//! `Store` wraps a single `rusqlite::Connection` behind a mutex. Every
//! public method performs exactly one short transaction (or a single
//! statement where a transaction buys nothing), matching the design's
//! "short transactions; callers assemble multi-statement operations
//! inside a single transaction" contract.

mod schema;
mod store;

pub use store::{NewMessage, Store, StoreError};
