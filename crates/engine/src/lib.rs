//! Queue semantics: validation, visibility, leasing, and statistics,
//! built on top of `tqs_store`. Nothing here is aware of HTTP.

mod clock;
mod engine;
mod error;
mod sweeper;

pub use clock::{Clock, FakeClock, SystemClock};
pub use engine::{DequeueParams, EnqueueMessage, QueueEngine};
pub use error::EngineError;
pub use sweeper::{spawn as spawn_sweepers, SweeperConfig, SweeperHandle};
