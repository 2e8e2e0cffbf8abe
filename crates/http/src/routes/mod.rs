pub mod misc;
pub mod queues;
pub mod stats;
