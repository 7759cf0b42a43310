//! Outbound write queue

mod write_queue;

pub use write_queue::{WriteFailures, WriteQueue};
