//! Session lifecycle

mod lifecycle;

pub use lifecycle::{Lifecycle, SessionState};
